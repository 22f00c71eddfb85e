use crate::outcome::{FallbackReason, ReportOutcome, ReportSource, ReportStage, ReportTimings, ms};
use crate::traits::LlmProvider;
use pswdoc_core::dar::{DarDocument, synthesize_fallback, validate_dar};
use pswdoc_core::extract::extract_json_object;
use pswdoc_core::prompt::build_dar_prompt;
use pswdoc_core::report::{InputError, ReportRequest};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid report request: {0}")]
    Input(#[from] InputError),
}

/// Turns a PSW's shift input into a DAR note.
///
/// Valid input always yields a valid document: model failures, unusable output and
/// schema violations all end in a synthesized note, tagged as such in the outcome.
pub struct ReportGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl ReportGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, request: &ReportRequest) -> Result<ReportOutcome, EngineError> {
        self.generate_with_hook(request, |_stage| async {}).await
    }

    /// Same as `generate`, but reports each stage as the pipeline progresses.
    ///
    /// The hook must be fast; it runs inline with the pipeline.
    pub async fn generate_with_hook<F, Fut>(
        &self,
        request: &ReportRequest,
        on_stage: F,
    ) -> Result<ReportOutcome, EngineError>
    where
        F: Fn(ReportStage) -> Fut,
        Fut: Future<Output = ()>,
    {
        request.validate()?;
        let started = Instant::now();

        on_stage(ReportStage::Prompting).await;
        let built = build_dar_prompt(request);

        on_stage(ReportStage::Generating).await;
        let g0 = Instant::now();
        let generated = self
            .llm
            .generate(&built.system_message, &built.user_message)
            .await;
        let generation_ms = Some(ms(g0.elapsed()));

        let generated = match generated {
            Ok(g) => g,
            Err(e) => {
                let reason = FallbackReason::LlmUnavailable(format!("{e:#}"));
                return Ok(fallback(request, reason, None, generation_ms, started));
            }
        };
        if generated.truncated {
            log::info!("model output hit its token limit; attempting repair");
        }

        on_stage(ReportStage::Extracting).await;
        let extracted = match extract_json_object(&generated.text) {
            Ok(x) => x,
            Err(e) => {
                let reason = FallbackReason::NoJson(e.to_string());
                return Ok(fallback(
                    request,
                    reason,
                    Some(generated.text),
                    generation_ms,
                    started,
                ));
            }
        };

        on_stage(ReportStage::Validating).await;
        let document: DarDocument = match validate_dar(&extracted.value) {
            Ok(doc) => doc,
            Err(issues) => {
                let reason = FallbackReason::Invalid(issues);
                return Ok(fallback(
                    request,
                    reason,
                    Some(generated.text),
                    generation_ms,
                    started,
                ));
            }
        };

        on_stage(ReportStage::Done).await;
        log::debug!(
            "DAR note generated by {} via {:?} extraction",
            generated.model,
            extracted.method
        );

        Ok(ReportOutcome {
            document,
            source: ReportSource::Model {
                model: generated.model,
                method: extracted.method,
            },
            raw_output: None,
            timings: ReportTimings {
                generation_ms,
                total_ms: ms(started.elapsed()),
            },
        })
    }
}

fn fallback(
    request: &ReportRequest,
    reason: FallbackReason,
    raw_output: Option<String>,
    generation_ms: Option<u64>,
    started: Instant,
) -> ReportOutcome {
    log::warn!("using synthesized DAR note: {reason}");

    ReportOutcome {
        document: synthesize_fallback(request),
        source: ReportSource::Fallback { reason },
        raw_output,
        timings: ReportTimings {
            generation_ms,
            total_ms: ms(started.elapsed()),
        },
    }
}
