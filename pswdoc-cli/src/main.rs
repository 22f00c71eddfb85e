use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use pswdoc_core::dar::validate_dar;
use pswdoc_core::extract::extract_json_object;
use pswdoc_core::report::ReportRequest;
use pswdoc_core::speech::speech_text;
use pswdoc_engine::traits::{AudioClip, SpeechRequest};
use pswdoc_runtime::config_store::ConfigStore;
use pswdoc_runtime::services::Services;
use simplelog::{Config, SimpleLogger};

#[derive(Parser, Debug)]
#[command(name = "pswdoc", about = "PSW shift documentation service")]
struct Args {
    /// Path to config.json (defaults are used when it does not exist)
    #[arg(short, long, default_value = "pswdoc.json")]
    config: PathBuf,

    /// Where generated reports are recorded
    #[arg(long, default_value = "pswdoc-history.json")]
    history: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API
    Serve,
    /// Generate a DAR note through the configured LLM
    Report {
        /// Observations text, or @path to read them from a file
        #[arg(long, default_value = "")]
        observations: String,
        /// A task performed during the shift (repeatable)
        #[arg(long = "task")]
        tasks: Vec<String>,
        /// Dictated transcript text, or @path
        #[arg(long)]
        transcript: Option<String>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Extract and validate a DAR note from saved model output (no LLM call)
    Check { file: PathBuf },
    /// Transcribe an audio file through Whisper
    Transcribe {
        file: PathBuf,
        #[arg(long)]
        language: Option<String>,
    },
    /// Synthesize speech through XTTS (at most 2000 characters)
    Speak {
        text: String,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        speaker: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::init(level, Config::default()).context("init logger")?;

    let load_services = || -> anyhow::Result<Services> {
        let mut cfg = ConfigStore::at_path(&args.config).load_or_default()?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        Services::from_config(cfg, Some(args.history.clone()))
    };

    match args.command {
        Command::Check { file } => {
            if !check(&file)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Serve => pswdoc_server::serve(load_services()?).await?,
        Command::Report {
            observations,
            tasks,
            transcript,
            client,
            date,
        } => {
            let request = ReportRequest {
                client_name: client,
                shift_date: date,
                observations: read_arg(&observations)?,
                tasks,
                transcript: transcript.as_deref().map(read_arg).transpose()?,
                additional_notes: None,
            };
            let outcome = load_services()?.generator.generate(&request).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Transcribe { file, language } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("read audio: {}", file.display()))?;
            let clip = AudioClip {
                mime_type: mime_for_path(&file).into(),
                bytes,
            };
            let transcript = load_services()?
                .stt
                .transcribe(&clip, language.as_deref())
                .await?;
            println!("{}", transcript.text);
        }
        Command::Speak { text, out, speaker } => {
            let request = speech_request(&text, speaker)?;
            let audio = load_services()?.tts.synthesize(&request).await?;
            std::fs::write(&out, &audio.bytes)
                .with_context(|| format!("write audio: {}", out.display()))?;
            log::info!("wrote {} bytes of {} to {}", audio.bytes.len(), audio.content_type, out.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Prints the validated note to stdout; returns false when the output is unusable.
fn check(file: &Path) -> anyhow::Result<bool> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("read model output: {}", file.display()))?;

    let extracted = match extract_json_object(&raw) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("extraction failed: {e}");
            return Ok(false);
        }
    };
    log::info!("extracted JSON object via {:?}", extracted.method);

    match validate_dar(&extracted.value) {
        Ok(doc) => {
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(true)
        }
        Err(issues) => {
            for issue in issues {
                eprintln!("invalid: {issue}");
            }
            Ok(false)
        }
    }
}

fn speech_request(text: &str, speaker: Option<String>) -> anyhow::Result<SpeechRequest> {
    Ok(SpeechRequest {
        text: speech_text(text)?.to_string(),
        speaker,
        language: None,
    })
}

fn read_arg(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("read input file: {path}"))
        }
        None => Ok(value.to_string()),
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("ogg") => "audio/ogg",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
