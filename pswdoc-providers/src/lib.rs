pub mod ollama;
pub mod parse;
pub mod request;
pub mod runtime;
pub mod whisper;
pub mod xtts;

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
