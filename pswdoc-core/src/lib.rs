pub mod config;
pub mod dar;
pub mod extract;
pub mod prompt;
pub mod report;
pub mod speech;
pub mod text;

// Keep the public surface small and intentional.
pub use config::*;
pub use dar::*;
pub use extract::*;
pub use prompt::*;
pub use report::*;
pub use speech::*;
pub use text::*;
