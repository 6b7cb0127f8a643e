pub mod client;
pub mod error;
pub mod prompt;
pub mod response;

pub use client::GeminiClient;
pub use error::AnalyzerError;
pub use prompt::build_prompt;
pub use response::{parse_analysis, primary_category, strip_code_fences};
