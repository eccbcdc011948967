//! Strategy report synthesis: prompt, completion call, output repair, schema normalization
//! and Markdown export.

pub mod completion;
pub mod markdown;
pub mod normalize;
pub mod prompt;
pub mod repair;
pub mod synth;

use thiserror::Error;
use ycs_storage::FetchError;

pub use completion::{CompletionApi, CompletionRequest, MistralChat};
pub use markdown::render_markdown;
pub use normalize::{normalize_report, REPORT_SCHEMA};
pub use prompt::{build_prompt, SCHEMA_TEMPLATE};
pub use repair::parse_model_output;
pub use synth::ReportSynthesizer;

pub const CRATE_NAME: &str = "ycs-report";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("completion request failed: {0}")]
    Completion(#[from] FetchError),
    #[error("completion response carried no message content")]
    EmptyCompletion,
    #[error("failed to parse JSON from model output: {reason} (content length {content_len})")]
    Unparseable { reason: String, content_len: usize },
    #[error("normalized report does not match the report schema: {0}")]
    Schema(#[source] serde_json::Error),
}
