//! Report synthesis: corpus -> prompt -> completion -> repaired JSON -> canonical report.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, info_span, Instrument};
use ycs_core::{CollectedCorpus, RawAnalysis, StrategyReport};

use crate::{build_prompt, normalize_report, parse_model_output, CompletionApi, CompletionRequest, ReportError};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Clone)]
pub struct ReportSynthesizer {
    completion: Arc<dyn CompletionApi>,
    temperature: f32,
}

impl ReportSynthesizer {
    pub fn new(completion: Arc<dyn CompletionApi>, temperature: f32) -> Self {
        Self {
            completion,
            temperature,
        }
    }

    /// Ask the model for a strategy and recover a JSON object from its answer.
    pub async fn analyze(&self, corpus: &CollectedCorpus) -> Result<RawAnalysis, ReportError> {
        let span = info_span!("synthesize", companies = corpus.companies.len());
        async {
            let request = CompletionRequest {
                prompt: build_prompt(corpus),
                temperature: self.temperature,
                json_mode: true,
            };
            info!(prompt_chars = request.prompt.len(), "requesting strategy analysis");
            let content = self.completion.complete(&request).await?;
            let object = parse_model_output(&content)?;
            info!(sections = object.len(), "analysis parsed");
            Ok(RawAnalysis(JsonValue::Object(object)))
        }
        .instrument(span)
        .await
    }

    pub async fn synthesize(&self, corpus: &CollectedCorpus) -> Result<StrategyReport, ReportError> {
        let raw = self.analyze(corpus).await?;
        normalize_report(&raw)
    }
}
