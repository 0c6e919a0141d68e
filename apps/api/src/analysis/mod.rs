//! Document-to-insight analysis pipeline.
//!
//! `bytes → extract → keywords → heuristic score`, optionally enriched by a
//! provider call that is normalized with the deterministic profile as
//! fallback. Stateless and request-scoped; the only shared resource is the
//! immutable vocabulary in `AppState`.

pub mod extract;
pub mod handlers;
pub mod keywords;
pub mod normalize;
pub mod scoring;
pub mod vocab;

use tracing::debug;

use crate::analysis::extract::ExtractedText;
use crate::analysis::keywords::{extract_keywords, KeywordProfile};
use crate::analysis::normalize::{normalize, AnalysisResult};
use crate::analysis::scoring::estimate_score;
use crate::errors::AppError;
use crate::llm_client::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};
use crate::state::AppState;

/// Full pipeline output: the normalized result plus any extraction
/// diagnostic (e.g. a scanned PDF with no text layer).
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub diagnostic: Option<String>,
}

/// Runs the analysis pipeline over already-extracted text.
///
/// When `ai_requested` is false, AI mode is disabled in config, or the
/// document produced no text, the provider is never called and the result is
/// purely heuristic.
pub async fn analyze(
    extracted: ExtractedText,
    ai_requested: bool,
    state: &AppState,
) -> Result<AnalysisOutput, AppError> {
    let profile = extract_keywords(&extracted.text, &state.vocabulary);
    let baseline = estimate_score(&extracted.text, &profile);
    debug!(
        baseline,
        keywords = profile.keywords.len(),
        skills = profile.skills_found.len(),
        "Computed deterministic profile"
    );

    let outcome = match (&state.provider, ai_requested, extracted.text.is_empty()) {
        (Some(client), true, false) => {
            let prompt = build_analysis_prompt(&extracted.text);
            Some(client.call(&prompt, ANALYSIS_SYSTEM).await)
        }
        _ => None,
    };

    let result = normalize(
        outcome.as_ref(),
        &profile,
        baseline,
        state.config.terminal_policy(),
    )?;

    Ok(AnalysisOutput {
        result,
        diagnostic: extracted.diagnostic,
    })
}

/// Lower-level operation for callers that only need text and keywords.
pub fn parse(extracted: &ExtractedText, state: &AppState) -> KeywordProfile {
    extract_keywords(&extracted.text, &state.vocabulary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract::{extract, RawDocument};
    use crate::analysis::vocab::Vocabulary;
    use crate::config::Config;
    use bytes::Bytes;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            config: Config {
                ai_enabled: false,
                provider_api_url: String::new(),
                provider_api_key: String::new(),
                provider_model: String::new(),
                max_attempts: 3,
                base_delay_ms: 1,
                terminal_4xx_degrades: false,
                port: 0,
                rust_log: "info".to_string(),
            },
            vocabulary: Arc::new(Vocabulary::new()),
            provider: None,
        }
    }

    fn text_doc(text: &str) -> RawDocument {
        RawDocument {
            bytes: Bytes::copy_from_slice(text.as_bytes()),
            filename: "resume.txt".to_string(),
            declared_mime: None,
        }
    }

    #[tokio::test]
    async fn test_heuristic_only_analysis_end_to_end() {
        let state = test_state();
        let extracted = extract(&text_doc(
            "Experienced engineer skilled in React, Node.js, and AWS, \
             built scalable APIs for 5 years.",
        ));
        let output = analyze(extracted, false, &state).await.unwrap();

        let result = &output.result;
        assert!(result.skills_found.contains(&"react".to_string()));
        assert!(result.skills_found.contains(&"node.js".to_string()));
        assert!(result.skills_found.contains(&"aws".to_string()));
        assert!((30..=95).contains(&result.ats_score));
        assert!(result.degraded.is_none());
        assert!(output.diagnostic.is_none());
    }

    #[tokio::test]
    async fn test_analysis_is_reproducible() {
        let state = test_state();
        let text = "Rust developer, shipped kafka pipelines on kubernetes.";
        let first = analyze(extract(&text_doc(text)), false, &state)
            .await
            .unwrap();
        let second = analyze(extract(&text_doc(text)), false, &state)
            .await
            .unwrap();
        assert_eq!(first.result.ats_score, second.result.ats_score);
        assert_eq!(first.result.keywords, second.result.keywords);
    }

    #[tokio::test]
    async fn test_empty_document_yields_empty_profile_and_diagnostic() {
        let state = test_state();
        let output = analyze(extract(&text_doc("   ")), true, &state).await.unwrap();

        assert!(output.result.keywords.is_empty());
        assert!(output.result.skills_found.is_empty());
        assert!(output.result.top_tokens.is_empty());
        assert!(output.diagnostic.is_some());
        // Score is still a clamped integer from the heuristic
        assert!((30..=95).contains(&output.result.ats_score));
    }

    #[tokio::test]
    async fn test_ai_request_without_provider_degrades_silently() {
        let state = test_state(); // provider: None
        let output = analyze(extract(&text_doc("python developer")), true, &state)
            .await
            .unwrap();
        // No provider configured: plain heuristic result, no error
        assert!(output.result.provider_error.is_none());
        assert!(!output.result.keywords.is_empty());
    }
}
