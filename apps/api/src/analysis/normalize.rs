//! Response Normalizer — turns an untrusted provider response into a
//! well-formed `AnalysisResult`, falling back to the deterministic keyword
//! profile and heuristic baseline under every provider behavior.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::analysis::keywords::KeywordProfile;
use crate::errors::AppError;
use crate::llm_client::{is_retryable, CallOutcome};

/// Cap on rewritten bullets kept from the provider.
const MAX_REWRITTEN_BULLETS: usize = 6;
/// Diagnostic strings embedded in results are truncated to this many chars.
const MAX_DIAGNOSTIC_CHARS: usize = 400;

/// What to do with a terminal (non-retryable 4xx) provider error: surface it
/// to the caller as an explicit failure, or degrade to heuristic-only output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalErrorPolicy {
    Surface,
    Degrade,
}

/// The final analysis shape exposed to API clients. Always producible, even
/// when the provider is fully unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Always a clamped integer in [0, 100].
    pub ats_score: u32,
    pub top_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub rewritten_bullets: Vec<String>,
    pub keywords: Vec<String>,
    pub skills_found: Vec<String>,
    pub top_tokens: Vec<String>,
    /// Set when the result was built from heuristics because the provider
    /// was unavailable or returned unusable content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<String>,
}

impl AnalysisResult {
    /// Builds a result entirely from the deterministic profile and baseline.
    fn heuristic(profile: &KeywordProfile, baseline_score: u32) -> Self {
        Self {
            ats_score: baseline_score,
            top_skills: profile.skills_found.clone(),
            suggestions: Vec::new(),
            rewritten_bullets: Vec::new(),
            keywords: profile.keywords.clone(),
            skills_found: profile.skills_found.clone(),
            top_tokens: profile.top_tokens.clone(),
            degraded: None,
            provider_error: None,
        }
    }

    fn degraded(profile: &KeywordProfile, baseline_score: u32, provider_error: String) -> Self {
        Self {
            degraded: Some(true),
            provider_error: Some(provider_error),
            ..Self::heuristic(profile, baseline_score)
        }
    }
}

/// Normalizes a provider call outcome (or its absence) into an
/// `AnalysisResult`.
///
/// The only error path is a terminal provider status under
/// `TerminalErrorPolicy::Surface`; every other failure class is absorbed
/// into a degraded but successful result.
pub fn normalize(
    outcome: Option<&CallOutcome>,
    profile: &KeywordProfile,
    baseline_score: u32,
    policy: TerminalErrorPolicy,
) -> Result<AnalysisResult, AppError> {
    let outcome = match outcome {
        // AI mode disabled or skipped: profile + baseline are the result.
        None => return Ok(AnalysisResult::heuristic(profile, baseline_score)),
        Some(o) => o,
    };

    if !outcome.ok {
        return match outcome.status_code {
            Some(status) if !is_retryable(status) => match policy {
                TerminalErrorPolicy::Surface => Err(AppError::Provider {
                    status,
                    message: truncate(&outcome.body_text),
                }),
                TerminalErrorPolicy::Degrade => Ok(AnalysisResult::degraded(
                    profile,
                    baseline_score,
                    format!("provider returned terminal status {status}"),
                )),
            },
            Some(status) => Ok(AnalysisResult::degraded(
                profile,
                baseline_score,
                format!(
                    "provider unavailable after {} attempts (last status {status})",
                    outcome.attempts_made
                ),
            )),
            None => Ok(AnalysisResult::degraded(
                profile,
                baseline_score,
                format!(
                    "provider unreachable after {} attempts: {}",
                    outcome.attempts_made,
                    truncate(&outcome.body_text)
                ),
            )),
        };
    }

    let parsed = match extract_json_object(&outcome.body_text) {
        Some(v) => v,
        None => {
            warn!("Provider returned 2xx but no parseable JSON object");
            return Ok(AnalysisResult::degraded(
                profile,
                baseline_score,
                format!(
                    "unparseable provider response: {}",
                    truncate(&outcome.body_text)
                ),
            ));
        }
    };

    let ats_score = parsed
        .get("atsScore")
        .and_then(Value::as_f64)
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(0.0, 100.0) as u32)
        .unwrap_or(baseline_score);

    let mut rewritten_bullets = string_list(&parsed, "rewrittenBullets").unwrap_or_default();
    rewritten_bullets.truncate(MAX_REWRITTEN_BULLETS);

    // Backfill list fields the provider omitted from the deterministic profile.
    let keywords = dedup_preserving_order(
        string_list(&parsed, "keywords").unwrap_or_else(|| profile.keywords.clone()),
    );
    let skills_found =
        string_list(&parsed, "skillsFound").unwrap_or_else(|| profile.skills_found.clone());
    let top_tokens =
        string_list(&parsed, "topTokens").unwrap_or_else(|| profile.top_tokens.clone());

    Ok(AnalysisResult {
        ats_score,
        top_skills: string_list(&parsed, "topSkills").unwrap_or_default(),
        suggestions: string_list(&parsed, "suggestions").unwrap_or_default(),
        rewritten_bullets,
        keywords,
        skills_found,
        top_tokens,
        degraded: None,
        provider_error: None,
    })
}

/// Strict JSON parse first; on failure, best-effort extraction of the
/// substring between the first `{` and the last `}`. LLM output is free
/// text that frequently wraps the requested JSON in prose.
fn extract_json_object(body: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        if v.is_object() {
            return Some(v);
        }
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&body[start..=end])
        .ok()
        .filter(Value::is_object)
}

/// Reads `key` as an array of strings, or `None` when absent or not an array.
fn string_list(v: &Value, key: &str) -> Option<Vec<String>> {
    v.get(key)?.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_DIAGNOSTIC_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
