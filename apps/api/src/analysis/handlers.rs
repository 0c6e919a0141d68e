//! Axum route handlers for the Analysis API.
//!
//! Both endpoints accept a multipart form with either a `resume` file field
//! (filename + bytes) or a `raw_text` text field. `/analyze` additionally
//! honors an `ai` flag to request provider enrichment.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::analysis::extract::{extract, ExtractedText, RawDocument};
use crate::analysis::keywords::KeywordProfile;
use crate::analysis::normalize::AnalysisResult;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Parsed multipart submission: a document, inline raw text, and the AI flag.
struct Submission {
    document: Option<RawDocument>,
    raw_text: Option<String>,
    ai: bool,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    pub profile: KeywordProfile,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/parse
///
/// Extracts plain text and a keyword profile without scoring or AI.
pub async fn handle_parse(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ParseResponse>, AppError> {
    let submission = read_submission(multipart).await?;
    let extracted = extract_submission(&submission)?;

    let profile = crate::analysis::parse(&extracted, &state);

    Ok(Json(ParseResponse {
        text: extracted.text,
        diagnostic: extracted.diagnostic,
        profile,
    }))
}

/// POST /api/v1/analyze
///
/// Runs the full pipeline and returns an `AnalysisResult`. With `ai=true`
/// and a configured provider, the result is provider-enriched; otherwise it
/// is heuristic-only.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let submission = read_submission(multipart).await?;
    let ai = submission.ai;
    let extracted = extract_submission(&submission)?;

    info!(
        ai,
        text_len = extracted.text.len(),
        "Starting resume analysis"
    );

    let output = crate::analysis::analyze(extracted, ai, &state).await?;

    Ok(Json(AnalyzeResponse {
        result: output.result,
        diagnostic: output.diagnostic,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart plumbing
// ────────────────────────────────────────────────────────────────────────────

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut submission = Submission {
        document: None,
        raw_text: None,
        ai: false,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        match field.name() {
            Some("resume") => {
                let filename = field.file_name().unwrap_or("resume").to_string();
                let declared_mime = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read resume file: {e}")))?;
                submission.document = Some(RawDocument {
                    bytes,
                    filename,
                    declared_mime,
                });
            }
            Some("raw_text") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read raw_text: {e}")))?;
                submission.raw_text = Some(text);
            }
            Some("ai") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read ai flag: {e}")))?;
                submission.ai = matches!(value.trim(), "1" | "true" | "yes");
            }
            _ => {}
        }
    }

    Ok(submission)
}

fn extract_submission(submission: &Submission) -> Result<ExtractedText, AppError> {
    if let Some(document) = &submission.document {
        Ok(extract(document))
    } else if let Some(raw_text) = &submission.raw_text {
        Ok(ExtractedText::from_raw_text(raw_text.clone()))
    } else {
        Err(AppError::Validation(
            "provide a 'resume' file or a 'raw_text' field".to_string(),
        ))
    }
}
