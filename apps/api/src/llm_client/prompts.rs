// All LLM prompt constants for resume analysis.

/// Truncation cap for resume text embedded in the prompt. Keeps the request
/// well under provider context limits for pathological uploads.
const MAX_PROMPT_CHARS: usize = 16_000;

/// System prompt for resume analysis — enforces JSON-only output.
pub const ANALYSIS_SYSTEM: &str =
    "You are an expert resume reviewer and applicant-tracking-system (ATS) analyst. \
    Analyze a resume and return structured feedback. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Resume analysis prompt template. Use `build_analysis_prompt` to fill it.
const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume for ATS compatibility.

Return a JSON object with this EXACT schema (no extra fields):
{
  "atsScore": 72,
  "topSkills": ["rust", "distributed systems"],
  "suggestions": ["Quantify the impact of the migration project"],
  "rewrittenBullets": ["Cut deploy time 40% by moving CI to self-hosted runners"],
  "keywords": ["rust", "kubernetes", "terraform"],
  "skillsFound": ["rust", "kubernetes"],
  "topTokens": ["migration", "latency"]
}

Rules:
- atsScore is an integer from 0 to 100 estimating how well this resume survives automated keyword screening.
- topSkills: the strongest skills evidenced by the resume, most prominent first.
- suggestions: at most 5 concrete, actionable improvements.
- rewrittenBullets: at most 6 rewritten experience bullets with stronger verbs and quantified impact.
- keywords, skillsFound, topTokens: lower-cased, no duplicates.

Resume text:
---
{resume_text}
---"#;

/// Builds the analysis prompt, truncating the resume text at a char boundary.
pub fn build_analysis_prompt(resume_text: &str) -> String {
    let truncated = match resume_text.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((idx, _)) => &resume_text[..idx],
        None => resume_text,
    };
    ANALYSIS_PROMPT_TEMPLATE.replace("{resume_text}", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_resume_text() {
        let prompt = build_analysis_prompt("built scalable APIs in Rust");
        assert!(prompt.contains("built scalable APIs in Rust"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_prompt_truncates_long_text() {
        let long = "x".repeat(MAX_PROMPT_CHARS * 2);
        let prompt = build_analysis_prompt(&long);
        assert!(prompt.len() < long.len());
    }

    #[test]
    fn test_truncation_respects_multibyte_boundaries() {
        let long = "é".repeat(MAX_PROMPT_CHARS + 100);
        // Must not panic on a non-ASCII boundary
        let _ = build_analysis_prompt(&long);
    }
}
