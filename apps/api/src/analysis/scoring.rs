//! ATS Heuristic Scorer — baseline score and sole fallback when the
//! external provider is unavailable. Pure, total, side-effect-free.

use crate::analysis::keywords::KeywordProfile;

const BASE_SCORE: i32 = 40;
const MIN_SCORE: i32 = 30;
const MAX_SCORE: i32 = 95;

/// Estimates an ATS compatibility score from text length and keyword count.
///
/// Starts at 40; +10 for word counts above 150 and again above 300; +10 for
/// keyword counts above 5, 10, and 15. Clamped to [30, 95].
pub fn estimate_score(text: &str, profile: &KeywordProfile) -> u32 {
    let word_count = text.split_whitespace().count();
    let keyword_count = profile.keywords.len();

    let mut score = BASE_SCORE;
    if word_count > 150 {
        score += 10;
    }
    if word_count > 300 {
        score += 10;
    }
    if keyword_count > 5 {
        score += 10;
    }
    if keyword_count > 10 {
        score += 10;
    }
    if keyword_count > 15 {
        score += 10;
    }

    score.clamp(MIN_SCORE, MAX_SCORE) as u32
}
