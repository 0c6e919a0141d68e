//! Keyword Extractor — deterministic keyword and skill profiling.
//!
//! Tokenizes normalized text, builds a frequency map, matches 1–3 word
//! phrases against the skill vocabulary, and produces a deduplicated
//! keyword profile. Pure and idempotent: identical input always yields
//! identical output.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analysis::vocab::{Vocabulary, MAX_PHRASE_TOKENS};

/// Keyword list cap in the final profile.
const MAX_KEYWORDS: usize = 30;
/// Non-skill frequent tokens kept in the profile.
const MAX_TOP_TOKENS: usize = 12;

/// Deterministic keyword profile of a resume text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordProfile {
    /// Skill matches followed by top tokens, deduplicated, first-seen order,
    /// at most 30 entries.
    pub keywords: Vec<String>,
    /// Vocabulary matches, ranked by match count descending (stable).
    pub skills_found: Vec<String>,
    /// Frequent non-skill tokens, at most 12.
    pub top_tokens: Vec<String>,
}

/// Extracts a `KeywordProfile` from plain text.
pub fn extract_keywords(text: &str, vocab: &Vocabulary) -> KeywordProfile {
    extract_keywords_with_limit(text, vocab, MAX_TOP_TOKENS)
}

/// As `extract_keywords`, with a configurable top-token cap.
pub fn extract_keywords_with_limit(
    text: &str,
    vocab: &Vocabulary,
    top_token_limit: usize,
) -> KeywordProfile {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return KeywordProfile::default();
    }

    // Frequency map over eligible tokens. Ordering comes from the token
    // stream, never from map iteration.
    let mut frequencies: HashMap<&str, u32> = HashMap::new();
    for token in &tokens {
        if is_countable(token, vocab) {
            *frequencies.entry(token.as_str()).or_insert(0) += 1;
        }
    }

    let (skills_found, skill_tokens) = match_skills(&tokens, vocab);

    // Remaining non-skill tokens ranked by frequency, first-seen stable.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ranked_tokens: Vec<(&str, u32)> = Vec::new();
    for token in &tokens {
        let token = token.as_str();
        if token.len() <= 2 || skill_tokens.contains(token) || !seen.insert(token) {
            continue;
        }
        if let Some(&count) = frequencies.get(token) {
            ranked_tokens.push((token, count));
        }
    }
    ranked_tokens.sort_by(|a, b| b.1.cmp(&a.1)); // stable: ties keep first-seen order
    let top_tokens: Vec<String> = ranked_tokens
        .into_iter()
        .take(top_token_limit)
        .map(|(t, _)| t.to_string())
        .collect();

    // keywords = skills then top tokens, deduplicated, capped.
    let mut keyword_seen: HashSet<&str> = HashSet::new();
    let keywords: Vec<String> = skills_found
        .iter()
        .chain(top_tokens.iter())
        .filter(|k| keyword_seen.insert(k.as_str()))
        .take(MAX_KEYWORDS)
        .cloned()
        .collect();

    KeywordProfile {
        keywords,
        skills_found,
        top_tokens,
    }
}

/// Normalizes text and splits it into lower-case tokens.
///
/// Unicode dash variants become `-`; characters other than alphanumerics,
/// `-`, `_`, `.`, `+`, and `#` become whitespace. The extra punctuation
/// survives so vocabulary entries like "node.js", "c++", and "c#" match;
/// stray sentence periods are trimmed from token edges.
fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '#') => c,
            _ => ' ',
        })
        .collect();

    normalized
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.trim_matches('.').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_countable(token: &str, vocab: &Vocabulary) -> bool {
    token.len() >= 2
        && !token.chars().all(|c| c.is_ascii_digit())
        && !vocab.is_stop_word(token)
}

/// Slides 1–3 token windows over the token stream and counts exact-phrase
/// vocabulary matches. Returns matched skills ranked by count descending
/// (stable) plus the set of tokens consumed by any matched phrase.
fn match_skills<'a>(
    tokens: &'a [String],
    vocab: &Vocabulary,
) -> (Vec<String>, HashSet<&'a str>) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();
    let mut skill_tokens: HashSet<&'a str> = HashSet::new();

    for start in 0..tokens.len() {
        for len in 1..=MAX_PHRASE_TOKENS.min(tokens.len() - start) {
            let window = &tokens[start..start + len];
            let phrase = window.join(" ");
            if phrase.len() < 2 || !vocab.is_skill(&phrase) {
                continue;
            }
            match counts.entry(phrase.clone()) {
                std::collections::hash_map::Entry::Occupied(mut e) => *e.get_mut() += 1,
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(1);
                    first_seen.push(phrase);
                }
            }
            for token in window {
                skill_tokens.insert(token.as_str());
            }
        }
    }

    let mut ranked: Vec<(String, u32)> = first_seen
        .into_iter()
        .map(|phrase| {
            let count = counts[&phrase];
            (phrase, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1)); // stable: ties keep first-seen order

    (ranked.into_iter().map(|(p, _)| p).collect(), skill_tokens)
}
