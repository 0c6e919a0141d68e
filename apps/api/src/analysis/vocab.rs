//! Vocabulary Store — immutable stop-word and skill sets.
//!
//! Built once at startup and shared via `Arc` in `AppState`; concurrent
//! requests read it without synchronization because it is never mutated.

use std::collections::HashSet;

/// Longest skill phrase in the vocabulary, in tokens.
pub const MAX_PHRASE_TOKENS: usize = 3;

/// Common English words excluded from the keyword frequency map.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your",
];

/// Curated technology and soft-skill phrases, lower-cased, 1–3 words each.
/// Matching is case-insensitive exact-phrase on normalized tokens.
const SKILLS: &[&str] = &[
    // Languages
    "python", "java", "javascript", "typescript", "rust", "golang", "c++", "c#", "ruby", "php",
    "swift", "kotlin", "scala", "sql", "html", "css", "bash", "matlab", "perl",
    // Frontend
    "react", "angular", "vue", "svelte", "next.js", "redux", "tailwind", "webpack", "jquery",
    // Backend
    "node.js", "django", "flask", "spring boot", "rails", "express", "fastapi", "laravel",
    "graphql", "rest api", "grpc", "microservices", "websockets",
    // Data / ML
    "machine learning", "deep learning", "data analysis", "data science", "data engineering",
    "natural language processing", "computer vision", "tensorflow", "pytorch", "scikit-learn",
    "pandas", "numpy", "spark", "hadoop", "airflow", "tableau", "power bi", "excel", "etl",
    "big data", "data visualization", "statistics",
    // Cloud / DevOps
    "aws", "azure", "gcp", "amazon web services", "google cloud", "docker", "kubernetes",
    "terraform", "ansible", "jenkins", "continuous integration", "continuous delivery", "devops",
    "git", "github", "gitlab", "linux", "unix", "nginx", "serverless", "cloudformation",
    "prometheus", "grafana",
    // Databases / messaging
    "postgresql", "mysql", "mongodb", "redis", "elasticsearch", "cassandra", "dynamodb", "sqlite",
    "oracle", "kafka", "rabbitmq",
    // Practices
    "agile", "scrum", "kanban", "jira", "tdd", "unit testing", "test automation", "code review",
    "functional programming", "design patterns", "distributed systems", "system design",
    "api design", "penetration testing", "oauth", "encryption", "accessibility",
    // Mobile
    "android", "ios", "react native", "flutter",
    // Soft skills
    "project management", "product management", "team leadership", "leadership", "communication",
    "problem solving", "critical thinking", "time management", "stakeholder management",
    "mentoring", "collaboration", "public speaking", "negotiation", "customer service",
    "strategic planning", "cross-functional collaboration",
    // Misc
    "blockchain", "solidity", "unity", "embedded systems", "iot", "salesforce", "sap", "seo",
    "google analytics", "figma", "photoshop", "user experience", "user research",
];

/// Read-only skill and stop-word vocabulary. Never mutated after construction.
#[derive(Debug)]
pub struct Vocabulary {
    stop_words: HashSet<&'static str>,
    skills: HashSet<&'static str>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            skills: SKILLS.iter().copied().collect(),
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    pub fn is_skill(&self, phrase: &str) -> bool {
        self.skills.contains(phrase)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_entries_are_lowercase() {
        for s in SKILLS.iter().chain(STOP_WORDS.iter()) {
            assert_eq!(*s, s.to_lowercase(), "vocabulary entry not lower-cased: {s}");
        }
    }

    #[test]
    fn test_no_skill_exceeds_max_phrase_tokens() {
        for s in SKILLS {
            assert!(
                s.split(' ').count() <= MAX_PHRASE_TOKENS,
                "skill phrase too long: {s}"
            );
        }
    }

    #[test]
    fn test_lookup() {
        let vocab = Vocabulary::new();
        assert!(vocab.is_skill("node.js"));
        assert!(vocab.is_skill("machine learning"));
        assert!(!vocab.is_skill("underwater basket weaving"));
        assert!(vocab.is_stop_word("the"));
        assert!(!vocab.is_stop_word("rust"));
    }
}
