use std::sync::Arc;

use crate::analysis::vocab::Vocabulary;
use crate::config::Config;
use crate::llm_client::ProviderClient;

/// Shared application state injected into all route handlers via Axum
/// extractors. The vocabulary is immutable after startup, so concurrent
/// requests read it without synchronization.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vocabulary: Arc<Vocabulary>,
    /// `None` when AI mode is disabled; the pipeline is heuristic-only.
    pub provider: Option<ProviderClient>,
}
