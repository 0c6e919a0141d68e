mod analysis;
mod config;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::vocab::Vocabulary;
use crate::config::Config;
use crate::llm_client::{HttpTransport, ProviderClient};
use crate::routes::build_router;
use crate::state::AppState;

/// Default `EnvFilter` directive scoped to this crate. Tracing targets use
/// the crate's module path, so the package name's hyphens must become
/// underscores or the directive matches nothing.
fn default_filter_directive(level: &str) -> String {
    format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), level)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter_directive(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-insight API v{}", env!("CARGO_PKG_VERSION"));

    // Build the immutable vocabulary once; shared read-only by all requests
    let vocabulary = Arc::new(Vocabulary::new());
    info!(
        skills = vocabulary.skill_count(),
        stop_words = vocabulary.stop_word_count(),
        "Vocabulary loaded"
    );

    // Initialize the provider client only when AI mode is enabled
    let provider = if config.ai_enabled {
        let transport = HttpTransport::new(
            config.provider_api_url.clone(),
            config.provider_api_key.clone(),
            config.provider_model.clone(),
        )?;
        info!(model = %config.provider_model, "AI analysis enabled");
        Some(ProviderClient::new(Arc::new(transport), config.retry()))
    } else {
        info!("AI analysis disabled; running heuristic-only");
        None
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        vocabulary,
        provider,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directive_matches_crate_module_path() {
        let directive = default_filter_directive("info");
        assert_eq!(directive, "resume_insight_api=info");
        // A hyphenated directive would match no event target
        assert!(!directive.contains('-'));
    }

    #[test]
    fn test_default_filter_directive_honors_configured_level() {
        assert!(default_filter_directive("debug").ends_with("=debug"));
    }
}
