/// Resilient Analysis Client — the single point of entry for all LLM calls.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// All LLM interactions MUST go through this module.
///
/// The retry policy lives in `ProviderClient`; the actual network call lives
/// behind the `ProviderTransport` trait so tests can script outcomes without
/// a network. Retries apply only to 429, 5xx, and transport-level failures;
/// any other non-2xx status is terminal and returned immediately.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Bounded-retry parameters, supplied by configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Outcome of a provider call, created per analysis request and discarded
/// after normalization. `body_text` holds the model's text on success, or
/// the last observed error body otherwise.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub ok: bool,
    pub status_code: Option<u16>,
    pub body_text: String,
    pub attempts_made: u32,
}

/// One transport-level reply: HTTP status plus response text.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    pub body: String,
}

/// The network seam. `Err` means a transport-level failure (connect error,
/// timeout) and is always treated as retryable.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(&self, prompt: &str, system: &str) -> Result<TransportReply>;
}

/// Returns true for status classes worth retrying: throttling and transient
/// server errors. Everything else non-2xx indicates a configuration or
/// payload problem that retrying would only mask.
pub fn is_retryable(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Exponential backoff with jitter: `base * 2^(failed_attempt - 1)` plus a
/// small random addition to avoid synchronized retry storms.
fn backoff_delay(base_ms: u64, failed_attempt: u32) -> Duration {
    let shift = (failed_attempt.saturating_sub(1)).min(16);
    let exp = base_ms.saturating_mul(1u64 << shift);
    let jitter = rand::thread_rng().gen_range(0..(base_ms / 4).max(1));
    Duration::from_millis(exp.saturating_add(jitter))
}

/// Retry-aware provider client. Clone-cheap; shared via `AppState`.
#[derive(Clone)]
pub struct ProviderClient {
    transport: Arc<dyn ProviderTransport>,
    retry: RetryConfig,
}

impl ProviderClient {
    pub fn new(transport: Arc<dyn ProviderTransport>, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }

    /// Calls the provider with bounded retries. Never returns an error:
    /// every failure mode is encoded in the `CallOutcome` so the caller can
    /// decide between surfacing and degrading.
    pub async fn call(&self, prompt: &str, system: &str) -> CallOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_status: Option<u16> = None;
        let mut last_body = String::new();

        for attempt in 1..=max_attempts {
            match self.transport.send(prompt, system).await {
                Ok(reply) if (200..300).contains(&reply.status) => {
                    debug!(attempt, "Provider call succeeded");
                    return CallOutcome {
                        ok: true,
                        status_code: Some(reply.status),
                        body_text: reply.body,
                        attempts_made: attempt,
                    };
                }
                Ok(reply) if !is_retryable(reply.status) => {
                    warn!(
                        status = reply.status,
                        attempt, "Terminal provider error, not retrying"
                    );
                    return CallOutcome {
                        ok: false,
                        status_code: Some(reply.status),
                        body_text: reply.body,
                        attempts_made: attempt,
                    };
                }
                Ok(reply) => {
                    warn!(status = reply.status, attempt, "Retryable provider error");
                    last_status = Some(reply.status);
                    last_body = reply.body;
                }
                Err(e) => {
                    warn!(attempt, "Provider transport error: {e:#}");
                    last_status = None;
                    last_body = format!("{e:#}");
                }
            }

            if attempt < max_attempts {
                let delay = backoff_delay(self.retry.base_delay_ms, attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                tokio::time::sleep(delay).await;
            }
        }

        CallOutcome {
            ok: false,
            status_code: last_status,
            body_text: last_body,
            attempts_made: max_attempts,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP transport (Anthropic Messages wire format)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ProviderRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ProviderMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ProviderMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl ProviderResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

/// Real HTTP transport over reqwest. Endpoint, model, and credential are all
/// opaque configuration values.
pub struct HttpTransport {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpTransport {
    pub fn new(api_url: String, api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(HTTP_TIMEOUT).build()?,
            api_url,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    async fn send(&self, prompt: &str, system: &str) -> Result<TransportReply> {
        let request_body = ProviderRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![ProviderMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        // On success, hand the normalizer the model's text rather than the
        // provider envelope. Error bodies pass through untouched.
        if (200..300).contains(&status) {
            if let Ok(parsed) = serde_json::from_str::<ProviderResponse>(&body) {
                if let Some(text) = parsed.text() {
                    return Ok(TransportReply {
                        status,
                        body: text.to_string(),
                    });
                }
            }
        }

        Ok(TransportReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays a scripted sequence of replies.
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<TransportReply>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<TransportReply>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
            })
        }
    }

    #[async_trait]
    impl ProviderTransport for ScriptedTransport {
        async fn send(&self, _prompt: &str, _system: &str) -> Result<TransportReply> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport called more times than scripted")
        }
    }

    fn reply(status: u16, body: &str) -> Result<TransportReply> {
        Ok(TransportReply {
            status,
            body: body.to_string(),
        })
    }

    fn client(transport: Arc<ScriptedTransport>, max_attempts: u32) -> ProviderClient {
        ProviderClient::new(
            transport,
            RetryConfig {
                max_attempts,
                base_delay_ms: 1,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![reply(200, "{\"atsScore\": 80}")]);
        let outcome = client(transport, 3).call("p", "s").await;
        assert!(outcome.ok);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(outcome.status_code, Some(200));
        assert_eq!(outcome.body_text, "{\"atsScore\": 80}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_500_exhausts_exactly_max_attempts() {
        let transport = ScriptedTransport::new(vec![
            reply(500, "boom"),
            reply(500, "boom"),
            reply(500, "final boom"),
        ]);
        let outcome = client(transport, 3).call("p", "s").await;
        assert!(!outcome.ok);
        assert_eq!(outcome.attempts_made, 3);
        assert_eq!(outcome.status_code, Some(500));
        assert_eq!(outcome.body_text, "final boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_401_is_terminal_after_one_attempt() {
        let transport = ScriptedTransport::new(vec![reply(401, "bad key")]);
        let outcome = client(transport, 5).call("p", "s").await;
        assert!(!outcome.ok);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(outcome.status_code, Some(401));
    }

    #[tokio::test(start_paused = true)]
    async fn test_429_then_success_recovers() {
        let transport =
            ScriptedTransport::new(vec![reply(429, "slow down"), reply(200, "{\"ok\":1}")]);
        let outcome = client(transport, 3).call("p", "s").await;
        assert!(outcome.ok);
        assert_eq!(outcome.attempts_made, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(anyhow::anyhow!("connection refused")),
            reply(200, "{}"),
        ]);
        let outcome = client(transport, 3).call("p", "s").await;
        assert!(outcome.ok);
        assert_eq!(outcome.attempts_made, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_transport_errors_have_no_status() {
        let transport = ScriptedTransport::new(vec![
            Err(anyhow::anyhow!("timeout")),
            Err(anyhow::anyhow!("timeout")),
        ]);
        let outcome = client(transport, 2).call("p", "s").await;
        assert!(!outcome.ok);
        assert_eq!(outcome.attempts_made, 2);
        assert_eq!(outcome.status_code, None);
        assert!(outcome.body_text.contains("timeout"));
    }

    #[test]
    fn test_retryable_status_classification() {
        assert!(is_retryable(429));
        assert!(is_retryable(500));
        assert!(is_retryable(503));
        assert!(is_retryable(599));
        assert!(!is_retryable(400));
        assert!(!is_retryable(401));
        assert!(!is_retryable(403));
        assert!(!is_retryable(404));
        assert!(!is_retryable(200));
    }

    #[test]
    fn test_backoff_delay_grows_exponentially() {
        let base = 500;
        let d1 = backoff_delay(base, 1).as_millis() as u64;
        let d2 = backoff_delay(base, 2).as_millis() as u64;
        let d3 = backoff_delay(base, 3).as_millis() as u64;
        let jitter_cap = base / 4;
        assert!((500..500 + jitter_cap).contains(&d1));
        assert!((1000..1000 + jitter_cap).contains(&d2));
        assert!((2000..2000 + jitter_cap).contains(&d3));
    }

    #[test]
    fn test_backoff_delay_does_not_overflow_on_large_attempts() {
        let d = backoff_delay(u64::MAX / 2, 40);
        assert!(d.as_millis() > 0);
    }
}
