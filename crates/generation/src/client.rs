//! Generation client: retry with capped exponential backoff, plus an
//! explicit offline mode with deterministic placeholder content.
//!
//! Offline mode and the retry policy are separate switches. Offline mode
//! skips the backend entirely; the retry policy recovers transient backend
//! failures and, once exhausted, falls back to the same offline content so
//! generation never aborts the campaign loop.

use crate::backend::{looks_like_email_prompt, CompletionBackend, GenerationError, HttpBackend};
use outreach_core::config::GenerationConfig;
use outreach_core::error::OutreachResult;
use outreach_core::types::Tone;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fixed exponential backoff: `base_delay` doubles on each failed attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Explicitly constructed, passed-in generation client. No process-wide
/// singleton: every consumer receives its instance through a constructor.
pub struct GenerationClient {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    offline_mode: bool,
    max_tokens: u32,
}

impl GenerationClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        retry: RetryPolicy,
        offline_mode: bool,
        max_tokens: u32,
    ) -> Self {
        info!(
            backend = backend.backend_name(),
            offline_mode,
            max_attempts = retry.max_attempts,
            "Generation client initialized"
        );
        Self {
            backend,
            retry,
            offline_mode,
            max_tokens,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> OutreachResult<Self> {
        let backend = Arc::new(HttpBackend::new(config)?);
        let retry = RetryPolicy {
            max_attempts: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        };
        Ok(Self::new(backend, retry, config.offline_mode, config.max_tokens))
    }

    pub fn default_max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Generate marketing copy. Never fails upward: offline mode and retry
    /// exhaustion both resolve to the deterministic placeholder.
    pub async fn generate(&self, prompt: &str, tone: Tone, max_tokens: u32) -> String {
        if self.offline_mode {
            warn!("Offline mode active, returning placeholder content");
            metrics::counter!("generation.offline").increment(1);
            return mock_response(prompt, tone);
        }

        let system = format!(
            "You are a {tone} marketing copywriter. Create concise, high-conversion copy."
        );

        let start = std::time::Instant::now();
        match self.try_backend(&system, prompt, max_tokens).await {
            Ok(text) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!(elapsed_ms, "Generated text");
                metrics::histogram!("generation.latency_ms").record(elapsed_ms as f64);
                text
            }
            Err(e) => {
                error!(error = %e, "Generation failed, falling back to placeholder content");
                metrics::counter!("generation.fallbacks").increment(1);
                mock_response(prompt, tone)
            }
        }
    }

    async fn try_backend(
        &self,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        for attempt in 0..self.retry.max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts = self.retry.max_attempts,
                "Generating text"
            );
            match self.backend.complete(system, prompt, max_tokens) {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "Generation attempt failed");
                    metrics::counter!("generation.retries").increment(1);
                    if attempt + 1 < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay_for(attempt)).await;
                    }
                }
            }
        }
        Err(GenerationError::RetriesExhausted {
            attempts: self.retry.max_attempts,
        })
    }
}

/// Deterministic placeholder content for offline/degraded operation. Shaped
/// by prompt kind so the caller's subject/body split still works.
pub fn mock_response(prompt: &str, tone: Tone) -> String {
    if looks_like_email_prompt(prompt) {
        format!(
            "Subject: [MOCK] Your Exclusive Offer\n\n\
             Hello! Here's a sample email in {tone} tone.\n\
             Take advantage of this offer today and click the CTA button.\n\
             — Outreach Express (offline)"
        )
    } else {
        "[MOCK] Try our product now and get a discount! #sale #offer #demo".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FailingBackend {
        calls: AtomicU32,
    }

    impl CompletionBackend for FailingBackend {
        fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GenerationError::Backend("connection refused".to_string()))
        }

        fn backend_name(&self) -> &str {
            "failing"
        }
    }

    struct ScriptedBackend {
        reply: String,
    }

    impl CompletionBackend for ScriptedBackend {
        fn complete(&self, _: &str, _: &str, _: u32) -> Result<String, GenerationError> {
            Ok(self.reply.clone())
        }

        fn backend_name(&self) -> &str {
            "scripted"
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_offline_mode_skips_backend() {
        let backend = Arc::new(FailingBackend {
            calls: AtomicU32::new(0),
        });
        let client = GenerationClient::new(backend.clone(), fast_retry(), true, 400);

        let content = client
            .generate("Write a marketing email. Subject: ...", Tone::Professional, 100)
            .await;

        assert!(content.contains("[MOCK]"));
        assert!(content.contains("professional"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_falls_back_after_three_attempts() {
        let backend = Arc::new(FailingBackend {
            calls: AtomicU32::new(0),
        });
        let client = GenerationClient::new(backend.clone(), fast_retry(), false, 400);

        let content = client.generate("social post please", Tone::Urgent, 100).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        assert!(content.contains("[MOCK]"));
        assert!(content.contains("#sale"));
    }

    #[tokio::test]
    async fn test_successful_backend_reply_passes_through_trimmed() {
        let backend = Arc::new(ScriptedBackend {
            reply: "  Subject: Hi\n\nBody text  ".to_string(),
        });
        let client = GenerationClient::new(backend, fast_retry(), false, 400);

        let content = client.generate("anything", Tone::Friendly, 100).await;
        assert_eq!(content, "Subject: Hi\n\nBody text");
    }

    #[test]
    fn test_mock_response_is_deterministic() {
        let a = mock_response("Write a marketing email", Tone::Playful);
        let b = mock_response("Write a marketing email", Tone::Playful);
        assert_eq!(a, b);
        assert!(a.starts_with("Subject: [MOCK]"));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }
}
