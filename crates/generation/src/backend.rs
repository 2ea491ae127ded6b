//! Completion backend abstraction for the text-generation collaborator.
//!
//! The client is decoupled from the provider behind [`CompletionBackend`], so
//! tests inject failing or scripted backends without touching the network.

use outreach_core::config::GenerationConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use std::fmt;

/// Errors internal to the generation layer. Never surfaces past the client:
/// retry exhaustion converts to deterministic fallback content.
#[derive(Debug, Clone)]
pub enum GenerationError {
    /// The backend call failed (network, auth, provider error).
    Backend(String),
    /// All retry attempts were consumed without a successful completion.
    RetriesExhausted { attempts: u32 },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Backend(msg) => write!(f, "backend error: {msg}"),
            GenerationError::RetriesExhausted { attempts } => {
                write!(f, "all {attempts} generation attempts failed")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

/// Provider seam for chat-completion calls.
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError>;

    /// Backend name for metrics/logging.
    fn backend_name(&self) -> &str;
}

/// OpenAI-shaped chat-completion backend.
/// In production: POST to {base_url}/v1/chat/completions.
pub struct HttpBackend {
    api_key: Option<String>,
    model: String,
    base_url: String,
}

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

impl HttpBackend {
    pub fn new(config: &GenerationConfig) -> OutreachResult<Self> {
        let base_url = match &config.base_url {
            Some(raw) => {
                let parsed = url::Url::parse(raw)
                    .map_err(|e| OutreachError::Config(format!("invalid base_url '{raw}': {e}")))?;
                parsed.to_string()
            }
            None => DEFAULT_BASE_URL.to_string(),
        };
        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url,
        })
    }
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl CompletionBackend for HttpBackend {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        let api_key = match &self.api_key {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(GenerationError::Backend(
                    "generation api_key is not set".to_string(),
                ))
            }
        };

        // Build the chat-completion payload (stub — in production, HTTP POST
        // to {base_url}/v1/chat/completions with bearer auth).
        let _payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "max_tokens": max_tokens,
            "temperature": 0.7,
        });
        let _ = (api_key, &self.base_url);

        metrics::counter!("generation.backend_calls", "backend" => "http").increment(1);

        Ok(stub_completion(user_prompt))
    }

    fn backend_name(&self) -> &str {
        "http"
    }
}

/// Deterministic stand-in completion for the stubbed HTTP path.
fn stub_completion(prompt: &str) -> String {
    if looks_like_email_prompt(prompt) {
        "Subject: Your Exclusive Offer Awaits\n\n\
         Body:\nWe saved something special for you. Claim your offer before it \
         expires and enjoy the upgrade you have been waiting for.\n\
         Shop now and save."
            .to_string()
    } else {
        "Big news! Our latest offer is live — grab yours today \u{1F389} \
         Shop now! #sale #offer #limited"
            .to_string()
    }
}

pub(crate) fn looks_like_email_prompt(prompt: &str) -> bool {
    prompt.contains("Subject:") || prompt.to_lowercase().contains("marketing email")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_without_api_key_errors() {
        let backend = HttpBackend::default();
        let err = backend.complete("system", "prompt", 100).unwrap_err();
        assert!(matches!(err, GenerationError::Backend(_)));
    }

    #[test]
    fn test_backend_with_api_key_returns_completion() {
        let config = GenerationConfig {
            api_key: Some("sk-test".to_string()),
            ..GenerationConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        let text = backend
            .complete("system", "Write a marketing email with a Subject: line", 100)
            .unwrap();
        assert!(text.starts_with("Subject:"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = GenerationConfig {
            base_url: Some("not a url".to_string()),
            ..GenerationConfig::default()
        };
        assert!(HttpBackend::new(&config).is_err());
    }
}
