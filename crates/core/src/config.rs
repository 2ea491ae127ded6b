use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `OUTREACH_EXPRESS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub rfm: RfmConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub sender: SenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Quantile bucket counts for the RFM scorer. Each metric is bucketed
/// independently; duplicate-heavy inputs may collapse to fewer effective
/// buckets than configured.
#[derive(Debug, Clone, Deserialize)]
pub struct RfmConfig {
    #[serde(default = "default_bins")]
    pub recency_bins: usize,
    #[serde(default = "default_bins")]
    pub frequency_bins: usize,
    #[serde(default = "default_bins")]
    pub monetary_bins: usize,
}

/// Text-generation collaborator settings. `offline_mode` (degraded/demo
/// operation) and the retry fields (transient-failure recovery) are distinct
/// switches; enabling one does not imply the other.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_sender_addr")]
    pub sender_addr: String,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_smtp_use_tls")]
    pub smtp_use_tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    /// Dry-run: delivery is logged, not performed. On by default so a fresh
    /// checkout never sends real traffic.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

// Default functions
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_bins() -> usize {
    5
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    1000
}
fn default_max_tokens() -> u32 {
    400
}
fn default_sender_name() -> String {
    "Outreach Express".to_string()
}
fn default_sender_addr() -> String {
    "outreach@example.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_use_tls() -> bool {
    true
}
fn default_dry_run() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for RfmConfig {
    fn default() -> Self {
        Self {
            recency_bins: default_bins(),
            frequency_bins: default_bins(),
            monetary_bins: default_bins(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: None,
            offline_mode: false,
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender_name: default_sender_name(),
            sender_addr: default_sender_addr(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_use_tls: default_smtp_use_tls(),
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            rfm: RfmConfig::default(),
            generation: GenerationConfig::default(),
            email: EmailConfig::default(),
            sender: SenderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("OUTREACH_EXPRESS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
