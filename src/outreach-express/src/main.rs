//! Outreach Express — RFM customer segmentation and campaign outreach.
//!
//! CLI entry point: runs the API server, scores customer CSVs, and
//! generates ad-hoc campaign content.

use clap::{Parser, Subcommand};
use outreach_api::ApiServer;
use outreach_campaigns::{AdhocGenerationRequest, CampaignService};
use outreach_campaigns::service::split_email;
use outreach_channels::email::{EmailMessage, EmailTransport, SmtpEmailSender};
use outreach_channels::social::{SocialPost, SocialTransport, StubSocialSender};
use outreach_core::config::{AppConfig, RfmConfig};
use outreach_core::types::{CampaignStatus, CampaignType, Tone};
use outreach_generation::GenerationClient;
use outreach_reporting::MetricsTracker;
use outreach_segmentation::score_rfm;
use outreach_store::{read_customers_csv, CampaignRepository, ContactStore};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "outreach-express")]
#[command(about = "RFM customer segmentation and campaign outreach")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// HTTP port (overrides config)
        #[arg(long, env = "OUTREACH_EXPRESS__API__HTTP_PORT")]
        http_port: Option<u16>,

        /// Metrics port (overrides config)
        #[arg(long, env = "OUTREACH_EXPRESS__METRICS__PORT")]
        metrics_port: Option<u16>,

        /// Data directory (overrides config)
        #[arg(long, env = "OUTREACH_EXPRESS__DATA_DIR")]
        data_dir: Option<String>,
    },

    /// Run RFM segmentation over a customer CSV.
    Segment {
        /// Customer CSV with customer_id, recency_days, frequency,
        /// monetary_value columns
        #[arg(long, default_value = "data/customers.csv")]
        customers_csv: PathBuf,

        /// Bucket count for all three metrics
        #[arg(long)]
        bins: Option<usize>,

        /// Print per-segment counts and a sample of scored rows
        #[arg(long)]
        show: bool,

        /// Top N customers per segment to preview
        #[arg(long, default_value_t = 5)]
        top_n: usize,
    },

    /// Generate email/social content and optionally send (dry-run by default).
    Generate {
        #[arg(long, default_value = "champions")]
        segment_name: String,

        #[arg(long, default_value = "Pro Widget 3000")]
        product_name: String,

        #[arg(long, default_value = "Drive conversions for summer sale")]
        goal: String,

        #[arg(long, default_value = "20% off for 72 hours")]
        offer: String,

        /// friendly, professional, playful, or urgent
        #[arg(long, default_value = "professional")]
        tone: String,

        #[arg(long, default_value = "customer@example.com")]
        to: String,

        #[arg(long, default_value = "twitter")]
        platform: String,

        /// email, social, or both
        #[arg(long, default_value = "both")]
        kind: String,

        /// Preview only, without sending
        #[arg(long)]
        preview: bool,

        #[arg(long, default_value_t = 300)]
        max_tokens: u32,
    },

    /// Inspect stored campaigns.
    Campaigns {
        #[command(subcommand)]
        action: CampaignsCmd,
    },
}

#[derive(Subcommand, Debug)]
enum CampaignsCmd {
    /// List campaigns, optionally filtered by status.
    List {
        /// draft, active, paused, or completed
        #[arg(long)]
        status: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outreach_express=info,outreach_campaigns=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Commands::Serve {
            http_port,
            metrics_port,
            data_dir,
        } => serve(config, http_port, metrics_port, data_dir).await,
        Commands::Segment {
            customers_csv,
            bins,
            show,
            top_n,
        } => segment(&config, customers_csv, bins, show, top_n),
        Commands::Generate {
            segment_name,
            product_name,
            goal,
            offer,
            tone,
            to,
            platform,
            kind,
            preview,
            max_tokens,
        } => {
            generate(
                &config,
                AdhocGenerationRequest {
                    segment_name,
                    product_name,
                    goal,
                    offer,
                    tone: Tone::from_str(&tone)?,
                    platform,
                    kind: CampaignType::from_str(&kind)?,
                    max_tokens: Some(max_tokens),
                },
                to,
                preview,
            )
            .await
        }
        Commands::Campaigns { action } => campaigns(&config, action),
    }
}

/// Wire the service graph from configuration. Every collaborator is
/// constructed here and injected; nothing is process-global.
fn build_service(config: &AppConfig) -> anyhow::Result<Arc<CampaignService>> {
    let repo = Arc::new(CampaignRepository::new(&config.data_dir)?);
    let contacts = Arc::new(ContactStore::new(&config.data_dir)?);
    let tracker = Arc::new(MetricsTracker::new(&config.data_dir)?);
    let generator = Arc::new(GenerationClient::from_config(&config.generation)?);
    let email = Arc::new(SmtpEmailSender::new(
        config.email.clone(),
        config.sender.dry_run,
    ));
    let social = Arc::new(StubSocialSender::new(config.sender.dry_run));

    Ok(Arc::new(
        CampaignService::new(repo, contacts, tracker, generator, email, social)
            .with_rfm_config(config.rfm.clone()),
    ))
}

async fn serve(
    mut config: AppConfig,
    http_port: Option<u16>,
    metrics_port: Option<u16>,
    data_dir: Option<String>,
) -> anyhow::Result<()> {
    if let Some(port) = http_port {
        config.api.http_port = port;
    }
    if let Some(port) = metrics_port {
        config.metrics.port = port;
    }
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        data_dir = %config.data_dir,
        dry_run = config.sender.dry_run,
        "Outreach Express starting up"
    );

    let service = build_service(&config)?;
    let api_server = ApiServer::new(config, service);

    if let Err(e) = api_server.start_metrics().await {
        tracing::error!(error = %e, "Failed to start metrics exporter");
    }

    api_server.start_http().await
}

fn segment(
    config: &AppConfig,
    customers_csv: PathBuf,
    bins: Option<usize>,
    show: bool,
    top_n: usize,
) -> anyhow::Result<()> {
    let customers = read_customers_csv(&customers_csv)?;
    let rfm = match bins {
        Some(bins) => RfmConfig {
            recency_bins: bins,
            frequency_bins: bins,
            monetary_bins: bins,
        },
        None => config.rfm.clone(),
    };
    let scored = score_rfm(&customers, &rfm)?;

    let out_path = customers_csv
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .join("segmented.json");
    std::fs::write(&out_path, serde_json::to_string_pretty(&scored)?)?;
    info!(
        customers = scored.len(),
        output = %out_path.display(),
        "Saved segmented data"
    );

    if show {
        let mut by_segment: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for row in &scored {
            by_segment
                .entry(row.segment.as_str())
                .or_default()
                .push(format!(
                    "{} R={} F={} M={} score={}",
                    row.customer_id, row.r, row.f, row.m, row.rfm_score
                ));
        }
        for (segment, rows) in by_segment {
            info!(segment, count = rows.len(), "Segment summary");
            for row in rows.iter().take(top_n) {
                info!(segment, "  {row}");
            }
        }
    }
    Ok(())
}

async fn generate(
    config: &AppConfig,
    request: AdhocGenerationRequest,
    to: String,
    preview: bool,
) -> anyhow::Result<()> {
    let service = build_service(config)?;
    let content = service.generate_content(&request).await?;

    if let Some(email_content) = content.email {
        let (subject, body) = split_email(&email_content);
        info!(subject = %subject, "Generated email");
        if preview {
            info!("{body}");
        } else {
            let sender = SmtpEmailSender::new(config.email.clone(), config.sender.dry_run);
            sender.send_email(&EmailMessage {
                subject,
                body,
                to: to.clone(),
                from_name: None,
                from_email: None,
            })?;
        }
    }

    if let Some(social_content) = content.social {
        info!("Generated social post");
        if preview {
            info!("{social_content}");
        } else {
            let sender = StubSocialSender::new(config.sender.dry_run);
            sender.send_post(&SocialPost {
                platform: request.platform.clone(),
                content: social_content,
                account: None,
            })?;
        }
    }

    Ok(())
}

fn campaigns(config: &AppConfig, action: CampaignsCmd) -> anyhow::Result<()> {
    match action {
        CampaignsCmd::List { status } => {
            let repo = CampaignRepository::new(&config.data_dir)?;
            let status = match status.as_deref() {
                Some(raw) => Some(CampaignStatus::from_str(raw)?),
                None => None,
            };
            let campaigns = repo.list(status)?;
            info!(count = campaigns.len(), "Stored campaigns");
            for c in campaigns {
                info!(
                    id = %c.id,
                    name = %c.name,
                    status = %c.status,
                    campaign_type = %c.campaign_type,
                    segment = %c.segment,
                    "campaign"
                );
            }
            Ok(())
        }
    }
}
