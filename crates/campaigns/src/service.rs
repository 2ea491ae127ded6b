//! Campaign service: CRUD, lifecycle, and the execution loop.
//!
//! Execution is a best-effort broadcast over a segment snapshot bound at
//! call time. Customers are processed sequentially; a failure on one
//! customer is recorded and the loop continues. Results are persisted in a
//! single batch after the loop.

use outreach_channels::email::{EmailMessage, EmailTransport};
use outreach_channels::social::{SocialPost, SocialTransport};
use outreach_core::config::RfmConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{
    Campaign, CampaignResult, CampaignStatus, CampaignType, ContentType, CustomerRecord,
    ScoredCustomer, SegmentLabel, Tone,
};
use outreach_generation::GenerationClient;
use outreach_reporting::{CampaignMetrics, MetricsTracker};
use outreach_segmentation::score_rfm;
use outreach_store::{CampaignRepository, ContactStore};
use outreach_templating::TemplateLibrary;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

use crate::lifecycle::CampaignLifecycle;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub campaign_type: CampaignType,
    pub segment: SegmentLabel,
    pub product_name: String,
    pub goal: String,
    pub offer: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_platform() -> String {
    "twitter".to_string()
}

/// Aggregate outcome of one execution run. `attempted` is always
/// snapshot_size x content-type count; `sent + failed == attempted`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub campaign_id: Uuid,
    pub snapshot_size: usize,
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Ad-hoc generation request outside any stored campaign (CLI preview and
/// the `/generate` endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct AdhocGenerationRequest {
    pub segment_name: String,
    pub product_name: String,
    pub goal: String,
    pub offer: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_kind")]
    pub kind: CampaignType,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_kind() -> CampaignType {
    CampaignType::Both
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedContent {
    pub email: Option<String>,
    pub social: Option<String>,
}

/// Campaign orchestration service. All collaborators are injected through
/// the constructor; the service holds no global state.
pub struct CampaignService {
    repo: Arc<CampaignRepository>,
    contacts: Arc<ContactStore>,
    tracker: Arc<MetricsTracker>,
    generator: Arc<GenerationClient>,
    email: Arc<dyn EmailTransport>,
    social: Arc<dyn SocialTransport>,
    templates: Arc<TemplateLibrary>,
    lifecycle: CampaignLifecycle,
    rfm: RfmConfig,
}

impl CampaignService {
    pub fn new(
        repo: Arc<CampaignRepository>,
        contacts: Arc<ContactStore>,
        tracker: Arc<MetricsTracker>,
        generator: Arc<GenerationClient>,
        email: Arc<dyn EmailTransport>,
        social: Arc<dyn SocialTransport>,
    ) -> Self {
        Self {
            repo,
            contacts,
            tracker,
            generator,
            email,
            social,
            templates: Arc::new(TemplateLibrary::new()),
            lifecycle: CampaignLifecycle::new(),
            rfm: RfmConfig::default(),
        }
    }

    pub fn with_rfm_config(mut self, rfm: RfmConfig) -> Self {
        self.rfm = rfm;
        self
    }

    pub fn with_templates(mut self, templates: Arc<TemplateLibrary>) -> Self {
        self.templates = templates;
        self
    }

    // ─── CRUD ──────────────────────────────────────────────────────────────

    pub fn create_campaign(&self, req: CreateCampaignRequest) -> OutreachResult<Campaign> {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: req.name,
            campaign_type: req.campaign_type,
            segment: req.segment,
            product_name: req.product_name,
            goal: req.goal,
            offer: req.offer,
            tone: req.tone,
            platform: req.platform,
            status: CampaignStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        info!(campaign = %campaign.name, id = %campaign.id, "Creating campaign");
        self.repo.create(&campaign)?;
        Ok(campaign)
    }

    pub fn get_campaign(&self, id: Uuid) -> OutreachResult<Campaign> {
        self.repo.get(id)?.ok_or(OutreachError::NotFound(id))
    }

    pub fn list_campaigns(&self, status: Option<CampaignStatus>) -> OutreachResult<Vec<Campaign>> {
        self.repo.list(status)
    }

    // ─── Lifecycle ─────────────────────────────────────────────────────────

    pub fn launch(&self, id: Uuid) -> OutreachResult<Campaign> {
        self.transition(id, CampaignStatus::Active)
    }

    pub fn pause(&self, id: Uuid) -> OutreachResult<Campaign> {
        self.transition(id, CampaignStatus::Paused)
    }

    pub fn resume(&self, id: Uuid) -> OutreachResult<Campaign> {
        self.transition(id, CampaignStatus::Active)
    }

    pub fn complete(&self, id: Uuid) -> OutreachResult<Campaign> {
        self.transition(id, CampaignStatus::Completed)
    }

    fn transition(&self, id: Uuid, to: CampaignStatus) -> OutreachResult<Campaign> {
        let mut campaign = self.get_campaign(id)?;
        self.lifecycle.transition(&mut campaign, to)?;
        self.repo.update(&campaign)?;
        Ok(campaign)
    }

    // ─── Execution ─────────────────────────────────────────────────────────

    /// Execute a campaign over the stored members of its target segment.
    pub async fn execute_by_segment(&self, id: Uuid) -> OutreachResult<ExecutionReport> {
        let campaign = self.get_campaign(id)?;
        let snapshot = self.contacts.segment_members(campaign.segment, &self.rfm)?;
        self.execute_campaign(id, snapshot).await
    }

    /// Execute a campaign over an explicit customer snapshot. The snapshot
    /// is bound here and never re-read mid-run; every result references a
    /// customer from it.
    pub async fn execute_campaign(
        &self,
        id: Uuid,
        customers: Vec<CustomerRecord>,
    ) -> OutreachResult<ExecutionReport> {
        let campaign = self.get_campaign(id)?;
        if campaign.status != CampaignStatus::Active {
            return Err(OutreachError::InvalidState {
                id: campaign.id,
                state: campaign.status,
            });
        }

        let content_types = campaign.campaign_type.content_types();
        if customers.is_empty() {
            info!(campaign = %campaign.name, "Segment snapshot is empty, nothing to execute");
            return Ok(ExecutionReport {
                campaign_id: id,
                snapshot_size: 0,
                attempted: 0,
                sent: 0,
                failed: 0,
            });
        }

        info!(
            campaign = %campaign.name,
            customers = customers.len(),
            "Executing campaign"
        );
        metrics::counter!("campaign.executions").increment(1);

        let scored = score_rfm(&customers, &self.rfm)?;
        let attempted = scored.len() * content_types.len();
        let mut results: Vec<CampaignResult> = Vec::with_capacity(attempted);
        let mut failed = 0usize;

        for customer in &scored {
            match self.process_customer(&campaign, customer).await {
                Ok(customer_results) => {
                    for result in &customer_results {
                        self.tracker.record_execution(
                            campaign.id,
                            &customer.customer_id,
                            result.content_type,
                            true,
                            None,
                        )?;
                    }
                    results.extend(customer_results);
                }
                Err(e) => {
                    let message = e.to_string();
                    error!(
                        customer_id = %customer.customer_id,
                        error = %message,
                        "Failed to process customer"
                    );
                    metrics::counter!("campaign.customer_failures").increment(1);
                    // The customer's remaining content types were not
                    // delivered either; each gets a failed entry so metrics
                    // cover snapshot x content types exactly.
                    for content_type in content_types {
                        self.tracker.record_execution(
                            campaign.id,
                            &customer.customer_id,
                            *content_type,
                            false,
                            Some(message.clone()),
                        )?;
                    }
                    failed += content_types.len();
                }
            }
        }

        self.repo.append_results(&results)?;

        let report = ExecutionReport {
            campaign_id: id,
            snapshot_size: scored.len(),
            attempted,
            sent: results.len(),
            failed,
        };
        info!(
            campaign = %campaign.name,
            attempted = report.attempted,
            sent = report.sent,
            failed = report.failed,
            "Campaign execution finished"
        );
        Ok(report)
    }

    /// Generate and deliver all requested content types for one customer.
    /// All-or-nothing per customer: an error discards this customer's
    /// partial results and is handled by the caller.
    async fn process_customer(
        &self,
        campaign: &Campaign,
        customer: &ScoredCustomer,
    ) -> OutreachResult<Vec<CampaignResult>> {
        let context = generation_context(campaign, customer.segment);
        let max_tokens = self.generator.default_max_tokens();
        let mut results = Vec::new();

        if matches!(
            campaign.campaign_type,
            CampaignType::Email | CampaignType::Both
        ) {
            let prompt = self.templates.render_named("email", &context)?;
            let started = Instant::now();
            let content = self.generator.generate(&prompt, campaign.tone, max_tokens).await;
            self.tracker.record_generation(
                campaign.id,
                ContentType::Email,
                started.elapsed().as_millis() as u64,
                true,
            )?;

            let (subject, body) = split_email(&content);
            let to = customer
                .email
                .clone()
                .unwrap_or_else(|| format!("{}@example.com", customer.customer_id));
            self.email.send_email(&EmailMessage {
                subject,
                body,
                to,
                from_name: None,
                from_email: None,
            })?;

            results.push(CampaignResult::sent(
                campaign.id,
                &customer.customer_id,
                ContentType::Email,
                content,
            ));
        }

        if matches!(
            campaign.campaign_type,
            CampaignType::Social | CampaignType::Both
        ) {
            let prompt = self.templates.render_named("social_post", &context)?;
            let started = Instant::now();
            let content = self.generator.generate(&prompt, campaign.tone, max_tokens).await;
            self.tracker.record_generation(
                campaign.id,
                ContentType::Social,
                started.elapsed().as_millis() as u64,
                true,
            )?;

            self.social.send_post(&SocialPost {
                platform: campaign.platform.clone(),
                content: content.clone(),
                account: None,
            })?;

            results.push(CampaignResult::sent(
                campaign.id,
                &customer.customer_id,
                ContentType::Social,
                content,
            ));
        }

        Ok(results)
    }

    // ─── Ad-hoc generation ─────────────────────────────────────────────────

    /// Generate content outside any stored campaign.
    pub async fn generate_content(
        &self,
        req: &AdhocGenerationRequest,
    ) -> OutreachResult<GeneratedContent> {
        let context: HashMap<String, String> = [
            ("segment_name", req.segment_name.as_str()),
            ("product_name", req.product_name.as_str()),
            ("goal", req.goal.as_str()),
            ("offer", req.offer.as_str()),
            ("platform", req.platform.as_str()),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain(std::iter::once((
            "tone".to_string(),
            req.tone.to_string(),
        )))
        .collect();

        let max_tokens = req
            .max_tokens
            .unwrap_or_else(|| self.generator.default_max_tokens());

        let mut out = GeneratedContent {
            email: None,
            social: None,
        };
        if matches!(req.kind, CampaignType::Email | CampaignType::Both) {
            let prompt = self.templates.render_named("email", &context)?;
            out.email = Some(self.generator.generate(&prompt, req.tone, max_tokens).await);
        }
        if matches!(req.kind, CampaignType::Social | CampaignType::Both) {
            let prompt = self.templates.render_named("social_post", &context)?;
            out.social = Some(self.generator.generate(&prompt, req.tone, max_tokens).await);
        }
        Ok(out)
    }

    // ─── Reporting ─────────────────────────────────────────────────────────

    pub fn campaign_metrics(&self, id: Uuid) -> OutreachResult<CampaignMetrics> {
        // Verify the campaign exists so unknown ids 404 instead of
        // returning an empty summary.
        self.get_campaign(id)?;
        self.tracker.campaign_summary(id)
    }

    pub fn campaign_results(&self, id: Uuid) -> OutreachResult<Vec<CampaignResult>> {
        self.get_campaign(id)?;
        self.repo.results_for(id)
    }
}

/// Flat key/value context for the prompt templates, combining campaign
/// parameters with the customer's scored segment.
fn generation_context(campaign: &Campaign, segment: SegmentLabel) -> HashMap<String, String> {
    [
        ("segment_name".to_string(), segment.to_string()),
        ("product_name".to_string(), campaign.product_name.clone()),
        ("goal".to_string(), campaign.goal.clone()),
        ("offer".to_string(), campaign.offer.clone()),
        ("tone".to_string(), campaign.tone.to_string()),
        ("platform".to_string(), campaign.platform.clone()),
    ]
    .into_iter()
    .collect()
}

/// Split generated email content into (subject, body). The `Subject:` line
/// is matched case-insensitively; without one the subject falls back to a
/// fixed default.
pub fn split_email(content: &str) -> (String, String) {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let subject = lines
        .iter()
        .find(|l| l.to_lowercase().starts_with("subject:"))
        .map(|l| l.splitn(2, ':').nth(1).unwrap_or("").trim().to_string())
        .unwrap_or_else(|| "Your Exclusive Offer".to_string());

    let body = lines
        .iter()
        .filter(|l| !l.to_lowercase().starts_with("subject:"))
        .copied()
        .collect::<Vec<&str>>()
        .join("\n");

    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_channels::capture::{CaptureEmailTransport, CaptureSocialTransport};
    use outreach_generation::{GenerationClient, HttpBackend, RetryPolicy};
    use outreach_reporting::MetricEntry;
    use std::path::PathBuf;
    use std::time::Duration;

    struct Harness {
        service: CampaignService,
        email: Arc<CaptureEmailTransport>,
        social: Arc<CaptureSocialTransport>,
        repo: Arc<CampaignRepository>,
        tracker: Arc<MetricsTracker>,
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("outreach-service-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn offline_client() -> Arc<GenerationClient> {
        Arc::new(GenerationClient::new(
            Arc::new(HttpBackend::default()),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::from_millis(1),
            },
            true,
            300,
        ))
    }

    fn harness() -> Harness {
        let dir = temp_dir();
        let repo = Arc::new(CampaignRepository::new(&dir).unwrap());
        let contacts = Arc::new(ContactStore::new(&dir).unwrap());
        let tracker = Arc::new(MetricsTracker::new(&dir).unwrap());
        let email = Arc::new(CaptureEmailTransport::new());
        let social = Arc::new(CaptureSocialTransport::new());
        let service = CampaignService::new(
            repo.clone(),
            contacts,
            tracker.clone(),
            offline_client(),
            email.clone(),
            social.clone(),
        );
        Harness {
            service,
            email,
            social,
            repo,
            tracker,
        }
    }

    fn customer(id: &str, recency: f64, frequency: f64, monetary: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            email: Some(format!("{}@customers.test", id.to_lowercase())),
            recency_days: recency,
            frequency,
            monetary_value: monetary,
        }
    }

    fn snapshot() -> Vec<CustomerRecord> {
        vec![
            customer("A", 5.0, 10.0, 1000.0),
            customer("B", 30.0, 3.0, 200.0),
            customer("C", 100.0, 1.0, 50.0),
        ]
    }

    fn create_request(kind: CampaignType) -> CreateCampaignRequest {
        CreateCampaignRequest {
            name: "Summer Sale".to_string(),
            campaign_type: kind,
            segment: SegmentLabel::Champions,
            product_name: "Pro Widget 3000".to_string(),
            goal: "Drive conversions for summer sale".to_string(),
            offer: "20% off for 72 hours".to_string(),
            tone: Tone::Professional,
            platform: "twitter".to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_both_produces_two_results_per_customer() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Both)).unwrap();
        h.service.launch(campaign.id).unwrap();

        let report = h.service.execute_campaign(campaign.id, snapshot()).await.unwrap();

        assert_eq!(report.snapshot_size, 3);
        assert_eq!(report.attempted, 6);
        assert_eq!(report.sent, 6);
        assert_eq!(report.failed, 0);
        assert_eq!(h.email.count(), 3);
        assert_eq!(h.social.count(), 3);

        // Results were persisted in one batch and reference the snapshot.
        let stored = h.repo.results_for(campaign.id).unwrap();
        assert_eq!(stored.len(), 6);
        for result in &stored {
            assert!(["A", "B", "C"].contains(&result.customer_id.as_str()));
            assert_eq!(result.campaign_id, campaign.id);
        }
    }

    #[tokio::test]
    async fn test_execute_from_draft_is_rejected_and_persists_nothing() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Email)).unwrap();

        let err = h
            .service
            .execute_campaign(campaign.id, snapshot())
            .await
            .unwrap_err();
        match err {
            OutreachError::InvalidState { state, .. } => {
                assert_eq!(state, CampaignStatus::Draft)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(h.repo.results_for(campaign.id).unwrap().len(), 0);
        assert_eq!(h.email.count(), 0);
    }

    #[tokio::test]
    async fn test_execute_unknown_campaign_is_not_found() {
        let h = harness();
        let err = h
            .service
            .execute_campaign(Uuid::new_v4(), snapshot())
            .await
            .unwrap_err();
        assert!(matches!(err, OutreachError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_one_customer_failure_does_not_abort_the_loop() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Both)).unwrap();
        h.service.launch(campaign.id).unwrap();
        h.email.fail_recipient("b@customers.test");

        let report = h.service.execute_campaign(campaign.id, snapshot()).await.unwrap();

        // B's email bounced, so B contributes no results and two failed
        // attempts (email + never-reached social).
        assert_eq!(report.attempted, 6);
        assert_eq!(report.sent, 4);
        assert_eq!(report.failed, 2);
        assert_eq!(report.sent + report.failed, report.attempted);
        assert_eq!(h.email.count(), 2);
        assert_eq!(h.social.count(), 2);

        let stored = h.repo.results_for(campaign.id).unwrap();
        assert!(stored.iter().all(|r| r.customer_id != "B"));

        // The error is captured as text in the failed metric entries.
        let summary = h.tracker.campaign_summary(campaign.id).unwrap();
        assert_eq!(summary.total_executions, 6);
        assert_eq!(summary.failed_executions, 2);
        let failure_errors: Vec<&str> = summary
            .entries
            .iter()
            .filter_map(|e| match e {
                MetricEntry::Execution {
                    success: false,
                    error: Some(err),
                    ..
                } => Some(err.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(failure_errors.len(), 2);
        assert!(failure_errors[0].contains("simulated bounce"));
    }

    #[tokio::test]
    async fn test_email_only_campaign_sends_no_social() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Email)).unwrap();
        h.service.launch(campaign.id).unwrap();

        let report = h.service.execute_campaign(campaign.id, snapshot()).await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent, 3);
        assert_eq!(h.email.count(), 3);
        assert_eq!(h.social.count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_customer_data_fails_before_any_delivery() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Email)).unwrap();
        h.service.launch(campaign.id).unwrap();

        let mut customers = snapshot();
        customers[1].recency_days = -3.0;

        let err = h
            .service
            .execute_campaign(campaign.id, customers)
            .await
            .unwrap_err();
        assert!(matches!(err, OutreachError::Validation(_)));
        assert_eq!(h.email.count(), 0);
        assert_eq!(h.repo.results_for(campaign.id).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_empty_snapshot_reports_zero() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Both)).unwrap();
        h.service.launch(campaign.id).unwrap();

        let report = h.service.execute_campaign(campaign.id, Vec::new()).await.unwrap();
        assert_eq!(report.snapshot_size, 0);
        assert_eq!(report.attempted, 0);
        assert_eq!(report.sent, 0);
    }

    #[tokio::test]
    async fn test_emails_use_customer_address_or_fallback() {
        let h = harness();
        let campaign = h.service.create_campaign(create_request(CampaignType::Email)).unwrap();
        h.service.launch(campaign.id).unwrap();

        let mut customers = snapshot();
        customers[2].email = None;
        h.service.execute_campaign(campaign.id, customers).await.unwrap();

        let sent = h.email.sent();
        assert_eq!(sent[0].to, "a@customers.test");
        assert_eq!(sent[2].to, "C@example.com");
    }

    #[tokio::test]
    async fn test_generate_content_kind_selects_outputs() {
        let h = harness();
        let mut req = AdhocGenerationRequest {
            segment_name: "champions".to_string(),
            product_name: "Pro Widget 3000".to_string(),
            goal: "Drive conversions".to_string(),
            offer: "20% off".to_string(),
            tone: Tone::Professional,
            platform: "twitter".to_string(),
            kind: CampaignType::Both,
            max_tokens: None,
        };

        let both = h.service.generate_content(&req).await.unwrap();
        assert!(both.email.is_some());
        assert!(both.social.is_some());
        assert!(both.email.unwrap().contains("[MOCK]"));

        req.kind = CampaignType::Social;
        let social_only = h.service.generate_content(&req).await.unwrap();
        assert!(social_only.email.is_none());
        assert!(social_only.social.is_some());
    }

    #[tokio::test]
    async fn test_campaign_metrics_requires_existing_campaign() {
        let h = harness();
        let err = h.service.campaign_metrics(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, OutreachError::NotFound(_)));
    }

    #[test]
    fn test_split_email_extracts_subject() {
        let (subject, body) = split_email("Subject: Test Subject\n\nThis is the body content.");
        assert_eq!(subject, "Test Subject");
        assert_eq!(body, "This is the body content.");
    }

    #[test]
    fn test_split_email_without_subject_uses_default() {
        let (subject, body) = split_email("Just a body.\nSecond line.");
        assert_eq!(subject, "Your Exclusive Offer");
        assert_eq!(body, "Just a body.\nSecond line.");
    }

    #[test]
    fn test_split_email_is_case_insensitive() {
        let (subject, _) = split_email("SUBJECT: Loud Subject\nBody here.");
        assert_eq!(subject, "Loud Subject");
    }
}
