//! File-backed execution metrics tracker.
//!
//! Append-only `metrics.json` with the same read-then-overwrite,
//! in-process-mutex discipline as the campaign store. One execution entry is
//! written per (customer, content_type); generation timings are tracked
//! separately.

use chrono::{DateTime, Utc};
use outreach_core::error::OutreachResult;
use outreach_core::types::ContentType;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricEntry {
    Execution {
        timestamp: DateTime<Utc>,
        campaign_id: Uuid,
        customer_id: String,
        content_type: ContentType,
        success: bool,
        error: Option<String>,
    },
    Generation {
        timestamp: DateTime<Utc>,
        campaign_id: Uuid,
        content_type: ContentType,
        generation_time_ms: u64,
        success: bool,
    },
}

/// Aggregated view of one campaign's execution metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub campaign_id: Uuid,
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    /// Percentage, rounded to two decimals.
    pub success_rate: f64,
    pub entries: Vec<MetricEntry>,
}

pub struct MetricsTracker {
    metrics_file: PathBuf,
    lock: Mutex<()>,
}

impl MetricsTracker {
    pub fn new(data_dir: impl AsRef<Path>) -> OutreachResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let metrics_file = data_dir.join("metrics.json");
        if !metrics_file.exists() {
            fs::write(&metrics_file, "[]")?;
        }
        Ok(Self {
            metrics_file,
            lock: Mutex::new(()),
        })
    }

    /// Record the outcome of delivering one content piece to one customer.
    pub fn record_execution(
        &self,
        campaign_id: Uuid,
        customer_id: &str,
        content_type: ContentType,
        success: bool,
        error: Option<String>,
    ) -> OutreachResult<()> {
        self.append(MetricEntry::Execution {
            timestamp: Utc::now(),
            campaign_id,
            customer_id: customer_id.to_string(),
            content_type,
            success,
            error,
        })?;
        info!(
            campaign_id = %campaign_id,
            customer_id,
            content_type = %content_type,
            success,
            "Tracked execution"
        );
        Ok(())
    }

    /// Record content-generation timing for one content piece.
    pub fn record_generation(
        &self,
        campaign_id: Uuid,
        content_type: ContentType,
        generation_time_ms: u64,
        success: bool,
    ) -> OutreachResult<()> {
        self.append(MetricEntry::Generation {
            timestamp: Utc::now(),
            campaign_id,
            content_type,
            generation_time_ms,
            success,
        })
    }

    /// Aggregate the execution entries for one campaign.
    pub fn campaign_summary(&self, campaign_id: Uuid) -> OutreachResult<CampaignMetrics> {
        let entries: Vec<MetricEntry> = self
            .load()?
            .into_iter()
            .filter(|e| match e {
                MetricEntry::Execution { campaign_id: id, .. } => *id == campaign_id,
                MetricEntry::Generation { campaign_id: id, .. } => *id == campaign_id,
            })
            .collect();

        let executions: Vec<&MetricEntry> = entries
            .iter()
            .filter(|e| matches!(e, MetricEntry::Execution { .. }))
            .collect();
        let total = executions.len() as u64;
        let successful = executions
            .iter()
            .filter(|e| matches!(e, MetricEntry::Execution { success: true, .. }))
            .count() as u64;
        let success_rate = if total > 0 {
            ((successful as f64 / total as f64) * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        Ok(CampaignMetrics {
            campaign_id,
            total_executions: total,
            successful_executions: successful,
            failed_executions: total - successful,
            success_rate,
            entries,
        })
    }

    fn append(&self, entry: MetricEntry) -> OutreachResult<()> {
        let _guard = self.lock.lock();
        let mut entries = self.load_locked()?;
        entries.push(entry);
        fs::write(&self.metrics_file, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }

    fn load(&self) -> OutreachResult<Vec<MetricEntry>> {
        let _guard = self.lock.lock();
        self.load_locked()
    }

    fn load_locked(&self) -> OutreachResult<Vec<MetricEntry>> {
        let raw = fs::read_to_string(&self.metrics_file)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("outreach-metrics-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_summary_counts_and_rate() {
        let tracker = MetricsTracker::new(temp_dir()).unwrap();
        let campaign_id = Uuid::new_v4();

        tracker
            .record_execution(campaign_id, "A", ContentType::Email, true, None)
            .unwrap();
        tracker
            .record_execution(campaign_id, "B", ContentType::Email, true, None)
            .unwrap();
        tracker
            .record_execution(
                campaign_id,
                "C",
                ContentType::Email,
                false,
                Some("bounced".to_string()),
            )
            .unwrap();

        let summary = tracker.campaign_summary(campaign_id).unwrap();
        assert_eq!(summary.total_executions, 3);
        assert_eq!(summary.successful_executions, 2);
        assert_eq!(summary.failed_executions, 1);
        assert_eq!(summary.success_rate, 66.67);
    }

    #[test]
    fn test_summary_scoped_to_campaign() {
        let tracker = MetricsTracker::new(temp_dir()).unwrap();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        tracker
            .record_execution(first, "A", ContentType::Email, true, None)
            .unwrap();
        tracker
            .record_execution(second, "B", ContentType::Social, true, None)
            .unwrap();

        let summary = tracker.campaign_summary(first).unwrap();
        assert_eq!(summary.total_executions, 1);
    }

    #[test]
    fn test_generation_entries_excluded_from_execution_counts() {
        let tracker = MetricsTracker::new(temp_dir()).unwrap();
        let campaign_id = Uuid::new_v4();

        tracker
            .record_generation(campaign_id, ContentType::Email, 42, true)
            .unwrap();
        tracker
            .record_execution(campaign_id, "A", ContentType::Email, true, None)
            .unwrap();

        let summary = tracker.campaign_summary(campaign_id).unwrap();
        assert_eq!(summary.total_executions, 1);
        assert_eq!(summary.entries.len(), 2);
    }

    #[test]
    fn test_empty_summary() {
        let tracker = MetricsTracker::new(temp_dir()).unwrap();
        let summary = tracker.campaign_summary(Uuid::new_v4()).unwrap();
        assert_eq!(summary.total_executions, 0);
        assert_eq!(summary.success_rate, 0.0);
    }
}
