//! Flat-file campaign repository.
//!
//! Every mutation is a whole-file read-then-overwrite, serialized by an
//! in-process mutex (single-writer discipline). Writers in other processes
//! would still race and silently drop updates — known limitation of the
//! flat-file store. Campaigns are never deleted; lifecycle is soft.

use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{Campaign, CampaignResult, CampaignStatus};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub struct CampaignRepository {
    campaigns_file: PathBuf,
    results_file: PathBuf,
    lock: Mutex<()>,
}

impl CampaignRepository {
    pub fn new(data_dir: impl AsRef<Path>) -> OutreachResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let campaigns_file = data_dir.join("campaigns.json");
        let results_file = data_dir.join("campaign_results.json");
        for file in [&campaigns_file, &results_file] {
            if !file.exists() {
                fs::write(file, "[]")?;
            }
        }

        info!(data_dir = %data_dir.display(), "Campaign repository initialized");
        Ok(Self {
            campaigns_file,
            results_file,
            lock: Mutex::new(()),
        })
    }

    // ─── Campaigns ─────────────────────────────────────────────────────────

    pub fn create(&self, campaign: &Campaign) -> OutreachResult<()> {
        let _guard = self.lock.lock();
        let mut campaigns = self.load_campaigns()?;
        campaigns.push(campaign.clone());
        self.save_campaigns(&campaigns)?;
        info!(campaign = %campaign.name, id = %campaign.id, "Created campaign");
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> OutreachResult<Option<Campaign>> {
        let _guard = self.lock.lock();
        Ok(self.load_campaigns()?.into_iter().find(|c| c.id == id))
    }

    pub fn list(&self, status: Option<CampaignStatus>) -> OutreachResult<Vec<Campaign>> {
        let _guard = self.lock.lock();
        let mut campaigns = self.load_campaigns()?;
        if let Some(status) = status {
            campaigns.retain(|c| c.status == status);
        }
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    pub fn update(&self, campaign: &Campaign) -> OutreachResult<()> {
        let _guard = self.lock.lock();
        let mut campaigns = self.load_campaigns()?;
        let slot = campaigns
            .iter_mut()
            .find(|c| c.id == campaign.id)
            .ok_or(OutreachError::NotFound(campaign.id))?;
        *slot = campaign.clone();
        self.save_campaigns(&campaigns)?;
        info!(campaign = %campaign.name, id = %campaign.id, status = %campaign.status, "Updated campaign");
        Ok(())
    }

    // ─── Results ───────────────────────────────────────────────────────────

    /// Append a batch of execution results. Called once per execution run,
    /// after the loop completes.
    pub fn append_results(&self, results: &[CampaignResult]) -> OutreachResult<()> {
        if results.is_empty() {
            return Ok(());
        }
        let _guard = self.lock.lock();
        let mut existing = self.load_results()?;
        existing.extend(results.iter().cloned());
        self.save_results(&existing)?;
        info!(count = results.len(), "Saved campaign results");
        Ok(())
    }

    pub fn results_for(&self, campaign_id: Uuid) -> OutreachResult<Vec<CampaignResult>> {
        let _guard = self.lock.lock();
        Ok(self
            .load_results()?
            .into_iter()
            .filter(|r| r.campaign_id == campaign_id)
            .collect())
    }

    // ─── File IO ───────────────────────────────────────────────────────────

    fn load_campaigns(&self) -> OutreachResult<Vec<Campaign>> {
        let raw = fs::read_to_string(&self.campaigns_file)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_campaigns(&self, campaigns: &[Campaign]) -> OutreachResult<()> {
        fs::write(
            &self.campaigns_file,
            serde_json::to_string_pretty(campaigns)?,
        )?;
        Ok(())
    }

    fn load_results(&self) -> OutreachResult<Vec<CampaignResult>> {
        let raw = fs::read_to_string(&self.results_file)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_results(&self, results: &[CampaignResult]) -> OutreachResult<()> {
        fs::write(&self.results_file, serde_json::to_string_pretty(results)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use outreach_core::types::{CampaignType, ContentType, SegmentLabel, Tone};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("outreach-store-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_campaign(name: &str, status: CampaignStatus) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            campaign_type: CampaignType::Both,
            segment: SegmentLabel::Champions,
            product_name: "Pro Widget 3000".to_string(),
            goal: "Drive conversions".to_string(),
            offer: "20% off".to_string(),
            tone: Tone::Professional,
            platform: "twitter".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_and_get_roundtrip() {
        let repo = CampaignRepository::new(temp_dir()).unwrap();
        let campaign = sample_campaign("Summer Sale", CampaignStatus::Draft);
        repo.create(&campaign).unwrap();

        let loaded = repo.get(campaign.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Summer Sale");
        assert_eq!(loaded.status, CampaignStatus::Draft);
    }

    #[test]
    fn test_list_filters_by_status() {
        let repo = CampaignRepository::new(temp_dir()).unwrap();
        repo.create(&sample_campaign("Draft One", CampaignStatus::Draft))
            .unwrap();
        repo.create(&sample_campaign("Live One", CampaignStatus::Active))
            .unwrap();

        let all = repo.list(None).unwrap();
        assert_eq!(all.len(), 2);

        let active = repo.list(Some(CampaignStatus::Active)).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Live One");
    }

    #[test]
    fn test_update_replaces_in_place() {
        let repo = CampaignRepository::new(temp_dir()).unwrap();
        let mut campaign = sample_campaign("Promo", CampaignStatus::Draft);
        repo.create(&campaign).unwrap();

        campaign.status = CampaignStatus::Active;
        repo.update(&campaign).unwrap();

        let loaded = repo.get(campaign.id).unwrap().unwrap();
        assert_eq!(loaded.status, CampaignStatus::Active);
        assert_eq!(repo.list(None).unwrap().len(), 1);
    }

    #[test]
    fn test_update_unknown_campaign_is_not_found() {
        let repo = CampaignRepository::new(temp_dir()).unwrap();
        let campaign = sample_campaign("Ghost", CampaignStatus::Draft);
        let err = repo.update(&campaign).unwrap_err();
        assert!(matches!(err, OutreachError::NotFound(_)));
    }

    #[test]
    fn test_results_append_only() {
        let repo = CampaignRepository::new(temp_dir()).unwrap();
        let campaign = sample_campaign("Promo", CampaignStatus::Active);
        repo.create(&campaign).unwrap();

        let batch1 = vec![CampaignResult::sent(
            campaign.id,
            "A",
            ContentType::Email,
            "hello".to_string(),
        )];
        let batch2 = vec![CampaignResult::sent(
            campaign.id,
            "B",
            ContentType::Social,
            "post".to_string(),
        )];
        repo.append_results(&batch1).unwrap();
        repo.append_results(&batch2).unwrap();

        let results = repo.results_for(campaign.id).unwrap();
        assert_eq!(results.len(), 2);
    }
}
