//! Contact store: the raw customer records behind segment snapshots.
//!
//! Same flat-file discipline as the campaign repository. Segment membership
//! is computed on read by scoring the current contact set; it is never
//! persisted as a source of truth.

use outreach_core::config::RfmConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{CustomerRecord, SegmentLabel};
use outreach_segmentation::score_rfm;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ContactStore {
    contacts_file: PathBuf,
    lock: Mutex<()>,
}

impl ContactStore {
    pub fn new(data_dir: impl AsRef<Path>) -> OutreachResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let contacts_file = data_dir.join("contacts.json");
        if !contacts_file.exists() {
            fs::write(&contacts_file, "[]")?;
        }
        Ok(Self {
            contacts_file,
            lock: Mutex::new(()),
        })
    }

    pub fn all(&self) -> OutreachResult<Vec<CustomerRecord>> {
        let _guard = self.lock.lock();
        let raw = fs::read_to_string(&self.contacts_file)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Replace the stored contact set wholesale.
    pub fn replace_all(&self, contacts: &[CustomerRecord]) -> OutreachResult<()> {
        let _guard = self.lock.lock();
        fs::write(&self.contacts_file, serde_json::to_string_pretty(contacts)?)?;
        info!(count = contacts.len(), "Stored contacts");
        Ok(())
    }

    /// Import a CSV of customer records, replacing the stored set.
    pub fn import_csv(&self, path: impl AsRef<Path>) -> OutreachResult<usize> {
        let contacts = read_customers_csv(path)?;
        self.replace_all(&contacts)?;
        Ok(contacts.len())
    }

    /// Snapshot the members of one segment: score the current contact set
    /// and keep the rows whose label matches. Callers bind this snapshot at
    /// execution start; it is not re-read mid-run.
    pub fn segment_members(
        &self,
        segment: SegmentLabel,
        rfm: &RfmConfig,
    ) -> OutreachResult<Vec<CustomerRecord>> {
        let contacts = self.all()?;
        if contacts.is_empty() {
            return Ok(Vec::new());
        }
        let scored = score_rfm(&contacts, rfm)?;
        Ok(scored
            .iter()
            .filter(|c| c.segment == segment)
            .map(|c| c.record())
            .collect())
    }
}

/// Read customer records from a CSV file with a header row.
pub fn read_customers_csv(path: impl AsRef<Path>) -> OutreachResult<Vec<CustomerRecord>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .map_err(|e| OutreachError::Storage(format!("cannot open CSV: {e}")))?;
    let mut records = Vec::new();
    for row in reader.deserialize::<CustomerRecord>() {
        let record = row.map_err(|e| OutreachError::Validation(format!("invalid CSV row: {e}")))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("outreach-contacts-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn customer(id: &str, recency: f64, frequency: f64, monetary: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            email: None,
            recency_days: recency,
            frequency,
            monetary_value: monetary,
        }
    }

    #[test]
    fn test_replace_and_read_back() {
        let store = ContactStore::new(temp_dir()).unwrap();
        store
            .replace_all(&[customer("A", 5.0, 10.0, 1000.0)])
            .unwrap();
        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].customer_id, "A");
    }

    #[test]
    fn test_segment_members_filters_by_label() {
        let store = ContactStore::new(temp_dir()).unwrap();
        store
            .replace_all(&[
                customer("A", 5.0, 10.0, 1000.0),
                customer("B", 30.0, 3.0, 200.0),
                customer("C", 100.0, 1.0, 50.0),
            ])
            .unwrap();

        let champions = store
            .segment_members(SegmentLabel::Champions, &RfmConfig::default())
            .unwrap();
        assert_eq!(champions.len(), 1);
        assert_eq!(champions[0].customer_id, "A");

        let lost = store
            .segment_members(SegmentLabel::Lost, &RfmConfig::default())
            .unwrap();
        assert_eq!(lost.len(), 1);
        assert_eq!(lost[0].customer_id, "C");
    }

    #[test]
    fn test_segment_members_of_empty_store() {
        let store = ContactStore::new(temp_dir()).unwrap();
        let members = store
            .segment_members(SegmentLabel::Champions, &RfmConfig::default())
            .unwrap();
        assert!(members.is_empty());
    }

    #[test]
    fn test_csv_import() {
        let dir = temp_dir();
        let csv_path = dir.join("customers.csv");
        fs::write(
            &csv_path,
            "customer_id,email,recency_days,frequency,monetary_value\n\
             A,a@example.com,5,10,1000\n\
             B,,30,3,200\n",
        )
        .unwrap();

        let store = ContactStore::new(&dir).unwrap();
        let imported = store.import_csv(&csv_path).unwrap();
        assert_eq!(imported, 2);

        let all = store.all().unwrap();
        assert_eq!(all[0].email.as_deref(), Some("a@example.com"));
        assert_eq!(all[1].customer_id, "B");
    }
}
