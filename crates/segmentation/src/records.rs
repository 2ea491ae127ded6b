//! Boundary parsing for loose customer records arriving as JSON.
//!
//! API and CLI callers submit untyped rows; missing required columns are a
//! validation failure naming the columns, not a serde error string.

use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::CustomerRecord;

pub const REQUIRED_COLUMNS: [&str; 4] =
    ["customer_id", "recency_days", "frequency", "monetary_value"];

/// Parse loose JSON rows into typed records. Fails on the first row with
/// missing required columns; no partial output.
pub fn parse_records(raw: &[serde_json::Value]) -> OutreachResult<Vec<CustomerRecord>> {
    let mut records = Vec::with_capacity(raw.len());
    for (i, row) in raw.iter().enumerate() {
        let obj = row.as_object().ok_or_else(|| {
            OutreachError::Validation(format!("record {i}: expected a JSON object"))
        })?;

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !obj.contains_key(**col) || obj[**col].is_null())
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(OutreachError::Validation(format!(
                "record {i}: missing columns: {}",
                missing.join(", ")
            )));
        }

        let record: CustomerRecord = serde_json::from_value(row.clone())
            .map_err(|e| OutreachError::Validation(format!("record {i}: {e}")))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_records() {
        let raw = vec![
            json!({"customer_id": "A", "recency_days": 5, "frequency": 10, "monetary_value": 1000}),
            json!({"customer_id": "B", "email": "b@example.com", "recency_days": 30, "frequency": 3, "monetary_value": 200}),
        ];
        let records = parse_records(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].customer_id, "A");
        assert_eq!(records[1].email.as_deref(), Some("b@example.com"));
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let raw = vec![json!({"customer_id": "A", "recency_days": 5, "frequency": 10})];
        let err = parse_records(&raw).unwrap_err();
        assert!(matches!(err, OutreachError::Validation(_)));
        assert!(err.to_string().contains("monetary_value"));
    }

    #[test]
    fn test_null_column_counts_as_missing() {
        let raw = vec![json!({
            "customer_id": "A", "recency_days": null, "frequency": 10, "monetary_value": 5
        })];
        let err = parse_records(&raw).unwrap_err();
        assert!(err.to_string().contains("recency_days"));
    }

    #[test]
    fn test_non_object_row_rejected() {
        let raw = vec![json!([1, 2, 3])];
        assert!(parse_records(&raw).is_err());
    }
}
