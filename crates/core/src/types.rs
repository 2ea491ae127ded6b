use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Raw customer purchase-behavior record, the immutable input to RFM scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub recency_days: f64,
    pub frequency: f64,
    pub monetary_value: f64,
}

/// One of the ten fixed behavioral segments derived from RFM buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentLabel {
    Champions,
    Loyal,
    PotentialLoyalist,
    NewCustomers,
    Promising,
    NeedsAttention,
    AboutToSleep,
    AtRisk,
    Hibernating,
    Lost,
}

impl SegmentLabel {
    pub const ALL: [SegmentLabel; 10] = [
        SegmentLabel::Champions,
        SegmentLabel::Loyal,
        SegmentLabel::PotentialLoyalist,
        SegmentLabel::NewCustomers,
        SegmentLabel::Promising,
        SegmentLabel::NeedsAttention,
        SegmentLabel::AboutToSleep,
        SegmentLabel::AtRisk,
        SegmentLabel::Hibernating,
        SegmentLabel::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentLabel::Champions => "champions",
            SegmentLabel::Loyal => "loyal",
            SegmentLabel::PotentialLoyalist => "potential_loyalist",
            SegmentLabel::NewCustomers => "new_customers",
            SegmentLabel::Promising => "promising",
            SegmentLabel::NeedsAttention => "needs_attention",
            SegmentLabel::AboutToSleep => "about_to_sleep",
            SegmentLabel::AtRisk => "at_risk",
            SegmentLabel::Hibernating => "hibernating",
            SegmentLabel::Lost => "lost",
        }
    }
}

impl fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SegmentLabel {
    type Err = crate::error::OutreachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SegmentLabel::ALL
            .iter()
            .find(|label| label.as_str() == s)
            .copied()
            .ok_or_else(|| {
                crate::error::OutreachError::Validation(format!("unknown segment '{s}'"))
            })
    }
}

/// A customer row with RFM scores and segment label appended.
/// Computed fresh on every scoring run; never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCustomer {
    pub customer_id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub recency_days: f64,
    pub frequency: f64,
    pub monetary_value: f64,
    #[serde(rename = "R")]
    pub r: u32,
    #[serde(rename = "F")]
    pub f: u32,
    #[serde(rename = "M")]
    pub m: u32,
    #[serde(rename = "RFM_Score")]
    pub rfm_score: u32,
    pub segment: SegmentLabel,
}

impl ScoredCustomer {
    /// Strip the derived columns back to the raw input record.
    pub fn record(&self) -> CustomerRecord {
        CustomerRecord {
            customer_id: self.customer_id.clone(),
            email: self.email.clone(),
            recency_days: self.recency_days,
            frequency: self.frequency,
            monetary_value: self.monetary_value,
        }
    }
}

/// Copywriting tone passed through to the generation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Friendly,
    Professional,
    Playful,
    Urgent,
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Professional
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Playful => "playful",
            Tone::Urgent => "urgent",
        };
        f.write_str(s)
    }
}

impl FromStr for Tone {
    type Err = crate::error::OutreachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "friendly" => Ok(Tone::Friendly),
            "professional" => Ok(Tone::Professional),
            "playful" => Ok(Tone::Playful),
            "urgent" => Ok(Tone::Urgent),
            other => Err(crate::error::OutreachError::Validation(format!(
                "unknown tone '{other}' (expected friendly, professional, playful, urgent)"
            ))),
        }
    }
}

/// Which outreach channels a campaign fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignType {
    Email,
    Social,
    Both,
}

impl CampaignType {
    /// Content types produced per customer for this campaign type.
    pub fn content_types(&self) -> &'static [ContentType] {
        match self {
            CampaignType::Email => &[ContentType::Email],
            CampaignType::Social => &[ContentType::Social],
            CampaignType::Both => &[ContentType::Email, ContentType::Social],
        }
    }
}

impl fmt::Display for CampaignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignType::Email => "email",
            CampaignType::Social => "social",
            CampaignType::Both => "both",
        };
        f.write_str(s)
    }
}

impl FromStr for CampaignType {
    type Err = crate::error::OutreachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(CampaignType::Email),
            "social" => Ok(CampaignType::Social),
            "both" => Ok(CampaignType::Both),
            other => Err(crate::error::OutreachError::Validation(format!(
                "unknown campaign type '{other}' (expected email, social, both)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Email,
    Social,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Email => "email",
            ContentType::Social => "social",
        };
        f.write_str(s)
    }
}

/// Campaign lifecycle state. Campaigns are never deleted; they only move
/// through this soft lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for CampaignStatus {
    type Err = crate::error::OutreachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            other => Err(crate::error::OutreachError::Validation(format!(
                "unknown campaign status '{other}' (expected draft, active, paused, completed)"
            ))),
        }
    }
}

/// A configured outreach unit targeting one segment with generated content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub campaign_type: CampaignType,
    pub segment: SegmentLabel,
    pub product_name: String,
    pub goal: String,
    pub offer: String,
    pub tone: Tone,
    pub platform: String,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Terminal delivery state for one generated content piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Bounced,
}

/// Outcome of delivering one content piece to one customer. Append-only;
/// always references an existing campaign and a customer from the segment
/// snapshot bound at execution start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignResult {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub customer_id: String,
    pub content_type: ContentType,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
}

impl CampaignResult {
    pub fn sent(campaign_id: Uuid, customer_id: &str, content_type: ContentType, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            customer_id: customer_id.to_string(),
            content_type,
            content,
            sent_at: Utc::now(),
            status: DeliveryStatus::Sent,
        }
    }
}
