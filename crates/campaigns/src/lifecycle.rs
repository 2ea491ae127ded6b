use outreach_core::error::{OutreachError, OutreachResult};
use outreach_core::types::{Campaign, CampaignStatus};
use chrono::Utc;

/// Describes a single valid lifecycle transition for a campaign.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: CampaignStatus,
    pub to: CampaignStatus,
    pub trigger: &'static str,
}

/// Guards the campaign lifecycle by enforcing a finite set of valid state
/// transitions. Campaigns move draft -> active -> completed, with paused as
/// a side branch; there is no delete.
#[derive(Debug, Clone)]
pub struct CampaignLifecycle {
    transitions: Vec<StateTransition>,
}

impl CampaignLifecycle {
    pub fn new() -> Self {
        let transitions = vec![
            StateTransition {
                from: CampaignStatus::Draft,
                to: CampaignStatus::Active,
                trigger: "launch",
            },
            StateTransition {
                from: CampaignStatus::Active,
                to: CampaignStatus::Paused,
                trigger: "pause",
            },
            StateTransition {
                from: CampaignStatus::Paused,
                to: CampaignStatus::Active,
                trigger: "resume",
            },
            StateTransition {
                from: CampaignStatus::Active,
                to: CampaignStatus::Completed,
                trigger: "complete",
            },
            StateTransition {
                from: CampaignStatus::Paused,
                to: CampaignStatus::Completed,
                trigger: "complete_while_paused",
            },
        ];
        Self { transitions }
    }

    /// Returns `true` if the given transition is allowed.
    pub fn can_transition(&self, from: CampaignStatus, to: CampaignStatus) -> bool {
        self.transitions
            .iter()
            .any(|t| t.from == from && t.to == to)
    }

    /// Attempts to move the campaign to `to`. Fails naming the current
    /// state if the transition is not permitted.
    pub fn transition(&self, campaign: &mut Campaign, to: CampaignStatus) -> OutreachResult<()> {
        if self.can_transition(campaign.status, to) {
            campaign.status = to;
            campaign.updated_at = Utc::now();
            Ok(())
        } else {
            Err(OutreachError::InvalidState {
                id: campaign.id,
                state: campaign.status,
            })
        }
    }
}

impl Default for CampaignLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::types::{CampaignType, SegmentLabel, Tone};
    use uuid::Uuid;

    fn draft_campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            campaign_type: CampaignType::Email,
            segment: SegmentLabel::Champions,
            product_name: "Widget".to_string(),
            goal: "Conversions".to_string(),
            offer: "10% off".to_string(),
            tone: Tone::Professional,
            platform: "twitter".to_string(),
            status: CampaignStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_full_lifecycle_path() {
        let lifecycle = CampaignLifecycle::new();
        let mut campaign = draft_campaign();

        lifecycle
            .transition(&mut campaign, CampaignStatus::Active)
            .unwrap();
        lifecycle
            .transition(&mut campaign, CampaignStatus::Paused)
            .unwrap();
        lifecycle
            .transition(&mut campaign, CampaignStatus::Active)
            .unwrap();
        lifecycle
            .transition(&mut campaign, CampaignStatus::Completed)
            .unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);
    }

    #[test]
    fn test_invalid_transition_names_current_state() {
        let lifecycle = CampaignLifecycle::new();
        let mut campaign = draft_campaign();

        let err = lifecycle
            .transition(&mut campaign, CampaignStatus::Completed)
            .unwrap_err();
        match err {
            OutreachError::InvalidState { state, .. } => {
                assert_eq!(state, CampaignStatus::Draft);
            }
            other => panic!("unexpected error: {other}"),
        }
        // State is untouched on rejection.
        assert_eq!(campaign.status, CampaignStatus::Draft);
    }

    #[test]
    fn test_completed_is_terminal() {
        let lifecycle = CampaignLifecycle::new();
        assert!(!lifecycle.can_transition(CampaignStatus::Completed, CampaignStatus::Active));
        assert!(!lifecycle.can_transition(CampaignStatus::Completed, CampaignStatus::Draft));
    }
}
