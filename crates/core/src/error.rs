use crate::types::CampaignStatus;
use thiserror::Error;
use uuid::Uuid;

pub type OutreachResult<T> = Result<T, OutreachError>;

#[derive(Error, Debug)]
pub enum OutreachError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid campaign state: campaign {id} is {state}")]
    InvalidState { id: Uuid, state: CampaignStatus },

    #[error("Campaign not found: {0}")]
    NotFound(Uuid),

    #[error("Template error: missing variable '{0}'")]
    MissingVariable(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
