pub mod lifecycle;
pub mod service;

pub use lifecycle::CampaignLifecycle;
pub use service::{
    AdhocGenerationRequest, CampaignService, CreateCampaignRequest, ExecutionReport,
    GeneratedContent,
};
