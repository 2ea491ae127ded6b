//! Social-post transport. Real platform automation is out of scope; the
//! stub logs in dry-run and warns otherwise.

use outreach_core::error::OutreachResult;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SocialPost {
    pub platform: String,
    pub content: String,
    pub account: Option<String>,
}

/// Transport seam for social posting.
pub trait SocialTransport: Send + Sync {
    fn send_post(&self, post: &SocialPost) -> OutreachResult<()>;
}

pub struct StubSocialSender {
    dry_run: bool,
}

impl StubSocialSender {
    pub fn new(dry_run: bool) -> Self {
        info!(dry_run, "Social sender initialized (stub)");
        Self { dry_run }
    }
}

impl SocialTransport for StubSocialSender {
    fn send_post(&self, post: &SocialPost) -> OutreachResult<()> {
        if self.dry_run {
            info!(
                platform = %post.platform,
                account = %post.account.as_deref().unwrap_or("default"),
                "[dry-run] Social post not published"
            );
            metrics::counter!("social.dry_run").increment(1);
            return Ok(());
        }

        warn!(
            platform = %post.platform,
            "Real social posting not implemented; enable sender dry_run to suppress this warning"
        );
        metrics::counter!("social.posted").increment(1);
        Ok(())
    }
}
