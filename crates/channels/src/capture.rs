//! In-memory capture transports for tests: record what would have been
//! delivered, with optional per-recipient failure injection.

use crate::email::{EmailMessage, EmailTransport};
use crate::social::{SocialPost, SocialTransport};
use outreach_core::error::{OutreachError, OutreachResult};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Captures outbound email; sends to recipients in the failure set error out.
#[derive(Default)]
pub struct CaptureEmailTransport {
    messages: Mutex<Vec<EmailMessage>>,
    fail_for: Mutex<HashSet<String>>,
}

impl CaptureEmailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `recipient` fail with a delivery error.
    pub fn fail_recipient(&self, recipient: impl Into<String>) {
        self.fail_for.lock().insert(recipient.into());
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.messages.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }
}

impl EmailTransport for CaptureEmailTransport {
    fn send_email(&self, msg: &EmailMessage) -> OutreachResult<()> {
        if self.fail_for.lock().contains(&msg.to) {
            return Err(OutreachError::Delivery(format!(
                "simulated bounce for {}",
                msg.to
            )));
        }
        self.messages.lock().push(msg.clone());
        Ok(())
    }
}

/// Captures outbound social posts.
#[derive(Default)]
pub struct CaptureSocialTransport {
    posts: Mutex<Vec<SocialPost>>,
}

impl CaptureSocialTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SocialPost> {
        self.posts.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.posts.lock().len()
    }
}

impl SocialTransport for CaptureSocialTransport {
    fn send_post(&self, post: &SocialPost) -> OutreachResult<()> {
        self.posts.lock().push(post.clone());
        Ok(())
    }
}
