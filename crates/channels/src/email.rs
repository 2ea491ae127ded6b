//! Email delivery transport.
//!
//! Dry-run logs the message instead of sending. A configured sender talks
//! SMTP (stubbed here — in production, open the SMTP session and submit);
//! an unconfigured, non-dry-run sender fails the send so the campaign loop
//! records the failure instead of silently dropping it.

use outreach_core::config::EmailConfig;
use outreach_core::error::{OutreachError, OutreachResult};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub to: String,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
}

/// Transport seam for email delivery.
pub trait EmailTransport: Send + Sync {
    fn send_email(&self, msg: &EmailMessage) -> OutreachResult<()>;
}

/// SMTP-backed sender with dry-run support.
pub struct SmtpEmailSender {
    config: EmailConfig,
    dry_run: bool,
}

impl SmtpEmailSender {
    pub fn new(config: EmailConfig, dry_run: bool) -> Self {
        info!(
            from = %config.sender_addr,
            dry_run,
            smtp_configured = config.smtp_host.is_some(),
            "Email sender initialized"
        );
        Self { config, dry_run }
    }

    fn is_configured(&self) -> bool {
        self.config.smtp_host.is_some()
            && self.config.smtp_username.is_some()
            && self.config.smtp_password.is_some()
    }
}

impl EmailTransport for SmtpEmailSender {
    fn send_email(&self, msg: &EmailMessage) -> OutreachResult<()> {
        let from_name = msg.from_name.as_deref().unwrap_or(&self.config.sender_name);
        let from_email = msg.from_email.as_deref().unwrap_or(&self.config.sender_addr);

        if self.dry_run {
            info!(
                to = %msg.to,
                from = %format!("{from_name} <{from_email}>"),
                subject = %msg.subject,
                "[dry-run] Email not sent"
            );
            metrics::counter!("email.dry_run").increment(1);
            return Ok(());
        }

        if !self.is_configured() {
            warn!("No email provider configured; set sender dry_run or the SMTP variables");
            return Err(OutreachError::Delivery(
                "no email provider configured".to_string(),
            ));
        }

        let host = self.config.smtp_host.as_deref().unwrap_or_default();
        debug!(
            host = %host,
            port = self.config.smtp_port,
            tls = self.config.smtp_use_tls,
            to = %msg.to,
            "Sending via SMTP"
        );

        // Stub — in production: open the SMTP session (STARTTLS when
        // configured), authenticate, and submit the message.
        metrics::counter!("email.sent").increment(1);
        info!(to = %msg.to, subject = %msg.subject, "Email sent");
        Ok(())
    }
}
