pub mod capture;
pub mod email;
pub mod social;

pub use capture::{CaptureEmailTransport, CaptureSocialTransport};
pub use email::{EmailMessage, EmailTransport, SmtpEmailSender};
pub use social::{SocialPost, SocialTransport, StubSocialSender};
