pub mod backend;
pub mod client;

pub use backend::{CompletionBackend, GenerationError, HttpBackend};
pub use client::{GenerationClient, RetryPolicy};
