pub mod engine;
pub mod library;

pub use engine::render;
pub use library::{TemplateLibrary, EMAIL_PROMPT, SOCIAL_POST_PROMPT};
