//! Named prompt template library with the built-in outreach prompts.

use crate::engine::render;
use dashmap::DashMap;
use outreach_core::error::{OutreachError, OutreachResult};
use std::collections::HashMap;

/// Prompt for generating a marketing email. The generated document carries a
/// `Subject:` line the execution loop splits off before delivery.
pub const EMAIL_PROMPT: &str = "\
Write a high-converting marketing email for the following campaign.
- Product: {{product_name}}
- Segment: {{segment_name}}
- Goal: {{goal}}
- Offer: {{offer}}
- Tone: {{tone}}
- Constraints: 120-180 words, include clear CTA and subject line.

Return as:
Subject: <subject line>
Body:
<email body>";

/// Prompt for generating a social post.
pub const SOCIAL_POST_PROMPT: &str = "\
Create a social media post for {{platform}} about {{product_name}} targeting {{segment_name}}.
Goal: {{goal}}
Offer: {{offer}}
Tone: {{tone}}
Constraints: 40-80 words, include one emoji and a short CTA.
Include 3 hashtags.";

/// Registry of prompt templates keyed by name. The two built-ins are
/// registered at construction; custom templates can be added at runtime.
pub struct TemplateLibrary {
    templates: DashMap<String, String>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        let templates = DashMap::new();
        templates.insert("email".to_string(), EMAIL_PROMPT.to_string());
        templates.insert("social_post".to_string(), SOCIAL_POST_PROMPT.to_string());
        Self { templates }
    }

    pub fn register(&self, name: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(name.into(), body.into());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.templates.get(name).map(|t| t.clone())
    }

    /// Render a template by name against a flat context.
    pub fn render_named(
        &self,
        name: &str,
        context: &HashMap<String, String>,
    ) -> OutreachResult<String> {
        let body = self
            .get(name)
            .ok_or_else(|| OutreachError::Validation(format!("unknown template '{name}'")))?;
        render(&body, context)
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_context() -> HashMap<String, String> {
        [
            ("segment_name", "champions"),
            ("product_name", "Pro Widget 3000"),
            ("goal", "Drive conversions for summer sale"),
            ("offer", "20% off for 72 hours"),
            ("tone", "professional"),
            ("platform", "twitter"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_builtin_email_prompt_renders() {
        let library = TemplateLibrary::new();
        let rendered = library.render_named("email", &full_context()).unwrap();
        assert!(rendered.contains("Pro Widget 3000"));
        assert!(rendered.contains("champions"));
        assert!(rendered.contains("Subject:"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_builtin_social_prompt_renders() {
        let library = TemplateLibrary::new();
        let rendered = library.render_named("social_post", &full_context()).unwrap();
        assert!(rendered.contains("twitter"));
        assert!(rendered.contains("3 hashtags"));
    }

    #[test]
    fn test_unknown_template_rejected() {
        let library = TemplateLibrary::new();
        let err = library.render_named("push", &full_context()).unwrap_err();
        assert!(matches!(err, OutreachError::Validation(_)));
    }

    #[test]
    fn test_custom_template_registration() {
        let library = TemplateLibrary::new();
        library.register("sms", "{{product_name}}: {{offer}}");
        let rendered = library.render_named("sms", &full_context()).unwrap();
        assert_eq!(rendered, "Pro Widget 3000: 20% off for 72 hours");
    }
}
