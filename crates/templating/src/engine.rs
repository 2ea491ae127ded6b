//! Placeholder substitution for prompt templates.
//!
//! Substitution only — no filters, no conditionals. The execution loop
//! depends on this being deterministic for identical input.

use outreach_core::error::{OutreachError, OutreachResult};
use std::collections::HashMap;

/// Substitute every `{{ key }}` placeholder from the context. Fails with
/// `MissingVariable` naming the first key the context does not provide.
pub fn render(template: &str, context: &HashMap<String, String>) -> OutreachResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| OutreachError::Validation("unterminated placeholder".to_string()))?;
        let key = after[..close].trim();
        let value = context
            .get(key)
            .ok_or_else(|| OutreachError::MissingVariable(key.to_string()))?;
        out.push_str(value);
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
