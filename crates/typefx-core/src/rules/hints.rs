//! Discovery hints for the help overlay.
//!
//! Rules may list their hints explicitly. When they don't, hints are
//! derived from the trigger pattern sources.

use super::EffectRule;

/// Hints for a rule: explicit ones lowercased, else derived.
pub fn hints_for(rule: &EffectRule) -> Vec<String> {
    if rule.hints.is_empty() {
        derive_hints(rule)
    } else {
        rule.hints.iter().map(|h| h.to_lowercase()).collect()
    }
}

/// Derive hints from `triggers_any`, falling back to the id prefix.
pub fn derive_hints(rule: &EffectRule) -> Vec<String> {
    let hints: Vec<String> = rule
        .triggers_any
        .iter()
        .filter_map(|p| hint_from_source(p.source()))
        .collect();

    if hints.is_empty() {
        let prefix = rule.id.split('-').next().unwrap_or(&rule.id);
        vec![prefix.to_string()]
    } else {
        hints
    }
}

fn hint_from_source(source: &str) -> Option<String> {
    let src = strip_inline_flags(source)
        .replace(r"\b", "")
        .replace(['(', ')'], "");

    if src.is_empty() || src == r"\$" || src == "^" || src == "$" {
        return None;
    }

    let hint: String = src
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();

    (hint.len() > 1).then_some(hint)
}

/// Drop a leading `(?i)`-style flag group.
fn strip_inline_flags(source: &str) -> &str {
    if let Some(rest) = source.strip_prefix("(?") {
        if let Some(end) = rest.find(')') {
            let flags = &rest[..end];
            if !flags.is_empty() && flags.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
                return &rest[end + 1..];
            }
        }
    }
    source
}
