//! Rule matching.
//!
//! Every rule in the table is tested against the lowercased line; each rule
//! that fires produces a [`Firing`] with its count and options resolved.

use rand::Rng;
use serde::Serialize;

use super::{AnimationOptions, Direction, EffectKind, EffectRule, GlyphChoice, RuleTable};

/// Options handed to the particle manager for one firing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedOptions {
    #[serde(flatten)]
    pub animation: AnimationOptions,
    pub glyphs: GlyphChoice,
    /// Batch-wide direction. `None` lets each particle pick its own.
    #[serde(rename = "batch_direction", skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// One rule match with its resolved request.
#[derive(Debug, Clone, Serialize)]
pub struct Firing<'a> {
    #[serde(rename = "rule", serialize_with = "serialize_rule_id")]
    pub rule: &'a EffectRule,
    pub kind: EffectKind,
    pub count: u32,
    pub options: ResolvedOptions,
}

fn serialize_rule_id<S: serde::Serializer>(rule: &&EffectRule, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&rule.id)
}

impl RuleTable {
    /// Evaluate every rule against `text`, in table order.
    pub fn match_all<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Vec<Firing<'_>> {
        if text.is_empty() {
            return Vec::new();
        }
        let lower = text.to_lowercase();

        self.rules()
            .iter()
            .filter(|rule| rule_fires(rule, &lower))
            .map(|rule| Firing {
                rule,
                kind: rule.kind,
                count: resolve_count(rule, &lower),
                options: resolve_options(rule, rng),
            })
            .collect()
    }
}

/// `any` of `triggers_any` (or none configured) and `all` of `must_also_match`.
pub fn rule_fires(rule: &EffectRule, lower: &str) -> bool {
    let any_match =
        rule.triggers_any.is_empty() || rule.triggers_any.iter().any(|p| p.is_match(lower));
    let all_match = rule.must_also_match.iter().all(|p| p.is_match(lower));
    any_match && all_match
}

/// Fallback count, replaced by the extracted number clamped to `[1, cap]`.
pub fn resolve_count(rule: &EffectRule, lower: &str) -> u32 {
    let policy = &rule.count;
    let extracted = policy
        .number_pattern
        .as_ref()
        .and_then(|p| p.first_group(lower))
        .and_then(parse_leading_int);

    match extracted {
        Some(n) => n.clamp(1, i64::from(policy.cap.max(1))) as u32,
        None => policy.fallback,
    }
}

fn resolve_options<R: Rng + ?Sized>(rule: &EffectRule, rng: &mut R) -> ResolvedOptions {
    let direction = match rule.kind {
        EffectKind::Run => Some(
            rule.options
                .direction
                .and_then(|d| d.pinned())
                .unwrap_or_else(|| random_direction(rng)),
        ),
        _ => None,
    };

    ResolvedOptions {
        animation: rule.options.clone(),
        glyphs: rule.glyph_choice(),
        direction,
    }
}

pub(crate) fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    if rng.gen_bool(0.5) {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Lenient integer parse: optional whitespace and sign, then leading digits.
/// Saturates instead of overflowing. `None` when there are no digits.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    let mut any = false;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        any = true;
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    any.then_some(if negative { -value } else { value })
}
