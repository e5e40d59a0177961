//! Effect rule definitions.
//!
//! A rule is plain data: which patterns fire it, which effect it produces,
//! which glyphs it samples and how many particles it requests.

use serde::{Deserialize, Serialize};

use super::Pattern;
use crate::error::RuleError;

/// Glyph used when a rule configures none.
pub const DEFAULT_GLYPH: &str = "✨";

pub const DEFAULT_FALLBACK_COUNT: u32 = 10;
pub const DEFAULT_CAP_COUNT: u32 = 150;

/// Largest particle scale factor a rule may request.
pub const MAX_SCALE: f64 = 10.0;

/// Animation family a particle batch renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Rain,
    Run,
    Float,
    Burst,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Rain => "rain",
            EffectKind::Run => "run",
            EffectKind::Float => "float",
            EffectKind::Burst => "burst",
        }
    }
}

/// Horizontal travel direction of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// Direction preference as written in a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionPref {
    Left,
    Right,
    Random,
}

impl DirectionPref {
    /// The pinned direction, or `None` when the choice is left to chance.
    pub fn pinned(&self) -> Option<Direction> {
        match self {
            DirectionPref::Left => Some(Direction::Left),
            DirectionPref::Right => Some(Direction::Right),
            DirectionPref::Random => None,
        }
    }
}

/// One glyph or an ordered set of glyphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Glyphs {
    One(String),
    Many(Vec<String>),
}

/// Glyph selection handed to the particle manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphChoice {
    Emoji(String),
    EmojiSet(Vec<String>),
}

impl GlyphChoice {
    pub fn as_slice(&self) -> &[String] {
        match self {
            GlyphChoice::Emoji(g) => std::slice::from_ref(g),
            GlyphChoice::EmojiSet(set) => set,
        }
    }
}

impl Default for GlyphChoice {
    fn default() -> Self {
        GlyphChoice::Emoji(DEFAULT_GLYPH.to_string())
    }
}

/// How many particles a firing requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountPolicy {
    #[serde(default = "default_fallback")]
    pub fallback: u32,

    #[serde(default = "default_cap")]
    pub cap: u32,

    /// Pattern whose first capture group holds a requested count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_pattern: Option<Pattern>,
}

fn default_fallback() -> u32 {
    DEFAULT_FALLBACK_COUNT
}
fn default_cap() -> u32 {
    DEFAULT_CAP_COUNT
}

impl Default for CountPolicy {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_FALLBACK_COUNT,
            cap: DEFAULT_CAP_COUNT,
            number_pattern: None,
        }
    }
}

/// Free-form animation parameters. Unset fields fall back to the particle
/// manager's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_max: Option<f64>,
    /// Upper bound on particles created by a single spawn call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_call: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<DirectionPref>,
    /// Spin particles; period sampled from `rotate_min..rotate_max` ms.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_max: Option<u32>,
}

/// A declarative effect rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRule {
    pub id: String,

    /// Rule fires if the lowercased input matches any of these.
    #[serde(default)]
    pub triggers_any: Vec<Pattern>,

    /// Every one of these must also match.
    #[serde(default)]
    pub must_also_match: Vec<Pattern>,

    pub kind: EffectKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyphs: Option<Glyphs>,

    #[serde(default)]
    pub count: CountPolicy,

    #[serde(default)]
    pub options: AnimationOptions,

    #[serde(default)]
    pub hints: Vec<String>,
}

impl EffectRule {
    /// Resolve the configured glyphs into an `emoji` or `emoji_set` choice.
    pub fn glyph_choice(&self) -> GlyphChoice {
        match &self.glyphs {
            Some(Glyphs::One(g)) => GlyphChoice::Emoji(g.clone()),
            Some(Glyphs::Many(set)) if set.len() > 1 => GlyphChoice::EmojiSet(set.clone()),
            Some(Glyphs::Many(set)) if set.len() == 1 => GlyphChoice::Emoji(set[0].clone()),
            _ => GlyphChoice::default(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), RuleError> {
        let invalid = |message: &str| RuleError::InvalidRule {
            id: self.id.clone(),
            message: message.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if self.count.cap == 0 {
            return Err(invalid("count.cap must be at least 1"));
        }
        let o = &self.options;
        if let (Some(min), Some(max)) = (o.min_duration, o.max_duration) {
            if min > max {
                return Err(invalid("min_duration exceeds max_duration"));
            }
        }
        if let (Some(min), Some(max)) = (o.min_size, o.max_size) {
            if min > max {
                return Err(invalid("min_size exceeds max_size"));
            }
        }
        for (name, scale) in [("scale_min", o.scale_min), ("scale_max", o.scale_max)] {
            if let Some(scale) = scale {
                if !is_valid_scale(scale) {
                    return Err(invalid(&format!("{name} must be in (0, {MAX_SCALE}]")));
                }
            }
        }
        if let (Some(min), Some(max)) = (o.scale_min, o.scale_max) {
            if min > max {
                return Err(invalid("scale_min exceeds scale_max"));
            }
        }
        Ok(())
    }
}

/// Finite, positive and at most [`MAX_SCALE`].
pub fn is_valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0 && scale <= MAX_SCALE
}
