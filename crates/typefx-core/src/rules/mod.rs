//! Declarative effect rules.
//!
//! A typed line is tested against an ordered table of rules; each rule that
//! fires becomes a particle burst. Lines that fire nothing fall through to
//! the bare-number balloon trigger.

pub mod fallback;
pub mod hints;
pub mod matcher;
pub mod pattern;
pub mod rule;
pub mod table;

pub use fallback::first_bare_number;
pub use matcher::{Firing, ResolvedOptions};
pub use pattern::Pattern;
pub use rule::{
    AnimationOptions, CountPolicy, Direction, DirectionPref, EffectKind, EffectRule, GlyphChoice,
    Glyphs,
};
pub use table::{RuleTable, RULE_TABLE_VERSION};
