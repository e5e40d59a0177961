//! # typefx Core Library
//!
//! This library provides the engine behind typefx: short-lived visual effects
//! triggered by what the user types. It implements a CLI-first philosophy
//! where every operation is available through the standalone `typefx`
//! binary, with any renderer being a thin layer polling the same engine.
//!
//! ## Architecture
//!
//! - **Rules**: An ordered, declarative table of regex-driven rules, embedded
//!   as TOML and optionally replaced by a custom file
//! - **Effects**: Particle and balloon lifecycles on a virtual clock that the
//!   caller advances; no internal threads
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`RuleTable`]: Rule loading and matching (`match_all`)
//! - [`EffectsEngine`]: Dispatcher owning both lifecycles and the clock
//! - [`Config`]: Application configuration management
//! - [`AudioSink`]: Trait for sound cue playback

pub mod effects;
pub mod error;
pub mod events;
pub mod rules;
pub mod storage;

pub use effects::{
    AudioSink, Balloon, BalloonId, BalloonSettings, CueLog, CueProfile, Dispatch, EffectsEngine,
    EngineSettings, FiredRule, NullAudio, Particle, ParticleId, ParticleSettings, PopOptions,
    SoundCue,
};
pub use error::{ConfigError, CoreError, Result, RuleError};
pub use events::EffectEvent;
pub use rules::{first_bare_number, EffectKind, EffectRule, Firing, ResolvedOptions, RuleTable};
pub use storage::Config;
