//! Effect lifecycles on a virtual clock.

pub mod audio;
pub mod balloons;
pub mod engine;
pub mod particles;
pub mod scheduler;

pub use audio::{AudioSink, CueLog, CueProfile, FilterKind, NullAudio, SoundCue};
pub use balloons::{
    pacing_pause, Balloon, BalloonId, BalloonManager, BalloonSettings, BalloonState, PopOptions,
    SpawnPlan, BALLOON_COLORS,
};
pub use engine::{Dispatch, EffectsEngine, EngineSettings, FiredRule};
pub use particles::{Particle, ParticleId, ParticleManager, ParticleSettings};
pub use scheduler::{TimerQueue, TimerTask};
