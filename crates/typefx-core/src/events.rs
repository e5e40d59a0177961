use serde::{Deserialize, Serialize};

use crate::effects::{Balloon, BalloonId, Particle, ParticleId};
use crate::rules::EffectKind;

/// Every state change in the engine produces an Event.
/// Renderers poll for events; `at_ms` is virtual time since engine start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EffectEvent {
    RuleFired {
        rule_id: String,
        kind: EffectKind,
        count: u32,
        at_ms: u64,
    },
    /// No rule fired and a bare number requested balloons.
    NumberTriggered {
        count: u32,
        at_ms: u64,
    },
    ParticleSpawned {
        particle: Particle,
        at_ms: u64,
    },
    ParticleExpired {
        id: ParticleId,
        at_ms: u64,
    },
    ParticlesCleared {
        count: usize,
        at_ms: u64,
    },
    BalloonSpawned {
        balloon: Balloon,
        at_ms: u64,
    },
    BalloonPopping {
        id: BalloonId,
        loud: bool,
        at_ms: u64,
    },
    BalloonRemoved {
        id: BalloonId,
        at_ms: u64,
    },
    BalloonsCleared {
        count: usize,
        at_ms: u64,
    },
}

impl EffectEvent {
    pub fn at_ms(&self) -> u64 {
        match self {
            EffectEvent::RuleFired { at_ms, .. }
            | EffectEvent::NumberTriggered { at_ms, .. }
            | EffectEvent::ParticleSpawned { at_ms, .. }
            | EffectEvent::ParticleExpired { at_ms, .. }
            | EffectEvent::ParticlesCleared { at_ms, .. }
            | EffectEvent::BalloonSpawned { at_ms, .. }
            | EffectEvent::BalloonPopping { at_ms, .. }
            | EffectEvent::BalloonRemoved { at_ms, .. }
            | EffectEvent::BalloonsCleared { at_ms, .. } => *at_ms,
        }
    }
}
