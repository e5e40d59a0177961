//! Particle lifecycle manager.
//!
//! Particles are immutable once created. Each one schedules its own removal
//! for `delay + duration + buffer` after creation.

use std::fmt;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::scheduler::{TimerQueue, TimerTask};
use crate::rules::matcher::random_direction;
use crate::rules::rule::{is_valid_scale, DEFAULT_GLYPH};
use crate::rules::{Direction, EffectKind, ResolvedOptions};

pub const DEFAULT_MIN_DURATION_MS: u32 = 3500;
pub const DEFAULT_MAX_DURATION_MS: u32 = 7000;
pub const DEFAULT_STAGGER_MS: u32 = 1000;
pub const DEFAULT_MIN_SIZE: u32 = 24;
pub const DEFAULT_MAX_SIZE: u32 = 48;
pub const DEFAULT_SCALE_MIN: f64 = 1.5;
pub const DEFAULT_SCALE_MAX: f64 = 3.0;
pub const DEFAULT_SPIN_MIN_MS: u32 = 4000;
pub const DEFAULT_SPIN_MAX_MS: u32 = 9000;
pub const MIN_PARTICLE_SIZE: u32 = 8;

/// Per-manager id, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect-{}", self.0)
    }
}

/// A single live emoji particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    pub kind: EffectKind,
    pub glyph: String,
    /// Horizontal position, percent of the viewport width.
    pub left_pct: u32,
    /// Vertical position, percent of the viewport height.
    pub top_pct: u32,
    pub size: u32,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_ms: Option<u32>,
}

/// Limits applied to every spawn call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSettings {
    /// Per-call maximum when the options don't set one.
    pub max_per_call: u32,
    /// Extra time a particle stays alive after its animation ends.
    pub removal_buffer: Duration,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            max_per_call: 150,
            removal_buffer: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParticleManager {
    settings: ParticleSettings,
    next_id: u64,
    live: Vec<Particle>,
}

impl ParticleManager {
    pub fn new(settings: ParticleSettings) -> Self {
        Self {
            settings,
            next_id: 0,
            live: Vec::new(),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.live
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.live.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Create up to `requested` particles and schedule their removal.
    /// Returns the newly created particles.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        kind: EffectKind,
        requested: u32,
        options: &ResolvedOptions,
        rng: &mut R,
        timers: &mut TimerQueue,
    ) -> &[Particle] {
        let a = &options.animation;
        let count = requested.min(a.max_per_call.unwrap_or(self.settings.max_per_call));
        let first_new = self.live.len();

        let min_duration = a.min_duration.unwrap_or(DEFAULT_MIN_DURATION_MS);
        let max_duration = a.max_duration.unwrap_or(DEFAULT_MAX_DURATION_MS);
        let stagger = a.stagger.unwrap_or(DEFAULT_STAGGER_MS);
        let min_size = a.min_size.unwrap_or(DEFAULT_MIN_SIZE);
        let max_size = a.max_size.unwrap_or(DEFAULT_MAX_SIZE);
        let scale_min = sane_scale(a.scale_min, DEFAULT_SCALE_MIN);
        let scale_max = sane_scale(a.scale_max, DEFAULT_SCALE_MAX);
        let glyphs = options.glyphs.as_slice();

        for _ in 0..count {
            self.next_id += 1;
            let id = ParticleId(self.next_id);

            let glyph = glyphs
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_GLYPH.to_string());
            let left_pct = uniform_floor(rng, 2, 98);
            let top_pct = uniform_floor(rng, 0, 80);
            let duration_ms = uniform_floor(rng, min_duration, max_duration);
            let delay_ms = uniform_floor(rng, 0, stagger);
            let base = uniform_floor(rng, min_size, max_size);
            let scale = if scale_max > scale_min {
                rng.gen_range(scale_min..scale_max)
            } else {
                scale_min
            };
            let size = ((f64::from(base) * scale).floor() as u32).max(MIN_PARTICLE_SIZE);
            let direction = options.direction.unwrap_or_else(|| random_direction(rng));
            let spin_ms = a.rotate.then(|| {
                uniform_floor(
                    rng,
                    a.rotate_min.unwrap_or(DEFAULT_SPIN_MIN_MS),
                    a.rotate_max.unwrap_or(DEFAULT_SPIN_MAX_MS),
                )
            });

            let lifetime = Duration::from_millis(u64::from(delay_ms) + u64::from(duration_ms))
                + self.settings.removal_buffer;
            timers.schedule_after(lifetime, TimerTask::ExpireParticle(id));

            self.live.push(Particle {
                id,
                kind,
                glyph,
                left_pct,
                top_pct,
                size,
                duration_ms,
                delay_ms,
                direction,
                spin_ms,
            });
        }

        if count < requested {
            tracing::debug!(requested, count, kind = kind.as_str(), "particle spawn clamped");
        }
        &self.live[first_new..]
    }

    /// Remove a particle by id. Already-removed ids are a no-op.
    pub fn expire(&mut self, id: ParticleId) -> Option<Particle> {
        let index = self.live.iter().position(|p| p.id == id)?;
        Some(self.live.remove(index))
    }

    /// Drop every live particle. Pending removals become no-ops.
    pub fn clear(&mut self) -> usize {
        let cleared = self.live.len();
        self.live.clear();
        cleared
    }
}

/// Options built in code skip table validation; out-of-range scales fall
/// back to the default.
fn sane_scale(scale: Option<f64>, default: f64) -> f64 {
    scale.filter(|s| is_valid_scale(*s)).unwrap_or(default)
}

/// `floor(uniform[min, max))`, or `min` when the range is empty.
fn uniform_floor<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AnimationOptions, GlyphChoice};
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn options(animation: AnimationOptions) -> ResolvedOptions {
        ResolvedOptions {
            animation,
            glyphs: GlyphChoice::EmojiSet(vec!["🎉".into(), "🎊".into()]),
            direction: None,
        }
    }

    #[test]
    fn spawn_samples_within_bounds() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::default();

        let created = mgr
            .spawn(EffectKind::Burst, 50, &options(AnimationOptions::default()), &mut rng, &mut timers)
            .len();
        assert_eq!(created, 50);
        assert_eq!(timers.pending(), 50);

        for p in mgr.particles() {
            assert!((2..98).contains(&p.left_pct));
            assert!(p.top_pct < 80);
            assert!((3500..7000).contains(&p.duration_ms));
            assert!(p.delay_ms < 1000);
            assert!(p.size >= 36 && p.size < 144, "size {}", p.size);
            assert!(p.glyph == "🎉" || p.glyph == "🎊");
            assert!(p.spin_ms.is_none());
        }
    }

    #[test]
    fn spawn_respects_max_per_call() {
        let mut rng = Pcg64Mcg::seed_from_u64(2);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::new(ParticleSettings::default());

        assert_eq!(
            mgr.spawn(EffectKind::Rain, 400, &options(AnimationOptions::default()), &mut rng, &mut timers)
                .len(),
            150
        );

        let capped = AnimationOptions {
            max_per_call: Some(3),
            ..Default::default()
        };
        assert_eq!(
            mgr.spawn(EffectKind::Rain, 10, &options(capped), &mut rng, &mut timers).len(),
            3
        );
        assert_eq!(mgr.len(), 153);
    }

    #[test]
    fn pinned_direction_applies_to_batch() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::default();
        let mut opts = options(AnimationOptions::default());
        opts.direction = Some(Direction::Right);

        mgr.spawn(EffectKind::Run, 20, &opts, &mut rng, &mut timers);
        assert!(mgr.particles().iter().all(|p| p.direction == Direction::Right));
    }

    #[test]
    fn ids_are_not_reused_and_expire_is_idempotent() {
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::default();
        let opts = options(AnimationOptions::default());

        let first = mgr.spawn(EffectKind::Float, 1, &opts, &mut rng, &mut timers)[0].id;
        assert!(mgr.expire(first).is_some());
        assert!(mgr.expire(first).is_none());

        mgr.spawn(EffectKind::Float, 1, &opts, &mut rng, &mut timers);
        assert_ne!(mgr.particles()[0].id, first);

        assert_eq!(mgr.clear(), 1);
        assert!(mgr.is_empty());
    }

    #[test]
    fn rotate_samples_spin_period() {
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::default();
        let opts = options(AnimationOptions {
            rotate: true,
            rotate_min: Some(4000),
            rotate_max: Some(9000),
            ..Default::default()
        });

        mgr.spawn(EffectKind::Rain, 10, &opts, &mut rng, &mut timers);
        assert!(mgr
            .particles()
            .iter()
            .all(|p| matches!(p.spin_ms, Some(ms) if (4000..9000).contains(&ms))));
    }

    #[test]
    fn unusable_scale_falls_back_to_default() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::default();
        let opts = options(AnimationOptions {
            min_size: Some(10),
            max_size: Some(10),
            scale_min: Some(-1e308),
            scale_max: Some(f64::NAN),
            ..Default::default()
        });

        mgr.spawn(EffectKind::Burst, 20, &opts, &mut rng, &mut timers);
        assert!(mgr.particles().iter().all(|p| (15..30).contains(&p.size)));
    }

    #[test]
    fn size_has_a_floor() {
        let mut rng = Pcg64Mcg::seed_from_u64(6);
        let mut timers = TimerQueue::new();
        let mut mgr = ParticleManager::default();
        let opts = options(AnimationOptions {
            min_size: Some(1),
            max_size: Some(2),
            scale_min: Some(1.0),
            scale_max: Some(1.0),
            ..Default::default()
        });

        mgr.spawn(EffectKind::Float, 5, &opts, &mut rng, &mut timers);
        assert!(mgr.particles().iter().all(|p| p.size == MIN_PARTICLE_SIZE));
    }
}
