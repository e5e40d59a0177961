//! Balloon lifecycle manager.
//!
//! ## State Transitions
//!
//! ```text
//! Spawned -> Popping -> Removed
//! ```
//!
//! `Popping` is entered once; further pops are ignored. Removal happens a
//! fixed pop-animation time after popping began. Popping balloons still
//! count against the population cap until they are removed.

use std::fmt;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::scheduler::{TimerQueue, TimerTask};

/// Balloon colors, sampled uniformly.
pub const BALLOON_COLORS: [&str; 10] = [
    "#ff6b6b", // red
    "#4ecdc4", // teal
    "#feca57", // yellow
    "#48e5a3", // green
    "#ff9ff3", // pink
    "#54a0ff", // blue
    "#5f27cd", // purple
    "#00d2d3", // cyan
    "#ff9f43", // orange
    "#10ac84", // emerald
];

/// Batch size that still spawns at the full per-balloon delay.
pub const PACING_BASE_COUNT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalloonId(pub u64);

impl fmt::Display for BalloonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "balloon-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalloonState {
    Spawned,
    Popping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balloon {
    pub id: BalloonId,
    pub color: String,
    /// Horizontal position in `[2, 98)` percent.
    pub left_pct: f64,
    pub is_popping: bool,
}

impl Balloon {
    pub fn state(&self) -> BalloonState {
        if self.is_popping {
            BalloonState::Popping
        } else {
            BalloonState::Spawned
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopOptions {
    #[serde(default)]
    pub loud: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalloonSettings {
    /// Maximum live balloons, popping ones included.
    pub max: u32,
    /// Pause between creations for batches up to [`PACING_BASE_COUNT`].
    pub spawn_delay: Duration,
    pub pop_base_delay: Duration,
    pub pop_random_variation: Duration,
    /// Time from popping to removal.
    pub pop_duration: Duration,
}

impl Default for BalloonSettings {
    fn default() -> Self {
        Self {
            max: 100,
            spawn_delay: Duration::from_millis(200),
            pop_base_delay: Duration::from_millis(200),
            pop_random_variation: Duration::from_millis(10_000),
            pop_duration: Duration::from_millis(500),
        }
    }
}

/// How many balloons a spawn request will create and how far apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    pub count: u32,
    pub pause: Duration,
}

/// Pause between creations for a batch of `n`: the full delay up to
/// [`PACING_BASE_COUNT`] balloons, scaled down beyond that so a batch never
/// takes longer than the base count would at full delay.
pub fn pacing_pause(n: u32, base_delay: Duration) -> Duration {
    if n <= 1 {
        return Duration::ZERO;
    }
    let ratio = f64::from(PACING_BASE_COUNT - 1) / f64::from(n - 1);
    base_delay.mul_f64(ratio.min(1.0))
}

#[derive(Debug, Default)]
pub struct BalloonManager {
    settings: BalloonSettings,
    next_id: u64,
    live: Vec<Balloon>,
}

impl BalloonManager {
    pub fn new(settings: BalloonSettings) -> Self {
        Self {
            settings,
            next_id: 0,
            live: Vec::new(),
        }
    }

    pub fn settings(&self) -> &BalloonSettings {
        &self.settings
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.live
    }

    pub fn get(&self, id: BalloonId) -> Option<&Balloon> {
        self.live.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn headroom(&self) -> u32 {
        let live = u32::try_from(self.live.len()).unwrap_or(u32::MAX);
        self.settings.max.saturating_sub(live)
    }

    /// Validate a spawn request against the cap. `None` means nothing to do.
    pub fn plan_spawn(&self, requested: u32) -> Option<SpawnPlan> {
        if requested == 0 || requested > self.settings.max {
            tracing::debug!(requested, max = self.settings.max, "balloon spawn rejected");
            return None;
        }
        let count = requested.min(self.headroom());
        if count == 0 {
            tracing::debug!(requested, "no balloon headroom");
            return None;
        }
        if count < requested {
            tracing::debug!(requested, count, "balloon spawn clamped to headroom");
        }
        Some(SpawnPlan {
            count,
            pause: pacing_pause(count, self.settings.spawn_delay),
        })
    }

    /// Create one balloon and schedule its pop, if the cap allows.
    pub fn inflate_one<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        timers: &mut TimerQueue,
    ) -> Option<&Balloon> {
        if self.headroom() == 0 {
            return None;
        }

        self.next_id += 1;
        let id = BalloonId(self.next_id);
        let color = BALLOON_COLORS
            .choose(rng)
            .copied()
            .unwrap_or(BALLOON_COLORS[0])
            .to_string();
        let left_pct = rng.gen_range(2.0..98.0);

        let variation = self.settings.pop_random_variation.as_secs_f64();
        let jitter = if variation > 0.0 {
            Duration::from_secs_f64(rng.gen_range(0.0..variation))
        } else {
            Duration::ZERO
        };
        timers.schedule_after(self.settings.pop_base_delay + jitter, TimerTask::PopBalloon(id));

        self.live.push(Balloon {
            id,
            color,
            left_pct,
            is_popping: false,
        });
        self.live.last()
    }

    /// Start popping a balloon and schedule its removal. `None` if the
    /// balloon is gone or already popping.
    pub fn pop(&mut self, id: BalloonId, timers: &mut TimerQueue) -> Option<&Balloon> {
        let pop_duration = self.settings.pop_duration;
        let balloon = self.live.iter_mut().find(|b| b.id == id)?;
        if balloon.is_popping {
            return None;
        }
        balloon.is_popping = true;
        timers.schedule_after(pop_duration, TimerTask::RemoveBalloon(id));
        Some(&*balloon)
    }

    /// Hard-remove a balloon. Already-removed ids are a no-op.
    pub fn remove(&mut self, id: BalloonId) -> Option<Balloon> {
        let index = self.live.iter().position(|b| b.id == id)?;
        Some(self.live.remove(index))
    }

    /// Drop every live balloon. Pending pops and removals become no-ops.
    pub fn clear(&mut self) -> usize {
        let cleared = self.live.len();
        self.live.clear();
        cleared
    }
}
