//! Effect dispatcher.
//!
//! The engine owns the rule table, both entity managers and the virtual
//! clock. It does not use internal threads - the caller feeds it lines with
//! `handle_line()` and moves time forward with `advance_to()`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = EffectsEngine::new(RuleTable::builtin()?, EngineSettings::default());
//! engine.handle_line("$100 for pizza");
//! engine.advance_by(Duration::from_millis(16));
//! for event in engine.drain_events() { /* render */ }
//! ```

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;

use super::audio::{AudioSink, NullAudio, SoundCue};
use super::balloons::{Balloon, BalloonId, BalloonManager, BalloonSettings, PopOptions};
use super::particles::{Particle, ParticleManager, ParticleSettings};
use super::scheduler::{TimerQueue, TimerTask};
use crate::events::EffectEvent;
use crate::rules::{first_bare_number, EffectKind, ResolvedOptions, RuleTable};

/// Tunables for a new engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub balloons: BalloonSettings,
    pub particles: ParticleSettings,
    pub audio_enabled: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            balloons: BalloonSettings::default(),
            particles: ParticleSettings::default(),
            audio_enabled: true,
        }
    }
}

/// One rule that fired for a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredRule {
    pub rule_id: String,
    pub kind: EffectKind,
    pub count: u32,
    /// Particles actually created after the per-call cap.
    pub spawned: u32,
}

/// What a typed line turned into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "dispatch", rename_all = "snake_case")]
pub enum Dispatch {
    Particles { fired: Vec<FiredRule> },
    /// No rule fired; a bare number asked for balloons.
    Balloons { requested: u32, planned: u32 },
    Nothing,
}

pub struct EffectsEngine<R = Pcg64Mcg, A = NullAudio> {
    rules: RuleTable,
    particles: ParticleManager,
    balloons: BalloonManager,
    timers: TimerQueue,
    rng: R,
    audio: A,
    audio_enabled: bool,
    events: Vec<EffectEvent>,
}

impl EffectsEngine<Pcg64Mcg, NullAudio> {
    /// Engine seeded from OS randomness with audio discarded.
    pub fn new(rules: RuleTable, settings: EngineSettings) -> Self {
        Self::with_parts(rules, settings, Pcg64Mcg::from_entropy(), NullAudio)
    }

    /// Engine with a fixed seed, for reproducible runs.
    pub fn seeded(rules: RuleTable, settings: EngineSettings, seed: u64) -> Self {
        Self::with_parts(rules, settings, Pcg64Mcg::seed_from_u64(seed), NullAudio)
    }
}

impl<R: Rng, A: AudioSink> EffectsEngine<R, A> {
    pub fn with_parts(rules: RuleTable, settings: EngineSettings, rng: R, audio: A) -> Self {
        Self {
            rules,
            particles: ParticleManager::new(settings.particles),
            balloons: BalloonManager::new(settings.balloons),
            timers: TimerQueue::new(),
            rng,
            audio,
            audio_enabled: settings.audio_enabled,
            events: Vec::new(),
        }
    }

    /// Swap the audio sink, keeping all other state.
    pub fn with_audio<B: AudioSink>(self, audio: B) -> EffectsEngine<R, B> {
        EffectsEngine {
            rules: self.rules,
            particles: self.particles,
            balloons: self.balloons,
            timers: self.timers,
            rng: self.rng,
            audio,
            audio_enabled: self.audio_enabled,
            events: self.events,
        }
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Route a typed line: every firing rule spawns particles; if none
    /// fire, the first bare positive number spawns balloons.
    pub fn handle_line(&mut self, text: &str) -> Dispatch {
        let firings = self.rules.match_all(text, &mut self.rng);

        if firings.is_empty() {
            drop(firings);
            let max = self.balloons.settings().max;
            let Some(requested) = first_bare_number(text, max) else {
                return Dispatch::Nothing;
            };
            let at_ms = self.now_ms();
            self.events.push(EffectEvent::NumberTriggered {
                count: requested,
                at_ms,
            });
            let planned = self.spawn_balloons(requested);
            return Dispatch::Balloons { requested, planned };
        }

        let mut fired = Vec::with_capacity(firings.len());
        for firing in firings {
            let at_ms = self.timers.now().as_millis() as u64;
            self.events.push(EffectEvent::RuleFired {
                rule_id: firing.rule.id.clone(),
                kind: firing.kind,
                count: firing.count,
                at_ms,
            });

            let created = self.particles.spawn(
                firing.kind,
                firing.count,
                &firing.options,
                &mut self.rng,
                &mut self.timers,
            );
            let spawned = created.len() as u32;
            self.events
                .extend(created.iter().cloned().map(|particle| EffectEvent::ParticleSpawned {
                    particle,
                    at_ms,
                }));

            fired.push(FiredRule {
                rule_id: firing.rule.id.clone(),
                kind: firing.kind,
                count: firing.count,
                spawned,
            });
        }
        Dispatch::Particles { fired }
    }

    // ── Particles ───────────────────────────────────────────────────

    /// Spawn a particle batch directly. Returns how many were created.
    pub fn spawn_particles(
        &mut self,
        kind: EffectKind,
        count: u32,
        options: &ResolvedOptions,
    ) -> usize {
        let at_ms = self.now_ms();
        let created = self
            .particles
            .spawn(kind, count, options, &mut self.rng, &mut self.timers);
        let n = created.len();
        self.events
            .extend(created.iter().cloned().map(|particle| EffectEvent::ParticleSpawned {
                particle,
                at_ms,
            }));
        n
    }

    pub fn clear_particles(&mut self) -> usize {
        let count = self.particles.clear();
        let at_ms = self.now_ms();
        self.events.push(EffectEvent::ParticlesCleared { count, at_ms });
        count
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.particles()
    }

    // ── Balloons ────────────────────────────────────────────────────

    /// Start a paced balloon batch. The first balloon appears immediately,
    /// the rest follow on the clock. Returns the planned batch size; 0 when
    /// the request is out of range or there is no headroom.
    pub fn spawn_balloons(&mut self, count: u32) -> u32 {
        let Some(plan) = self.balloons.plan_spawn(count) else {
            return 0;
        };
        tracing::debug!(
            count = plan.count,
            pause_ms = plan.pause.as_millis() as u64,
            "balloon batch started"
        );
        self.spawn_step(plan.count, plan.pause);
        plan.count
    }

    /// Begin popping a balloon. Returns false if it is gone or already
    /// popping.
    pub fn pop_balloon(&mut self, id: BalloonId, options: PopOptions) -> bool {
        if self.balloons.pop(id, &mut self.timers).is_none() {
            tracing::debug!(%id, "pop ignored");
            return false;
        }
        self.play(if options.loud {
            SoundCue::LoudPop
        } else {
            SoundCue::Pop
        });
        let at_ms = self.now_ms();
        self.events.push(EffectEvent::BalloonPopping {
            id,
            loud: options.loud,
            at_ms,
        });
        true
    }

    pub fn clear_balloons(&mut self) -> usize {
        let count = self.balloons.clear();
        let at_ms = self.now_ms();
        self.events.push(EffectEvent::BalloonsCleared { count, at_ms });
        count
    }

    pub fn balloons(&self) -> &[Balloon] {
        self.balloons.balloons()
    }

    /// Create the next balloon of a batch. A zero pause creates the rest of
    /// the batch immediately.
    fn spawn_step(&mut self, mut remaining: u32, pause: Duration) {
        while remaining > 0 {
            let Some(balloon) = self
                .balloons
                .inflate_one(&mut self.rng, &mut self.timers)
                .cloned()
            else {
                tracing::debug!(remaining, "balloon cap reached, batch ended");
                return;
            };
            self.play(SoundCue::Inflate);
            let at_ms = self.now_ms();
            self.events.push(EffectEvent::BalloonSpawned { balloon, at_ms });

            remaining -= 1;
            if remaining > 0 && !pause.is_zero() {
                self.timers
                    .schedule_after(pause, TimerTask::SpawnBalloon { remaining, pause });
                return;
            }
        }
    }

    // ── Clock ───────────────────────────────────────────────────────

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    /// Fire every timer due at or before `t`, then settle the clock at `t`.
    /// Returns the number of timers fired.
    pub fn advance_to(&mut self, t: Duration) -> usize {
        let mut fired = 0;
        while let Some(task) = self.timers.pop_due(t) {
            tracing::trace!(?task, now_ms = self.now_ms(), "timer fired");
            self.run_task(task);
            fired += 1;
        }
        self.timers.settle_at(t);
        fired
    }

    pub fn advance_by(&mut self, d: Duration) -> usize {
        self.advance_to(self.timers.now() + d)
    }

    /// Run the clock until no timers remain.
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.timers.next_deadline() {
            fired += self.advance_to(deadline);
        }
        fired
    }

    fn run_task(&mut self, task: TimerTask) {
        match task {
            TimerTask::ExpireParticle(id) => {
                if self.particles.expire(id).is_some() {
                    let at_ms = self.now_ms();
                    self.events.push(EffectEvent::ParticleExpired { id, at_ms });
                }
            }
            TimerTask::PopBalloon(id) => {
                self.pop_balloon(id, PopOptions::default());
            }
            TimerTask::RemoveBalloon(id) => {
                if self.balloons.remove(id).is_some() {
                    let at_ms = self.now_ms();
                    self.events.push(EffectEvent::BalloonRemoved { id, at_ms });
                }
            }
            TimerTask::SpawnBalloon { remaining, pause } => self.spawn_step(remaining, pause),
        }
    }

    // ── Observation ─────────────────────────────────────────────────

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<EffectEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
    }

    /// Flip audio on or off, returning the new state.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_enabled = !self.audio_enabled;
        self.audio_enabled
    }

    fn play(&mut self, cue: SoundCue) {
        if self.audio_enabled {
            self.audio.play(cue);
        }
    }

    fn now_ms(&self) -> u64 {
        self.timers.now().as_millis() as u64
    }
}
