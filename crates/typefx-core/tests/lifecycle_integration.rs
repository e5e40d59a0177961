//! Integration tests for particle and balloon lifecycles on the virtual clock.

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use typefx_core::rules::{AnimationOptions, GlyphChoice};
use typefx_core::{
    BalloonSettings, CueLog, EffectEvent, EffectKind, EffectsEngine, EngineSettings, PopOptions,
    ResolvedOptions, RuleTable, SoundCue,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn engine_with(balloons: BalloonSettings) -> EffectsEngine<Pcg64Mcg, CueLog> {
    EffectsEngine::with_parts(
        RuleTable::builtin().unwrap(),
        EngineSettings {
            balloons,
            ..Default::default()
        },
        Pcg64Mcg::seed_from_u64(7),
        CueLog::default(),
    )
}

/// Balloons that never pop on their own within a test run.
fn sticky_balloons() -> BalloonSettings {
    BalloonSettings {
        pop_base_delay: Duration::from_secs(3600),
        pop_random_variation: Duration::ZERO,
        ..Default::default()
    }
}

#[test]
fn test_particle_lives_for_delay_duration_and_buffer() {
    let mut e = engine_with(BalloonSettings::default());
    let options = ResolvedOptions {
        animation: AnimationOptions {
            min_duration: Some(4000),
            max_duration: Some(4000),
            stagger: Some(0),
            ..Default::default()
        },
        glyphs: GlyphChoice::Emoji("🎈".into()),
        direction: None,
    };

    assert_eq!(e.spawn_particles(EffectKind::Float, 1, &options), 1);
    assert_eq!(e.particles()[0].duration_ms, 4000);
    assert_eq!(e.particles()[0].delay_ms, 0);

    e.advance_to(ms(4499));
    assert_eq!(e.particles().len(), 1);
    e.advance_to(ms(4500));
    assert!(e.particles().is_empty());
}

#[test]
fn test_clear_particles_makes_pending_expiry_a_noop() {
    let mut e = engine_with(BalloonSettings::default());
    e.handle_line("snow");
    let live = e.particles().len();
    assert!(live > 0);

    assert_eq!(e.clear_particles(), live);
    e.drain_events();
    e.run_until_idle();
    assert!(e.particles().is_empty());
    assert!(!e
        .drain_events()
        .iter()
        .any(|ev| matches!(ev, EffectEvent::ParticleExpired { .. })));
}

#[test]
fn test_typing_999_fills_to_the_cap() {
    let mut e = engine_with(sticky_balloons());
    assert_eq!(
        e.handle_line("999"),
        typefx_core::Dispatch::Balloons {
            requested: 100,
            planned: 100
        }
    );
    e.advance_to(ms(60_000));
    assert_eq!(e.balloons().len(), 100);
    assert_eq!(e.audio().count(SoundCue::Inflate), 100);
}

#[test]
fn test_direct_spawn_over_max_is_rejected() {
    let mut e = engine_with(sticky_balloons());
    assert_eq!(e.spawn_balloons(999), 0);
    assert_eq!(e.spawn_balloons(0), 0);
    assert!(e.balloons().is_empty());
    assert_eq!(e.pending_timers(), 0);
}

#[test]
fn test_batches_are_paced() {
    let mut e = engine_with(sticky_balloons());
    e.spawn_balloons(100);
    assert_eq!(e.balloons().len(), 1);
    e.advance_to(ms(199));
    assert_eq!(e.balloons().len(), 1);
    e.advance_to(ms(200));
    assert_eq!(e.balloons().len(), 2);
    e.advance_to(ms(99 * 200));
    assert_eq!(e.balloons().len(), 100);
}

#[test]
fn test_large_batch_is_paced_faster() {
    let mut e = engine_with(BalloonSettings {
        max: 200,
        ..sticky_balloons()
    });
    e.spawn_balloons(200);
    // 99/199 of 200ms per step; the whole batch lands within ~19.8s.
    e.advance_to(ms(19_801));
    assert_eq!(e.balloons().len(), 200);
}

#[test]
fn test_second_batch_is_clamped_to_headroom() {
    let mut e = engine_with(BalloonSettings {
        max: 10,
        ..sticky_balloons()
    });
    assert_eq!(e.spawn_balloons(6), 6);
    e.advance_to(ms(5_000));
    assert_eq!(e.spawn_balloons(6), 4);
    e.advance_to(ms(10_000));
    assert_eq!(e.balloons().len(), 10);
    assert_eq!(e.spawn_balloons(1), 0);
}

#[test]
fn test_overlapping_batches_stop_at_the_cap() {
    let mut e = engine_with(BalloonSettings {
        max: 10,
        ..sticky_balloons()
    });
    assert_eq!(e.spawn_balloons(8), 8);
    assert_eq!(e.spawn_balloons(8), 8);
    e.advance_to(ms(10_000));
    assert_eq!(e.balloons().len(), 10);
    assert_eq!(e.pending_timers(), 10);
}

#[test]
fn test_pop_is_idempotent_and_removes_after_pop_duration() {
    let mut e = engine_with(sticky_balloons());
    e.spawn_balloons(1);
    let id = e.balloons()[0].id;

    e.advance_to(ms(1000));
    assert!(e.pop_balloon(id, PopOptions::default()));
    assert!(!e.pop_balloon(id, PopOptions { loud: true }));
    assert_eq!(e.audio().count(SoundCue::Pop), 1);
    assert_eq!(e.audio().count(SoundCue::LoudPop), 0);
    assert!(e.balloons()[0].is_popping);

    e.advance_to(ms(1499));
    assert_eq!(e.balloons().len(), 1);
    e.advance_to(ms(1500));
    assert!(e.balloons().is_empty());
    assert!(!e.pop_balloon(id, PopOptions::default()));
}

#[test]
fn test_balloons_pop_on_their_own() {
    let mut e = engine_with(BalloonSettings::default());
    e.spawn_balloons(1);
    // Latest pop is 200ms + 10s of jitter, then 500ms to removal.
    e.advance_to(ms(10_700));
    assert!(e.balloons().is_empty());
    assert_eq!(e.audio().count(SoundCue::Pop), 1);
}

#[test]
fn test_clear_does_not_cancel_in_flight_batch() {
    let mut e = engine_with(sticky_balloons());
    e.spawn_balloons(5);
    e.advance_to(ms(200));
    assert_eq!(e.clear_balloons(), 2);
    assert!(e.balloons().is_empty());

    e.advance_to(ms(800));
    assert_eq!(e.balloons().len(), 3);
}

#[test]
fn test_muted_audio_still_runs_lifecycle() {
    let mut e = engine_with(BalloonSettings::default());
    e.set_audio_enabled(false);
    e.handle_line("4");
    e.run_until_idle();
    assert!(e.audio().cues().is_empty());
    assert!(e.balloons().is_empty());
    assert!(!e.is_audio_enabled());
}
