use std::time::Duration;

use clap::Args;
use serde_json::json;
use typefx_core::{CueLog, EffectEvent, EffectsEngine, SoundCue};

#[derive(Args)]
pub struct SimulateArgs {
    /// Lines typed at t=0, in order
    #[arg(required = true)]
    pub lines: Vec<String>,
    /// Stop the clock here instead of running until every effect is gone
    #[arg(long)]
    pub until_ms: Option<u64>,
    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: SimulateArgs) -> typefx_core::Result<()> {
    let mut engine = super::engine_from_config(args.seed)?.with_audio(CueLog::default());

    for line in &args.lines {
        let dispatch = engine.handle_line(line);
        tracing::debug!(?dispatch, line = line.as_str(), "line dispatched");
        print_events(engine.drain_events())?;
    }

    match args.until_ms {
        Some(ms) => {
            engine.advance_to(Duration::from_millis(ms));
        }
        None => {
            engine.run_until_idle();
        }
    }
    print_events(engine.drain_events())?;

    let summary = summary(&engine);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn print_events(events: Vec<EffectEvent>) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn summary<R: rand::Rng>(engine: &EffectsEngine<R, CueLog>) -> serde_json::Value {
    let audio = engine.audio();
    json!({
        "type": "Summary",
        "now_ms": engine.now().as_millis() as u64,
        "particles": engine.particles().len(),
        "balloons": engine.balloons().len(),
        "pending_timers": engine.pending_timers(),
        "sounds": {
            "inflate": audio.count(SoundCue::Inflate),
            "pop": audio.count(SoundCue::Pop),
            "loud_pop": audio.count(SoundCue::LoudPop),
        },
    })
}
