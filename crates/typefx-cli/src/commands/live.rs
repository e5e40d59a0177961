//! Real-time driver: wall-clock time since start is the engine's clock.
//!
//! Lines starting with `:` are commands (`:pop <id>`, `:loudpop <id>`,
//! `:clear`, `:mute`, `:quit`); anything else is typed text.

use clap::Args;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use typefx_core::{AudioSink, BalloonId, EffectsEngine, PopOptions, SoundCue};

#[derive(Args)]
pub struct LiveArgs {
    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Prints each cue with its synthesis profile.
struct StdoutAudio;

impl AudioSink for StdoutAudio {
    fn play(&mut self, cue: SoundCue) {
        let line = json!({ "type": "Sound", "cue": cue, "profile": cue.profile() });
        println!("{line}");
    }
}

pub fn run(args: LiveArgs) -> typefx_core::Result<()> {
    let engine = super::engine_from_config(args.seed)?.with_audio(StdoutAudio);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(drive(engine))
}

async fn drive<R: rand::Rng>(
    mut engine: EffectsEngine<R, StdoutAudio>,
) -> typefx_core::Result<()> {
    let start = Instant::now();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = engine.next_deadline().map(|d| start + d);
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                engine.advance_to(start.elapsed());
                if !handle_input(&mut engine, line.trim()) {
                    break;
                }
            }
            _ = sleep_until(deadline) => {
                engine.advance_to(start.elapsed());
            }
        }
        for event in engine.drain_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }
    Ok(())
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(t) => tokio::time::sleep_until(t).await,
        None => std::future::pending().await,
    }
}

/// Returns false when the user asked to quit.
fn handle_input<R: rand::Rng>(engine: &mut EffectsEngine<R, StdoutAudio>, input: &str) -> bool {
    let Some(command) = input.strip_prefix(':') else {
        engine.handle_line(input);
        return true;
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit"), _) => return false,
        (Some("clear"), _) => {
            engine.clear_particles();
            engine.clear_balloons();
        }
        (Some("mute"), _) => {
            let enabled = engine.toggle_audio();
            eprintln!("audio {}", if enabled { "on" } else { "off" });
        }
        (Some(verb @ ("pop" | "loudpop")), Some(id)) => match parse_balloon_id(id) {
            Some(id) => {
                let loud = verb == "loudpop";
                if !engine.pop_balloon(id, PopOptions { loud }) {
                    eprintln!("{id} is not poppable");
                }
            }
            None => eprintln!("bad balloon id: {id}"),
        },
        _ => eprintln!("unknown command: {input}"),
    }
    true
}

/// Accepts `balloon-7` or `7`.
fn parse_balloon_id(s: &str) -> Option<BalloonId> {
    s.strip_prefix("balloon-")
        .unwrap_or(s)
        .parse()
        .ok()
        .map(BalloonId)
}
