use clap::Args;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde_json::json;
use typefx_core::{first_bare_number, Config};

#[derive(Args)]
pub struct MatchArgs {
    /// Line of text to evaluate
    pub text: String,
    /// RNG seed for direction choices
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: MatchArgs) -> typefx_core::Result<()> {
    let config = Config::load_or_default();
    let table = config.rule_table()?;
    let mut rng = match args.seed.or(config.seed) {
        Some(seed) => Pcg64Mcg::seed_from_u64(seed),
        None => Pcg64Mcg::from_entropy(),
    };

    let firings = table.match_all(&args.text, &mut rng);
    if firings.is_empty() {
        let balloons = first_bare_number(&args.text, config.balloons.max);
        println!("{}", serde_json::to_string_pretty(&json!({ "balloons": balloons }))?);
    } else {
        println!("{}", serde_json::to_string_pretty(&firings)?);
    }
    Ok(())
}
