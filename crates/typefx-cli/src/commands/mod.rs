pub mod config;
pub mod live;
pub mod matching;
pub mod rules;
pub mod simulate;

use typefx_core::{Config, EffectsEngine, Result};

/// Engine from the user's config, with `seed` overriding the configured one.
pub(crate) fn engine_from_config(seed: Option<u64>) -> Result<EffectsEngine> {
    let mut config = Config::load_or_default();
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config.build_engine()?)
}
