//! Property tests for the balloon population cap and rule count clamping.

use std::time::Duration;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use typefx_core::{BalloonSettings, EffectsEngine, EngineSettings, NullAudio, PopOptions, RuleTable};

#[derive(Debug, Clone)]
enum Op {
    Spawn(u32),
    Type(u32),
    Advance(u64),
    PopFirst(bool),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..300).prop_map(Op::Spawn),
        (0u32..2000).prop_map(Op::Type),
        (0u64..3000).prop_map(Op::Advance),
        any::<bool>().prop_map(Op::PopFirst),
        Just(Op::Clear),
    ]
}

proptest! {
    #[test]
    fn live_balloons_never_exceed_max(
        max in 1u32..60,
        seed in any::<u64>(),
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let settings = EngineSettings {
            balloons: BalloonSettings { max, ..Default::default() },
            ..Default::default()
        };
        let mut e = EffectsEngine::with_parts(
            RuleTable::builtin().unwrap(),
            settings,
            Pcg64Mcg::seed_from_u64(seed),
            NullAudio,
        );

        for op in ops {
            match op {
                Op::Spawn(n) => {
                    let planned = e.spawn_balloons(n);
                    prop_assert!(planned <= max);
                }
                Op::Type(n) => {
                    e.handle_line(&n.to_string());
                }
                Op::Advance(ms) => {
                    e.advance_by(Duration::from_millis(ms));
                }
                Op::PopFirst(loud) => {
                    if let Some(id) = e.balloons().first().map(|b| b.id) {
                        e.pop_balloon(id, PopOptions { loud });
                    }
                }
                Op::Clear => {
                    e.clear_balloons();
                }
            }
            prop_assert!(e.balloons().len() <= max as usize);
        }

        e.run_until_idle();
        prop_assert!(e.balloons().is_empty());
    }

    #[test]
    fn extracted_count_is_clamped_to_rule_cap(n in 0u64..1_000_000) {
        let table = RuleTable::builtin().unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(n);
        let firings = table.match_all(&format!("{n} stars"), &mut rng);
        let stars = firings.iter().find(|f| f.rule.id == "stars-float").unwrap();
        prop_assert_eq!(u64::from(stars.count), n.clamp(1, 120));
    }

    #[test]
    fn fallback_never_exceeds_max(n in 1u64..100_000, max in 1u32..500) {
        let got = typefx_core::first_bare_number(&format!("{n} balloons"), max);
        prop_assert_eq!(got.map(u64::from), Some(n.min(u64::from(max))));
    }
}
