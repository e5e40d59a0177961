use std::path::PathBuf;

use clap::Subcommand;
use serde::Serialize;
use typefx_core::rules::hints::hints_for;
use typefx_core::{Config, EffectKind, RuleTable};

#[derive(Subcommand)]
pub enum RulesAction {
    /// List the active rule table
    List,
    /// Print every trigger hint, one per line
    Hints,
    /// Validate a rule table file
    Check {
        /// Path to a TOML rule table
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct RuleRow<'a> {
    id: &'a str,
    kind: EffectKind,
    triggers: Vec<&'a str>,
    fallback: u32,
    cap: u32,
    hints: Vec<String>,
}

pub fn run(action: RulesAction) -> typefx_core::Result<()> {
    match action {
        RulesAction::List => {
            let table = Config::load_or_default().rule_table()?;
            let rows: Vec<RuleRow<'_>> = table
                .rules()
                .iter()
                .map(|rule| RuleRow {
                    id: &rule.id,
                    kind: rule.kind,
                    triggers: rule.triggers_any.iter().map(|p| p.source()).collect(),
                    fallback: rule.count.fallback,
                    cap: rule.count.cap,
                    hints: hints_for(rule),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        RulesAction::Hints => {
            let table = Config::load_or_default().rule_table()?;
            for hint in table.all_hints() {
                println!("{hint}");
            }
        }
        RulesAction::Check { file } => {
            let table = RuleTable::load(&file)?;
            println!("ok: {} rules (version {})", table.len(), table.version());
        }
    }
    Ok(())
}
