//! Rule table loading.
//!
//! The table is a versioned TOML artifact loaded once at startup. The
//! built-in table ships inside the library; a custom file can replace it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{hints, EffectRule, Pattern};
use crate::error::RuleError;

/// Rule table format version understood by this build.
pub const RULE_TABLE_VERSION: u32 = 1;

const BUILTIN_RULES: &str = include_str!("builtin.toml");

/// An ordered, immutable list of effect rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTable {
    version: u32,
    #[serde(default)]
    rules: Vec<EffectRule>,
}

impl RuleTable {
    /// The rule table embedded in the library.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_toml_str(BUILTIN_RULES)
    }

    /// Parse and validate a table from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, RuleError> {
        let raw: toml::Table = content.parse()?;
        check_patterns(&raw)?;
        let table: RuleTable = toml::from_str(content)?;
        table.validate()?;
        tracing::debug!(rules = table.rules.len(), "loaded rule table");
        Ok(table)
    }

    /// Read a table from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Build a table directly from rules (validated like a file).
    pub fn from_rules(rules: Vec<EffectRule>) -> Result<Self, RuleError> {
        let table = Self {
            version: RULE_TABLE_VERSION,
            rules,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    fn validate(&self) -> Result<(), RuleError> {
        if self.version != RULE_TABLE_VERSION {
            return Err(RuleError::UnsupportedVersion {
                found: self.version,
                expected: RULE_TABLE_VERSION,
            });
        }
        let mut seen = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateId(rule.id.clone()));
            }
        }
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[EffectRule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&EffectRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every rule's hints, deduplicated, in table order.
    pub fn all_hints(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .flat_map(hints::hints_for)
            .filter(|h| seen.insert(h.clone()))
            .collect()
    }
}

/// Compile every pattern source up front so a bad regex is reported as
/// [`RuleError::InvalidPattern`] instead of a generic parse error.
fn check_patterns(raw: &toml::Table) -> Result<(), RuleError> {
    let Some(rules) = raw.get("rules").and_then(toml::Value::as_array) else {
        return Ok(());
    };
    for rule in rules {
        let lists = ["triggers_any", "must_also_match"]
            .into_iter()
            .filter_map(|key| rule.get(key))
            .filter_map(toml::Value::as_array)
            .flatten();
        let number_pattern = rule.get("count").and_then(|c| c.get("number_pattern"));
        for source in lists.chain(number_pattern).filter_map(toml::Value::as_str) {
            Pattern::new(source)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EffectKind, GlyphChoice};

    #[test]
    fn builtin_table_loads() {
        let table = RuleTable::builtin().unwrap();
        assert_eq!(table.version(), RULE_TABLE_VERSION);
        assert_eq!(table.len(), 17);
        assert_eq!(table.rules()[0].id, "money-rain");

        let money = table.get("money-rain").unwrap();
        assert_eq!(money.kind, EffectKind::Rain);
        assert_eq!(money.count.fallback, 60);
        assert_eq!(money.count.cap, 150);
        assert!(matches!(money.glyph_choice(), GlyphChoice::EmojiSet(ref s) if s.len() == 2));
    }

    #[test]
    fn all_hints_are_deduplicated() {
        let hints = RuleTable::builtin().unwrap().all_hints();
        assert_eq!(hints.iter().filter(|h| *h == "party").count(), 1);
        assert!(hints.contains(&"money".to_string()));
        assert!(hints.contains(&"snowflakes".to_string()));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = RuleTable::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, RuleError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let toml = r#"
            version = 1
            [[rules]]
            id = "a"
            kind = "rain"
            [[rules]]
            id = "a"
            kind = "float"
        "#;
        assert!(matches!(
            RuleTable::from_toml_str(toml),
            Err(RuleError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn rejects_bad_pattern() {
        let toml = r#"
            version = 1
            [[rules]]
            id = "broken"
            kind = "rain"
            triggers_any = ['(oops']
        "#;
        assert!(matches!(
            RuleTable::from_toml_str(toml),
            Err(RuleError::InvalidPattern { ref pattern, .. }) if pattern == "(oops"
        ));
    }

    #[test]
    fn bad_number_pattern_names_the_pattern() {
        let toml = r#"
            version = 1
            [[rules]]
            id = "broken"
            kind = "rain"
            count = { number_pattern = '(\d+' }
        "#;
        assert!(matches!(
            RuleTable::from_toml_str(toml),
            Err(RuleError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            RuleTable::from_toml_str("version = "),
            Err(RuleError::Parse(_))
        ));
    }

    #[test]
    fn rejects_unusable_scale_bounds() {
        for options in [
            "{ scale_min = -1e308, scale_max = 1e308 }",
            "{ scale_min = inf }",
            "{ scale_max = nan }",
            "{ scale_min = 0.0 }",
        ] {
            let toml = format!(
                "version = 1\n[[rules]]\nid = \"wide\"\nkind = \"burst\"\ntriggers_any = ['wide']\noptions = {options}\n"
            );
            assert!(
                matches!(
                    RuleTable::from_toml_str(&toml),
                    Err(RuleError::InvalidRule { ref id, .. }) if id == "wide"
                ),
                "{options}"
            );
        }
    }

    #[test]
    fn toml_roundtrip_preserves_rules() {
        let table = RuleTable::builtin().unwrap();
        let text = table.to_toml_string().unwrap();
        let reparsed = RuleTable::from_toml_str(&text).unwrap();
        assert_eq!(reparsed.rules(), table.rules());
    }
}
