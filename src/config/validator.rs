use colored::Colorize;
use std::collections::HashSet;

/// Flags configuration keys that profsnap does not understand
pub struct ConfigValidator {
    /// Fields recognized under the `[backup]` table
    backup_fields: HashSet<&'static str>,
    /// Fields recognized under each `[variants.<tag>]` table
    variant_fields: HashSet<&'static str>,
    /// Fields recognized on each profile entry
    profile_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            backup_fields: [
                "destination",
                "process_name",
                "process_list_command",
                "compression_level",
                "exclude",
            ]
            .into_iter()
            .collect(),
            variant_fields: ["destination", "profiles"].into_iter().collect(),
            profile_fields: ["path", "archive"].into_iter().collect(),
        }
    }

    /// Print a warning for every unknown key in `content`.
    ///
    /// Malformed TOML is left for the parser to report.
    pub fn warn_unknown_fields(&self, content: &str) {
        let Ok(parsed) = toml::from_str::<toml::Table>(content) else {
            return;
        };

        let unknown = self.unknown_fields(&parsed);
        if unknown.is_empty() {
            return;
        }

        eprintln!("{}", "Configuration warnings:".yellow().bold());
        for field in &unknown {
            eprintln!("  Unknown configuration field: {}", field.yellow());
        }
        eprintln!();
    }

    /// Dotted paths of all keys not recognized by the config schema
    #[must_use]
    pub fn unknown_fields(&self, table: &toml::Table) -> Vec<String> {
        let mut unknown = Vec::new();

        for (key, value) in table {
            match key.as_str() {
                "backup" => Self::check_keys(value, "backup", &self.backup_fields, &mut unknown),
                "variants" => {
                    if let toml::Value::Table(variants) = value {
                        for (tag, variant) in variants {
                            let prefix = format!("variants.{tag}");
                            Self::check_keys(variant, &prefix, &self.variant_fields, &mut unknown);
                            self.check_profiles(variant, &prefix, &mut unknown);
                        }
                    }
                }
                _ => unknown.push(key.clone()),
            }
        }

        unknown
    }

    /// Check the keys of each entry in a variant's `profiles` array
    fn check_profiles(&self, variant: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        let Some(toml::Value::Array(profiles)) = variant.get("profiles") else {
            return;
        };
        for (i, profile) in profiles.iter().enumerate() {
            let entry = format!("{prefix}.profiles[{i}]");
            Self::check_keys(profile, &entry, &self.profile_fields, unknown);
        }
    }

    /// Collect keys of `value` (if a table) that are not in `known`
    fn check_keys(
        value: &toml::Value,
        prefix: &str,
        known: &HashSet<&'static str>,
        unknown: &mut Vec<String>,
    ) {
        if let toml::Value::Table(map) = value {
            for key in map.keys() {
                if !known.contains(key.as_str()) {
                    unknown.push(format!("{prefix}.{key}"));
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
