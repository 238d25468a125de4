use super::Config;
use super::validator::ConfigValidator;
use anyhow::{Context, Result};
use std::path::Path;

/// Read, parse and validate a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or
/// contains values that fail validation.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    ConfigValidator::new().warn_unknown_fields(&content);

    parse_config_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse and validate configuration text.
///
/// # Errors
///
/// Returns an error on malformed TOML or invalid values.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    // Validation errors are returned as-is, without wrapping
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if !(1..=22).contains(&config.backup.compression_level) {
        anyhow::bail!("Compression level must be between 1 and 22");
    }

    if config.backup.process_name.trim().is_empty() {
        anyhow::bail!("backup.process_name must not be empty");
    }

    for name in &config.backup.exclude {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            anyhow::bail!(
                "Exclusion '{name}' must be a single directory name (it only matches the first level of a profile)"
            );
        }
    }

    for (variant, settings) in &config.variants {
        for profile in &settings.profiles {
            if !profile.path.is_absolute() {
                anyhow::bail!(
                    "Profile path in variant '{variant}' must be absolute: {}",
                    profile.path.display()
                );
            }
            if profile.archive.trim().is_empty() {
                anyhow::bail!("Archive name in variant '{variant}' must not be empty");
            }
            if profile.archive.contains(['/', '\\']) {
                anyhow::bail!(
                    "Archive name '{}' in variant '{variant}' must not contain path separators",
                    profile.archive
                );
            }
        }
    }

    Ok(())
}
