pub mod parser;
pub mod validator;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the variant used when no tag is given or the tag is unknown.
pub const DEFAULT_VARIANT: &str = "default";

/// Directory names skipped at the top level of every profile unless the
/// config file says otherwise.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "cache2",
    "startupCache",
    "safebrowsing",
    "shader-cache",
    "crashes",
    "saved-telemetry-pings",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupSettings,

    /// Named profile groups, selected by the invocation tag
    #[serde(default)]
    pub variants: BTreeMap<String, VariantConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    #[serde(default = "default_destination")]
    pub destination: PathBuf,
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Command whose stdout lists running processes
    #[serde(default)]
    pub process_list_command: Option<String>,
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
    #[serde(default = "default_excludes")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VariantConfig {
    /// Overrides `backup.destination` for this variant
    #[serde(default)]
    pub destination: Option<PathBuf>,
    #[serde(default)]
    pub profiles: Vec<ProfileSpec>,
}

/// A profile directory and the base name its archives are derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub path: PathBuf,
    pub archive: String,
}

/// First-level directory names left out of every archive.
///
/// Membership is tested against the first component of a path relative to
/// the profile root only; deeper directories and file names never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// The settings a single run operates on, fixed once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Variant that was actually selected (after fallback)
    pub variant: String,
    pub profiles: Vec<ProfileSpec>,
    pub destination: PathBuf,
    pub exclusions: ExclusionSet,
    pub process_name: String,
    pub process_list_command: Option<Vec<String>>,
    pub compression_level: i32,
}

fn default_destination() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Backups")
        .join("profiles")
}

fn default_process_name() -> String {
    if cfg!(windows) {
        "firefox.exe".to_string()
    } else {
        "firefox".to_string()
    }
}

const fn default_compression_level() -> i32 {
    1
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| (*s).to_string()).collect()
}

/// Where Firefox keeps profiles on this platform, used for the generated
/// template only.
fn default_profile_path() -> PathBuf {
    if cfg!(windows) {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Mozilla")
            .join("Firefox")
            .join("Profiles")
            .join("default-release")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mozilla")
            .join("firefox")
            .join("default-release")
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            process_name: default_process_name(),
            process_list_command: None,
            compression_level: default_compression_level(),
            exclude: default_excludes(),
        }
    }
}

impl Config {
    /// Configuration written when no file exists yet.
    #[must_use]
    pub fn template() -> Self {
        let mut variants = BTreeMap::new();
        variants.insert(
            DEFAULT_VARIANT.to_string(),
            VariantConfig {
                destination: None,
                profiles: vec![ProfileSpec {
                    path: default_profile_path(),
                    archive: "firefox-profile".to_string(),
                }],
            },
        );
        Self {
            backup: BackupSettings::default(),
            variants,
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML or invalid values
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::template();
            config.save(path)?;
            crate::output::info(&format!(
                "Wrote default configuration to {}",
                path.display()
            ));
            return Ok(config);
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Select the variant named by `selector` and flatten it into the
    /// settings for one run.
    ///
    /// An absent selector picks [`DEFAULT_VARIANT`]; an unknown one falls
    /// back to it with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the fallback variant is missing or the
    /// process-list command cannot be split into words.
    pub fn resolve(&self, selector: Option<&str>) -> Result<ResolvedConfig> {
        let requested = selector.unwrap_or(DEFAULT_VARIANT);

        let (name, variant) = match self.variants.get_key_value(requested) {
            Some(found) => found,
            None => {
                tracing::warn!(tag = requested, "unknown variant, using default");
                self.variants
                    .get_key_value(DEFAULT_VARIANT)
                    .with_context(|| {
                        format!(
                            "Variant '{requested}' not found and no '{DEFAULT_VARIANT}' variant is configured"
                        )
                    })?
            }
        };

        let process_list_command = self
            .backup
            .process_list_command
            .as_deref()
            .map(shell_words::split)
            .transpose()
            .context("Invalid backup.process_list_command")?;

        Ok(ResolvedConfig {
            variant: name.clone(),
            profiles: variant.profiles.clone(),
            destination: variant
                .destination
                .clone()
                .unwrap_or_else(|| self.backup.destination.clone()),
            exclusions: ExclusionSet::new(self.backup.exclude.iter().cloned()),
            process_name: self.backup.process_name.clone(),
            process_list_command,
            compression_level: self.backup.compression_level,
        })
    }
}

/// Locate the configuration file.
///
/// Precedence: explicit path, then `PROFSNAP_CONFIG`, then the platform
/// config directory.
///
/// # Errors
///
/// Returns an error if no explicit path is given and the platform config
/// directory cannot be determined.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(crate::CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("Could not find config directory")?;
    Ok(base.join(crate::DEFAULT_CONFIG_PATH))
}
