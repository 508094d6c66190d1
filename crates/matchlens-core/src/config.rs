// Configuration loading and parsing (matchlens.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::source::TournamentQuery;

/// Name of the configuration file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "matchlens.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tournament: TournamentConfig,
    #[serde(default)]
    pub pitch: PitchConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub views: ViewsConfig,
}

/// Which tournament to analyze. `competition_id`/`season_id` address the
/// match listing; the remaining fields address the tournament-wide dump.
#[derive(Debug, Clone, Deserialize)]
pub struct TournamentConfig {
    pub competition_id: u32,
    pub season_id: u32,
    pub country: String,
    pub division: String,
    pub season: String,
    pub gender: String,
}

impl TournamentConfig {
    pub fn query(&self) -> TournamentQuery {
        TournamentQuery {
            country: self.country.clone(),
            division: self.division.clone(),
            season: self.season.clone(),
            gender: self.gender.clone(),
        }
    }
}

/// Pitch geometry in provider coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PitchConfig {
    pub length: f64,
    pub width: f64,
    /// x coordinate where the attacking final third starts.
    pub final_third_x: f64,
}

impl Default for PitchConfig {
    /// StatsBomb's 120 x 80 pitch.
    fn default() -> Self {
        PitchConfig {
            length: 120.0,
            width: 80.0,
            final_third_x: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub base_url: String,
    #[serde(default)]
    pub local_dir: Option<String>,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewsConfig {
    pub heatmap_bins_x: usize,
    pub heatmap_bins_y: usize,
    /// Minimum completed passes for a passing-network edge to be drawn.
    pub network_min_passes: usize,
    pub exclude_penalties: bool,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        ViewsConfig {
            heatmap_bins_x: 6,
            heatmap_bins_y: 5,
            network_min_passes: 3,
            exclude_penalties: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/matchlens.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for normal startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration text without touching the filesystem.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy any missing files from `defaults/` into `config/`. Returns the list
/// of files that were copied. Existing files are never overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let pitch = &config.pitch;
    if !(pitch.length.is_finite() && pitch.length > 0.0) {
        return Err(invalid("pitch.length", format!("must be > 0, got {}", pitch.length)));
    }
    if !(pitch.width.is_finite() && pitch.width > 0.0) {
        return Err(invalid("pitch.width", format!("must be > 0, got {}", pitch.width)));
    }
    if !(pitch.final_third_x > 0.0 && pitch.final_third_x < pitch.length) {
        return Err(invalid(
            "pitch.final_third_x",
            format!(
                "must be inside the pitch (0, {}), got {}",
                pitch.length, pitch.final_third_x
            ),
        ));
    }

    let source = &config.source;
    if source.base_url.trim().is_empty() {
        return Err(invalid("source.base_url", "must not be empty"));
    }
    if source.kind == SourceKind::Local
        && source.local_dir.as_deref().map_or(true, |d| d.trim().is_empty())
    {
        return Err(invalid("source.local_dir", "required when source.kind = \"local\""));
    }
    if source.max_concurrent_fetches == 0 {
        return Err(invalid("source.max_concurrent_fetches", "must be > 0"));
    }
    if source.timeout_secs == 0 {
        return Err(invalid("source.timeout_secs", "must be > 0"));
    }

    let views = &config.views;
    let view_fields: &[(&str, usize)] = &[
        ("views.heatmap_bins_x", views.heatmap_bins_x),
        ("views.heatmap_bins_y", views.heatmap_bins_y),
    ];
    for (name, val) in view_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let tournament = &config.tournament;
    let tournament_fields: &[(&str, &str)] = &[
        ("tournament.country", tournament.country.as_str()),
        ("tournament.division", tournament.division.as_str()),
        ("tournament.season", tournament.season.as_str()),
        ("tournament.gender", tournament.gender.as_str()),
    ];
    for (name, val) in tournament_fields {
        if val.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
