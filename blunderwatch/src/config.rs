//! Runtime configuration for blunderwatch.
//!
//! Settings live in a JSON file. Which file is read, and which values are
//! overridden afterwards, follows a fixed priority so that a one-off run can
//! change the engine or log level without editing the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use analysis::{AnalysisConfig, Thresholds};
use engine::{EngineConfig, SearchBudget};
use serde::{Deserialize, Serialize};

/// Env variable naming a config file to use instead of the default one.
const CONFIG_PATH_VAR: &str = "BLUNDERWATCH_CONFIG";

/// Env variable overriding the engine executable.
const ENGINE_PATH_VAR: &str = "BLUNDERWATCH_ENGINE_PATH";

/// Env variable overriding the log level.
const LOG_LEVEL_VAR: &str = "BLUNDERWATCH_LOG_LEVEL";

/// Default search time per position (in seconds).
const DEFAULT_TIME_SECS: f64 = 1.0;

/// Default deadline for one engine search (in seconds).
const DEFAULT_POSITION_TIMEOUT_SECS: u64 = 30;

/// Default log level.
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `config.json`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// UCI engine executable. Searched for on the usual paths when unset.
    pub stockfish_binary_path: Option<PathBuf>,
    /// Search time per position in seconds. Ignored when `depth` is set.
    pub time: f64,
    /// Fixed search depth per position.
    pub depth: Option<u8>,
    pub log_level: String,
    /// Write logs to a daily rolling file in this directory instead of stderr.
    pub log_dir: Option<PathBuf>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub position_timeout_secs: u64,
    pub thresholds: Thresholds,
    pub retry_engine: bool,
    pub noise_floor_cp: u32,
    /// File the settings were read from, `None` for built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stockfish_binary_path: None,
            time: DEFAULT_TIME_SECS,
            depth: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
            threads: None,
            hash_mb: None,
            position_timeout_secs: DEFAULT_POSITION_TIMEOUT_SECS,
            thresholds: Thresholds::default(),
            retry_engine: true,
            noise_floor_cp: 0,
            source: None,
        }
    }
}

impl Config {
    /// Load the configuration.
    ///
    /// Priority for the file:
    /// 1. `explicit` (the `--config` flag) if given
    /// 2. `BLUNDERWATCH_CONFIG` env variable if set
    /// 3. `<config dir>/blunderwatch/config.json` if it exists
    /// 4. built-in defaults
    ///
    /// A file named by 1 or 2 must exist. `BLUNDERWATCH_ENGINE_PATH` and
    /// `BLUNDERWATCH_LOG_LEVEL` are applied on top of whatever was loaded.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from));

        let mut config = match named {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(
            std::env::var(ENGINE_PATH_VAR).ok(),
            std::env::var(LOG_LEVEL_VAR).ok(),
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply single-value overrides. Empty values are ignored.
    pub fn apply_overrides(&mut self, engine_path: Option<String>, log_level: Option<String>) {
        if let Some(path) = engine_path.filter(|p| !p.is_empty()) {
            self.stockfish_binary_path = Some(PathBuf::from(path));
        }
        if let Some(level) = log_level.filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
    }

    /// Search budget per position: fixed depth when configured, otherwise
    /// `time` seconds.
    pub fn budget(&self) -> Result<SearchBudget, ConfigError> {
        if let Some(depth) = self.depth {
            return Ok(SearchBudget::Depth(depth));
        }
        Duration::try_from_secs_f64(self.time)
            .map(SearchBudget::MoveTime)
            .map_err(|_| ConfigError::Invalid(format!("time must be positive, got {}", self.time)))
    }

    /// Build the validated configuration for one analysis.
    pub fn to_analysis_config(&self) -> Result<AnalysisConfig, ConfigError> {
        let engine = EngineConfig {
            path: self.stockfish_binary_path.clone(),
            threads: self.threads,
            hash_mb: self.hash_mb,
            position_timeout: Duration::from_secs(self.position_timeout_secs),
            ..EngineConfig::default()
        };
        let config = AnalysisConfig {
            engine,
            budget: self.budget()?,
            thresholds: self.thresholds,
            retry_engine: self.retry_engine,
            noise_floor_cp: self.noise_floor_cp,
        };
        config
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(config)
    }
}

/// `<config dir>/blunderwatch/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("blunderwatch").join("config.json"))
}
