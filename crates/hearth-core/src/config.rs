//! Configuration loading and typed config structures.
//!
//! The configuration lives in `hearth.yaml`. Every field has a default, so
//! a missing file, an empty file, or a file naming only a few keys are all
//! valid.

use std::path::Path;

use serde::Deserialize;

use hearth_world::{Abundance, Pacing};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HearthConfig {
    /// Tick rate, population, seeding.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Pacing and abundance presets.
    #[serde(default)]
    pub presets: PresetConfig,

    /// Cognition scheduler timings and limits.
    #[serde(default)]
    pub cognition: CognitionConfig,

    /// Goal oracle selection and timeouts.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HearthConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string. Blank input yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Simulation-wide settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Agents spawned at world start.
    #[serde(default = "default_agent_count")]
    pub agent_count: u32,

    /// RNG seed. A random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Half-width of the square nodes and agents spawn in.
    #[serde(default = "default_spawn_range")]
    pub spawn_range: f64,

    /// Delay between extinction and world reset.
    #[serde(default = "default_extinction_reset_ms")]
    pub extinction_reset_ms: u64,

    /// Stop after this many ticks. Runs forever when absent.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            agent_count: default_agent_count(),
            seed: None,
            spawn_range: default_spawn_range(),
            extinction_reset_ms: default_extinction_reset_ms(),
            max_ticks: None,
        }
    }
}

/// Preset selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PresetConfig {
    /// Stat decay and action durations.
    #[serde(default)]
    pub pacing: Pacing,

    /// Node counts, yields and respawn delays.
    #[serde(default)]
    pub abundance: Abundance,
}

/// Where tactical plans come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TacticsSource {
    /// The built-in rule-based planner.
    #[default]
    Local,
    /// The goal oracle's tactical contract.
    Oracle,
}

/// Cognition scheduler settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CognitionConfig {
    /// Cadence of strategic requests.
    #[serde(default = "default_strategic_interval_ms")]
    pub strategic_interval_ms: u64,

    /// Random extra delay added to each strategic deadline.
    #[serde(default = "default_strategic_jitter_ms")]
    pub strategic_jitter_ms: u64,

    /// Offset between consecutive agents' first requests.
    #[serde(default = "default_start_stagger_ms")]
    pub start_stagger_ms: u64,

    /// A tree running longer than this is discarded.
    #[serde(default = "default_watchdog_ms")]
    pub watchdog_ms: u64,

    /// Goal buffer overflow limit.
    #[serde(default = "default_goal_buffer_limit")]
    pub goal_buffer_limit: usize,

    /// Delay before asking again after a goal yields no plan.
    #[serde(default = "default_idle_retry_ms")]
    pub idle_retry_ms: u64,

    /// How often one failing goal is re-planned before it is dropped.
    #[serde(default = "default_max_replans")]
    pub max_replans: u32,

    /// Food or warmth below this may trigger a panic re-think.
    #[serde(default = "default_panic_threshold")]
    pub panic_threshold: f64,

    /// Per-tick probability of a panic re-think.
    #[serde(default = "default_panic_chance")]
    pub panic_chance: f64,

    /// Tactical plan source.
    #[serde(default)]
    pub tactics: TacticsSource,
}

impl Default for CognitionConfig {
    fn default() -> Self {
        Self {
            strategic_interval_ms: default_strategic_interval_ms(),
            strategic_jitter_ms: default_strategic_jitter_ms(),
            start_stagger_ms: default_start_stagger_ms(),
            watchdog_ms: default_watchdog_ms(),
            goal_buffer_limit: default_goal_buffer_limit(),
            idle_retry_ms: default_idle_retry_ms(),
            max_replans: default_max_replans(),
            panic_threshold: default_panic_threshold(),
            panic_chance: default_panic_chance(),
            tactics: TacticsSource::Local,
        }
    }
}

/// Which goal oracle backs strategic decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    /// Deterministic in-process rules.
    #[default]
    Rules,
    /// An LLM over HTTP, configured from the environment.
    Llm,
}

/// Oracle settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OracleConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: OracleBackend,

    /// Per-request timeout before the fallback is used.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How long a whisper stays attached to snapshots.
    #[serde(default = "default_whisper_timeout_ms")]
    pub whisper_timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Rules,
            request_timeout_ms: default_request_timeout_ms(),
            whisper_timeout_ms: default_whisper_timeout_ms(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: default_log_level(),
        }
    }
}

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_agent_count() -> u32 {
    3
}

const fn default_spawn_range() -> f64 {
    30.0
}

const fn default_extinction_reset_ms() -> u64 {
    5_000
}

const fn default_strategic_interval_ms() -> u64 {
    30_000
}

const fn default_strategic_jitter_ms() -> u64 {
    5_000
}

const fn default_start_stagger_ms() -> u64 {
    2_000
}

const fn default_watchdog_ms() -> u64 {
    60_000
}

const fn default_goal_buffer_limit() -> usize {
    3
}

const fn default_idle_retry_ms() -> u64 {
    5_000
}

const fn default_max_replans() -> u32 {
    2
}

const fn default_panic_threshold() -> f64 {
    5.0
}

const fn default_panic_chance() -> f64 {
    0.1
}

const fn default_request_timeout_ms() -> u64 {
    45_000
}

const fn default_whisper_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = HearthConfig::default();
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert_eq!(config.cognition.strategic_interval_ms, 30_000);
        assert_eq!(config.cognition.watchdog_ms, 60_000);
        assert_eq!(config.cognition.goal_buffer_limit, 3);
        assert_eq!(config.oracle.request_timeout_ms, 45_000);
        assert_eq!(config.oracle.backend, OracleBackend::Rules);
        assert_eq!(config.presets.pacing, Pacing::Medium);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
simulation:
  tick_interval_ms: 50
  agent_count: 5
  seed: 1234
  spawn_range: 20.0
  extinction_reset_ms: 1000
  max_ticks: 600

presets:
  pacing: fast
  abundance: high

cognition:
  strategic_interval_ms: 10000
  strategic_jitter_ms: 0
  watchdog_ms: 20000
  goal_buffer_limit: 2
  max_replans: 1
  panic_chance: 0.0
  tactics: oracle

oracle:
  backend: llm
  request_timeout_ms: 5000

logging:
  format: json
  level: debug
";
        let config = HearthConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.unwrap_or_default();
        assert_eq!(config.simulation.agent_count, 5);
        assert_eq!(config.simulation.seed, Some(1234));
        assert_eq!(config.simulation.max_ticks, Some(600));
        assert_eq!(config.presets.pacing, Pacing::Fast);
        assert_eq!(config.presets.abundance, Abundance::High);
        assert_eq!(config.cognition.tactics, TacticsSource::Oracle);
        assert_eq!(config.cognition.goal_buffer_limit, 2);
        assert_eq!(config.oracle.backend, OracleBackend::Llm);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_partial_yaml_keeps_defaults() {
        let config = HearthConfig::parse("cognition:\n  watchdog_ms: 1000\n").unwrap_or_default();
        assert_eq!(config.cognition.watchdog_ms, 1000);
        assert_eq!(config.cognition.idle_retry_ms, 5_000);
        assert_eq!(config.simulation.agent_count, 3);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(HearthConfig::parse("").is_ok());
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(HearthConfig::parse("presets:\n  pacing: ludicrous\n").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = HearthConfig::load_or_default(Path::new("/nonexistent/hearth.yaml"));
        assert!(config.is_ok());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("hearth.yaml");
        if path.exists() {
            let config = HearthConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
