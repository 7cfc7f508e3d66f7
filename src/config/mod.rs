//! Configuration system for the Mamdani engine CLI
//!
//! Provides a layered configuration supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Engine profiles (default, fine, fast) plus user-defined ones
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./mamdani.toml` - Project-local configuration
//! 2. `~/.config/mamdani/config.toml` - User configuration (XDG)
//! 3. `~/.mamdani/config.toml` - User configuration (legacy)
//! 4. `/etc/mamdani/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `MAMDANI_PROFILE` - Engine profile (default, fine, fast)
//! - `MAMDANI_GRID_STEP` - Output universe sampling step
//! - `MAMDANI_DEFUZZ` - Defuzzification method (centroid, bisector, ...)
//! - `MAMDANI_WORKERS` - Worker threads for rule evaluation (0 = auto)
//! - `MAMDANI_PARALLEL` - Enable the parallel path (true/false)
//! - `MAMDANI_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//!
//! # Example Configuration
//!
//! ```toml
//! # mamdani.toml
//!
//! [general]
//! log_level = "normal"
//! color = true
//! profile = "default"
//!
//! [engine]
//! grid_step = 1.0
//! defuzz = "centroid"
//!
//! [engine.parallel]
//! workers = 0
//! min_rules_per_worker = 4
//! enabled = true
//!
//! [profiles.plotting]
//! grid_step = 0.05
//! description = "Dense sampling for curve export"
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defuzz::DefuzzMethod;
use crate::engine::EngineConfig;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MamdaniConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Engine settings applied to every simulation
    pub engine: EngineConfig,
    /// Profile-specific overrides
    pub profiles: HashMap<String, ProfileConfig>,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Enable colored output
    pub color: bool,
    /// Engine profile applied at startup
    pub profile: EngineProfile,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Normal,
            color: true,
            profile: EngineProfile::Default,
        }
    }
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProfileConfig {
    /// Override grid_step
    pub grid_step: Option<f64>,
    /// Override defuzzification method
    pub defuzz: Option<DefuzzMethod>,
    /// Override worker count
    pub workers: Option<usize>,
    /// Description of the profile
    pub description: Option<String>,
}

// ============================================================================
// Enums
// ============================================================================

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

/// Engine profile presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineProfile {
    /// Unit-step sampling with standard settings
    #[default]
    Default,
    /// Dense output sampling
    Fine,
    /// Coarse sampling, eager thread fan-out
    Fast,
    /// Custom profile (use profiles section)
    Custom,
}

impl EngineProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineProfile::Default => "default",
            EngineProfile::Fine => "fine",
            EngineProfile::Fast => "fast",
            EngineProfile::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "default" | "" => Some(EngineProfile::Default),
            "fine" | "dense" | "smooth" => Some(EngineProfile::Fine),
            "fast" | "coarse" | "quick" => Some(EngineProfile::Fast),
            "custom" => Some(EngineProfile::Custom),
            _ => None,
        }
    }

    /// Get the sampling step used by this profile
    pub fn default_grid_step(&self) -> f64 {
        match self {
            EngineProfile::Default => 1.0,
            EngineProfile::Fine => 0.25,
            EngineProfile::Fast => 2.0,
            EngineProfile::Custom => 1.0,
        }
    }

    /// Get a description of this profile
    pub fn description(&self) -> &'static str {
        match self {
            EngineProfile::Default => "Unit-step output sampling, standard settings",
            EngineProfile::Fine => "Dense output sampling for smooth aggregates",
            EngineProfile::Fast => "Coarse sampling with eager thread fan-out",
            EngineProfile::Custom => "User-defined profile",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl MamdaniConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from default locations
    ///
    /// Searches for config files in order:
    /// 1. ./mamdani.toml
    /// 2. ~/.config/mamdani/config.toml
    /// 3. ~/.mamdani/config.toml
    /// 4. /etc/mamdani/config.toml
    ///
    /// Then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Try to load from config file locations
        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        // Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.clone(), e.to_string()))?;

        let config: MamdaniConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.clone(), e.to_string()))?;

        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Project-local
        paths.push(PathBuf::from("./mamdani.toml"));

        // XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mamdani").join("config.toml"));
        }

        // Legacy home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".mamdani").join("config.toml"));
        }

        // System-wide (Unix only)
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/mamdani/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        // MAMDANI_PROFILE
        if let Ok(val) = env::var("MAMDANI_PROFILE") {
            let _ = self.apply_profile(&val);
        }

        // MAMDANI_GRID_STEP
        if let Ok(val) = env::var("MAMDANI_GRID_STEP") {
            if let Ok(step) = val.parse::<f64>() {
                self.engine.grid_step = step;
            }
        }

        // MAMDANI_DEFUZZ
        if let Ok(val) = env::var("MAMDANI_DEFUZZ") {
            if let Ok(method) = val.parse::<DefuzzMethod>() {
                self.engine.defuzz = method;
            }
        }

        // MAMDANI_WORKERS
        if let Ok(val) = env::var("MAMDANI_WORKERS") {
            if let Ok(workers) = val.parse::<usize>() {
                self.engine.parallel.workers = workers;
            }
        }

        // MAMDANI_PARALLEL
        if let Ok(val) = env::var("MAMDANI_PARALLEL") {
            self.engine.parallel.enabled = val == "true" || val == "1" || val == "yes";
        }

        // MAMDANI_LOG_LEVEL
        if let Ok(val) = env::var("MAMDANI_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_str(&val) {
                self.general.log_level = level;
            }
        }
    }

    /// Apply a named profile's settings
    pub fn apply_profile(&mut self, name: &str) -> Result<(), ConfigError> {
        // First check built-in profiles
        if let Some(profile) = EngineProfile::from_str(name) {
            self.general.profile = profile;
            self.engine.grid_step = profile.default_grid_step();

            if profile == EngineProfile::Fast {
                // Fan out even for small rule bases
                self.engine.parallel.min_rules_per_worker = 1;
            }
            return Ok(());
        }

        // Check custom profiles
        if let Some(custom) = self.profiles.get(name).cloned() {
            self.general.profile = EngineProfile::Custom;
            if let Some(step) = custom.grid_step {
                self.engine.grid_step = step;
            }
            if let Some(method) = custom.defuzz {
                self.engine.defuzz = method;
            }
            if let Some(workers) = custom.workers {
                self.engine.parallel.workers = workers;
            }
            return Ok(());
        }

        Err(ConfigError::UnknownProfile(name.to_string()))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::IoError(path.clone(), e.to_string()))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# Mamdani engine configuration file
# See documentation for all available options

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Enable colored output
color = true
# Engine profile applied at startup: default, fine, fast
profile = "default"

[engine]
# Output universe sampling step for defuzzification
grid_step = 1.0
# Defuzzification method: centroid, bisector, mean_of_maximum,
# smallest_of_maximum, largest_of_maximum
defuzz = "centroid"

[engine.parallel]
# Worker threads for rule evaluation (0 = one per CPU core)
workers = 0
# Minimum rules per worker before fanning out
min_rules_per_worker = 4
# Enable the parallel path
enabled = true

# Custom profiles can be defined like this:
# [profiles.plotting]
# grid_step = 0.05
# defuzz = "centroid"
# description = "Dense sampling for curve export"
"#
    }

    /// List all available profiles
    pub fn available_profiles(&self) -> Vec<(&str, &str)> {
        let mut profiles = vec![
            ("default", EngineProfile::Default.description()),
            ("fine", EngineProfile::Fine.description()),
            ("fast", EngineProfile::Fast.description()),
        ];

        // Add custom profiles
        for (name, config) in &self.profiles {
            let desc = config.description.as_deref().unwrap_or("Custom profile");
            profiles.push((name.as_str(), desc));
        }

        profiles
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// IO error reading/writing config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
    /// Serialization error
    SerializeError(String),
    /// Unknown profile name
    UnknownProfile(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            ConfigError::UnknownProfile(name) => {
                write!(f, "Unknown profile: {}", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MamdaniConfig::new();
        assert_eq!(config.engine.grid_step, 1.0);
        assert_eq!(config.engine.defuzz, DefuzzMethod::Centroid);
        assert_eq!(config.general.log_level, LogLevel::Normal);
        assert_eq!(config.general.profile, EngineProfile::Default);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            log_level = "verbose"
            profile = "fine"

            [engine]
            grid_step = 0.5
            defuzz = "bisector"
        "#;

        let config = MamdaniConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.general.profile, EngineProfile::Fine);
        assert_eq!(config.engine.grid_step, 0.5);
        assert_eq!(config.engine.defuzz, DefuzzMethod::Bisector);
    }

    #[test]
    fn test_parse_parallel_section() {
        let toml = r#"
            [engine.parallel]
            workers = 2
            min_rules_per_worker = 8
            enabled = false
        "#;

        let config = MamdaniConfig::load_from_str(toml).unwrap();
        assert_eq!(config.engine.parallel.workers, 2);
        assert_eq!(config.engine.parallel.min_rules_per_worker, 8);
        assert!(!config.engine.parallel.enabled);
        // Unlisted sections keep defaults
        assert_eq!(config.engine.grid_step, 1.0);
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!(EngineProfile::from_str("fine"), Some(EngineProfile::Fine));
        assert_eq!(EngineProfile::from_str("fast"), Some(EngineProfile::Fast));
        assert_eq!(EngineProfile::from_str("coarse"), Some(EngineProfile::Fast));
        assert_eq!(EngineProfile::from_str("unknown"), None);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("quiet"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::from_str("verbose"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::from_str("debug"), Some(LogLevel::Debug));
    }

    #[test]
    fn test_apply_profile() {
        let mut config = MamdaniConfig::new();

        config.apply_profile("fine").unwrap();
        assert_eq!(config.general.profile, EngineProfile::Fine);
        assert_eq!(config.engine.grid_step, 0.25);

        config.apply_profile("fast").unwrap();
        assert_eq!(config.general.profile, EngineProfile::Fast);
        assert_eq!(config.engine.grid_step, 2.0);
        assert_eq!(config.engine.parallel.min_rules_per_worker, 1);
    }

    #[test]
    fn test_custom_profile() {
        let toml = r#"
            [profiles.plotting]
            grid_step = 0.05
            defuzz = "mean_of_maximum"
            workers = 2
            description = "Dense sampling for curve export"
        "#;

        let mut config = MamdaniConfig::load_from_str(toml).unwrap();
        config.apply_profile("plotting").unwrap();

        assert_eq!(config.general.profile, EngineProfile::Custom);
        assert_eq!(config.engine.grid_step, 0.05);
        assert_eq!(config.engine.defuzz, DefuzzMethod::MeanOfMaximum);
        assert_eq!(config.engine.parallel.workers, 2);
    }

    #[test]
    fn test_serialize_config() {
        let config = MamdaniConfig::new();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[engine.parallel]"));
    }

    #[test]
    fn test_default_config_content_parses() {
        let config = MamdaniConfig::load_from_str(MamdaniConfig::default_config_content()).unwrap();
        assert_eq!(config.engine.grid_step, 1.0);
        assert!(config.engine.parallel.enabled);
    }

    #[test]
    fn test_config_paths() {
        let paths = MamdaniConfig::config_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("mamdani.toml"));
    }

    #[test]
    fn test_unknown_profile_error() {
        let mut config = MamdaniConfig::new();
        let result = config.apply_profile("nonexistent");
        assert!(matches!(result, Err(ConfigError::UnknownProfile(_))));
    }

    #[test]
    fn test_available_profiles() {
        let toml = r#"
            [profiles.plotting]
            grid_step = 0.05
            description = "Dense sampling for curve export"
        "#;
        let config = MamdaniConfig::load_from_str(toml).unwrap();
        let profiles = config.available_profiles();
        assert!(profiles.iter().any(|(name, _)| *name == "default"));
        assert!(profiles.iter().any(|(name, _)| *name == "plotting"));
    }
}
