//! Configuration module
//!
//! Handles loading and layering runner configuration.

mod env;

pub use env::{print_env_help, EnvBuilder, EnvConfig, EnvGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::benchmark::BenchmarkConfig;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Expose short mode to cases
    pub short: bool,

    /// Maximum concurrently running parallel cases
    pub max_parallel: usize,

    /// Print logs of passing cases
    pub verbose: bool,

    /// Output format name
    pub format: String,

    /// Colorize text output
    pub color: bool,

    /// Log level for harness diagnostics
    pub log_level: String,

    /// Benchmark policy
    pub benchmark: BenchmarkConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            short: false,
            max_parallel: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            verbose: false,
            format: "text".to_string(),
            color: true,
            log_level: "warn".to_string(),
            benchmark: BenchmarkConfig::default(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

impl RunnerConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Build configuration from an optional file, then environment overrides
    pub fn resolve(path: Option<&Path>, env: &EnvConfig) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.as_deref().map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(env);
        Ok(config)
    }

    /// Override fields set in the environment
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(short) = env.short {
            self.short = short;
        }
        if let Some(parallel) = env.parallel {
            self.max_parallel = parallel.max(1);
        }
        if let Some(verbose) = env.verbose {
            self.verbose = verbose;
        }
        if let Some(format) = &env.format {
            self.format = format.clone();
        }
        if let Some(benchtime) = env.benchtime_ms {
            self.benchmark.min_time_ms = benchtime;
        }
        if let Some(level) = &env.log_level {
            self.log_level = level.clone();
        }
        if env.no_color == Some(true) {
            self.color = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert!(!config.short);
        assert!(config.max_parallel >= 1);
        assert_eq!(config.format, "text");
        assert_eq!(config.benchmark.min_time_ms, 1000);
    }

    #[test]
    fn test_config_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("casekit.yaml");

        let config = RunnerConfig {
            short: true,
            max_parallel: 2,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = RunnerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("casekit.json");
        std::fs::write(
            &path,
            r#"{"short": true, "benchmark": {"min_time_ms": 10, "max_iterations": 99}}"#,
        )
        .unwrap();

        let loaded = RunnerConfig::load(&path).unwrap();
        assert!(loaded.short);
        assert_eq!(loaded.format, "text");
        assert_eq!(loaded.benchmark.max_iterations, 99);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = RunnerConfig::default();
        let env = EnvConfig {
            short: Some(true),
            parallel: Some(0),
            format: Some("json".to_string()),
            benchtime_ms: Some(25),
            ..Default::default()
        };

        config.apply_env(&env);
        assert!(config.short);
        assert_eq!(config.max_parallel, 1);
        assert_eq!(config.format, "json");
        assert_eq!(config.benchmark.min_time_ms, 25);
    }

    #[test]
    fn test_resolve_missing_file_errors() {
        let env = EnvConfig::default();
        let missing = Path::new("/nonexistent/casekit.yaml");
        assert!(RunnerConfig::resolve(Some(missing), &env).is_err());
        assert!(RunnerConfig::resolve(None, &env).is_ok());
    }
}
