//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;

/// Environment variable prefix
const ENV_PREFIX: &str = "CASEKIT";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Short mode from CASEKIT_SHORT
    pub short: Option<bool>,
    /// Parallel slots from CASEKIT_PARALLEL
    pub parallel: Option<usize>,
    /// Verbose from CASEKIT_VERBOSE
    pub verbose: Option<bool>,
    /// Output format from CASEKIT_FORMAT
    pub format: Option<String>,
    /// Benchmark minimum time from CASEKIT_BENCHTIME (milliseconds)
    pub benchtime_ms: Option<u64>,
    /// Config file from CASEKIT_CONFIG
    pub config_file: Option<String>,
    /// Log level from CASEKIT_LOG
    pub log_level: Option<String>,
    /// Disable color when NO_COLOR is set
    pub no_color: Option<bool>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            short: get_env_bool("SHORT"),
            parallel: get_env_parse("PARALLEL"),
            verbose: get_env_bool("VERBOSE"),
            format: get_env("FORMAT"),
            benchtime_ms: get_env_parse("BENCHTIME"),
            config_file: get_env("CONFIG"),
            log_level: get_env("LOG"),
            no_color: env::var_os("NO_COLOR").map(|_| true),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.short.is_some()
            || self.parallel.is_some()
            || self.verbose.is_some()
            || self.format.is_some()
            || self.benchtime_ms.is_some()
            || self.config_file.is_some()
            || self.log_level.is_some()
            || self.no_color.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    get_env(name).and_then(|v| v.parse().ok())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
#[derive(Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn short(mut self, short: bool) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_SHORT"), short.to_string()));
        self
    }

    pub fn parallel(mut self, slots: usize) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_PARALLEL"), slots.to_string()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_FORMAT"), format.into()));
        self
    }

    pub fn benchtime(mut self, ms: u64) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_BENCHTIME"), ms.to_string()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Print all CASEKIT environment variables
pub fn print_env_help() {
    println!("Environment Variables:");
    println!();
    println!("  {ENV_PREFIX}_SHORT       Enable short mode (true/false)");
    println!("  {ENV_PREFIX}_PARALLEL    Maximum parallel cases");
    println!("  {ENV_PREFIX}_VERBOSE     Print logs of passing cases (true/false)");
    println!("  {ENV_PREFIX}_FORMAT      Output format (text, json, json-pretty, csv, summary)");
    println!("  {ENV_PREFIX}_BENCHTIME   Minimum benchmark time in milliseconds");
    println!("  {ENV_PREFIX}_CONFIG      Path to configuration file");
    println!("  {ENV_PREFIX}_LOG         Harness log level (trace, debug, info, warn, error)");
    println!("  NO_COLOR            Disable colored output");
}
