//! Tracing subscriber setup.
//!
//! Environment variables:
//!
//! - `ROLEWATCH_DEBUG=1` - Enable debug logging
//! - `ROLEWATCH_LOG_LEVEL=trace|debug|info|warn|error|off` - Set log level
//! - `ROLEWATCH_LOG_FORMAT=pretty|compact|json` - Set output format
//! - `RUST_LOG` - Full filter directive, overrides the level

use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Minimum level of emitted diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl Level {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Off => "off",
        }
    }
}

/// Output format for log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pretty,
    Compact,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: Format,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: Format::Compact,
        }
    }
}

impl LogConfig {
    /// Read `ROLEWATCH_*` logging variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("ROLEWATCH_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let level = lookup("ROLEWATCH_LOG_LEVEL")
            .and_then(|s| Level::parse(&s))
            .unwrap_or(if debug { Level::Debug } else { Level::Info });

        let format = lookup("ROLEWATCH_LOG_FORMAT")
            .and_then(|s| Format::parse(&s))
            .unwrap_or(Format::Compact);

        Self { level, format }
    }

    /// Apply `--verbose` / `--quiet`.
    pub fn with_flags(mut self, verbose: bool, quiet: bool) -> Self {
        if quiet {
            self.level = Level::Error;
        } else if verbose {
            self.level = self.level.min(Level::Debug);
        }
        self
    }
}

/// Install the global subscriber. Diagnostics go to stderr so command
/// output on stdout stays clean.
pub fn init(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        Format::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        Format::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        Format::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(LogConfig::from_lookup(lookup(&[])), LogConfig::default());
    }

    #[test]
    fn test_debug_flag_implies_debug_level() {
        let config = LogConfig::from_lookup(lookup(&[("ROLEWATCH_DEBUG", "1")]));
        assert_eq!(config.level, Level::Debug);

        let config = LogConfig::from_lookup(lookup(&[
            ("ROLEWATCH_DEBUG", "true"),
            ("ROLEWATCH_LOG_LEVEL", "warn"),
        ]));
        assert_eq!(config.level, Level::Warn);
    }

    #[test]
    fn test_format_and_invalid_values() {
        let config = LogConfig::from_lookup(lookup(&[
            ("ROLEWATCH_LOG_FORMAT", "JSON"),
            ("ROLEWATCH_LOG_LEVEL", "loud"),
        ]));
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.level, Level::Info);
    }

    #[test]
    fn test_flags() {
        let base = LogConfig::default();
        assert_eq!(base.clone().with_flags(true, false).level, Level::Debug);
        assert_eq!(base.clone().with_flags(true, true).level, Level::Error);

        let trace = LogConfig {
            level: Level::Trace,
            ..base
        };
        assert_eq!(trace.with_flags(true, false).level, Level::Trace);
    }
}
