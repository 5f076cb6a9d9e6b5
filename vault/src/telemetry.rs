//! Tracing subscriber setup for binaries and tests using this crate.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the application.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, TestWriter, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
    /// Write through libtest's captured output instead of stdout
    pub test_writer: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "vault_core=info".to_string(),
            json_output: false,
            test_writer: false,
        }
    }
}

impl TracingConfig {
    /// Create config with custom log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Route output through the test harness so it only shows for
    /// failing tests.
    #[must_use]
    pub const fn with_test_writer(mut self) -> Self {
        self.test_writer = true;
        self
    }
}

/// Install a global subscriber for `config`.
///
/// Returns `false` when a subscriber was already installed, so repeated
/// calls from several tests are harmless.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let writer = if config.test_writer {
        BoxMakeWriter::new(TestWriter::new())
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer))
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.log_level, "vault_core=info");
        assert!(!config.json_output);
        assert!(!config.test_writer);
    }

    #[test]
    fn test_config_builder() {
        let config = TracingConfig::default()
            .with_log_level("vault_core=debug")
            .with_json_output()
            .with_test_writer();

        assert_eq!(config.log_level, "vault_core=debug");
        assert!(config.json_output);
        assert!(config.test_writer);
    }

    #[test]
    fn test_second_init_is_harmless() {
        let config = TracingConfig::default().with_test_writer();
        init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
