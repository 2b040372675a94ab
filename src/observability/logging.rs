//! Structured logging.

use crate::config::ObservabilitySettings;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human readable.
    Pretty,
    /// Single-line, human readable.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Filter directive that failed to parse and was replaced by `warn`.
    pub rejected_directive: Option<String>,
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// Precedence for the filter: `RUST_LOG`, `GROUPGATE_LOG`, `--verbose`,
    /// the config file, then `warn`.
    #[must_use]
    pub fn from_settings(settings: Option<&ObservabilitySettings>, verbose: bool) -> Self {
        let mut format = settings
            .and_then(|s| s.log_format.as_deref())
            .and_then(LogFormat::parse)
            .unwrap_or_default();
        if let Some(env_format) = std::env::var("GROUPGATE_LOG_FORMAT")
            .ok()
            .as_deref()
            .and_then(LogFormat::parse)
        {
            format = env_format;
        }

        let directive = select_directive(
            std::env::var("RUST_LOG").ok(),
            std::env::var("GROUPGATE_LOG").ok(),
            verbose,
            settings.and_then(|s| s.log_filter.clone()),
        );

        match EnvFilter::try_new(&directive) {
            Ok(filter) => Self {
                format,
                filter,
                rejected_directive: None,
            },
            Err(_) => Self {
                format,
                filter: EnvFilter::new("warn"),
                rejected_directive: Some(directive),
            },
        }
    }
}

/// Picks the first non-blank filter directive in precedence order.
fn select_directive(
    rust_log: Option<String>,
    groupgate_log: Option<String>,
    verbose: bool,
    configured: Option<String>,
) -> String {
    let non_blank = |v: &String| !v.trim().is_empty();
    rust_log
        .filter(non_blank)
        .or_else(|| groupgate_log.filter(non_blank))
        .or_else(|| verbose.then(|| "groupgate=debug".to_string()))
        .or_else(|| configured.filter(non_blank))
        .unwrap_or_else(|| "warn".to_string())
}
