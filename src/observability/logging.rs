//! Tracing subscriber setup and log redaction.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::errors::{ValyuError, ValyuResult};

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. `valyu_client=debug`. `RUST_LOG` wins when set.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Include span enter/exit events.
    pub with_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "valyu_client=info".to_string(),
            format: LogFormat::Pretty,
            with_spans: false,
        }
    }
}

impl LogConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter directive.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Switches to JSON output.
    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    /// Logs span close events with their timings.
    pub fn with_spans(mut self) -> Self {
        self.with_spans = true;
        self
    }
}

/// Installs a global `tracing` subscriber.
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already set.
pub fn init_tracing(config: LogConfig) -> ValyuResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| ValyuError::Configuration {
            message: format!("Invalid log filter '{}': {}", config.filter, e),
        })?,
    };

    let span_events = if config.with_spans {
        fmt::format::FmtSpan::CLOSE
    } else {
        fmt::format::FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_span_events(span_events))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_span_events(span_events))
            .try_init(),
    };

    result.map_err(|e| ValyuError::Configuration {
        message: format!("Failed to install tracing subscriber: {}", e),
    })
}

#[allow(clippy::expect_used)]
static SECRET_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(x-api-key[\x22']?\s*[:=]\s*[\x22']?)[^\s\x22',}]+", "${1}***"),
        (r"(?i)(api[_-]?key[\x22']?\s*[:=]\s*[\x22']?)[^\s\x22',}]+", "${1}***"),
        (r"(?i)([?&]token=)[^&\s]+", "${1}***"),
        (r"Bearer [A-Za-z0-9._-]+", "Bearer ***"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid pattern"), replacement))
    .collect()
});

/// Masks API keys and asset tokens in `text`.
pub fn redact(text: &str) -> String {
    SECRET_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}
