//! Structured logging for sparse kernels
//!
//! Coalescing, format conversion and the two multiply kernels report their
//! input and output sizes as `debug` events. Everything here compiles to
//! no-ops unless the `tracing` feature is enabled.
//!
//! # Example
//!
//! ```ignore
//! use spten_sparse::tracing_support::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default())?;
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (default `spten_sparse=info,warn`)
//! - `SPTEN_LOG_FORMAT`: `json`, `compact` or `pretty` (default)

use anyhow::Result;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// JSON format for structured logging
    Json,
    /// Compact format (single line per event)
    Compact,
}

impl TracingFormat {
    /// Parse from string; unknown names fall back to `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Output format
    pub format: TracingFormat,
    /// Filter directive (e.g., "spten_sparse=debug")
    pub filter: String,
    /// Enable ANSI colors
    pub with_ansi: bool,
    /// Show target module paths
    pub with_target: bool,
    /// Show file locations
    pub with_file: bool,
    /// Show line numbers
    pub with_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var("SPTEN_LOG_FORMAT")
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "spten_sparse=info,warn".to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_file: false,
            with_line_number: false,
        }
    }
}

/// Install a global subscriber for the given configuration
///
/// Fails if the filter does not parse or a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        TracingFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        TracingFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(config.with_target)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
        TracingFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
        }
    }

    Ok(())
}

/// Stub for when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}

/// Record a kernel invocation and its entry counts
#[cfg(feature = "tracing")]
pub fn record_kernel(operation: &str, nnz_in: usize, nnz_out: usize) {
    tracing::debug!(
        operation = operation,
        nnz_in = nnz_in,
        nnz_out = nnz_out,
        "sparse_kernel"
    );
}

#[cfg(not(feature = "tracing"))]
pub fn record_kernel(_operation: &str, _nnz_in: usize, _nnz_out: usize) {}

/// Record a format conversion
#[cfg(feature = "tracing")]
pub fn record_conversion(from: &str, to: &str, nnz: usize) {
    tracing::debug!(from = from, to = to, nnz = nnz, "format_conversion");
}

#[cfg(not(feature = "tracing"))]
pub fn record_conversion(_from: &str, _to: &str, _nnz: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_format_parse() {
        assert_eq!(TracingFormat::parse("json"), TracingFormat::Json);
        assert_eq!(TracingFormat::parse("JSON"), TracingFormat::Json);
        assert_eq!(TracingFormat::parse("compact"), TracingFormat::Compact);
        assert_eq!(TracingFormat::parse("unknown"), TracingFormat::Pretty);
    }

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert!(config.with_ansi);
        assert!(!config.filter.is_empty());
    }

    #[test]
    fn test_record_helpers() {
        // must not panic with or without a subscriber
        record_kernel("coalesce", 10, 4);
        record_conversion("COO", "CSR", 4);
    }
}
