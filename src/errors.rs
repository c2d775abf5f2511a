//! Unified error handling.
//!
//! A `thiserror`-based model with:
//!   * Typed variants for each failure domain of the extraction pipeline
//!   * A categorization layer (`ErrorCategory`) for structured reporting
//!   * Helper constructors
//!   * `From` conversions for common lower-level errors
//!
//! Only `EmptyInput` and `EmptyExport` ever reach the caller of the pipeline.
//! Remote inference failures are recovered by the aggregator (heuristic
//! fallback) and malformed URLs are recovered by the extractors (the derived
//! field is simply omitted).
//!
//! Usage:
//!   use credsift::errors::{Result, CredSiftError};
//!
//!   fn do_something() -> Result<()> {
//!       Err(CredSiftError::EmptyInput)
//!   }

use std::io;

use thiserror::Error;

/// High-level classification for structured reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Remote,
    Parse,
    Export,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Remote => "remote",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Export => "export",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary application error type.
#[derive(Error, Debug)]
pub enum CredSiftError {
    // ------------------------ Input / Validation ----------------------------
    #[error("Input text is empty; nothing to analyze")]
    EmptyInput,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ------------------------- Remote inference -----------------------------
    #[error("Remote inference via '{endpoint}' failed: {reason}")]
    RemoteInference { endpoint: String, reason: String },

    #[error("Remote inference via '{endpoint}' timed out after {seconds}s")]
    RemoteTimeout { endpoint: String, seconds: u64 },

    // ---------------------------- Parsing -----------------------------------
    #[error("Malformed URL '{url}': {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("Serialization failed: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    // ----------------------------- Export -----------------------------------
    #[error("Refusing to export an empty {format} artifact: no records")]
    EmptyExport { format: String },

    #[error("CSV export failed: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    // ---------------------------- Internal ----------------------------------
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CredSiftError {
    /// Categorize the error for structured output.
    pub fn category(&self) -> ErrorCategory {
        use CredSiftError::*;
        match self {
            EmptyInput | Configuration { .. } => ErrorCategory::Input,

            RemoteInference { .. } | RemoteTimeout { .. } => ErrorCategory::Remote,

            MalformedUrl { .. } | Serialization { .. } => ErrorCategory::Parse,

            EmptyExport { .. } | Csv { .. } => ErrorCategory::Export,

            Io { .. } | Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// True for the failures a caller must surface rather than recover from.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Input | ErrorCategory::Export
        )
    }

    // ---------------------------- Constructors -----------------------------

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn remote(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteInference {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn remote_timeout(endpoint: impl Into<String>, seconds: u64) -> Self {
        Self::RemoteTimeout {
            endpoint: endpoint.into(),
            seconds,
        }
    }

    pub fn malformed_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn empty_export(format: impl Into<String>) -> Self {
        Self::EmptyExport {
            format: format.into(),
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, CredSiftError>;

/// Map standard IO errors into `Io` variant (generic context).
impl From<io::Error> for CredSiftError {
    fn from(e: io::Error) -> Self {
        CredSiftError::Io {
            path: "<unknown>".into(),
            operation: "unspecified".into(),
            source: e,
        }
    }
}

impl From<url::ParseError> for CredSiftError {
    fn from(e: url::ParseError) -> Self {
        // The offending input is not available here; callers with context use
        // `malformed_url` directly.
        CredSiftError::MalformedUrl {
            url: "<unknown>".into(),
            reason: e.to_string(),
        }
    }
}

impl From<reqwest::Error> for CredSiftError {
    fn from(e: reqwest::Error) -> Self {
        let endpoint = e
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".into());
        CredSiftError::RemoteInference {
            endpoint,
            reason: e.to_string(),
        }
    }
}

impl From<tokio::time::error::Elapsed> for CredSiftError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        CredSiftError::RemoteTimeout {
            endpoint: "<unknown>".into(),
            seconds: 0,
        }
    }
}

impl From<serde_yaml::Error> for CredSiftError {
    fn from(e: serde_yaml::Error) -> Self {
        CredSiftError::internal_with("YAML serialization failed", e)
    }
}

/// Extension trait for enriching IO results with path + operation context.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| CredSiftError::io(path.into(), operation.into(), e))
    }
}
