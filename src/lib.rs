//! credsift
//!
//! Extracts migration credentials from free-text support messages: FTP
//! accounts, server logins, mailboxes, website panels, domains with their
//! nameservers and DNS zone records, plus any other login/password pair.
//!
//! - Heuristic, bilingual (Polish/English) extractors driven by regex
//!   pattern sets and bounded context windows
//! - Optional remote inference collaborator with deterministic fallback
//! - Classification into five output record types, deduplication
//! - Grouping by client/ticket and JSON/CSV export
//!
//! # Example
//!
//! ```rust
//! use credsift::{AnalysisOptions, CredentialExtractor, WindowConfig};
//!
//! let extractor = CredentialExtractor::heuristic_only(WindowConfig::default());
//! let analysis = extractor.analyze_offline(
//!     "serwer FTP: ftp.firma.pl\nlogin: jan\nhasło: Tajne123",
//!     None,
//!     &AnalysisOptions::default(),
//! )?;
//! assert_eq!(analysis.categorize().ftp_accounts.len(), 1);
//! # Ok::<(), credsift::CredSiftError>(())
//! ```

pub mod aggregate;
pub mod analysis;
pub mod app;
pub mod candidate;
pub mod cli;
pub mod config;
pub mod domain_utils;
pub mod errors;
pub mod export;
pub mod extractors;
pub mod facade;
pub mod format;
pub mod inference;
pub mod merge;
pub mod patterns;
pub mod structured_output;
pub mod styled_output;

// Re-export commonly used types and functions for convenience
pub use aggregate::{Aggregator, ExtractionSource};
pub use analysis::AnalysisOptions;
pub use candidate::{ClientContext, Kind, RawCandidate};
pub use config::{Config, WindowConfig};
pub use errors::{CredSiftError, Result};
pub use export::{CsvExporter, JsonExporter, JsonLayout, RecordExporter, categorize, flatten, group};
pub use facade::{CredentialAnalysis, CredentialExtractor};
pub use format::{FormattedRecord, RecordType, classify};
pub use inference::{HttpInferenceClient, InferenceClient, InferencePayload};
pub use merge::{dedup, merge};
pub use structured_output::ExtractionReport;
pub use styled_output::StyledFormatter;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
