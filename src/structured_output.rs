//! Structured output module for JSON and YAML serialization.
//!
//! The report envelope wraps the formatted records with tool metadata, a
//! summary of the analyzed input and per-category statistics. Records keep
//! their own camelCase wire shape; the envelope uses snake_case.

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::ExtractionSource;
use crate::analysis::AnalysisOptions;
use crate::candidate::ClientContext;
use crate::facade::CredentialAnalysis;
use crate::format::{FormattedRecord, RecordType};

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Root structure for all credsift output in structured formats
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ExtractionReport {
    pub metadata: OutputMetadata,

    /// What was analyzed and with which options
    pub input: InputInfo,

    /// Formatted credential records, in extraction order
    pub records: Vec<FormattedRecord>,

    pub statistics: ExtractionStatistics,

    /// Recoverable problems met during the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Tool metadata and versioning information
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct OutputMetadata {
    pub tool_name: String,
    pub version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub schema_version: String,
}

/// Information about what was analyzed
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct InputInfo {
    pub source: InputSource,

    /// Length of the message in characters
    pub length_chars: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientContext>,

    pub options: AnalysisOptions,
}

/// Where the message was read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Stdin,
    File { path: String },
    Library,
}

/// Record counts and run diagnostics
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ExtractionStatistics {
    pub total_records: usize,
    pub per_category: CategoryCounts,

    /// Records at or above the advisory confidence threshold
    pub above_threshold: usize,

    pub duplicates_removed: usize,
    pub extraction_source: ExtractionSource,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct CategoryCounts {
    pub ftp: usize,
    pub website: usize,
    pub domain: usize,
    pub email: usize,
    pub generic: usize,
}

impl CategoryCounts {
    pub fn count(records: &[FormattedRecord]) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.record_type() {
                RecordType::Ftp => counts.ftp += 1,
                RecordType::Website => counts.website += 1,
                RecordType::Domain => counts.domain += 1,
                RecordType::Email => counts.email += 1,
                RecordType::Generic => counts.generic += 1,
            }
        }
        counts
    }
}

impl ExtractionReport {
    /// Build the report for one analysis run.
    pub fn from_analysis(analysis: &CredentialAnalysis, source: InputSource) -> Self {
        Self {
            metadata: OutputMetadata {
                tool_name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: chrono::Utc::now(),
                schema_version: SCHEMA_VERSION.to_string(),
            },
            input: InputInfo {
                source,
                length_chars: analysis.stats.input_chars,
                client: analysis.client.clone(),
                options: analysis.options.clone(),
            },
            records: analysis.records.clone(),
            statistics: ExtractionStatistics {
                total_records: analysis.len(),
                per_category: CategoryCounts::count(&analysis.records),
                above_threshold: analysis.above_threshold().len(),
                duplicates_removed: analysis.stats.duplicates_removed,
                extraction_source: analysis.stats.source,
                duration_ms: analysis.stats.duration_ms,
            },
            warnings: analysis.stats.warnings.clone(),
        }
    }

    /// Generate JSON schema for this output format
    pub fn generate_json_schema() -> Result<String> {
        let schema = schemars::schema_for!(ExtractionReport);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;
    use crate::facade::CredentialExtractor;

    fn report() -> ExtractionReport {
        let text = "serwer FTP: ftp.firma.pl\nlogin: jan\nhasło: Tajne123\n\
                    Strona: https://www.firma.pl";
        let analysis = CredentialExtractor::heuristic_only(WindowConfig::default())
            .analyze_offline(text, None, &AnalysisOptions::with_threshold(0.8))
            .unwrap();
        ExtractionReport::from_analysis(
            &analysis,
            InputSource::File {
                path: "ticket.txt".into(),
            },
        )
    }

    #[test]
    fn test_statistics() {
        let report = report();
        assert_eq!(report.statistics.total_records, report.records.len());
        assert_eq!(report.statistics.per_category.ftp, 1);
        assert!(report.statistics.above_threshold >= 1);
        assert_eq!(report.statistics.extraction_source, ExtractionSource::Heuristic);
        assert_eq!(report.metadata.tool_name, "credsift");
    }

    #[test]
    fn test_json_and_yaml() {
        let report = report();
        let json: serde_json::Value = serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
        assert_eq!(json["input"]["source"]["file"]["path"], "ticket.txt");
        assert_eq!(json["input"]["options"]["confidenceThreshold"], 0.8);
        assert_eq!(json["records"][0]["type"], "ftp");
        assert!(json.get("warnings").is_none());

        let yaml = report.to_yaml().unwrap();
        assert!(yaml.contains("schema_version:"));
        assert!(yaml.contains("extraction_source: heuristic"));
    }

    #[test]
    fn test_schema_generation() {
        let schema = ExtractionReport::generate_json_schema().unwrap();
        assert!(schema.contains("ExtractionReport"));
        assert!(schema.contains("per_category"));
    }
}
