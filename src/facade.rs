use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::aggregate::{Aggregation, Aggregator, ExtractionSource};
use crate::analysis::AnalysisOptions;
use crate::candidate::ClientContext;
use crate::config::{Config, WindowConfig};
use crate::errors::Result;
use crate::export::{self, CategorizedExport, GroupedExport};
use crate::format::{FormattedRecord, Formatter};
use crate::inference::{HttpInferenceClient, InferenceClient};
use crate::merge;

/// High-level façade providing library-consumable entry points.
///
/// Runs the whole pipeline for one message: aggregate (remote first when a
/// collaborator is configured, heuristics otherwise), deduplicate, then
/// format with one shared extraction timestamp. Nothing is printed; callers
/// decide how to render the returned `CredentialAnalysis`.
pub struct CredentialExtractor {
    aggregator: Aggregator,
    windows: WindowConfig,
}

impl CredentialExtractor {
    /// Extractor for a validated configuration. Builds the HTTP collaborator
    /// when `config.remote` enables one.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut aggregator = Aggregator::new(&config.windows);
        if let Some(client) = HttpInferenceClient::from_config(&config.remote)? {
            tracing::debug!(endpoint = client.endpoint(), "remote inference enabled");
            aggregator = aggregator.with_inference(Arc::new(client), config.remote.timeout);
        }
        Ok(Self {
            aggregator,
            windows: config.windows,
        })
    }

    /// Heuristic extractors only.
    pub fn heuristic_only(windows: WindowConfig) -> Self {
        Self {
            aggregator: Aggregator::new(&windows),
            windows,
        }
    }

    /// Plug in a custom collaborator.
    pub fn with_inference(
        mut self,
        client: Arc<dyn InferenceClient>,
        timeout: std::time::Duration,
    ) -> Self {
        self.aggregator = self.aggregator.with_inference(client, timeout);
        self
    }

    pub fn has_remote(&self) -> bool {
        self.aggregator.has_inference()
    }

    /// Analyze one message.
    pub async fn analyze(
        &self,
        text: &str,
        client: Option<&ClientContext>,
        opts: &AnalysisOptions,
    ) -> Result<CredentialAnalysis> {
        let start = Instant::now();
        let aggregation = self.aggregator.aggregate_detailed(text, client).await?;
        Ok(self.finish(text, client, opts, aggregation, start))
    }

    /// Analyze one message without contacting any collaborator.
    pub fn analyze_offline(
        &self,
        text: &str,
        client: Option<&ClientContext>,
        opts: &AnalysisOptions,
    ) -> Result<CredentialAnalysis> {
        let start = Instant::now();
        let candidates = self.aggregator.aggregate_offline(text, client)?;
        let aggregation = Aggregation {
            candidates,
            source: ExtractionSource::Heuristic,
            remote_error: None,
        };
        Ok(self.finish(text, client, opts, aggregation, start))
    }

    fn finish(
        &self,
        text: &str,
        client: Option<&ClientContext>,
        opts: &AnalysisOptions,
        aggregation: Aggregation,
        start: Instant,
    ) -> CredentialAnalysis {
        let found = aggregation.candidates.len();
        let merged = merge::dedup(aggregation.candidates);
        let duplicates_removed = found - merged.len();

        let mut formatter = Formatter::at(Utc::now());
        if opts.include_context {
            formatter = formatter.with_context(text, self.windows.record_context);
        }
        let records = formatter.format_all(&merged);

        let mut warnings = Vec::new();
        if let Some(reason) = aggregation.remote_error {
            warnings.push(format!(
                "Remote inference unavailable, heuristic extraction used instead ({reason})"
            ));
        }
        if records.is_empty() {
            warnings.push("No migration credentials found in the input".to_string());
        }

        tracing::info!(
            records = records.len(),
            duplicates_removed,
            source = ?aggregation.source,
            "analysis finished"
        );

        CredentialAnalysis {
            records,
            options: opts.clone(),
            client: client.filter(|c| !c.is_empty()).cloned(),
            stats: AnalysisStats {
                input_chars: text.chars().count(),
                candidates_found: found,
                duplicates_removed,
                source: aggregation.source,
                duration_ms: start.elapsed().as_millis() as u64,
                warnings,
            },
        }
    }
}

/* ----------------------------- Public Data Model --------------------------- */

/// Normalized result produced by the façade.
#[derive(Debug, Clone)]
pub struct CredentialAnalysis {
    pub records: Vec<FormattedRecord>,
    pub options: AnalysisOptions,
    pub client: Option<ClientContext>,
    pub stats: AnalysisStats,
}

impl CredentialAnalysis {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records at or above the advisory confidence threshold.
    pub fn above_threshold(&self) -> Vec<&FormattedRecord> {
        self.records
            .iter()
            .filter(|r| r.confidence >= self.options.confidence_threshold)
            .collect()
    }

    pub fn categorize(&self) -> CategorizedExport {
        export::categorize(&self.records)
    }

    pub fn group(&self, default_client_name: &str) -> GroupedExport {
        export::group_with_default_name(&self.records, default_client_name)
    }
}

/// Statistical + diagnostic data about the analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisStats {
    pub input_chars: usize,
    pub candidates_found: usize,
    pub duplicates_removed: usize,
    pub source: ExtractionSource,
    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CredSiftError;
    use crate::format::{RecordDetails, RecordType};

    const TICKET: &str = "Prosimy o migrację.\n\
        serwer FTP: ftp.firma.pl\nlogin: jan\nhasło: Tajne123\n\
        Panel: https://firma.pl/wp-admin\n";

    fn extractor() -> CredentialExtractor {
        CredentialExtractor::heuristic_only(WindowConfig::default())
    }

    #[test]
    fn test_offline_pipeline() {
        let analysis = extractor()
            .analyze_offline(TICKET, None, &AnalysisOptions::default())
            .unwrap();
        assert_eq!(analysis.stats.source, ExtractionSource::Heuristic);
        let ftp = analysis
            .records
            .iter()
            .find(|r| r.record_type() == RecordType::Ftp)
            .unwrap();
        match &ftp.details {
            RecordDetails::Ftp(f) => {
                assert_eq!(f.server, "ftp.firma.pl");
                assert_eq!(f.username, "jan");
                assert_eq!(f.password.as_deref(), Some("Tajne123"));
                assert_eq!(f.port, 21);
            }
            other => panic!("unexpected details {other:?}"),
        }
        assert!(analysis.categorize().websites.len() == 1);
        assert!(analysis.stats.warnings.is_empty());
    }

    #[test]
    fn test_all_records_share_timestamp() {
        let analysis = extractor()
            .analyze_offline(TICKET, None, &AnalysisOptions::default())
            .unwrap();
        let first = analysis.records[0].extracted_at();
        assert!(analysis.records.iter().all(|r| r.extracted_at() == first));
    }

    #[test]
    fn test_threshold_is_advisory() {
        let opts = AnalysisOptions::with_threshold(0.95);
        let analysis = extractor().analyze_offline(TICKET, None, &opts).unwrap();
        assert!(!analysis.is_empty());
        assert!(analysis.above_threshold().len() < analysis.len());
    }

    #[test]
    fn test_context_attached_on_request() {
        let opts = AnalysisOptions::default().include_context(true);
        let analysis = extractor().analyze_offline(TICKET, None, &opts).unwrap();
        assert!(analysis.records.iter().all(|r| r.context.is_some()));
    }

    #[test]
    fn test_empty_input_and_empty_result() {
        let err = extractor()
            .analyze_offline("   ", None, &AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, CredSiftError::EmptyInput));

        let analysis = extractor()
            .analyze_offline("Dzień dobry, proszę o fakturę.", None, &AnalysisOptions::default())
            .unwrap();
        assert!(analysis.is_empty());
        assert_eq!(analysis.stats.warnings.len(), 1);
    }

    #[test]
    fn test_group_uses_client_context() {
        let client = ClientContext::new(Some("Firma".into()), Some("c-7".into()), None);
        let analysis = extractor()
            .analyze_offline(TICKET, Some(&client), &AnalysisOptions::default())
            .unwrap();
        let grouped = analysis.group("Unknown Client");
        assert_eq!(grouped.0["c-7"].client_name, "Firma");
        assert!(grouped.0["c-7"].tickets.contains_key("general"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.remote.enabled = true;
        assert!(matches!(
            CredentialExtractor::new(&config),
            Err(CredSiftError::Configuration { .. })
        ));
        assert!(!CredentialExtractor::new(&Config::default()).unwrap().has_remote());
    }
}
