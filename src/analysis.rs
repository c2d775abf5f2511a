//! Per-call analysis options shared by the façade, the report and the CLI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Caller-supplied options for one analysis run.
///
/// `confidence_threshold` is advisory: it travels with the result so that
/// downstream consumers can filter, but the pipeline never drops candidates
/// because of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    pub confidence_threshold: f64,
    pub include_context: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.0,
            include_context: false,
        }
    }
}

impl AnalysisOptions {
    /// Options with an advisory threshold, clamped into [0, 1].
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            confidence_threshold: clamp_unit(threshold),
            ..Self::default()
        }
    }

    pub fn include_context(mut self, include: bool) -> Self {
        self.include_context = include;
        self
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(AnalysisOptions::with_threshold(1.7).confidence_threshold, 1.0);
        assert_eq!(AnalysisOptions::with_threshold(-0.2).confidence_threshold, 0.0);
        assert_eq!(AnalysisOptions::with_threshold(f64::NAN).confidence_threshold, 0.0);
    }

    #[test]
    fn camel_case_wire_names() {
        let json = serde_json::to_string(&AnalysisOptions::default().include_context(true)).unwrap();
        assert!(json.contains("confidenceThreshold"));
        assert!(json.contains("\"includeContext\":true"));
    }
}
