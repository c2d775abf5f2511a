//! Aggregator: one call, one candidate list.
//!
//! When a remote collaborator is configured it gets exactly one bounded
//! attempt. A payload that parses supersedes the heuristic pass entirely;
//! anything else (transport error, bad status, bad body, timeout) is logged
//! and the heuristic extractors run instead, with the same result as if no
//! collaborator existed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::{ClientContext, Kind, RawCandidate};
use crate::config::WindowConfig;
use crate::errors::{CredSiftError, Result};
use crate::extractors::{self, Extractor};
use crate::inference::InferenceClient;

/// Which pass produced the candidates of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Heuristic,
    Remote,
    HeuristicFallback,
}

/// Candidates of one run plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub candidates: Vec<RawCandidate>,
    pub source: ExtractionSource,
    /// Why the remote attempt was abandoned, for `HeuristicFallback`.
    pub remote_error: Option<String>,
}

pub struct Aggregator {
    extractors: Vec<Box<dyn Extractor>>,
    inference: Option<Arc<dyn InferenceClient>>,
    remote_timeout: Duration,
}

impl Aggregator {
    /// Heuristic-only aggregator with the default extractor line-up.
    pub fn new(windows: &WindowConfig) -> Self {
        Self::with_extractors(extractors::default_extractors(windows))
    }

    pub fn with_extractors(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self {
            extractors,
            inference: None,
            remote_timeout: Duration::from_secs(30),
        }
    }

    /// Try `client` first, bounded by `timeout`.
    pub fn with_inference(mut self, client: Arc<dyn InferenceClient>, timeout: Duration) -> Self {
        self.inference = Some(client);
        self.remote_timeout = timeout;
        self
    }

    pub fn has_inference(&self) -> bool {
        self.inference.is_some()
    }

    /// Run every extractor and drop shadowed generic pairs. Never fails.
    pub fn heuristic(&self, text: &str) -> Vec<RawCandidate> {
        let mut all = Vec::new();
        for extractor in &self.extractors {
            let found = extractor.extract(text);
            tracing::debug!(extractor = extractor.name(), count = found.len(), "extractor pass");
            all.extend(found);
        }
        drop_shadowed_generics(all)
    }

    /// Heuristic pipeline only, stamped with `client`.
    pub fn aggregate_offline(
        &self,
        text: &str,
        client: Option<&ClientContext>,
    ) -> Result<Vec<RawCandidate>> {
        ensure_text(text)?;
        Ok(stamp(self.heuristic(text), client))
    }

    /// Remote-first aggregation with deterministic heuristic fallback.
    pub async fn aggregate(
        &self,
        text: &str,
        client: Option<&ClientContext>,
    ) -> Result<Vec<RawCandidate>> {
        Ok(self.aggregate_detailed(text, client).await?.candidates)
    }

    /// `aggregate`, also reporting which pass produced the result.
    pub async fn aggregate_detailed(
        &self,
        text: &str,
        client: Option<&ClientContext>,
    ) -> Result<Aggregation> {
        ensure_text(text)?;

        let mut remote_error = None;
        if let Some(remote) = &self.inference {
            match self.try_remote(remote.as_ref(), text).await {
                Ok(candidates) => {
                    tracing::info!(
                        remote = remote.name(),
                        count = candidates.len(),
                        "using remote inference result"
                    );
                    return Ok(Aggregation {
                        candidates: stamp(drop_shadowed_generics(candidates), client),
                        source: ExtractionSource::Remote,
                        remote_error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(remote = remote.name(), error = %e, "remote inference failed, falling back to heuristics");
                    remote_error = Some(e.to_string());
                }
            }
        }

        let candidates = self.heuristic(text);
        tracing::info!(count = candidates.len(), "heuristic extraction finished");
        let source = if remote_error.is_some() {
            ExtractionSource::HeuristicFallback
        } else {
            ExtractionSource::Heuristic
        };
        Ok(Aggregation {
            candidates: stamp(candidates, client),
            source,
            remote_error,
        })
    }

    async fn try_remote(
        &self,
        remote: &dyn InferenceClient,
        text: &str,
    ) -> Result<Vec<RawCandidate>> {
        let payload = tokio::time::timeout(self.remote_timeout, remote.infer_credentials(text))
            .await
            .map_err(|_| {
                CredSiftError::remote_timeout(remote.name(), self.remote_timeout.as_secs())
            })??;
        Ok(payload.into_candidates(text))
    }
}

fn ensure_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(CredSiftError::EmptyInput);
    }
    Ok(())
}

fn stamp(candidates: Vec<RawCandidate>, client: Option<&ClientContext>) -> Vec<RawCandidate> {
    let client = client.filter(|c| !c.is_empty()).cloned();
    candidates
        .into_iter()
        .map(|c| c.with_client(client.clone()))
        .collect()
}

/// Drop generic candidates whose secret pair is already held by a
/// specialized candidate.
pub fn drop_shadowed_generics(candidates: Vec<RawCandidate>) -> Vec<RawCandidate> {
    let specialized: HashSet<(String, String)> = candidates
        .iter()
        .filter(|c| c.is_specialized())
        .filter_map(|c| match c.payload.secret_pair() {
            Some((Some(user), Some(pass))) => Some((user.to_string(), pass.to_string())),
            _ => None,
        })
        .collect();

    let before = candidates.len();
    let kept: Vec<RawCandidate> = candidates
        .into_iter()
        .filter(|c| {
            if c.kind() != Kind::Generic {
                return true;
            }
            match c.payload.secret_pair() {
                Some((Some(user), Some(pass))) => {
                    !specialized.contains(&(user.to_string(), pass.to_string()))
                }
                _ => true,
            }
        })
        .collect();
    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), "generic pairs shadowed by specialized candidates");
    }
    kept
}
