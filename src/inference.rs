//! Optional remote inference collaborator.
//!
//! A remote service may read the message and answer with an already
//! structured payload. It sits behind `InferenceClient`, a single fallible
//! operation, so the aggregator can be exercised without any network: tests
//! plug in their own implementation.
//!
//! The payload is all-or-nothing. A transport error, a non-2xx status, a body
//! that is not JSON or JSON that does not match `InferencePayload` is an
//! `Err`; partial data never leaves this module.

use std::time::Duration;

use async_trait::async_trait;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Deserializer, Serialize};

use crate::candidate::{
    CandidatePayload, DomainFields, EmailFields, FtpFields, NameserverList, RawCandidate,
    WebsiteFields,
};
use crate::config::RemoteConfig;
use crate::errors::{CredSiftError, Result};
use crate::extractors::ftp::DEFAULT_FTP_PORT;
use crate::extractors::website::{detect_cms, hostname_of};

/// Present but possibly `null`; a missing key is a schema mismatch.
fn nullable<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(d)
}

/// FTP account as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RemoteFtpAccount {
    pub login: String,
    pub host: String,
    #[serde(deserialize_with = "nullable")]
    #[schemars(with = "Option<String>")]
    pub password: Option<String>,
}

/// Mailbox as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RemoteMailAccount {
    pub email: String,
    #[serde(deserialize_with = "nullable")]
    #[schemars(with = "Option<String>")]
    pub password: Option<String>,
}

/// Structured answer of the remote service. All four lists are required and
/// no other key is accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct InferencePayload {
    pub ftp_accounts: Vec<RemoteFtpAccount>,
    pub websites: Vec<String>,
    pub domains: Vec<String>,
    pub mail_accounts: Vec<RemoteMailAccount>,
}

impl InferencePayload {
    /// Strict parse of a response body.
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    pub fn len(&self) -> usize {
        self.ftp_accounts.len() + self.websites.len() + self.domains.len() + self.mail_accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unscored candidates; offsets point at the first occurrence of the
    /// value in `text` when there is one.
    pub fn into_candidates(self, text: &str) -> Vec<RawCandidate> {
        let offset_of = |needle: &str| text.find(needle).unwrap_or(0);
        let mut out = Vec::with_capacity(self.len());

        for ftp in self.ftp_accounts {
            let offset = offset_of(&ftp.host);
            out.push(RawCandidate::unscored(
                CandidatePayload::Ftp(FtpFields {
                    server: ftp.host,
                    username: ftp.login,
                    password: ftp.password,
                    port: Some(DEFAULT_FTP_PORT),
                }),
                offset,
            ));
        }

        for url in self.websites {
            let offset = offset_of(&url);
            out.push(RawCandidate::unscored(
                CandidatePayload::Website(WebsiteFields {
                    hostname: hostname_of(&url).ok(),
                    cms: detect_cms(&url, text).map(str::to_string),
                    url,
                    username: None,
                    password: None,
                }),
                offset,
            ));
        }

        for domain in self.domains {
            let offset = offset_of(&domain);
            out.push(RawCandidate::unscored(
                CandidatePayload::Domain(DomainFields {
                    domain: domain.trim().trim_end_matches('.').to_lowercase(),
                    nameservers: NameserverList::new(),
                }),
                offset,
            ));
        }

        for mail in self.mail_accounts {
            let offset = offset_of(&mail.email);
            out.push(RawCandidate::unscored(
                CandidatePayload::Email(EmailFields {
                    email: mail.email.to_lowercase(),
                    password: mail.password,
                    server: None,
                }),
                offset,
            ));
        }

        out
    }
}

/// A remote service able to structure a message.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// One attempt; no retries.
    async fn infer_credentials(&self, text: &str) -> Result<InferencePayload>;
}

/// `InferenceClient` over HTTP: POSTs `{ "text", "schema" }` as JSON.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpInferenceClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(15)))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }

    /// Client for an enabled remote configuration, `None` otherwise.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>> {
        match (&config.endpoint, config.enabled) {
            (Some(endpoint), true) => Ok(Some(Self::new(
                endpoint.clone(),
                config.api_key.clone(),
                config.timeout,
            )?)),
            _ => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn infer_credentials(&self, text: &str) -> Result<InferencePayload> {
        let body = serde_json::json!({
            "text": text,
            "schema": schema_for!(InferencePayload),
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CredSiftError::remote(&self.endpoint, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CredSiftError::remote(
                &self.endpoint,
                format!("non-success status {status}"),
            ));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| CredSiftError::remote(&self.endpoint, e.to_string()))?;
        let payload = InferencePayload::parse(&raw).map_err(|e| {
            CredSiftError::remote(&self.endpoint, format!("payload does not match schema: {e}"))
        })?;

        tracing::debug!(endpoint = %self.endpoint, items = payload.len(), "remote payload received");
        Ok(payload)
    }
}
