//! Candidate data model produced by the per-kind extractors.
//!
//! A `RawCandidate` is one unclassified extraction result. Its kind is not a
//! free-floating tag but the discriminant of `CandidatePayload`, so every kind
//! carries exactly the fields that make sense for it.

use std::fmt;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Confidence assigned when only the anchor (and at most one companion) resolved.
pub const BASELINE_CONFIDENCE: f64 = 0.7;

/// Confidence assigned when a corroborating field or keyword resolved.
pub const CORROBORATED_CONFIDENCE: f64 = 0.9;

/// Pick the baseline or corroborated confidence.
pub fn confidence_for(corroborated: bool) -> f64 {
    if corroborated {
        CORROBORATED_CONFIDENCE
    } else {
        BASELINE_CONFIDENCE
    }
}

/// Closed set of extraction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Ftp,
    Server,
    Email,
    Website,
    Domain,
    Dns,
    Generic,
}

impl Kind {
    pub const ALL: [Kind; 7] = [
        Kind::Ftp,
        Kind::Server,
        Kind::Email,
        Kind::Website,
        Kind::Domain,
        Kind::Dns,
        Kind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Ftp => "ftp",
            Kind::Server => "server",
            Kind::Email => "email",
            Kind::Website => "website",
            Kind::Domain => "domain",
            Kind::Dns => "dns",
            Kind::Generic => "generic",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client/ticket the analyzed message belongs to. Supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

impl ClientContext {
    pub fn new(
        name: Option<String>,
        id: Option<String>,
        ticket_id: Option<String>,
    ) -> Self {
        Self {
            name,
            id,
            ticket_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.id.is_none() && self.ticket_id.is_none()
    }
}

/// Ordered set of nameserver hostnames bound to a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameserverList(Vec<String>);

impl NameserverList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a hostname (lowercased, trailing dot stripped) unless already present.
    pub fn insert(&mut self, host: &str) -> bool {
        let norm = host.trim().trim_end_matches('.').to_ascii_lowercase();
        if norm.is_empty() || self.0.contains(&norm) {
            return false;
        }
        self.0.push(norm);
        true
    }

    pub fn contains(&self, host: &str) -> bool {
        let norm = host.trim().trim_end_matches('.').to_ascii_lowercase();
        self.0.contains(&norm)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameserverList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = NameserverList::new();
        for host in iter {
            list.insert(host.as_ref());
        }
        list
    }
}

/// Document-level mail server block; shared by every mailbox candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailServerConfig {
    pub hostname: String,
    pub imap_port: Option<u16>,
    pub smtp_port: Option<u16>,
    pub pop_port: Option<u16>,
    pub encryption: Option<String>,
}

/// One parsed zone line from a DNS section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct DnsRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FtpFields {
    pub server: String,
    pub username: String,
    pub password: Option<String>,
    pub port: Option<u16>,
}

/// Server / admin-panel / SSH access bound to a host.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerFields {
    pub host: String,
    pub port: Option<u16>,
    /// Keyword that introduced the host ("panel", "ssh", "serwer", ...).
    pub label: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailFields {
    pub email: String,
    pub password: Option<String>,
    pub server: Option<Arc<MailServerConfig>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebsiteFields {
    pub url: String,
    /// Derived from `url`; `None` when the URL could not be parsed.
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cms: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainFields {
    pub domain: String,
    pub nameservers: NameserverList,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DnsFields {
    pub domain: String,
    pub nameservers: NameserverList,
    pub records: Vec<DnsRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericFields {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Free-text label naming the system the pair belongs to.
    pub system: Option<String>,
}

/// Per-kind payload; the variant is the candidate's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidatePayload {
    Ftp(FtpFields),
    Server(ServerFields),
    Email(EmailFields),
    Website(WebsiteFields),
    Domain(DomainFields),
    Dns(DnsFields),
    Generic(GenericFields),
}

impl CandidatePayload {
    pub fn kind(&self) -> Kind {
        match self {
            CandidatePayload::Ftp(_) => Kind::Ftp,
            CandidatePayload::Server(_) => Kind::Server,
            CandidatePayload::Email(_) => Kind::Email,
            CandidatePayload::Website(_) => Kind::Website,
            CandidatePayload::Domain(_) => Kind::Domain,
            CandidatePayload::Dns(_) => Kind::Dns,
            CandidatePayload::Generic(_) => Kind::Generic,
        }
    }

    /// (username, password) pair, for kinds that carry one.
    pub fn secret_pair(&self) -> Option<(Option<&str>, Option<&str>)> {
        match self {
            CandidatePayload::Ftp(f) => Some((Some(f.username.as_str()), f.password.as_deref())),
            CandidatePayload::Server(s) => Some((s.username.as_deref(), s.password.as_deref())),
            CandidatePayload::Email(e) => Some((Some(e.email.as_str()), e.password.as_deref())),
            CandidatePayload::Website(w) => Some((w.username.as_deref(), w.password.as_deref())),
            CandidatePayload::Generic(g) => Some((g.username.as_deref(), g.password.as_deref())),
            CandidatePayload::Domain(_) | CandidatePayload::Dns(_) => None,
        }
    }
}

/// Unclassified extraction result.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub payload: CandidatePayload,
    /// Byte offset of the anchor in the analyzed text.
    pub source_offset: usize,
    /// `None` only for candidates that did not come from the heuristic pass.
    pub confidence: Option<f64>,
    pub client: Option<ClientContext>,
}

impl RawCandidate {
    pub fn new(payload: CandidatePayload, source_offset: usize, confidence: f64) -> Self {
        Self {
            payload,
            source_offset,
            confidence: Some(clamp_confidence(confidence)),
            client: None,
        }
    }

    /// Candidate without a heuristic confidence (e.g. supplied by remote inference).
    pub fn unscored(payload: CandidatePayload, source_offset: usize) -> Self {
        Self {
            payload,
            source_offset,
            confidence: None,
            client: None,
        }
    }

    pub fn with_client(mut self, client: Option<ClientContext>) -> Self {
        self.client = client;
        self
    }

    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    /// True for every kind except `Generic`.
    pub fn is_specialized(&self) -> bool {
        self.kind() != Kind::Generic
    }
}

fn clamp_confidence(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
