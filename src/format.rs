//! Classifier and formatter.
//!
//! `classify` maps a candidate onto the closed set of output record types.
//! `Formatter` turns a candidate into its canonical `FormattedRecord`,
//! filling in protocol defaults and stamping the extraction time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::{CandidatePayload, DnsRecord, GenericFields, RawCandidate};
use crate::extractors::website::hostname_of;
use crate::patterns::{EMAIL, HOSTNAME, WEBSITE_URL, find_anchors, nearby_text};

pub use crate::extractors::ftp::DEFAULT_FTP_PORT;
pub const DEFAULT_FTP_ENCRYPTION: &str = "FTP";
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_POP3_PORT: u16 = 995;
pub const DEFAULT_MAIL_ENCRYPTION: &str = "SSL/TLS";

/// Confidence reported when a candidate carries none at all.
pub const FALLBACK_CONFIDENCE: f64 = 1.0;

/// Output record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Ftp,
    Website,
    Domain,
    Email,
    Generic,
}

impl RecordType {
    pub const ALL: [RecordType; 5] = [
        RecordType::Ftp,
        RecordType::Website,
        RecordType::Domain,
        RecordType::Email,
        RecordType::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Ftp => "ftp",
            RecordType::Website => "website",
            RecordType::Domain => "domain",
            RecordType::Email => "email",
            RecordType::Generic => "generic",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ftp" => Ok(RecordType::Ftp),
            "website" | "web" => Ok(RecordType::Website),
            "domain" => Ok(RecordType::Domain),
            "email" | "mail" => Ok(RecordType::Email),
            "generic" | "other" => Ok(RecordType::Generic),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// Record type of a candidate: its extractor's kind when that is an output
/// type, else whatever its free-text system label points at.
pub fn classify(candidate: &RawCandidate) -> RecordType {
    match &candidate.payload {
        CandidatePayload::Ftp(_) => RecordType::Ftp,
        CandidatePayload::Website(_) => RecordType::Website,
        CandidatePayload::Domain(_) | CandidatePayload::Dns(_) => RecordType::Domain,
        CandidatePayload::Email(_) => RecordType::Email,
        CandidatePayload::Server(_) => RecordType::Generic,
        CandidatePayload::Generic(g) => g
            .system
            .as_deref()
            .map(classify_label)
            .unwrap_or(RecordType::Generic),
    }
}

/// Substring probe of a system label.
pub fn classify_label(label: &str) -> RecordType {
    let l = label.to_lowercase();
    if l.contains("ftp") {
        RecordType::Ftp
    } else if l.contains("web") {
        RecordType::Website
    } else if l.contains("domain") || l.contains("domen") {
        RecordType::Domain
    } else if l.contains('@') {
        RecordType::Email
    } else {
        RecordType::Generic
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FtpRecord {
    pub server: String,
    pub username: String,
    pub password: Option<String>,
    pub port: u16,
    pub encryption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteRecord {
    pub url: String,
    pub hostname: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cms: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub domain: String,
    pub nameservers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_records: Vec<DnsRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub email: String,
    pub password: Option<String>,
    pub server: Option<String>,
    pub imap_port: u16,
    pub smtp_port: u16,
    pub pop3_port: u16,
    pub encryption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenericRecord {
    pub username: Option<String>,
    pub password: Option<String>,
    pub system: Option<String>,
}

/// Per-type record body, tagged with `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordDetails {
    Ftp(FtpRecord),
    Website(WebsiteRecord),
    Domain(DomainRecord),
    Email(EmailRecord),
    Generic(GenericRecord),
}

impl RecordDetails {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordDetails::Ftp(_) => RecordType::Ftp,
            RecordDetails::Website(_) => RecordType::Website,
            RecordDetails::Domain(_) => RecordType::Domain,
            RecordDetails::Email(_) => RecordType::Email,
            RecordDetails::Generic(_) => RecordType::Generic,
        }
    }

    /// One-line human summary used by the terminal renderer.
    pub fn summary(&self) -> String {
        match self {
            RecordDetails::Ftp(f) => format!("{}@{}:{}", f.username, f.server, f.port),
            RecordDetails::Website(w) => match &w.username {
                Some(user) => format!("{} ({user})", w.url),
                None => w.url.clone(),
            },
            RecordDetails::Domain(d) if d.nameservers.is_empty() => d.domain.clone(),
            RecordDetails::Domain(d) => format!("{} [{}]", d.domain, d.nameservers.join(", ")),
            RecordDetails::Email(e) => match &e.server {
                Some(server) => format!("{} via {server}", e.email),
                None => e.email.clone(),
            },
            RecordDetails::Generic(g) => {
                let user = g.username.as_deref().unwrap_or("?");
                match &g.system {
                    Some(system) => format!("{user} @ {system}"),
                    None => user.to_string(),
                }
            }
        }
    }
}

/// Canonical output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormattedRecord {
    #[serde(flatten)]
    pub details: RecordDetails,
    pub confidence: f64,
    extracted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Source text around the record, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl FormattedRecord {
    pub fn new(details: RecordDetails, confidence: f64, extracted_at: DateTime<Utc>) -> Self {
        Self {
            details,
            confidence,
            extracted_at,
            client_name: None,
            client_id: None,
            ticket_id: None,
            context: None,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.details.record_type()
    }

    /// Extraction time; fixed once the record exists.
    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }
}

/// Formats candidates with a shared extraction timestamp.
#[derive(Debug, Clone)]
pub struct Formatter<'a> {
    extracted_at: DateTime<Utc>,
    context: Option<(&'a str, usize)>,
}

impl Default for Formatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Formatter<'a> {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(extracted_at: DateTime<Utc>) -> Self {
        Self {
            extracted_at,
            context: None,
        }
    }

    /// Attach the `radius`-character window of `text` around each record's
    /// source offset.
    pub fn with_context(mut self, text: &'a str, radius: usize) -> Self {
        self.context = Some((text, radius));
        self
    }

    pub fn format(&self, candidate: &RawCandidate) -> FormattedRecord {
        let details = details_for(candidate);
        let mut record = FormattedRecord::new(
            details,
            candidate.confidence.unwrap_or(FALLBACK_CONFIDENCE),
            self.extracted_at,
        );
        if let Some(client) = &candidate.client {
            record.client_name = client.name.clone();
            record.client_id = client.id.clone();
            record.ticket_id = client.ticket_id.clone();
        }
        if let Some((text, radius)) = self.context {
            let window = nearby_text(text, candidate.source_offset, radius).trim();
            if !window.is_empty() {
                record.context = Some(window.to_string());
            }
        }
        record
    }

    pub fn format_all(&self, candidates: &[RawCandidate]) -> Vec<FormattedRecord> {
        candidates.iter().map(|c| self.format(c)).collect()
    }
}

/// Format one candidate, stamped now.
pub fn format(candidate: &RawCandidate) -> FormattedRecord {
    Formatter::new().format(candidate)
}

fn details_for(candidate: &RawCandidate) -> RecordDetails {
    match &candidate.payload {
        CandidatePayload::Ftp(f) => RecordDetails::Ftp(FtpRecord {
            server: f.server.clone(),
            username: f.username.clone(),
            password: f.password.clone(),
            port: f.port.unwrap_or(DEFAULT_FTP_PORT),
            encryption: DEFAULT_FTP_ENCRYPTION.to_string(),
        }),
        CandidatePayload::Website(w) => RecordDetails::Website(WebsiteRecord {
            url: w.url.clone(),
            hostname: w.hostname.clone(),
            username: w.username.clone(),
            password: w.password.clone(),
            cms: w.cms.clone(),
        }),
        CandidatePayload::Domain(d) => RecordDetails::Domain(DomainRecord {
            domain: d.domain.clone(),
            nameservers: d.nameservers.to_vec(),
            dns_records: Vec::new(),
        }),
        CandidatePayload::Dns(d) => RecordDetails::Domain(DomainRecord {
            domain: d.domain.clone(),
            nameservers: d.nameservers.to_vec(),
            dns_records: d.records.clone(),
        }),
        CandidatePayload::Email(e) => {
            let server = e.server.as_deref();
            RecordDetails::Email(EmailRecord {
                email: e.email.clone(),
                password: e.password.clone(),
                server: server.map(|s| s.hostname.clone()),
                imap_port: server.and_then(|s| s.imap_port).unwrap_or(DEFAULT_IMAP_PORT),
                smtp_port: server.and_then(|s| s.smtp_port).unwrap_or(DEFAULT_SMTP_PORT),
                pop3_port: server.and_then(|s| s.pop_port).unwrap_or(DEFAULT_POP3_PORT),
                encryption: server
                    .and_then(|s| s.encryption.clone())
                    .unwrap_or_else(|| DEFAULT_MAIL_ENCRYPTION.to_string()),
            })
        }
        CandidatePayload::Server(s) => {
            let mut system = format!("{}: {}", s.label, s.host);
            if let Some(port) = s.port {
                system.push_str(&format!(":{port}"));
            }
            RecordDetails::Generic(GenericRecord {
                username: s.username.clone(),
                password: s.password.clone(),
                system: Some(system),
            })
        }
        CandidatePayload::Generic(g) => generic_details(g),
    }
}

/// A generic pair reshaped into the record type its label points at, when
/// the label names a concrete target that record can hold together with the
/// credentials. Anything else stays a generic record.
fn generic_details(g: &GenericFields) -> RecordDetails {
    let label = g.system.as_deref().unwrap_or_default();
    let kept = || {
        RecordDetails::Generic(GenericRecord {
            username: g.username.clone(),
            password: g.password.clone(),
            system: g.system.clone(),
        })
    };

    match classify_label(label) {
        RecordType::Ftp => match (HOSTNAME.find(label), &g.username) {
            (Some(host), Some(username)) => RecordDetails::Ftp(FtpRecord {
                server: host.as_str().to_lowercase(),
                username: username.clone(),
                password: g.password.clone(),
                port: DEFAULT_FTP_PORT,
                encryption: DEFAULT_FTP_ENCRYPTION.to_string(),
            }),
            _ => kept(),
        },
        RecordType::Website => {
            let url = find_anchors(label, &WEBSITE_URL)
                .into_iter()
                .next()
                .map(|a| a.value)
                .or_else(|| HOSTNAME.find(label).map(|m| m.as_str().to_string()));
            match url {
                Some(url) => RecordDetails::Website(WebsiteRecord {
                    hostname: hostname_of(&url).ok(),
                    url,
                    username: g.username.clone(),
                    password: g.password.clone(),
                    cms: None,
                }),
                None => kept(),
            }
        }
        RecordType::Email => {
            let email = find_anchors(label, &EMAIL)
                .into_iter()
                .next()
                .map(|a| a.value.to_lowercase());
            let same_login = |email: &str| {
                g.username
                    .as_deref()
                    .is_none_or(|u| u.eq_ignore_ascii_case(email))
            };
            match email {
                Some(email) if same_login(&email) => RecordDetails::Email(EmailRecord {
                    email,
                    password: g.password.clone(),
                    server: None,
                    imap_port: DEFAULT_IMAP_PORT,
                    smtp_port: DEFAULT_SMTP_PORT,
                    pop3_port: DEFAULT_POP3_PORT,
                    encryption: DEFAULT_MAIL_ENCRYPTION.to_string(),
                }),
                _ => kept(),
            }
        }
        // A domain record has no room for a login.
        RecordType::Domain | RecordType::Generic => kept(),
    }
}
