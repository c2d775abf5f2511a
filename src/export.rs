//! Grouping, categorization and export artifacts.
//!
//! Export refuses to produce an empty artifact: zero records is an
//! `EmptyExport` error, never an empty JSON array or a header-only CSV.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{CredSiftError, IoResultExt, Result};
use crate::format::{FormattedRecord, RecordDetails, RecordType};

/// Group key for records without a client id.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Group key for records without a ticket id.
pub const GENERAL_TICKET: &str = "general";

/// Client name used when none of a client's records carries one.
pub const DEFAULT_CLIENT_NAME: &str = "Unknown Client";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub id: String,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetadata {
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketGroup {
    pub credentials: Vec<FormattedRecord>,
    pub metadata: TicketMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientGroup {
    pub client_name: String,
    pub client_info: ClientInfo,
    pub tickets: BTreeMap<String, TicketGroup>,
}

/// Records bucketed by client id, then ticket id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GroupedExport(pub BTreeMap<String, ClientGroup>);

impl GroupedExport {
    pub fn clients(&self) -> impl Iterator<Item = (&String, &ClientGroup)> {
        self.0.iter()
    }

    pub fn record_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|c| c.tickets.values())
            .map(|t| t.credentials.len())
            .sum()
    }
}

/// Records bucketed by output type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorizedExport {
    pub ftp_accounts: Vec<FormattedRecord>,
    pub websites: Vec<FormattedRecord>,
    pub domains: Vec<FormattedRecord>,
    pub email_accounts: Vec<FormattedRecord>,
    pub other_credentials: Vec<FormattedRecord>,
}

impl CategorizedExport {
    pub fn bucket(&self, record_type: RecordType) -> &[FormattedRecord] {
        match record_type {
            RecordType::Ftp => &self.ftp_accounts,
            RecordType::Website => &self.websites,
            RecordType::Domain => &self.domains,
            RecordType::Email => &self.email_accounts,
            RecordType::Generic => &self.other_credentials,
        }
    }
}

/// Bucket by client id (default `unknown`) then ticket id (default `general`).
pub fn group(records: &[FormattedRecord]) -> GroupedExport {
    group_with_default_name(records, DEFAULT_CLIENT_NAME)
}

pub fn group_with_default_name(records: &[FormattedRecord], default_name: &str) -> GroupedExport {
    let mut clients: BTreeMap<String, ClientGroup> = BTreeMap::new();

    for record in records {
        let client_id = record
            .client_id
            .clone()
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        let ticket_id = record
            .ticket_id
            .clone()
            .unwrap_or_else(|| GENERAL_TICKET.to_string());
        let at = record.extracted_at();

        let client = clients
            .entry(client_id.clone())
            .or_insert_with(|| ClientGroup {
                client_name: default_name.to_string(),
                client_info: ClientInfo {
                    id: client_id.clone(),
                    date_added: at,
                },
                tickets: BTreeMap::new(),
            });
        if client.client_name == default_name
            && let Some(name) = &record.client_name
        {
            client.client_name = name.clone();
        }
        client.client_info.date_added = client.client_info.date_added.min(at);

        let ticket = client
            .tickets
            .entry(ticket_id)
            .or_insert_with(|| TicketGroup {
                credentials: Vec::new(),
                metadata: TicketMetadata { date_created: at },
            });
        ticket.metadata.date_created = ticket.metadata.date_created.min(at);

        let mut stored = record.clone();
        stored.client_id = None;
        stored.ticket_id = None;
        ticket.credentials.push(stored);
    }

    GroupedExport(clients)
}

/// Records of a grouped export with client and ticket ids re-attached.
pub fn flatten(grouped: &GroupedExport) -> Vec<FormattedRecord> {
    let mut out = Vec::with_capacity(grouped.record_count());
    for (client_id, client) in grouped.clients() {
        for (ticket_id, ticket) in &client.tickets {
            for record in &ticket.credentials {
                let mut record = record.clone();
                record.client_id = (client_id != UNKNOWN_CLIENT).then(|| client_id.clone());
                record.ticket_id = (ticket_id != GENERAL_TICKET).then(|| ticket_id.clone());
                out.push(record);
            }
        }
    }
    out
}

/// Bucket records by their output type.
pub fn categorize(records: &[FormattedRecord]) -> CategorizedExport {
    let mut out = CategorizedExport::default();
    for record in records {
        let bucket = match record.record_type() {
            RecordType::Ftp => &mut out.ftp_accounts,
            RecordType::Website => &mut out.websites,
            RecordType::Domain => &mut out.domains,
            RecordType::Email => &mut out.email_accounts,
            RecordType::Generic => &mut out.other_credentials,
        };
        bucket.push(record.clone());
    }
    out
}

/// A serialized export artifact.
pub trait RecordExporter {
    fn export(&self, records: &[FormattedRecord]) -> Result<String>;

    fn mime_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;
}

/// Shape of a JSON export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonLayout {
    #[default]
    Flat,
    Grouped,
    Categorized,
}

pub struct JsonExporter {
    layout: JsonLayout,
    pretty: bool,
    default_client_name: String,
}

impl JsonExporter {
    pub fn new(layout: JsonLayout) -> Self {
        Self {
            layout,
            pretty: true,
            default_client_name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn default_client_name(mut self, name: impl Into<String>) -> Self {
        self.default_client_name = name.into();
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(format!("{json}\n"))
    }
}

impl RecordExporter for JsonExporter {
    fn export(&self, records: &[FormattedRecord]) -> Result<String> {
        if records.is_empty() {
            return Err(CredSiftError::empty_export("json"));
        }
        match self.layout {
            JsonLayout::Flat => self.render(&records),
            JsonLayout::Grouped => {
                self.render(&group_with_default_name(records, &self.default_client_name))
            }
            JsonLayout::Categorized => self.render(&categorize(records)),
        }
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

/// CSV for a single output type.
pub struct CsvExporter {
    category: RecordType,
}

impl CsvExporter {
    pub fn new(category: RecordType) -> Self {
        Self { category }
    }

    pub fn headers(category: RecordType) -> &'static [&'static str] {
        match category {
            RecordType::Ftp => &["Server", "Username", "Password", "Port", "Encryption"],
            RecordType::Website => &["URL", "Hostname", "Username", "Password", "CMS"],
            RecordType::Domain => &["Domain", "Nameservers"],
            RecordType::Email => &[
                "Email",
                "Password",
                "Server",
                "IMAP Port",
                "SMTP Port",
                "POP3 Port",
            ],
            RecordType::Generic => &["Username", "Password", "System"],
        }
    }
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn row(details: &RecordDetails) -> Vec<String> {
    match details {
        RecordDetails::Ftp(f) => vec![
            f.server.clone(),
            f.username.clone(),
            cell(&f.password),
            f.port.to_string(),
            f.encryption.clone(),
        ],
        RecordDetails::Website(w) => vec![
            w.url.clone(),
            cell(&w.hostname),
            cell(&w.username),
            cell(&w.password),
            cell(&w.cms),
        ],
        RecordDetails::Domain(d) => vec![d.domain.clone(), d.nameservers.join("; ")],
        RecordDetails::Email(e) => vec![
            e.email.clone(),
            cell(&e.password),
            cell(&e.server),
            e.imap_port.to_string(),
            e.smtp_port.to_string(),
            e.pop3_port.to_string(),
        ],
        RecordDetails::Generic(g) => vec![cell(&g.username), cell(&g.password), cell(&g.system)],
    }
}

impl RecordExporter for CsvExporter {
    fn export(&self, records: &[FormattedRecord]) -> Result<String> {
        let selected: Vec<&FormattedRecord> = records
            .iter()
            .filter(|r| r.record_type() == self.category)
            .collect();
        if selected.is_empty() {
            return Err(CredSiftError::empty_export(format!("{} csv", self.category)));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Self::headers(self.category))?;
        for record in selected {
            writer.write_record(row(&record.details))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CredSiftError::internal(format!("CSV buffer flush failed: {e}")))?;
        String::from_utf8(bytes).map_err(|e| CredSiftError::internal_with("CSV output is not UTF-8", e))
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }
}

/// Write one artifact as `<dir>/<stem>.<ext>`.
pub fn write_artifact(
    dir: &Path,
    stem: &str,
    exporter: &dyn RecordExporter,
    records: &[FormattedRecord],
) -> Result<PathBuf> {
    let content = exporter.export(records)?;
    fs::create_dir_all(dir).with_path(dir.display().to_string(), "create directory")?;
    let path = dir.join(format!("{stem}.{}", exporter.file_extension()));
    fs::write(&path, content).with_path(path.display().to_string(), "write")?;
    tracing::info!(path = %path.display(), mime = exporter.mime_type(), "export written");
    Ok(path)
}

/// Write every non-empty category as its own CSV file.
pub fn write_csv_per_category(dir: &Path, records: &[FormattedRecord]) -> Result<Vec<PathBuf>> {
    if records.is_empty() {
        return Err(CredSiftError::empty_export("csv"));
    }
    let mut written = Vec::new();
    for category in RecordType::ALL {
        if records.iter().any(|r| r.record_type() == category) {
            let stem = format!("credentials-{category}");
            written.push(write_artifact(dir, &stem, &CsvExporter::new(category), records)?);
        }
    }
    Ok(written)
}
