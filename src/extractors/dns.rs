//! DNS zone section extraction.
//!
//! A section starts at a header ("Rekordy DNS", "DNS zone", "plik strefy",
//! ...) and runs until the first blank line or the configured section extent.
//! Zone-file-like lines inside it are parsed into records; prose lines that
//! merely start with a type keyword are rejected by per-type value checks.

use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;

use super::Extractor;
use super::domain::{explicit_domains, nameserver_block};
use super::website::hostname_of;
use crate::candidate::{
    CandidatePayload, DnsFields, DnsRecord, Kind, NameserverList, RawCandidate, confidence_for,
};
use crate::config::WindowConfig;
use crate::domain_utils;
use crate::patterns;

static RECORD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:(\S+)[ \t]+)?(?:\d+[ \t]+)?(?:IN[ \t]+)?(AAAA|A|CNAME|MX|TXT|NS|SRV|CAA)\b[ \t]*[:=]?[ \t]*(\S[^\r\n]*?)[ \t]*\r?$",
    )
    .unwrap()
});

static ORIGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*\$ORIGIN[ \t]+(\S+)").unwrap());

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\r?\n").unwrap());

/// Parse the zone-like lines of a section.
pub fn parse_records(section: &str) -> Vec<DnsRecord> {
    let mut out = Vec::new();
    for caps in RECORD_LINE.captures_iter(section) {
        let (Some(record_type), Some(value)) = (caps.get(2), caps.get(3)) else {
            continue;
        };
        let record_type = record_type.as_str().to_ascii_uppercase();
        let value = value.as_str().trim().to_string();
        if !is_plausible(&record_type, &value) {
            continue;
        }
        let name = caps
            .get(1)
            .map(|m| m.as_str())
            .filter(|owner| !owner.eq_ignore_ascii_case("in"))
            .unwrap_or("@")
            .to_string();
        out.push(DnsRecord {
            name,
            record_type,
            value,
        });
    }
    out
}

fn is_plausible(record_type: &str, value: &str) -> bool {
    let mut tokens = value.split_whitespace();
    let first = tokens.next().unwrap_or("");
    match record_type {
        "A" => first.parse::<Ipv4Addr>().is_ok(),
        "AAAA" => first.parse::<Ipv6Addr>().is_ok(),
        "CNAME" | "NS" => first == "@" || is_host(first),
        "MX" => {
            let host = if first.parse::<u16>().is_ok() {
                tokens.next().unwrap_or("")
            } else {
                first
            };
            is_host(host)
        }
        _ => !value.is_empty(),
    }
}

fn is_host(token: &str) -> bool {
    let t = token.trim_end_matches('.');
    patterns::HOSTNAME
        .find(t)
        .is_some_and(|m| m.start() == 0 && m.end() == t.len())
}

#[derive(Debug, Clone)]
pub struct DnsExtractor {
    windows: WindowConfig,
}

impl DnsExtractor {
    pub fn new(windows: WindowConfig) -> Self {
        Self { windows }
    }

    /// Text following a header, bounded by a blank line or the section extent.
    fn section<'a>(&self, text: &'a str, from: usize) -> &'a str {
        let rest = &text[from..];
        let limit = rest
            .char_indices()
            .nth(self.windows.dns_section)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let rest = &rest[..limit];
        // the header line itself may be followed by the records directly
        let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        match BLANK_LINE.find(&rest[body_start..]) {
            Some(m) => &rest[..body_start + m.start()],
            None => rest,
        }
    }
}

/// Domain a section describes, and whether the section itself named it.
fn section_domain(
    text: &str,
    header_offset: usize,
    section: &str,
    records: &[DnsRecord],
    nameservers: &NameserverList,
) -> Option<(String, bool)> {
    if let Some(origin) = ORIGIN.captures(section).and_then(|c| c.get(1)) {
        return Some((domain_utils::normalize_host(origin.as_str()), true));
    }

    let header_line = section.lines().next().unwrap_or("");
    if let Some(host) = patterns::HOSTNAME.find(header_line)
        && !nameservers.contains(host.as_str())
    {
        return Some((domain_utils::normalize_host(host.as_str()), true));
    }

    if let Some(domain) = records
        .iter()
        .filter(|r| r.name.ends_with('.') && r.name.contains('.'))
        .find_map(|r| domain_utils::extract_registrable_domain(&r.name))
    {
        return Some((domain, true));
    }

    if let Some((domain, _)) = explicit_domains(text, nameservers)
        .into_iter()
        .min_by_key(|(_, offset)| offset.abs_diff(header_offset))
    {
        return Some((domain, false));
    }

    patterns::find_anchors(text, &patterns::WEBSITE_URL)
        .iter()
        .filter_map(|a| hostname_of(&a.value).ok())
        .find_map(|host| domain_utils::extract_registrable_domain(&host))
        .map(|domain| (domain, false))
}

impl Extractor for DnsExtractor {
    fn kind(&self) -> Kind {
        Kind::Dns
    }

    fn extract(&self, text: &str) -> Vec<RawCandidate> {
        let headers = patterns::find_anchors(text, &patterns::DNS_SECTION);
        if headers.is_empty() {
            return Vec::new();
        }

        let document_nameservers = nameserver_block(text);
        let mut out = Vec::new();

        for header in headers {
            let section = self.section(text, header.span.end);
            let records = parse_records(section);
            if records.is_empty() {
                continue;
            }

            let Some((domain, named)) =
                section_domain(text, header.offset, section, &records, &document_nameservers)
            else {
                tracing::debug!(header = %header.value, "dns section without a domain, skipped");
                continue;
            };

            let from_records: NameserverList = records
                .iter()
                .filter(|r| r.record_type == "NS")
                .map(|r| r.value.as_str())
                .collect();
            let nameservers = if from_records.is_empty() {
                document_nameservers.clone()
            } else {
                from_records
            };

            out.push(RawCandidate::new(
                CandidatePayload::Dns(DnsFields {
                    domain,
                    nameservers,
                    records,
                }),
                header.offset,
                confidence_for(named),
            ));
        }

        out
    }
}
