//! Server, SSH and hosting-panel access extraction.
//!
//! Anchors are hosts introduced by a server-ish keyword (`serwer:`, `panel:`,
//! `SSH:`, `cPanel:`, ...). Hosts that belong to another extractor are left
//! alone: FTP, mail and nameserver endpoints, and anything written as an
//! http(s) URL (that is a website). A host counts as foreign when its own
//! line names the service ("FTP host: ...") or when the FTP or mail server
//! patterns already anchor it.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{Extractor, parse_port, port_after};
use crate::candidate::{CandidatePayload, Kind, RawCandidate, ServerFields, confidence_for};
use crate::config::WindowConfig;
use crate::domain_utils;
use crate::patterns::{self, ContextWindow};

/// Keyword spans that hand the host to a more specific extractor.
static FOREIGN_SERVICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)s?ftp|poczt|mail|imap|smtp|pop3?|dns|nazw|name|ns\b").unwrap()
});

#[derive(Debug, Clone)]
pub struct ServerExtractor {
    windows: WindowConfig,
}

impl ServerExtractor {
    pub fn new(windows: WindowConfig) -> Self {
        Self { windows }
    }
}

/// Lowercased hosts claimed by the FTP and mail server patterns.
fn foreign_hosts(text: &str) -> HashSet<String> {
    [&*patterns::FTP_HOST, &*patterns::MAIL_SERVER_HOST]
        .into_iter()
        .flat_map(|set| patterns::find_occurrences(text, set))
        .map(|a| a.value.to_lowercase())
        .collect()
}

/// Text between the start of the line and `end`.
fn line_prefix(text: &str, end: usize) -> &str {
    let start = text[..end].rfind('\n').map_or(0, |i| i + 1);
    &text[start..end]
}

impl Extractor for ServerExtractor {
    fn kind(&self) -> Kind {
        Kind::Server
    }

    fn extract(&self, text: &str) -> Vec<RawCandidate> {
        let mut out = Vec::new();
        let foreign = foreign_hosts(text);

        for anchor in patterns::find_anchors(text, &patterns::SERVER_HOST) {
            let keyword = text[anchor.span.start..anchor.offset]
                .trim_end_matches([' ', '\t', ':', '='])
                .trim();
            if FOREIGN_SERVICE.is_match(line_prefix(text, anchor.offset))
                || foreign.contains(&anchor.value.to_lowercase())
                || domain_utils::is_ftp_host(&anchor.value)
                || domain_utils::is_mail_host(&anchor.value)
                || domain_utils::is_nameserver_host(&anchor.value)
            {
                continue;
            }

            let window = ContextWindow::around(text, anchor.offset, self.windows.server);
            let username = window.probe(&patterns::USERNAME).map(|c| c.value);
            let password = window.probe(&patterns::PASSWORD).map(|c| c.value);
            if username.is_none() && password.is_none() {
                tracing::trace!(host = %anchor.value, "server host without credentials, skipped");
                continue;
            }

            let port = port_after(text, anchor.end()).or_else(|| {
                window
                    .probe(&patterns::PORT)
                    .and_then(|c| parse_port(&c.value))
            });
            let confidence = confidence_for(username.is_some() && password.is_some());

            out.push(RawCandidate::new(
                CandidatePayload::Server(ServerFields {
                    host: anchor.value,
                    port,
                    label: keyword.to_string(),
                    username,
                    password,
                }),
                anchor.offset,
                confidence,
            ));
        }

        out
    }
}
