//! Mailbox extraction.
//!
//! Not every address in a support message is a mailbox to migrate: most are
//! signatures, CCs or logins. An address is accepted only when migration
//! vocabulary appears around it, or when the message carries a mail server
//! block (then every address in it is in scope). Addresses used as logins
//! are excluded: either a login keyword sits right before the address, the
//! whole address is the value of a login field, or its local part is the
//! value of a login field written close to it.
//!
//! The mail server block is parsed once per message and shared by every
//! mailbox candidate.

use std::sync::Arc;

use super::{Extractor, parse_port};
use crate::candidate::{
    CandidatePayload, EmailFields, Kind, MailServerConfig, RawCandidate, confidence_for,
};
use crate::config::WindowConfig;
use crate::patterns::{self, ContextWindow};

#[derive(Debug, Clone)]
pub struct EmailExtractor {
    windows: WindowConfig,
}

impl EmailExtractor {
    pub fn new(windows: WindowConfig) -> Self {
        Self { windows }
    }

    /// First mail server host in the message with the ports and encryption
    /// written around it.
    pub fn mail_server_block(&self, text: &str) -> Option<Arc<MailServerConfig>> {
        let anchor = patterns::find_anchors(text, &patterns::MAIL_SERVER_HOST)
            .into_iter()
            .min_by_key(|a| a.offset)?;
        let window = ContextWindow::around(text, anchor.offset, self.windows.server);
        let port = |set: &patterns::PatternSet| {
            window.probe(set).and_then(|c| parse_port(&c.value))
        };

        Some(Arc::new(MailServerConfig {
            hostname: anchor.value.to_lowercase(),
            imap_port: port(&patterns::IMAP_PORT),
            smtp_port: port(&patterns::SMTP_PORT),
            pop_port: port(&patterns::POP_PORT),
            encryption: window
                .probe(&patterns::ENCRYPTION)
                .map(|c| c.value.to_uppercase()),
        }))
    }
}

/// A login field value and where it was written.
struct LoginValue {
    value: String,
    offset: usize,
}

/// Lowercased values of every login field in the message.
fn login_values(text: &str) -> Vec<LoginValue> {
    patterns::find_occurrences(text, &patterns::USERNAME)
        .into_iter()
        .map(|a| LoginValue {
            value: a.value.to_lowercase(),
            offset: a.offset,
        })
        .collect()
}

/// True when the address at `offset` is a login: the whole address is a
/// login value anywhere, or its local part is one within `radius` bytes.
fn is_login(email: &str, offset: usize, logins: &[LoginValue], radius: usize) -> bool {
    let lower = email.to_lowercase();
    let local = lower.split_once('@').map(|(local, _)| local);
    logins.iter().any(|login| {
        login.value == lower
            || (local == Some(login.value.as_str()) && login.offset.abs_diff(offset) <= radius)
    })
}

impl Extractor for EmailExtractor {
    fn kind(&self) -> Kind {
        Kind::Email
    }

    fn extract(&self, text: &str) -> Vec<RawCandidate> {
        let anchors = patterns::find_anchors(text, &patterns::EMAIL);
        if anchors.is_empty() {
            return Vec::new();
        }

        let server = self.mail_server_block(text);
        let logins = login_values(text);
        let mut out = Vec::new();

        for anchor in anchors {
            let pre = ContextWindow::before(text, anchor.offset, self.windows.login_exclusion);
            if pre.contains(&patterns::LOGIN_KEYWORD)
                || is_login(&anchor.value, anchor.offset, &logins, self.windows.credential)
            {
                tracing::trace!(email = %anchor.value, "address used as a login, skipped");
                continue;
            }

            let in_scope = server.is_some()
                || ContextWindow::around(text, anchor.offset, self.windows.migration_keyword)
                    .contains(&patterns::MIGRATION_KEYWORD);
            if !in_scope {
                continue;
            }

            let password = ContextWindow::around(text, anchor.offset, self.windows.email_password)
                .probe(&patterns::PASSWORD)
                .map(|c| c.value);
            let confidence = confidence_for(password.is_some());

            out.push(RawCandidate::new(
                CandidatePayload::Email(EmailFields {
                    email: anchor.value.to_lowercase(),
                    password,
                    server: server.clone(),
                }),
                anchor.offset,
                confidence,
            ));
        }

        out
    }
}
