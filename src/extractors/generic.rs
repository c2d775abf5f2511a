//! Free-standing login/password pairs.
//!
//! Every login field in the message is a candidate anchor; a pair is emitted
//! only when a password resolves. The password lookup never crosses into a
//! neighbouring login's block. The system the pair belongs to is read from
//! the text on the login's own line, or from a short `Label:` line right
//! above it.

use super::Extractor;
use crate::candidate::{CandidatePayload, GenericFields, Kind, RawCandidate, confidence_for};
use crate::config::WindowConfig;
use crate::patterns::{self, ContextWindow};

#[derive(Debug, Clone)]
pub struct GenericExtractor {
    windows: WindowConfig,
}

impl GenericExtractor {
    pub fn new(windows: WindowConfig) -> Self {
        Self { windows }
    }

    fn system_label(&self, text: &str, keyword_start: usize) -> Option<String> {
        let line_start = text[..keyword_start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let prefix = text[line_start..keyword_start]
            .trim()
            .trim_end_matches([':', '-', '–', '|', ','])
            .trim();
        if !prefix.is_empty() {
            let usable = prefix.chars().count() <= self.windows.system_label
                && !patterns::CREDENTIAL_KEYWORD.is_match(prefix);
            return usable.then(|| prefix.to_string());
        }

        let above = ContextWindow::before(text, line_start, self.windows.system_label);
        let line = above.text.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
        if line.ends_with(':') && !patterns::CREDENTIAL_KEYWORD.is_match(line) {
            let label = line.trim_end_matches(':').trim();
            return (!label.is_empty()).then(|| label.to_string());
        }
        None
    }
}

impl Extractor for GenericExtractor {
    fn kind(&self) -> Kind {
        Kind::Generic
    }

    fn extract(&self, text: &str) -> Vec<RawCandidate> {
        let logins = patterns::find_occurrences(text, &patterns::USERNAME);
        let mut out = Vec::new();

        for (i, login) in logins.iter().enumerate() {
            // only the first login may take a password written above it
            let block_start = if i == 0 { 0 } else { login.span.start };
            let block_end = logins
                .get(i + 1)
                .map(|next| next.span.start)
                .unwrap_or(text.len());

            let bounded = &text[..block_end];
            let password = ContextWindow::around(bounded, login.offset, self.windows.generic_pair)
                .probe(&patterns::PASSWORD)
                .filter(|c| c.offset >= block_start)
                .map(|c| c.value);
            let Some(password) = password else {
                continue;
            };

            let system = self.system_label(text, login.span.start);
            let confidence = confidence_for(system.is_some());
            out.push(RawCandidate::new(
                CandidatePayload::Generic(GenericFields {
                    username: Some(login.value.clone()),
                    password: Some(password),
                    system,
                }),
                login.offset,
                confidence,
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(c: &RawCandidate) -> &GenericFields {
        match &c.payload {
            CandidatePayload::Generic(g) => g,
            other => panic!("expected generic payload, got {other:?}"),
        }
    }

    fn extract(text: &str) -> Vec<RawCandidate> {
        GenericExtractor::new(WindowConfig::default()).extract(text)
    }

    #[test]
    fn test_labelled_pair() {
        let found = extract("Panel Allegro:\nlogin: sklep_pl\nhasło: Zakupy#1");
        assert_eq!(found.len(), 1);
        let g = generic(&found[0]);
        assert_eq!(g.username.as_deref(), Some("sklep_pl"));
        assert_eq!(g.password.as_deref(), Some("Zakupy#1"));
        assert_eq!(g.system.as_deref(), Some("Panel Allegro"));
        assert_eq!(found[0].confidence, Some(0.9));
    }

    #[test]
    fn test_label_on_the_same_line() {
        let found = extract("Baza danych - user: db_admin, password: s3cr3t");
        assert_eq!(generic(&found[0]).system.as_deref(), Some("Baza danych"));
    }

    #[test]
    fn test_unlabelled_pair_is_baseline() {
        let found = extract("login: jan\nhasło: tajne");
        assert_eq!(generic(&found[0]).system, None);
        assert_eq!(found[0].confidence, Some(0.7));
    }

    #[test]
    fn test_login_without_password_is_skipped() {
        assert!(extract("Mój login: jan, hasło wyślę później").is_empty());
    }

    #[test]
    fn test_passwords_do_not_leak_between_blocks() {
        let found = extract("login: a\nhasło: one\n\nlogin: b\n\nlogin: c\nhasło: three");
        assert_eq!(found.len(), 2);
        assert_eq!(generic(&found[0]).username.as_deref(), Some("a"));
        assert_eq!(generic(&found[1]).username.as_deref(), Some("c"));
        assert_eq!(generic(&found[1]).password.as_deref(), Some("three"));
    }
}
