//! Per-kind heuristic extractors.
//!
//! Each extractor scans the whole message for its anchors (hosts, URLs,
//! mailboxes, domains, zone sections, login keywords) and resolves companion
//! fields inside bounded context windows. Extractors are independent and
//! stateless: they read `&str`, share nothing but the static pattern sets and
//! can run in any order. Cross-kind reconciliation (generic pairs shadowed by
//! a specialized candidate, duplicate identities) is the aggregator's and the
//! merger's job, not theirs.
//!
//! ```ignore
//! let windows = WindowConfig::default();
//! let candidates = extract_all(text, &windows);
//! ```

use crate::candidate::{Kind, RawCandidate};
use crate::config::WindowConfig;

pub mod dns;
pub mod domain;
pub mod email;
pub mod ftp;
pub mod generic;
pub mod server;
pub mod website;

pub use dns::DnsExtractor;
pub use domain::DomainExtractor;
pub use email::EmailExtractor;
pub use ftp::FtpExtractor;
pub use generic::GenericExtractor;
pub use server::ServerExtractor;
pub use website::WebsiteExtractor;

/// A heuristic extraction pass for one candidate kind.
pub trait Extractor: Send + Sync {
    /// Kind of every candidate this extractor emits.
    fn kind(&self) -> Kind;

    /// Stable identifier used in logs.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// All candidates found in `text`, in anchor order.
    fn extract(&self, text: &str) -> Vec<RawCandidate>;
}

/// The full extractor line-up in its fixed run order.
pub fn default_extractors(windows: &WindowConfig) -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(FtpExtractor::new(*windows)),
        Box::new(ServerExtractor::new(*windows)),
        Box::new(EmailExtractor::new(*windows)),
        Box::new(WebsiteExtractor::new(*windows)),
        Box::new(DomainExtractor),
        Box::new(DnsExtractor::new(*windows)),
        Box::new(GenericExtractor::new(*windows)),
    ]
}

/// Run every extractor over `text` and concatenate the results.
pub fn extract_all(text: &str, windows: &WindowConfig) -> Vec<RawCandidate> {
    default_extractors(windows)
        .iter()
        .flat_map(|e| {
            let found = e.extract(text);
            tracing::debug!(extractor = e.name(), count = found.len(), "extractor pass");
            found
        })
        .collect()
}

/// Parse a TCP port, rejecting 0 and out-of-range values.
pub(crate) fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|p| *p > 0)
}

/// Port written as `host:port` directly after an anchor ending at `end`.
pub(crate) fn port_after(text: &str, end: usize) -> Option<u16> {
    let rest = text.get(end..)?.strip_prefix(':')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || digits.len() > 5 {
        return None;
    }
    parse_port(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_helpers() {
        assert_eq!(parse_port("2121"), Some(2121));
        assert_eq!(parse_port("0"), None);
        assert_eq!(parse_port("70000"), None);
        let text = "host: 10.0.0.5:2222 ok";
        let end = text.find(":2222").unwrap();
        assert_eq!(port_after(text, end), Some(2222));
        assert_eq!(port_after(text, 0), None);
        assert_eq!(port_after(text, 999), None);
    }

    #[test]
    fn test_line_up_covers_every_kind() {
        let extractors = default_extractors(&WindowConfig::default());
        let kinds: Vec<Kind> = extractors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, Kind::ALL.to_vec());
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(extract_all("", &WindowConfig::default()).is_empty());
        assert!(extract_all("Dzień dobry, proszę o kontakt.", &WindowConfig::default()).is_empty());
    }
}
