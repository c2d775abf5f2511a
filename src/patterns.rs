//! Pattern library and context window resolver.
//!
//! Every field an extractor looks for is described by a `PatternSet`: an
//! ordered list of recognizers, earliest = most specific. Matching is always a
//! stateless match-all over an immutable `&str` returning explicit offsets, so
//! the static sets can be shared freely between calls and threads.
//!
//! Two lookups are offered:
//! - `find_anchors` locates primary tokens (hosts, URLs, emails, domains)
//!   across a whole document;
//! - `ContextWindow::probe` looks for a companion field (username, password,
//!   port, ...) inside a bounded window around an anchor. The first pattern of
//!   the set that matches anywhere in the window wins; among its matches the
//!   first one following the anchor is taken, else the closest preceding one.
//!
//! The vocabulary is bilingual (Polish / English).

use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Hostname with at least one dot and an alphabetic TLD.
pub const HOST: &str = r"(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}";

/// Dotted-quad IPv4 literal.
pub const IPV4: &str = r"(?:\d{1,3}\.){3}\d{1,3}";

const LOGIN_KW: &str = r"(?:login|user(?:name)?|użytkownik|uzytkownik|nazwa[ \t]+u[żz]ytkownika)";
const PASSWORD_KW: &str = r"(?:hasło|haslo|hasła|hasla|password|passwd|pass|pwd)";
const QUALIFIER: &str = r"(?:[ \t]+(?:do[ \t]+)?(?:s?ftp|ssh|panelu|panel|admina|administratora|poczty|e-?mail|konta|wp))?";

fn host_or_ip() -> String {
    format!("(?:{IPV4}|{HOST})")
}

/// Ordered list of recognizers for one logical field.
#[derive(Debug)]
pub struct PatternSet {
    name: &'static str,
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile a set; patterns are static vocabulary, so a bad one is a bug.
    pub fn new<I, S>(name: &'static str, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = sources
            .into_iter()
            .map(|src| {
                Regex::new(src.as_ref())
                    .unwrap_or_else(|e| panic!("invalid `{name}` pattern {:?}: {e}", src.as_ref()))
            })
            .collect();
        Self { name, patterns }
    }

    pub fn empty(name: &'static str) -> Self {
        Self {
            name,
            patterns: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when any pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }
}

/// A located primary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Cleaned value (capture group 1, or the whole match).
    pub value: String,
    /// Byte offset of the value.
    pub offset: usize,
    /// Byte range of the whole match, keyword included.
    pub span: Range<usize>,
    /// Index of the pattern that produced this anchor.
    pub pattern: usize,
}

impl Anchor {
    /// Byte offset just past the value.
    pub fn end(&self) -> usize {
        self.offset + self.value.len()
    }
}

/// A companion field found inside a context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub value: String,
    /// Absolute byte offset of the value.
    pub offset: usize,
}

/// Every match of every pattern, in priority order, one entry per logical value.
///
/// Values are compared case-insensitively with trailing dots ignored; the
/// earliest pattern's text and offset win.
pub fn find_anchors(text: &str, set: &PatternSet) -> Vec<Anchor> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (pattern, re) in set.patterns().iter().enumerate() {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let m = caps.get(1).unwrap_or(whole);
            let value = clean_anchor(m.as_str());
            if value.is_empty() {
                continue;
            }
            if seen.insert(anchor_key(value)) {
                out.push(Anchor {
                    value: value.to_string(),
                    offset: m.start(),
                    span: whole.start()..whole.end(),
                    pattern,
                });
            }
        }
    }
    out
}

/// Every match of every pattern ordered by position, without merging equal
/// values. A later pattern's match overlapping an earlier one is dropped.
pub fn find_occurrences(text: &str, set: &PatternSet) -> Vec<Anchor> {
    let mut out: Vec<Anchor> = Vec::new();
    for (pattern, re) in set.patterns().iter().enumerate() {
        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let m = caps.get(1).unwrap_or(whole);
            let value = clean_companion(m.as_str());
            if value.is_empty() {
                continue;
            }
            let span = whole.start()..whole.end();
            if out
                .iter()
                .any(|a| a.span.start < span.end && span.start < a.span.end)
            {
                continue;
            }
            out.push(Anchor {
                value: value.to_string(),
                offset: m.start(),
                span,
                pattern,
            });
        }
    }
    out.sort_by_key(|a| a.offset);
    out
}

/// Bounded window of text around an anchor position.
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow<'a> {
    pub text: &'a str,
    /// Absolute byte offset of `text` in the document.
    pub start: usize,
    /// Absolute byte offset of the anchor.
    pub anchor: usize,
}

impl<'a> ContextWindow<'a> {
    /// Window of `radius` characters on each side of `offset`, clipped to the text.
    pub fn around(text: &'a str, offset: usize, radius: usize) -> Self {
        let anchor = floor_char_boundary(text, offset);
        let start = text[..anchor]
            .char_indices()
            .rev()
            .take(radius)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(anchor);
        let end = text[anchor..]
            .char_indices()
            .nth(radius)
            .map(|(i, _)| anchor + i)
            .unwrap_or(text.len());
        Self {
            text: &text[start..end],
            start,
            anchor,
        }
    }

    /// Up to `radius` characters immediately before `offset`.
    pub fn before(text: &'a str, offset: usize, radius: usize) -> Self {
        let anchor = floor_char_boundary(text, offset);
        let start = text[..anchor]
            .char_indices()
            .rev()
            .take(radius)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(anchor);
        Self {
            text: &text[start..anchor],
            start,
            anchor,
        }
    }

    /// First pattern of `set` with a match in the window. Among its matches
    /// the first one after the anchor wins; failing that, the closest one
    /// before it.
    pub fn probe(&self, set: &PatternSet) -> Option<Capture> {
        for re in set.patterns() {
            let mut after: Option<Capture> = None;
            let mut before: Option<Capture> = None;
            for caps in re.captures_iter(self.text) {
                let Some(whole) = caps.get(0) else { continue };
                let m = caps.get(1).unwrap_or(whole);
                let value = clean_companion(m.as_str());
                if value.is_empty() {
                    continue;
                }
                let capture = Capture {
                    value: value.to_string(),
                    offset: self.start + m.start(),
                };
                if self.start + whole.start() >= self.anchor {
                    after = Some(capture);
                    break;
                }
                // matches arrive in text order, so the last one before wins
                before = Some(capture);
            }
            if let Some(capture) = after.or(before) {
                return Some(capture);
            }
        }
        None
    }

    pub fn contains(&self, set: &PatternSet) -> bool {
        set.is_match(self.text)
    }
}

/// Substring of `radius` characters on each side of `offset`, clipped at the
/// text bounds.
pub fn nearby_text(text: &str, offset: usize, radius: usize) -> &str {
    ContextWindow::around(text, offset, radius).text
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut i = offset.min(text.len());
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Strip sentence punctuation and quoting glued to an anchor.
fn clean_anchor(raw: &str) -> &str {
    raw.trim()
        .trim_end_matches(['.', ',', ';', ':', ')', ']', '}', '>', '"', '\'', '!', '?'])
        .trim_start_matches(['(', '[', '<', '"', '\''])
}

/// Companion values keep dots (passwords may end with one) but lose list
/// separators and quotes.
fn clean_companion(raw: &str) -> &str {
    raw.trim()
        .trim_end_matches([',', ';', '"', '\''])
        .trim_start_matches(['"', '\''])
}

fn anchor_key(value: &str) -> String {
    value.trim_end_matches('.').to_lowercase()
}

/* -------------------------------------------------------------------------- */
/*                               Pattern sets                                 */
/* -------------------------------------------------------------------------- */

/// Login / username companion.
pub static USERNAME: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "username",
        [
            format!(r"(?i)\b{LOGIN_KW}{QUALIFIER}[ \t]*[:=][ \t]*([^\s,;]+)"),
            format!(r"(?i)\b{LOGIN_KW}{QUALIFIER}[ \t]+(?:to|is|-|–)[ \t]+([^\s,;]+)"),
        ],
    )
});

/// Password companion.
pub static PASSWORD: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "password",
        [
            format!(r"(?i)\b{PASSWORD_KW}{QUALIFIER}[ \t]*[:=][ \t]*(\S+)"),
            format!(r"(?i)\b{PASSWORD_KW}{QUALIFIER}[ \t]+(?:to|is|-|–)[ \t]+(\S+)"),
        ],
    )
});

/// Explicit port companion.
pub static PORT: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "port",
        [r"(?i)\bport(?:[ \t]+s?ftp)?[ \t]*[:=]?[ \t]*(\d{2,5})\b"],
    )
});

/// Login keyword alone; used for the mailbox exclusion pre-text.
pub static LOGIN_KEYWORD: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "login-keyword",
        [r"(?i)(?:login|user(?:name)?|użytkownik|uzytkownik)"],
    )
});

/// Credential keyword (login or password), used to reject label lines.
pub static CREDENTIAL_KEYWORD: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "credential-keyword",
        [format!(r"(?i)\b(?:{LOGIN_KW}|{PASSWORD_KW})\b")],
    )
});

/// FTP host anchors.
pub static FTP_HOST: Lazy<PatternSet> = Lazy::new(|| {
    let h = host_or_ip();
    PatternSet::new(
        "ftp-host",
        [
            format!(r"(?i)\b(?:serwer|server|host|adres)[ \t]+s?ftp[ \t]*[:=][ \t]*(?:s?ftp://)?({h})\b"),
            format!(r"(?i)\bs?ftp(?:[ \t]+(?:serwer|server|host|adres))?[ \t]*[:=][ \t]*(?:s?ftp://)?({h})\b"),
            format!(r"(?i)\bs?ftp://({h})\b"),
            r"(?i)\b(ftp\.(?:[a-z0-9-]+\.)+[a-z]{2,63})\b".to_string(),
        ],
    )
});

/// Server / admin panel anchors. The keyword-to-colon span is checked by the
/// extractor to hand FTP, mail and DNS hosts to their own extractors.
pub static SERVER_HOST: Lazy<PatternSet> = Lazy::new(|| {
    let h = host_or_ip();
    PatternSet::new(
        "server-host",
        [format!(
            r"(?i)\b(?:panel(?:[ \t]+(?:administracyjny|admina|klienta))?|cpanel|directadmin|plesk|webmin|ispconfig|ssh|vps|(?:serwer|server)\w*|host)\b[^\n:=]{{0,30}}?[ \t]*[:=][ \t]*({h})\b"
        )],
    )
});

/// Email literal anchors.
pub static EMAIL: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "email",
        [format!(r"(?i)\b[a-z0-9._%+-]+@{HOST}\b")],
    )
});

/// Migration intent vocabulary around a mailbox.
pub static MIGRATION_KEYWORD: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "migration-keyword",
        [r"(?i)\b(?:migracj\w*|migrat\w*|mailbox\w*|skrzyn\w*|transfer\w*|przeni\w*|przenosz\w*)"],
    )
});

/// Mail server host anchors.
pub static MAIL_SERVER_HOST: Lazy<PatternSet> = Lazy::new(|| {
    let h = host_or_ip();
    PatternSet::new(
        "mail-server-host",
        [
            format!(r"(?i)\b(?:serwer[ \t]+(?:poczty|pocztowy|mailowy)|mail[ \t]*server|serwer[ \t]+(?:imap|smtp|pop3?)|(?:imap|smtp|pop3?)[ \t]+(?:server|serwer|host))[ \t]*[:=][ \t]*({h})\b"),
            format!(r"(?i)\b(?:imap|smtp|pop3?)[ \t]*[:=][ \t]*({h})\b"),
        ],
    )
});

fn mail_port_set(name: &'static str, proto: &str) -> PatternSet {
    let h = host_or_ip();
    PatternSet::new(
        name,
        [
            format!(r"(?i)\b{proto}\w*\b[^\n]{{0,40}}?\bport\w*[ \t]*[:=]?[ \t]*(\d{{2,5}})\b"),
            format!(r"(?i)\bport\w*[ \t]+{proto}\w*[ \t]*[:=]?[ \t]*(\d{{2,5}})\b"),
            format!(r"(?i)\b{proto}\w*[ \t]*[:=][ \t]*{h}:(\d{{2,5}})\b"),
        ],
    )
}

pub static IMAP_PORT: Lazy<PatternSet> = Lazy::new(|| mail_port_set("imap-port", "imap"));
pub static SMTP_PORT: Lazy<PatternSet> = Lazy::new(|| mail_port_set("smtp-port", "smtp"));
pub static POP_PORT: Lazy<PatternSet> = Lazy::new(|| mail_port_set("pop-port", "pop3?"));

/// Transport encryption mentioned near a mail server block.
pub static ENCRYPTION: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new("encryption", [r"(?i)\b(ssl/tls|starttls|ssl|tls)\b"])
});

/// Website URL anchors.
pub static WEBSITE_URL: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "website-url",
        [
            r#"(?i)\bhttps?://[^\s<>"'()\[\]{}]+"#.to_string(),
            format!(r#"(?i)(?:^|[\s(])(www\.{HOST}(?:/[^\s<>"'()]*)?)"#),
        ],
    )
});

/// Explicitly named domains ("domena: foo.pl", "domains: a.com, b.com").
pub static EXPLICIT_DOMAIN: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "explicit-domain",
        [format!(
            r"(?i)\b(?:domen[a-ząęńóśćźż]*|domains?)\b[ \t]*(?:[:=\-–]|to|is)?[ \t]*((?:www\.)?{HOST}(?:[ \t]*,[ \t]*(?:www\.)?{HOST})*)\b"
        )],
    )
});

/// Nameserver blocks and bare nameserver hostnames.
pub static NAMESERVER: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "nameserver",
        [
            format!(
                r"(?i)\b(?:name[ \t]*servers?|nameservery?|serwery?[ \t]+(?:nazw|dns)|dns[ \t]+servers?)[ \t]*[:=]?[ \t]*({HOST}(?:(?:[ \t]*[,;][ \t]*|[ \t]+){HOST})*)"
            ),
            format!(r"(?i)\bns[ \t]*[:=][ \t]*({HOST}(?:(?:[ \t]*[,;][ \t]*|[ \t]+){HOST})*)"),
            r"(?i)\b((?:dns|ns)\d*\.(?:[a-z0-9-]+\.)+[a-z]{2,63})\b".to_string(),
        ],
    )
});

/// Header opening a DNS record section.
pub static DNS_SECTION: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        "dns-section",
        [r"(?i)\b(?:rekordy[ \t]+dns|dns[ \t]+records?|strefa[ \t]+dns|strefy[ \t]+dns|dns[ \t]+zone|zone[ \t]+file|plik[ \t]+strefy|ustawienia[ \t]+dns|dns[ \t]+settings)\b"],
    )
});

/// Single hostname, used to split captured runs.
pub static HOSTNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{HOST}\b")).unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_yield_no_anchors() {
        assert!(find_anchors("", &FTP_HOST).is_empty());
        assert!(find_anchors("serwer FTP: ftp.example.com", &PatternSet::empty("none")).is_empty());
        assert!(find_occurrences("", &USERNAME).is_empty());
    }

    #[test]
    fn earlier_pattern_wins_logical_duplicate() {
        let text = "serwer FTP: ftp.example.com";
        let anchors = find_anchors(text, &FTP_HOST);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].value, "ftp.example.com");
        assert_eq!(anchors[0].pattern, 0);
        assert_eq!(&text[anchors[0].offset..anchors[0].end()], "ftp.example.com");
    }

    #[test]
    fn anchors_are_reported_with_offsets() {
        let text = "a@example.com oraz b@example.org";
        let anchors = find_anchors(text, &EMAIL);
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[1].value, "b@example.org");
        assert_eq!(anchors[1].offset, text.find("b@").unwrap());
    }

    #[test]
    fn window_is_clipped_at_bounds() {
        let text = "abcdef";
        assert_eq!(nearby_text(text, 3, 2), "bcde");
        assert_eq!(nearby_text(text, 0, 50), "abcdef");
        assert_eq!(nearby_text(text, 99, 1), "f");
        assert_eq!(nearby_text("", 0, 10), "");
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let text = "łąćż|hasło";
        let w = nearby_text(text, text.find('|').unwrap(), 2);
        assert_eq!(w, "ćż|h");
    }

    #[test]
    fn probe_prefers_following_match() {
        let text = "login: before\nserwer: 10.0.0.1\n\n\nlogin: after";
        let anchor = text.find("10.0.0.1").unwrap();
        let w = ContextWindow::around(text, anchor, 200);
        assert_eq!(w.probe(&USERNAME).unwrap().value, "after");

        let text = "login: before\nserwer: 10.0.0.1";
        let w = ContextWindow::around(text, text.find("10.0").unwrap(), 200);
        assert_eq!(w.probe(&USERNAME).unwrap().value, "before");
    }

    #[test]
    fn password_keywords_are_bilingual() {
        let w = ContextWindow::around("hasło: s3cret", 0, 50);
        assert_eq!(w.probe(&PASSWORD).unwrap().value, "s3cret");
        let w = ContextWindow::around("Password FTP = Xy!9.", 0, 50);
        assert_eq!(w.probe(&PASSWORD).unwrap().value, "Xy!9.");
    }

    #[test]
    fn occurrences_keep_repeated_values() {
        let text = "login: admin\nhasło: a\n\nlogin: admin\nhasło: b";
        let found = find_occurrences(text, &USERNAME);
        assert_eq!(found.len(), 2);
        assert!(found[0].offset < found[1].offset);
    }
}
