//! Host and domain helpers backed by the Public Suffix List.
//!
//! Extractors only ever see hostnames as text; these helpers decide what the
//! registrable part of a hostname is, whether a hostname is infrastructure
//! (nameserver, mail or FTP endpoint) and how a host should be normalized
//! before it is compared.
//! - www.shop.example.co.uk -> example.co.uk
//! - mysite.github.io -> mysite.github.io (github.io is a public suffix)

use anyhow::{Result, anyhow};
use psl::{domain_str, suffix_str};

/// A hostname split along its public suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainInfo {
    /// Lowercased host, trailing dot removed.
    pub host: String,
    /// Registrable part, e.g. `sklep.com.pl` for `www.sklep.com.pl`.
    pub registrable: String,
    /// Labels left of the registrable part.
    pub subdomain: Option<String>,
    pub suffix: String,
}

impl DomainInfo {
    /// Fails only for an empty or single-label host.
    pub fn parse(host: &str) -> Result<Self> {
        let host = qualified_host(host)?;
        let registrable = domain_str(&host)
            .map(str::to_string)
            .unwrap_or_else(|| last_two_labels(&host));
        let suffix = suffix_str(&host)
            .or_else(|| host.rsplit('.').next())
            .unwrap_or_default()
            .to_string();
        let subdomain = host
            .strip_suffix(registrable.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .filter(|rest| !rest.is_empty())
            .map(str::to_string);

        Ok(Self {
            host,
            registrable,
            subdomain,
            suffix,
        })
    }

    /// True when the host is a service endpoint (mail, ftp, nameserver, ...)
    /// rather than the client's site.
    pub fn is_infrastructure(&self) -> bool {
        self.subdomain
            .as_deref()
            .and_then(|sub| sub.split('.').next())
            .is_some_and(is_service_label)
    }
}

/// Registrable domain of a hostname, `None` when it is not a qualified name.
pub fn extract_registrable_domain(host: &str) -> Option<String> {
    DomainInfo::parse(host).ok().map(|info| info.registrable)
}

/// Lowercase a host and drop a trailing dot and a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let lower = host.trim().trim_end_matches('.').to_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) if rest.contains('.') => rest.to_string(),
        _ => lower,
    }
}

/// True for hostnames that look like nameservers (`ns1.`, `dns2.`, ...).
pub fn is_nameserver_host(host: &str) -> bool {
    let first = host.trim().split('.').next().unwrap_or("").to_ascii_lowercase();
    let stem = first.trim_end_matches(|c: char| c.is_ascii_digit());
    host.contains('.') && (stem == "ns" || stem == "dns")
}

/// True for hostnames that look like mail endpoints (`mail.`, `smtp.`, ...).
pub fn is_mail_host(host: &str) -> bool {
    let first = host.trim().split('.').next().unwrap_or("").to_ascii_lowercase();
    host.contains('.')
        && matches!(
            first.as_str(),
            "mail" | "smtp" | "imap" | "pop" | "pop3" | "poczta" | "mx"
        )
}

/// True for hostnames that look like FTP endpoints.
pub fn is_ftp_host(host: &str) -> bool {
    let first = host.trim().split('.').next().unwrap_or("").to_ascii_lowercase();
    host.contains('.') && (first == "ftp" || first == "sftp")
}

fn is_service_label(label: &str) -> bool {
    let l = label.to_ascii_lowercase();
    let stem = l.trim_end_matches(|c: char| c.is_ascii_digit());
    matches!(
        stem,
        "ns" | "dns" | "mail" | "smtp" | "imap" | "pop" | "pop3" | "poczta" | "mx" | "ftp" | "sftp"
    )
}

fn qualified_host(raw: &str) -> Result<String> {
    let host = raw.trim().trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        return Err(anyhow!("empty host"));
    }
    if !host.contains('.') {
        return Err(anyhow!("{host} is not a qualified host name"));
    }
    Ok(host)
}

fn last_two_labels(host: &str) -> String {
    let mut labels = host.rsplitn(3, '.');
    match (labels.next(), labels.next()) {
        (Some(tld), Some(sld)) => format!("{sld}.{tld}"),
        _ => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_domain_parsing() {
        let info = DomainInfo::parse("shop.example.com").unwrap();
        assert_eq!(info.registrable, "example.com");
        assert_eq!(info.subdomain.as_deref(), Some("shop"));
        assert_eq!(info.suffix, "com");
    }

    #[test]
    fn test_complex_tld() {
        let info = DomainInfo::parse("www.sklep.com.pl").unwrap();
        assert_eq!(info.registrable, "sklep.com.pl");
        assert_eq!(info.subdomain.as_deref(), Some("www"));
    }

    #[test]
    fn test_private_suffix_keeps_whole_host() {
        let info = DomainInfo::parse("mysite.github.io").unwrap();
        assert_eq!(info.registrable, "mysite.github.io");
        assert_eq!(info.subdomain, None);
    }

    #[test]
    fn test_host_is_normalized() {
        let info = DomainInfo::parse("Example.Com.").unwrap();
        assert_eq!(info.host, "example.com");
        assert!(DomainInfo::parse("localhost").is_err());
        assert!(DomainInfo::parse("  ").is_err());
    }

    #[test]
    fn test_infrastructure_hosts() {
        assert!(DomainInfo::parse("ns1.hosting.pl").unwrap().is_infrastructure());
        assert!(DomainInfo::parse("mail.example.com").unwrap().is_infrastructure());
        assert!(!DomainInfo::parse("www.example.com").unwrap().is_infrastructure());
        assert!(!DomainInfo::parse("example.com").unwrap().is_infrastructure());
    }

    #[test]
    fn test_host_predicates() {
        assert!(is_nameserver_host("ns2.foo.com"));
        assert!(is_nameserver_host("dns.foo.com"));
        assert!(!is_nameserver_host("nsa.gov"));
        assert!(is_mail_host("smtp.foo.com"));
        assert!(is_ftp_host("ftp.foo.com"));
        assert!(!is_ftp_host("ftpstore.com"));
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Example.com."), "example.com");
        assert_eq!(normalize_host("www.com"), "www.com");
    }
}
