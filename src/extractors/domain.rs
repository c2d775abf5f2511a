//! Domain extraction.
//!
//! A domain only needs its literal. The nameserver block of a message is not
//! proximity-scoped: once found, it is attached to every domain in the
//! message. When no domain is named explicitly but nameservers are given, the
//! domains are derived from the registrable part of the website hosts.

use super::Extractor;
use super::website::hostname_of;
use crate::candidate::{
    CandidatePayload, DomainFields, Kind, NameserverList, RawCandidate, confidence_for,
    BASELINE_CONFIDENCE,
};
use crate::domain_utils::{self, DomainInfo};
use crate::patterns;

/// Every nameserver hostname mentioned in the message, in order.
pub fn nameserver_block(text: &str) -> NameserverList {
    let mut list = NameserverList::new();
    for anchor in patterns::find_anchors(text, &patterns::NAMESERVER) {
        for host in patterns::HOSTNAME.find_iter(&anchor.value) {
            list.insert(host.as_str());
        }
    }
    list
}

/// Explicitly named domains with the offset of the naming phrase.
pub fn explicit_domains(text: &str, nameservers: &NameserverList) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = Vec::new();
    for anchor in patterns::find_anchors(text, &patterns::EXPLICIT_DOMAIN) {
        for host in patterns::HOSTNAME.find_iter(&anchor.value) {
            let domain = domain_utils::normalize_host(host.as_str());
            if nameservers.contains(&domain)
                || domain_utils::is_nameserver_host(&domain)
                || out.iter().any(|(d, _)| *d == domain)
            {
                continue;
            }
            out.push((domain, anchor.offset + host.start()));
        }
    }
    out
}

/// Registrable domains behind the website URLs of the message.
fn domains_from_websites(text: &str) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = Vec::new();
    for anchor in patterns::find_anchors(text, &patterns::WEBSITE_URL) {
        let Ok(host) = hostname_of(&anchor.value) else {
            continue;
        };
        let Ok(info) = DomainInfo::parse(&host) else {
            continue;
        };
        if info.is_infrastructure() {
            continue;
        }
        if !out.iter().any(|(d, _)| *d == info.registrable) {
            out.push((info.registrable, anchor.offset));
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct DomainExtractor;

impl Extractor for DomainExtractor {
    fn kind(&self) -> Kind {
        Kind::Domain
    }

    fn extract(&self, text: &str) -> Vec<RawCandidate> {
        let nameservers = nameserver_block(text);
        let explicit = explicit_domains(text, &nameservers);

        let (domains, synthesized) = if explicit.is_empty() && !nameservers.is_empty() {
            (domains_from_websites(text), true)
        } else {
            (explicit, false)
        };

        domains
            .into_iter()
            .map(|(domain, offset)| {
                let confidence = if synthesized {
                    BASELINE_CONFIDENCE
                } else {
                    confidence_for(!nameservers.is_empty())
                };
                RawCandidate::new(
                    CandidatePayload::Domain(DomainFields {
                        domain,
                        nameservers: nameservers.clone(),
                    }),
                    offset,
                    confidence,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(c: &RawCandidate) -> &DomainFields {
        match &c.payload {
            CandidatePayload::Domain(d) => d,
            other => panic!("expected domain payload, got {other:?}"),
        }
    }

    fn extract(text: &str) -> Vec<RawCandidate> {
        DomainExtractor.extract(text)
    }

    #[test]
    fn test_nameservers_attach_to_every_domain() {
        let text = "Domeny: firma.pl, www.firma.com.pl\n\n\
                    (dużo tekstu)\n\n\
                    Serwery DNS: ns1.hosting.pl, ns2.hosting.pl";
        let found = extract(text);
        assert_eq!(found.len(), 2);
        assert_eq!(domain(&found[0]).domain, "firma.pl");
        assert_eq!(domain(&found[1]).domain, "firma.com.pl");
        for c in &found {
            assert_eq!(
                domain(c).nameservers.as_slice(),
                &["ns1.hosting.pl", "ns2.hosting.pl"]
            );
            assert_eq!(c.confidence, Some(0.9));
        }
    }

    #[test]
    fn test_domain_without_nameservers() {
        let found = extract("Proszę przenieść domenę example.org");
        assert_eq!(found.len(), 1);
        assert_eq!(domain(&found[0]).domain, "example.org");
        assert!(domain(&found[0]).nameservers.is_empty());
        assert_eq!(found[0].confidence, Some(0.7));
    }

    #[test]
    fn test_domains_synthesized_from_websites() {
        let text = "Strona: https://www.sklep.example.pl/koszyk\nNameservers: ns1.dns.pl ns2.dns.pl";
        let found = extract(text);
        assert_eq!(found.len(), 1);
        assert_eq!(domain(&found[0]).domain, "example.pl");
        assert_eq!(domain(&found[0]).nameservers.len(), 2);
    }

    #[test]
    fn test_no_domains_no_nameservers() {
        assert!(extract("https://www.example.com").is_empty());
        assert!(extract("").is_empty());
    }
}
