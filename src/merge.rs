//! Deduplication of candidates by per-kind identity.

use std::collections::HashSet;

use crate::candidate::{CandidatePayload, RawCandidate};

/// Identity of a candidate; two candidates with equal keys are the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Ftp { server: String, username: String },
    Server { host: String, username: Option<String> },
    Email(String),
    Website { url: String, username: Option<String> },
    Domain(String),
    Dns(String),
    Generic { username: Option<String>, system: Option<String> },
}

fn host_key(host: &str) -> String {
    host.trim().trim_end_matches('.').to_lowercase()
}

/// Identity key of one candidate. Hosts, domains and addresses compare
/// case-insensitively; usernames, URLs and labels as written.
pub fn identity_key(candidate: &RawCandidate) -> IdentityKey {
    match &candidate.payload {
        CandidatePayload::Ftp(f) => IdentityKey::Ftp {
            server: host_key(&f.server),
            username: f.username.clone(),
        },
        CandidatePayload::Server(s) => IdentityKey::Server {
            host: host_key(&s.host),
            username: s.username.clone(),
        },
        CandidatePayload::Email(e) => IdentityKey::Email(e.email.to_lowercase()),
        CandidatePayload::Website(w) => IdentityKey::Website {
            url: w.url.trim_end_matches('/').to_string(),
            username: w.username.clone(),
        },
        CandidatePayload::Domain(d) => IdentityKey::Domain(host_key(&d.domain)),
        CandidatePayload::Dns(d) => IdentityKey::Dns(host_key(&d.domain)),
        CandidatePayload::Generic(g) => IdentityKey::Generic {
            username: g.username.clone(),
            system: g.system.clone(),
        },
    }
}

/// Flatten `lists` keeping the first candidate per identity key, in
/// first-seen order.
pub fn merge<I>(lists: I) -> Vec<RawCandidate>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = RawCandidate>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for candidate in lists.into_iter().flatten() {
        if seen.insert(identity_key(&candidate)) {
            out.push(candidate);
        } else {
            tracing::trace!(kind = %candidate.kind(), "duplicate candidate dropped");
        }
    }
    out
}

/// `merge` over a single list.
pub fn dedup(candidates: Vec<RawCandidate>) -> Vec<RawCandidate> {
    merge([candidates])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{DomainFields, FtpFields, NameserverList};

    fn ftp(server: &str, username: &str, confidence: f64) -> RawCandidate {
        RawCandidate::new(
            CandidatePayload::Ftp(FtpFields {
                server: server.into(),
                username: username.into(),
                password: None,
                port: Some(21),
            }),
            0,
            confidence,
        )
    }

    fn domain(name: &str) -> RawCandidate {
        RawCandidate::new(
            CandidatePayload::Domain(DomainFields {
                domain: name.into(),
                nameservers: NameserverList::new(),
            }),
            0,
            0.7,
        )
    }

    #[test]
    fn test_first_seen_wins() {
        let merged = merge([
            vec![ftp("ftp.x.pl", "a", 0.7)],
            vec![ftp("FTP.X.PL", "a", 0.9), ftp("ftp.x.pl", "b", 0.9)],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].confidence, Some(0.7));
        assert_eq!(identity_key(&merged[1]), identity_key(&ftp("ftp.x.pl", "b", 0.1)));
    }

    #[test]
    fn test_idempotent() {
        let input = vec![domain("x.pl"), domain("X.pl."), domain("y.pl"), ftp("h.pl", "u", 0.7)];
        let once = dedup(input);
        let twice = dedup(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge(Vec::<Vec<RawCandidate>>::new()).is_empty());
        assert!(dedup(Vec::new()).is_empty());
    }
}
