//! Website extraction with CMS inference.

use super::Extractor;
use crate::candidate::{CandidatePayload, Kind, RawCandidate, WebsiteFields, confidence_for};
use crate::config::WindowConfig;
use crate::errors::CredSiftError;
use crate::patterns::{self, ContextWindow};

/// A content-management system and the text that gives it away.
struct CmsSignature {
    name: &'static str,
    /// Substrings of a URL (path or host) specific to the CMS.
    url_markers: &'static [&'static str],
    /// Substrings of the message naming the CMS.
    text_markers: &'static [&'static str],
}

const CMS_VOCABULARY: &[CmsSignature] = &[
    CmsSignature {
        name: "WordPress",
        url_markers: &["/wp-admin", "/wp-login", "/wp-content", "/wp-json"],
        text_markers: &["wordpress", "woocommerce"],
    },
    CmsSignature {
        name: "Joomla",
        url_markers: &["/administrator", "option=com_"],
        text_markers: &["joomla"],
    },
    CmsSignature {
        name: "Drupal",
        url_markers: &["/user/login", "/node/"],
        text_markers: &["drupal"],
    },
    CmsSignature {
        name: "PrestaShop",
        url_markers: &["/admin-dev", "/modules/ps_"],
        text_markers: &["prestashop", "presta shop"],
    },
    CmsSignature {
        name: "Magento",
        url_markers: &["/index.php/admin", "/static/frontend"],
        text_markers: &["magento"],
    },
    CmsSignature {
        name: "Shopify",
        url_markers: &[".myshopify.com"],
        text_markers: &["shopify"],
    },
    CmsSignature {
        name: "OpenCart",
        url_markers: &["route=common", "route=product"],
        text_markers: &["opencart"],
    },
    CmsSignature {
        name: "TYPO3",
        url_markers: &["/typo3"],
        text_markers: &["typo3"],
    },
];

/// CMS named by the URL itself, else by the surrounding message.
pub fn detect_cms(url: &str, text: &str) -> Option<&'static str> {
    let url = url.to_lowercase();
    if let Some(sig) = CMS_VOCABULARY
        .iter()
        .find(|sig| sig.url_markers.iter().any(|m| url.contains(m)))
    {
        return Some(sig.name);
    }

    let text = text.to_lowercase();
    CMS_VOCABULARY
        .iter()
        .find(|sig| sig.text_markers.iter().any(|m| text.contains(m)))
        .map(|sig| sig.name)
}

/// Hostname of a website URL; `www.` shorthand is read as http.
pub fn hostname_of(raw: &str) -> Result<String, CredSiftError> {
    let candidate = if raw.to_ascii_lowercase().starts_with("www.") {
        format!("http://{raw}")
    } else {
        raw.to_string()
    };
    let parsed =
        url::Url::parse(&candidate).map_err(|e| CredSiftError::malformed_url(raw, e.to_string()))?;
    parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| CredSiftError::malformed_url(raw, "URL has no host"))
}

#[derive(Debug, Clone)]
pub struct WebsiteExtractor {
    windows: WindowConfig,
}

impl WebsiteExtractor {
    pub fn new(windows: WindowConfig) -> Self {
        Self { windows }
    }
}

impl Extractor for WebsiteExtractor {
    fn kind(&self) -> Kind {
        Kind::Website
    }

    fn extract(&self, text: &str) -> Vec<RawCandidate> {
        let mut out = Vec::new();

        for anchor in patterns::find_anchors(text, &patterns::WEBSITE_URL) {
            let hostname = match hostname_of(&anchor.value) {
                Ok(host) => Some(host),
                Err(e) => {
                    tracing::debug!(error = %e, "keeping website without hostname");
                    None
                }
            };

            let window = ContextWindow::around(text, anchor.offset, self.windows.credential);
            let username = window.probe(&patterns::USERNAME).map(|c| c.value);
            let password = window.probe(&patterns::PASSWORD).map(|c| c.value);
            let cms = detect_cms(&anchor.value, text).map(str::to_string);
            let confidence = confidence_for(password.is_some());

            out.push(RawCandidate::new(
                CandidatePayload::Website(WebsiteFields {
                    url: anchor.value,
                    hostname,
                    username,
                    password,
                    cms,
                }),
                anchor.offset,
                confidence,
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn website(c: &RawCandidate) -> &WebsiteFields {
        match &c.payload {
            CandidatePayload::Website(w) => w,
            other => panic!("expected website payload, got {other:?}"),
        }
    }

    fn extract(text: &str) -> Vec<RawCandidate> {
        WebsiteExtractor::new(WindowConfig::default()).extract(text)
    }

    #[test]
    fn test_wordpress_admin() {
        let found = extract(
            "Panel WP: https://sklep.example.pl/wp-admin.\nlogin: admin\nhasło: Qwerty!1",
        );
        assert_eq!(found.len(), 1);
        let w = website(&found[0]);
        assert_eq!(w.url, "https://sklep.example.pl/wp-admin");
        assert_eq!(w.hostname.as_deref(), Some("sklep.example.pl"));
        assert_eq!(w.username.as_deref(), Some("admin"));
        assert_eq!(w.cms.as_deref(), Some("WordPress"));
        assert_eq!(found[0].confidence, Some(0.9));
    }

    #[test]
    fn test_url_marker_beats_document_context() {
        assert_eq!(
            detect_cms("https://x.pl/administrator", "Strona stoi na WordPress"),
            Some("Joomla")
        );
        assert_eq!(detect_cms("https://x.pl/", "Sklep na PrestaShop"), Some("PrestaShop"));
        assert_eq!(detect_cms("https://x.pl/", "zwykła strona"), None);
    }

    #[test]
    fn test_www_shorthand() {
        let found = extract("Strona firmy: www.firma.pl");
        assert_eq!(found.len(), 1);
        assert_eq!(website(&found[0]).url, "www.firma.pl");
        assert_eq!(website(&found[0]).hostname.as_deref(), Some("www.firma.pl"));
        assert_eq!(found[0].confidence, Some(0.7));
    }

    #[test]
    fn test_malformed_url_keeps_candidate() {
        let found = extract("Adres: http://300.1.1.1/admin hasło: x");
        assert_eq!(found.len(), 1);
        assert_eq!(website(&found[0]).hostname, None);
        assert!(hostname_of("http://300.1.1.1/admin").is_err());
    }
}
