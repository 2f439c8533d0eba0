//! Response classification
//!
//! The content-kind resolver collaborator: given a URL and a body, pick the
//! response class the host pipeline should construct. URL extension wins,
//! body sniffing breaks ties.

use serde::{Deserialize, Serialize};

/// Classified content kind of a fetch response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// HTML document
    #[default]
    Html,
    /// XML document
    Xml,
    /// JSON payload
    Json,
    /// Plain text
    Text,
}

impl ResponseKind {
    /// Classify a response from its URL and body
    pub fn classify(url: &str, body: &str) -> Self {
        if let Some(kind) = Self::from_url(url) {
            return kind;
        }
        Self::from_body(body)
    }

    fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" | "xhtml" => Some(ResponseKind::Html),
            "xml" | "rss" | "atom" => Some(ResponseKind::Xml),
            "json" => Some(ResponseKind::Json),
            "txt" => Some(ResponseKind::Text),
            _ => None,
        }
    }

    fn from_body(body: &str) -> Self {
        let head = body.trim_start();
        let lower = head
            .get(..head.len().min(256))
            .unwrap_or(head)
            .to_ascii_lowercase();

        if lower.starts_with("<?xml") {
            // XML prolog may still open an XHTML document
            if lower.contains("<html") {
                ResponseKind::Html
            } else {
                ResponseKind::Xml
            }
        } else if lower.starts_with("<!doctype html") || lower.contains("<html") {
            ResponseKind::Html
        } else if head.starts_with('{') || head.starts_with('[') {
            ResponseKind::Json
        } else if head.starts_with('<') {
            ResponseKind::Html
        } else {
            ResponseKind::Text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(
            ResponseKind::classify("https://example.com/feed.xml", ""),
            ResponseKind::Xml
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/api/data.json", ""),
            ResponseKind::Json
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/readme.txt", ""),
            ResponseKind::Text
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/index.html?q=1", ""),
            ResponseKind::Html
        );
    }

    #[test]
    fn test_classify_by_body() {
        assert_eq!(
            ResponseKind::classify("https://example.com/", "<!DOCTYPE html><html></html>"),
            ResponseKind::Html
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/", "<html lang=\"en\"></html>"),
            ResponseKind::Html
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/", "<?xml version=\"1.0\"?><rss/>"),
            ResponseKind::Xml
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/", "{\"ok\": true}"),
            ResponseKind::Json
        );
        assert_eq!(
            ResponseKind::classify("https://example.com/", "just words"),
            ResponseKind::Text
        );
    }

    #[test]
    fn test_xml_prolog_with_html_root() {
        let body = "<?xml version=\"1.0\"?><html xmlns=\"http://www.w3.org/1999/xhtml\"></html>";
        assert_eq!(
            ResponseKind::classify("https://example.com/", body),
            ResponseKind::Html
        );
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&ResponseKind::Html).unwrap(),
            "\"html\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseKind::Json).unwrap(),
            "\"json\""
        );
    }
}
