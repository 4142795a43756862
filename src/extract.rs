//! Routing-key extraction from free-form alert text.
//!
//! Every function here is total: malformed input yields `None` or the
//! `Unknown Site` sentinel, never an error.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::MatchStrategy;

pub const UNKNOWN_SITE: &str = "Unknown Site";

static URL_IN_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((https?://[^\s()]+)\)").expect("valid url regex"));

static SITE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""site(?:Name)?"\s*:\s*"([^"]*)""#).expect("valid site field regex")
});

// Upptime titles look like "🟥 Site Name (https://…) is down". Skip leading
// emoji, variation selectors and markdown markup before the name.
static LEADING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\p{So}\p{Sk}\p{Cf}\p{Mn}*_~`#>]*([^(\n]+?)\s*\(")
        .expect("valid leading name regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingKey {
    Url(String),
    SiteName(String),
}

/// First parenthesised http(s) URL in `message`, without the parentheses.
pub fn extract_url(message: &str) -> Option<&str> {
    URL_IN_PARENS
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Site name from a `"site"`/`"siteName"` field, else the leading token
/// before the first `(`, else [`UNKNOWN_SITE`].
pub fn extract_site_name(message: &str) -> &str {
    if let Some(name) = SITE_FIELD
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        return name;
    }

    LEADING_NAME
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['*', '_', '~', '`']).trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SITE)
}

pub fn extract_routing_key(strategy: MatchStrategy, message: &str) -> Option<RoutingKey> {
    match strategy {
        MatchStrategy::Url => extract_url(message).map(|u| RoutingKey::Url(u.to_string())),
        MatchStrategy::Name => Some(RoutingKey::SiteName(
            extract_site_name(message).to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_url_cases() {
        let cases: &[(&str, Option<&str>)] = &[
            (
                "🟥 Site Name (https://1click.chaindefuser.com/x) is down",
                Some("https://1click.chaindefuser.com/x"),
            ),
            ("🟩 API (http://api.example.com) is up", Some("http://api.example.com")),
            (
                "first (https://a.example.com) then (https://b.example.com)",
                Some("https://a.example.com"),
            ),
            ("bare https://no-parens.example.com is down", None),
            ("(ftp://files.example.com)", None),
            ("(https://)", None),
            ("(https://unterminated.example.com", None),
            ("", None),
            ("((((((", None),
            ("{\"message\": null}", None),
        ];
        for (input, expected) in cases {
            assert_eq!(extract_url(input), *expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_extract_site_name_cases() {
        let cases: &[(&str, &str)] = &[
            ("🟥 Site Name (https://x.example.com) is down", "Site Name"),
            ("⚠️ Bridge API (https://bridge.example.com) slow", "Bridge API"),
            ("**Explorer** (https://explorer.example.com)", "Explorer"),
            ("Plain Name (whatever)", "Plain Name"),
            (r#"{"siteName": "Dashboard", "status": "down"}"#, "Dashboard"),
            (r#"{"site":"Docs"} Other (https://o.example.com)"#, "Docs"),
            (r#"{"site": ""}"#, UNKNOWN_SITE),
            ("no parenthesis at all", UNKNOWN_SITE),
            ("(https://only-url.example.com)", UNKNOWN_SITE),
            ("🟥 (https://x.example.com)", UNKNOWN_SITE),
            ("", UNKNOWN_SITE),
            ("   \n  ", UNKNOWN_SITE),
        ];
        for (input, expected) in cases {
            assert_eq!(extract_site_name(input), *expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_routing_key_by_strategy() {
        let msg = "🟥 Site Name (https://1click.chaindefuser.com/x) is down";
        assert_eq!(
            extract_routing_key(MatchStrategy::Url, msg),
            Some(RoutingKey::Url("https://1click.chaindefuser.com/x".into()))
        );
        assert_eq!(
            extract_routing_key(MatchStrategy::Name, msg),
            Some(RoutingKey::SiteName("Site Name".into()))
        );
        assert_eq!(extract_routing_key(MatchStrategy::Url, "nothing"), None);
        assert_eq!(
            extract_routing_key(MatchStrategy::Name, "nothing"),
            Some(RoutingKey::SiteName(UNKNOWN_SITE.into()))
        );
    }
}
