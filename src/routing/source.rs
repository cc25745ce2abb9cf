//! Candidate sources for the upstream base URL.
//!
//! # Responsibilities
//! - Read one candidate value from one carrier (cookie, header, query)
//! - Decode the carrier's encoding
//! - Report "absent" for anything missing or malformed
//!
//! # Design Decisions
//! - Extractors never fail: a bad value is the same as no value
//! - Extractors only see headers and URI, not the body
//! - Strict percent-decoding for the cookie: a stray `%` invalidates it

use std::fmt;

use axum::http::{header, HeaderMap, HeaderName, Uri};
use percent_encoding::percent_decode_str;
use url::Url;

/// Cookie carrying the percent-encoded backend URL.
pub const BACKEND_URL_COOKIE: &str = "backend_url";

/// Header carrying the literal backend URL.
pub const BACKEND_URL_HEADER: HeaderName = HeaderName::from_static("x-backend-url");

/// Query parameter carrying the literal backend URL.
pub const BACKEND_URL_QUERY: &str = "backend_url";

/// Where a resolved upstream came from. Declaration order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CandidateSource {
    Cookie,
    Header,
    QueryParam,
    EnvironmentDefault,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::Cookie => "cookie",
            CandidateSource::Header => "header",
            CandidateSource::QueryParam => "query",
            CandidateSource::EnvironmentDefault => "default",
        }
    }
}

impl fmt::Display for CandidateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The parts of an inbound request a candidate source may look at.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub headers: &'a HeaderMap,
    pub uri: &'a Uri,
}

/// A single request-carried source of the backend URL.
pub trait CandidateExtractor: Send + Sync + fmt::Debug {
    /// Which source this extractor reads.
    fn source(&self) -> CandidateSource;

    /// Returns the decoded candidate, or `None` if absent or malformed.
    fn extract(&self, request: RequestView<'_>) -> Option<String>;
}

/// Reads the `backend_url` cookie.
#[derive(Debug, Clone, Default)]
pub struct CookieExtractor;

impl CandidateExtractor for CookieExtractor {
    fn source(&self) -> CandidateSource {
        CandidateSource::Cookie
    }

    fn extract(&self, request: RequestView<'_>) -> Option<String> {
        let raw = find_cookie(request.headers, BACKEND_URL_COOKIE)?;
        strict_percent_decode(raw)
    }
}

/// Reads the `x-backend-url` header.
#[derive(Debug, Clone, Default)]
pub struct HeaderExtractor;

impl CandidateExtractor for HeaderExtractor {
    fn source(&self) -> CandidateSource {
        CandidateSource::Header
    }

    fn extract(&self, request: RequestView<'_>) -> Option<String> {
        request
            .headers
            .get(BACKEND_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    }
}

/// Reads the `backend_url` query parameter.
#[derive(Debug, Clone, Default)]
pub struct QueryExtractor;

impl CandidateExtractor for QueryExtractor {
    fn source(&self) -> CandidateSource {
        CandidateSource::QueryParam
    }

    fn extract(&self, request: RequestView<'_>) -> Option<String> {
        let query = request.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == BACKEND_URL_QUERY)
            .map(|(_, value)| value.trim().to_string())
    }
}

/// First value of cookie `name` across all `Cookie` headers.
fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"'))
}

/// Percent-decode, rejecting truncated or non-hex escapes and non-UTF-8 output.
pub fn strict_percent_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Parse a candidate as an absolute `http`/`https` URL with a host.
pub fn parse_upstream_url(candidate: &str) -> Option<Url> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let url = Url::parse(candidate).ok()?;
    let usable = matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|h| !h.is_empty())
        && url.query().is_none()
        && url.fragment().is_none();

    usable.then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn view<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> RequestView<'a> {
        RequestView { headers, uri }
    }

    #[test]
    fn cookie_is_percent_decoded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; backend_url=http%3A%2F%2Fbackend%3A8000; sid=1"),
        );
        let uri = Uri::from_static("/api/threads");

        assert_eq!(
            CookieExtractor.extract(view(&headers, &uri)).as_deref(),
            Some("http://backend:8000")
        );
    }

    #[test]
    fn cookie_found_in_second_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("backend_url=http%3A%2F%2Fb"));
        let uri = Uri::from_static("/");

        assert_eq!(CookieExtractor.extract(view(&headers, &uri)).as_deref(), Some("http://b"));
    }

    #[test]
    fn malformed_percent_encoding_is_absent() {
        assert_eq!(strict_percent_decode("http%3A%2F%2Fb%3"), None);
        assert_eq!(strict_percent_decode("http%zz"), None);
        assert_eq!(strict_percent_decode("%E0%A4%A"), None);
        // Well-formed escapes that decode to invalid UTF-8.
        assert_eq!(strict_percent_decode("%FF%FE"), None);
        assert_eq!(strict_percent_decode("plain"), Some("plain".into()));
    }

    #[test]
    fn query_parameter_is_read_among_others() {
        let headers = HeaderMap::new();
        let uri = Uri::from_static("/api/runs?limit=10&backend_url=http://q:7000&x=y");
        assert_eq!(
            QueryExtractor.extract(view(&headers, &uri)).as_deref(),
            Some("http://q:7000")
        );
    }

    #[test]
    fn non_utf8_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            BACKEND_URL_HEADER,
            HeaderValue::from_bytes(b"http://b\xff").unwrap(),
        );
        let uri = Uri::from_static("/");
        assert_eq!(HeaderExtractor.extract(view(&headers, &uri)), None);
    }

    #[test]
    fn upstream_url_shape() {
        assert!(parse_upstream_url("http://localhost:2024").is_some());
        assert!(parse_upstream_url("https://agents.example.com/deployments/a1").is_some());
        assert!(parse_upstream_url("").is_none());
        assert!(parse_upstream_url("localhost:2024").is_none());
        assert!(parse_upstream_url("ftp://files.example.com").is_none());
        assert!(parse_upstream_url("http://b:9000/?x=1").is_none());
    }

    #[test]
    fn precedence_follows_declaration_order() {
        assert!(CandidateSource::Cookie < CandidateSource::Header);
        assert!(CandidateSource::Header < CandidateSource::QueryParam);
        assert!(CandidateSource::QueryParam < CandidateSource::EnvironmentDefault);
    }
}
