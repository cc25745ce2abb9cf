//! The `backend_url` cookie as written by the client side.

use std::sync::{Arc, Mutex};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::cookie::Jar;
use url::Url;

use crate::routing::BACKEND_URL_COOKIE;

/// Lifetime of the hand-off cookie.
pub const BACKEND_URL_MAX_AGE_SECS: u64 = 60 * 60;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode `value` the way browsers encode URI components.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// `Set-Cookie`-style string persisting `backend_url` for an hour, site-wide.
pub fn backend_url_cookie(backend_url: &str) -> String {
    format!(
        "{BACKEND_URL_COOKIE}={}; Max-Age={BACKEND_URL_MAX_AGE_SECS}; Path=/; SameSite=Lax",
        encode_component(backend_url)
    )
}

#[derive(Debug, thiserror::Error)]
#[error("failed to persist cookie: {0}")]
pub struct CookieError(pub String);

/// Somewhere a cookie can be persisted for later requests to the proxy.
pub trait CookieSink: Send + Sync {
    fn set_cookie(&self, cookie: &str) -> Result<(), CookieError>;
}

/// Stores cookies in a `reqwest` jar, scoped to the page origin.
#[derive(Debug, Clone)]
pub struct JarCookieSink {
    jar: Arc<Jar>,
    origin: Url,
}

impl JarCookieSink {
    pub fn new(jar: Arc<Jar>, origin: Url) -> Self {
        Self { jar, origin }
    }
}

impl CookieSink for JarCookieSink {
    fn set_cookie(&self, cookie: &str) -> Result<(), CookieError> {
        self.jar.add_cookie_str(cookie, &self.origin);
        Ok(())
    }
}

/// Keeps cookies in memory, newest last.
#[derive(Debug, Default)]
pub struct MemoryCookieSink {
    cookies: Mutex<Vec<String>>,
}

impl MemoryCookieSink {
    pub fn cookies(&self) -> Vec<String> {
        self.cookies.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CookieSink for MemoryCookieSink {
    fn set_cookie(&self, cookie: &str) -> Result<(), CookieError> {
        self.cookies
            .lock()
            .map_err(|e| CookieError(e.to_string()))?
            .push(cookie.to_string());
        Ok(())
    }
}

/// Used outside a browsing context, where there is no cookie store.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardCookies;

impl CookieSink for DiscardCookies {
    fn set_cookie(&self, _cookie: &str) -> Result<(), CookieError> {
        Ok(())
    }
}
