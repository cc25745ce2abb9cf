//! Client-side choice between the proxy and a direct backend connection.
//!
//! A page served over `https` cannot call an `http` backend (mixed content),
//! so such sessions go through the proxy mounted on the page's own origin.
//! Either way the backend address is written to the `backend_url` cookie,
//! which is what the proxy's resolver reads first.

use crate::client::cookie::{backend_url_cookie, CookieSink};

/// Environment variable that forces proxy usage when set to `"true"`.
pub const FORCE_PROXY_VAR: &str = "USE_API_PROXY";

/// Where this session's requests go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientRoutingDecision {
    pub use_proxy: bool,
    /// Empty when no backend is configured; callers must not issue requests.
    pub effective_base_url: String,
}

/// Computes the base URL for a page session.
#[derive(Debug, Clone)]
pub struct ClientUrlResolver {
    page_origin: Option<String>,
    force_proxy: bool,
    mount_path: String,
}

impl ClientUrlResolver {
    /// `page_origin` is e.g. `https://chat.example.com`; `None` outside a
    /// browsing context.
    pub fn new(page_origin: Option<String>) -> Self {
        Self {
            page_origin: page_origin.map(|o| o.trim_end_matches('/').to_string()),
            force_proxy: false,
            mount_path: "/api".to_string(),
        }
    }

    /// Like [`ClientUrlResolver::new`], reading the force flag from `USE_API_PROXY`.
    pub fn from_env(page_origin: Option<String>) -> Self {
        let force = std::env::var(FORCE_PROXY_VAR).is_ok_and(|v| v == "true");
        Self::new(page_origin).with_force_proxy(force)
    }

    pub fn with_force_proxy(mut self, force_proxy: bool) -> Self {
        self.force_proxy = force_proxy;
        self
    }

    pub fn with_mount_path(mut self, mount_path: impl Into<String>) -> Self {
        self.mount_path = mount_path.into();
        self
    }

    /// Decide the session's base URL for `desired_backend_url`.
    ///
    /// Persists the backend address through `cookies` whenever one is given,
    /// even if this session connects directly.
    pub fn compute_base_url(
        &self,
        desired_backend_url: Option<&str>,
        cookies: &dyn CookieSink,
    ) -> ClientRoutingDecision {
        let desired = match desired_backend_url {
            Some(url) if !url.is_empty() => url,
            _ => return ClientRoutingDecision::default(),
        };

        if let Err(e) = cookies.set_cookie(&backend_url_cookie(desired)) {
            tracing::warn!(error = %e, "Could not persist backend_url cookie");
        }

        let secure_page = self
            .page_origin
            .as_deref()
            .is_some_and(|origin| origin.starts_with("https:"));
        let insecure_backend = desired.starts_with("http://");

        if self.force_proxy || (secure_page && insecure_backend) {
            let effective_base_url = match &self.page_origin {
                Some(origin) => format!("{origin}{}", self.mount_path),
                None => self.mount_path.clone(),
            };
            tracing::debug!(base = %effective_base_url, "Routing through proxy");
            return ClientRoutingDecision {
                use_proxy: true,
                effective_base_url,
            };
        }

        tracing::debug!(base = %desired, "Connecting directly");
        ClientRoutingDecision {
            use_proxy: false,
            effective_base_url: desired.to_string(),
        }
    }
}
