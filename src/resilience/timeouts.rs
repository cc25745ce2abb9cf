//! Timeout enforcement and upstream failure classification.
//!
//! # Responsibilities
//! - Bound the wait for upstream response headers
//! - Tell timeouts apart from other transport failures
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the connect timeout lives on the connector
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout, other failures 502

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

/// Why an upstream call produced no response.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connect or response deadline elapsed.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
    /// Refused connection, DNS failure, TLS failure, reset, ...
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    /// The target URI could not be built from the resolved upstream.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

/// Run `call` with a deadline, classifying whatever it fails with.
pub async fn with_upstream_timeout<F, T, E>(deadline: Duration, call: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, E>>,
    E: StdError + 'static,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(classify(&err, deadline)),
        Err(_) => Err(UpstreamError::Timeout(deadline)),
    }
}

/// Map a transport error to an [`UpstreamError`] by inspecting its source chain.
pub fn classify(err: &(dyn StdError + 'static), deadline: Duration) -> UpstreamError {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::TimedOut {
                return UpstreamError::Timeout(deadline);
            }
        }
        current = e.source();
    }
    UpstreamError::Unreachable(render_chain(err))
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        out.push_str(": ");
        out.push_str(&e.to_string());
        current = e.source();
    }
    out
}
