//! Data acquisition: transport seam, endpoint building and single-flight loading.

use std::cell::Cell;

use futures::future::LocalBoxFuture;
use serde::Serialize;
use vizkit_core::VizError;

/// Raw HTTP answer; the body is parsed by the widget.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("payload from {url} rejected: {source}")]
    Payload {
        url: String,
        #[source]
        source: VizError,
    },
}

/// GET transport. Futures are local: the widgets live on a single-threaded event loop.
pub trait Fetch: 'static {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>>;
}

/// Result of one `obtain_datas` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "records", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Records replaced with this many items.
    Loaded(usize),
    /// Request or payload failed; records were reset to empty.
    Failed,
    /// Another call was still pending; nothing was requested.
    InFlight,
}

/// `/{prefix}` with an optional query string.
pub fn endpoint(prefix: &str, query: &[(&str, String)]) -> String {
    let mut url = format!("/{}", prefix.trim_start_matches('/'));
    for (i, (key, value)) in query.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(value);
    }
    url
}

/// Holds the loading flag for the duration of a request and clears it on drop.
pub(crate) struct LoadingGuard<'a>(&'a Cell<bool>);

impl<'a> LoadingGuard<'a> {
    /// `None` when a request is already in flight.
    pub(crate) fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[cfg(target_arch = "wasm32")]
pub use http::HttpFetcher;

#[cfg(target_arch = "wasm32")]
mod http {
    use futures::future::{FutureExt, LocalBoxFuture};
    use gloo_net::http::Request;

    use super::{Fetch, FetchError, FetchResponse};

    /// Browser `fetch` through `gloo-net`.
    #[derive(Debug, Clone, Default)]
    pub struct HttpFetcher;

    impl Fetch for HttpFetcher {
        fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse, FetchError>> {
            let url = url.to_string();
            async move {
                let transport = |err: gloo_net::Error| FetchError::Transport {
                    url: url.clone(),
                    reason: err.to_string(),
                };
                let response = Request::get(&url).send().await.map_err(transport)?;
                let status = response.status();
                let body = response.text().await.map_err(transport)?;
                Ok(FetchResponse { status, body })
            }
            .boxed_local()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_prefix() {
        assert_eq!(endpoint("api/tasks", &[]), "/api/tasks");
        assert_eq!(endpoint("/api/tasks", &[]), "/api/tasks");
        assert_eq!(
            endpoint("events", &[("year", "2024".to_string())]),
            "/events?year=2024"
        );
    }

    #[test]
    fn guard_is_single_flight_and_resets() {
        let flag = Cell::new(false);
        {
            let _guard = LoadingGuard::acquire(&flag).unwrap();
            assert!(flag.get());
            assert!(LoadingGuard::acquire(&flag).is_none());
        }
        assert!(!flag.get());
        assert!(LoadingGuard::acquire(&flag).is_some());
    }

    #[test]
    fn success_range() {
        assert!(FetchResponse::ok("[]").is_success());
        assert!(!FetchResponse { status: 500, body: String::new() }.is_success());
    }
}
