//! Snapshot of the headers bound to one in-flight request.

use std::sync::Arc;

use http::{header, HeaderMap};

use super::scope::{self, Scoped};

/// Immutable snapshot of the headers selected from one inbound request.
///
/// A snapshot is created by [`HeaderForwarding`] when a request arrives and
/// stays bound while that request's pipeline is polled. It is never mutated
/// afterwards, and cloning it only bumps a reference count.
///
/// [`HeaderForwarding`]: super::HeaderForwarding
#[derive(Clone, Debug, Default)]
pub struct ForwardedHeaders {
    headers: Arc<HeaderMap>,
}

impl ForwardedHeaders {
    /// Returns the binding of the inbound request currently being serviced,
    /// or `None` outside any request scope.
    pub fn current() -> Option<ForwardedHeaders> {
        scope::current()
    }

    /// The forwarded headers as a plain [`HeaderMap`].
    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Iterates over every (name, value) pair, repeating the name of
    /// multi-valued headers.
    pub fn iter(&self) -> header::Iter<'_, header::HeaderValue> {
        self.headers.iter()
    }

    /// Number of header values in the snapshot.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the snapshot holds no headers at all.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Binds this snapshot around `future`, so outbound calls made while it is
    /// polled see these headers.
    ///
    /// Bindings do not cross task boundaries implicitly; work spawned to
    /// service the same request has to carry them explicitly:
    ///
    /// ```ignore
    /// if let Some(headers) = ForwardedHeaders::current() {
    ///     tokio::spawn(headers.scope(fetch_details(client)));
    /// }
    /// ```
    pub fn scope<F>(self, future: F) -> Scoped<F> {
        Scoped::new(self, future)
    }
}

impl From<HeaderMap> for ForwardedHeaders {
    fn from(headers: HeaderMap) -> Self {
        Self {
            headers: Arc::new(headers),
        }
    }
}
