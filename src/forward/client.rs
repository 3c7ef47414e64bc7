//! Middleware appending forwarded headers to outgoing HTTP requests.

use std::task::{Context, Poll};

use http::Request;
use tower_layer::Layer;
use tower_service::Service;

use super::headers::ForwardedHeaders;

/// [`Layer`] that appends the forwarded headers of the request currently being
/// serviced to every outbound HTTP request.
///
/// [`Layer`]: tower_layer::Layer
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderForwardingClientLayer;

impl HeaderForwardingClientLayer {
    /// Create a new [`HeaderForwardingClientLayer`].
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for HeaderForwardingClientLayer {
    type Service = HeaderForwardingClient<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeaderForwardingClient { inner }
    }
}

/// Middleware that appends the active forwarded headers in front of a client
/// [`Service`].
///
/// Forwarded values are appended, never inserted, so a header the caller set
/// on the outbound request for its own reasons keeps its values. Outside any
/// inbound request scope the request is passed through untouched.
///
/// [`Service`]: tower_service::Service
#[derive(Clone, Debug)]
pub struct HeaderForwardingClient<S> {
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for HeaderForwardingClient<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        match ForwardedHeaders::current() {
            Some(headers) => {
                for (name, value) in headers.iter() {
                    req.headers_mut().append(name.clone(), value.clone());
                }
            }
            None => tracing::debug!(
                url = %req.uri(),
                "no forwarded-header scope is active, request sent unmodified"
            ),
        }

        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http::{HeaderMap, HeaderValue, Response};
    use tower::{service_fn, ServiceBuilder, ServiceExt};

    use super::*;

    fn echo_client() -> HeaderForwardingClient<
        impl Service<Request<()>, Response = Response<HeaderMap>, Error = Infallible> + Clone,
    > {
        ServiceBuilder::new()
            .layer(HeaderForwardingClientLayer::new())
            .service(service_fn(|req: Request<()>| async move {
                Ok::<_, Infallible>(Response::new(req.headers().clone()))
            }))
    }

    #[tokio::test]
    async fn without_scope_the_request_is_untouched() {
        let request = Request::builder()
            .header("exampleclientrequestheader", "set-by-caller")
            .body(())
            .unwrap();
        let seen = echo_client().oneshot(request).await.unwrap().into_body();

        assert_eq!(seen.get("exampleclientrequestheader").unwrap(), "set-by-caller");
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn appends_to_caller_set_values_instead_of_replacing() {
        let mut bound = HeaderMap::new();
        bound.insert("x-correlation-id", HeaderValue::from_static("from-scope"));

        let seen = ForwardedHeaders::from(bound)
            .scope(async {
                let request = Request::builder()
                    .header("x-correlation-id", "from-caller")
                    .body(())
                    .unwrap();
                echo_client().oneshot(request).await.unwrap().into_body()
            })
            .await;

        let values: Vec<&str> = seen
            .get_all("x-correlation-id")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, ["from-caller", "from-scope"]);
    }

    #[tokio::test]
    async fn multi_valued_headers_keep_their_order() {
        let mut bound = HeaderMap::new();
        bound.append("x-tag", HeaderValue::from_static("first"));
        bound.append("x-tag", HeaderValue::from_static("second"));

        let seen = ForwardedHeaders::from(bound)
            .scope(async {
                let request = Request::builder().body(()).unwrap();
                echo_client().oneshot(request).await.unwrap().into_body()
            })
            .await;

        let values: Vec<&str> = seen
            .get_all("x-tag")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, ["first", "second"]);
    }
}
