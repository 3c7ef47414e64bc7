//! Middleware binding forwarded headers to a [`Service`] handling inbound
//! HTTP requests.
//!
//! [`Service`]: tower_service::Service

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use http::{Request, Response};
use pin_project::pin_project;
use tower_layer::Layer;
use tower_service::Service;

use super::{headers::ForwardedHeaders, rule::ForwardRule, scope};

/// [`Layer`] that selects the forwardable headers of every inbound request
/// and keeps them bound while that request is serviced.
///
/// [`Layer`]: tower_layer::Layer
#[derive(Clone, Debug)]
pub struct HeaderForwardingLayer {
    rule: Arc<ForwardRule>,
}

impl HeaderForwardingLayer {
    /// Forward inbound headers according to the given rule.
    pub fn new(rule: ForwardRule) -> Self {
        Self {
            rule: Arc::new(rule),
        }
    }
}

impl<S> Layer<S> for HeaderForwardingLayer {
    type Service = HeaderForwarding<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeaderForwarding {
            inner,
            rule: Arc::clone(&self.rule),
        }
    }
}

/// Middleware that binds forwarded headers around an inbound request's
/// processing.
///
/// The inbound request itself is passed through untouched; the selected
/// headers are only made visible to [`HeaderForwardingClient`] instances used
/// while the request is serviced.
///
/// [`HeaderForwardingClient`]: super::HeaderForwardingClient
#[derive(Clone, Debug)]
pub struct HeaderForwarding<S> {
    inner: S,
    rule: Arc<ForwardRule>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HeaderForwarding<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let headers = ForwardedHeaders::from(self.rule.select(req.headers()));
        let inner = {
            let _scope = scope::enter(headers.clone());
            self.inner.call(req)
        };

        ResponseFuture { inner, headers }
    }
}

/// Response future for [`HeaderForwarding`].
#[pin_project]
pub struct ResponseFuture<F> {
    #[pin]
    inner: F,
    headers: ForwardedHeaders,
}

impl<F, ResBody, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _scope = scope::enter(this.headers.clone());
        this.inner.poll(cx)
    }
}
