//! Carrier binding a [`ForwardedHeaders`] snapshot to the request being polled.
//!
//! The snapshot lives in the request's response future and is entered around
//! every poll, the same way `tracing` follows futures with spans. The
//! thread-local slot below is therefore only populated while one request's
//! future is actually being polled: the binding travels with the logical
//! request across suspension points and executor threads, and concurrent
//! requests on a shared worker pool can never observe each other's binding.

use std::{
    cell::RefCell,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};

use pin_project::pin_project;

use super::headers::ForwardedHeaders;

thread_local! {
    static ACTIVE: RefCell<Option<ForwardedHeaders>> = const { RefCell::new(None) };
}

/// Returns the binding active on this thread, if any.
pub(crate) fn current() -> Option<ForwardedHeaders> {
    ACTIVE.with(|slot| slot.borrow().clone())
}

/// Binds `headers` on this thread until the returned guard is dropped.
///
/// The guard restores whatever binding was active before, so scopes nest.
/// It must never be held across an `.await`; futures carry their binding with
/// [`Scoped`] and re-enter it on every poll instead.
pub(crate) fn enter(headers: ForwardedHeaders) -> ScopeGuard {
    let previous = ACTIVE.with(|slot| slot.replace(Some(headers)));
    ScopeGuard {
        previous,
        _not_send: PhantomData,
    }
}

/// Restores the previously active binding on drop.
pub(crate) struct ScopeGuard {
    previous: Option<ForwardedHeaders>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE.with(|slot| *slot.borrow_mut() = self.previous.take());
    }
}

/// Future with a [`ForwardedHeaders`] binding entered on every poll.
///
/// The binding is owned by the future, so it follows the request through
/// hand-offs between worker threads and is released when the future is
/// dropped, on completion and on cancellation alike.
#[pin_project]
pub struct Scoped<F> {
    #[pin]
    inner: F,
    headers: ForwardedHeaders,
}

impl<F> Scoped<F> {
    pub(crate) fn new(headers: ForwardedHeaders, inner: F) -> Self {
        Self { inner, headers }
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _scope = enter(this.headers.clone());
        this.inner.poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use http::{HeaderMap, HeaderValue};

    use super::*;

    fn binding(name: &'static str, value: &'static str) -> ForwardedHeaders {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_static(value));
        ForwardedHeaders::from(headers)
    }

    #[test]
    fn absent_outside_any_scope() {
        assert!(current().is_none());
    }

    #[test]
    fn nested_scopes_restore_the_previous_binding() {
        let outer = enter(binding("x-outer", "1"));
        assert!(current().unwrap().header_map().contains_key("x-outer"));

        {
            let _inner = enter(binding("x-inner", "2"));
            let active = current().unwrap();
            assert!(active.header_map().contains_key("x-inner"));
            assert!(!active.header_map().contains_key("x-outer"));
        }

        assert!(current().unwrap().header_map().contains_key("x-outer"));
        drop(outer);
        assert!(current().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn scoped_future_carries_its_binding_across_polls() {
        let seen = binding("x-correlation-id", "abc")
            .scope(async {
                tokio::task::yield_now().await;
                ForwardedHeaders::current()
            })
            .await;

        assert_eq!(seen.unwrap().header_map().get("x-correlation-id").unwrap(), "abc");
        assert!(ForwardedHeaders::current().is_none());
    }

    #[tokio::test]
    async fn scoped_future_does_not_leak_into_the_caller() {
        binding("x-correlation-id", "abc")
            .scope(async {})
            .await;

        assert!(ForwardedHeaders::current().is_none());
    }
}
