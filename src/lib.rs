//! Request-scoped forwarding of HTTP headers across service boundaries.
//!
//! A selected subset of the headers carried by an inbound request is bound to
//! that request's processing and appended to every outbound request issued
//! while servicing it, without threading header values through handler code.
//! Typical use is keeping correlation IDs and B3 trace headers intact along a
//! request chain.
//!
//! ```
//! use http::header::HeaderName;
//! use tower_header_forwarding::forward::{
//!     ForwardRule, HeaderForwardingClientLayer, HeaderForwardingLayer,
//! };
//!
//! let rule = ForwardRule::builder()
//!     .header(HeaderName::from_static("x-correlation-id"))
//!     .filter(|name| name.starts_with("x-b3-"))
//!     .build();
//!
//! // wraps the server, e.g. an axum `Router`
//! let server_layer = HeaderForwardingLayer::new(rule);
//! // wraps any client `Service` used inside handlers
//! let client_layer = HeaderForwardingClientLayer::new();
//! # let _ = (server_layer, client_layer);
//! ```
//!
//! Forwarding is best-effort by design: a request with no matching headers,
//! an outbound call made outside any inbound scope, or a misbehaving filter
//! never fail the request they belong to.

pub mod forward;
