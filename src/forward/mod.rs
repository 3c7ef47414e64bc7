//! Middleware pair forwarding selected inbound headers to outbound requests.
//!
//! [`HeaderForwardingLayer`] wraps the server side: on every inbound request
//! it evaluates a [`ForwardRule`] against the request's headers and keeps the
//! selected [`ForwardedHeaders`] bound while the request is serviced.
//! [`HeaderForwardingClientLayer`] wraps any client used inside the handler
//! and appends the bound headers to every outbound request it sends.

#[doc(inline)]
pub use self::{
    client::{HeaderForwardingClient, HeaderForwardingClientLayer},
    headers::ForwardedHeaders,
    rule::{ForwardRule, ForwardRuleBuilder},
    scope::Scoped,
    server::{HeaderForwarding, HeaderForwardingLayer},
};

pub mod client;
pub mod headers;
pub mod rule;
mod scope;
pub mod server;
