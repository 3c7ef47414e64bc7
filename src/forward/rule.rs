//! Selection of the inbound headers eligible for forwarding.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use http::{HeaderMap, HeaderName};

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync + 'static>;

/// Rule deciding which inbound request headers are forwarded to outbound requests.
///
/// A header is forwarded when its name is listed exactly or when any filter
/// predicate accepts it. Built once at startup with [`ForwardRule::builder`]
/// and immutable afterwards.
#[derive(Clone, Default)]
pub struct ForwardRule {
    names: Vec<HeaderName>,
    filters: Vec<Predicate>,
}

impl ForwardRule {
    /// Create a new [`ForwardRuleBuilder`] with no names and no filters.
    pub fn builder() -> ForwardRuleBuilder {
        ForwardRuleBuilder::default()
    }

    /// Computes the forwarded header set for one inbound request.
    ///
    /// The result is a filtered copy of `headers`: every selected name keeps
    /// all of its values in their original order, and a name matched by both
    /// an exact entry and a filter is still copied exactly once.
    pub fn select(&self, headers: &HeaderMap) -> HeaderMap {
        let mut selected = HeaderMap::new();
        for name in headers.keys() {
            if self.matches(name) {
                for value in headers.get_all(name) {
                    selected.append(name.clone(), value.clone());
                }
            }
        }
        selected
    }

    fn matches(&self, name: &HeaderName) -> bool {
        self.names.contains(name)
            || self
                .filters
                .iter()
                .any(|filter| run_filter(filter, name.as_str()))
    }
}

/// Runs a single predicate, treating a panic as a non-match so that one broken
/// filter cannot abort selection for the remaining headers or fail the request.
fn run_filter(filter: &Predicate, name: &str) -> bool {
    panic::catch_unwind(AssertUnwindSafe(|| filter(name))).unwrap_or_else(|_| {
        tracing::warn!(header = name, "header filter panicked, treated as non-matching");
        false
    })
}

impl fmt::Debug for ForwardRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardRule")
            .field("names", &self.names)
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Builder for [`ForwardRule`].
#[derive(Default)]
pub struct ForwardRuleBuilder {
    names: Vec<HeaderName>,
    filters: Vec<Predicate>,
}

impl ForwardRuleBuilder {
    /// Forward the header with exactly this name.
    pub fn header(mut self, name: HeaderName) -> Self {
        self.names.push(name);
        self
    }

    /// Forward every header whose name satisfies the predicate.
    ///
    /// Predicates receive the canonical lowercase header name. They are tried
    /// in registration order after the exact names, short-circuiting on the
    /// first match.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(predicate));
        self
    }

    /// Build the [`ForwardRule`].
    pub fn build(self) -> ForwardRule {
        ForwardRule {
            names: self.names,
            filters: self.filters,
        }
    }
}
