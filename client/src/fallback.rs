//! Ordered transport strategies for data access calls.
//!
//! Each data access function describes one attempt per [`Route`] and hands it
//! to a [`TransportPlan`]. The plan runs the routes strictly in sequence:
//!
//! - `[Managed, Http]` when a managed backend is configured and enabled,
//! - `[Http]` otherwise.
//!
//! A failure on the managed route is logged and the HTTP route runs next,
//! unless the error is not fallback-eligible (see
//! [`ClientError::is_fallback_eligible`]). The HTTP route's outcome is always
//! final. No route is attempted twice.

use futures_util::future::BoxFuture;
use log::{debug, warn};

use crate::backend::ManagedBackend;
use crate::error::ClientResult;

/// One way of reaching the data.
#[derive(Clone, Copy)]
pub enum Route<'a> {
    Managed(&'a dyn ManagedBackend),
    Http,
}

impl Route<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Managed(_) => "managed",
            Route::Http => "http",
        }
    }
}

impl std::fmt::Debug for Route<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy)]
pub struct TransportPlan<'a> {
    managed: Option<&'a dyn ManagedBackend>,
}

impl<'a> TransportPlan<'a> {
    pub fn new(managed: Option<&'a dyn ManagedBackend>) -> Self {
        Self { managed }
    }

    pub fn http_only() -> Self {
        Self { managed: None }
    }

    pub fn routes(&self) -> Vec<Route<'a>> {
        let mut routes = Vec::with_capacity(2);
        if let Some(backend) = self.managed {
            routes.push(Route::Managed(backend));
        }
        routes.push(Route::Http);
        routes
    }

    /// Run `attempt` once per route until one succeeds or a failure is final.
    pub async fn execute<T, F>(&self, operation: &str, mut attempt: F) -> ClientResult<T>
    where
        F: FnMut(Route<'a>) -> BoxFuture<'a, ClientResult<T>>,
    {
        let routes = self.routes();
        let Some((last, earlier)) = routes.split_last() else {
            return attempt(Route::Http).await;
        };
        for route in earlier {
            debug!("{operation}: trying {} route", route.name());
            match attempt(*route).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_fallback_eligible() => {
                    warn!("{operation}: {} route failed, falling back: {e}", route.name());
                }
                Err(e) => return Err(e),
            }
        }
        debug!("{operation}: using {} route", last.name());
        attempt(*last).await
    }
}
