//! Keeps the transport's bearer token in step with the managed backend's session.

use log::{debug, info};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::auth::AuthContext;
use crate::backend::{ManagedBackend, Session};

/// Copy the backend's current session token into `auth`.
///
/// Returns `false` when the session could not be read; the token is left
/// untouched in that case.
pub async fn sync_once(backend: &dyn ManagedBackend, auth: &AuthContext) -> bool {
    match backend.current_session().await {
        Ok(session) => {
            apply(auth, session.as_ref());
            true
        }
        Err(e) => {
            debug!("Could not read managed backend session: {e}");
            false
        }
    }
}

fn apply(auth: &AuthContext, session: Option<&Session>) {
    auth.set_token(session.map(|s| s.access_token.clone()));
}

/// Start credential sync in the background.
///
/// Without a backend there is nothing to follow and `None` is returned. The
/// task never reports errors: a failed initial session read ends it quietly.
/// Otherwise it applies every auth-state change until the backend drops its
/// sender.
pub fn spawn(
    backend: Option<Arc<dyn ManagedBackend>>,
    auth: AuthContext,
) -> Option<JoinHandle<()>> {
    let backend = backend?;
    Some(tokio::spawn(async move {
        let mut changes = backend.auth_changes();
        if !sync_once(backend.as_ref(), &auth).await {
            return;
        }
        while changes.changed().await.is_ok() {
            let session = changes.borrow_and_update().clone();
            info!(
                "Auth state changed, bearer token {}",
                if session.is_some() { "updated" } else { "cleared" }
            );
            apply(&auth, session.as_ref());
        }
        debug!("Auth change stream closed, credential sync stopped");
    }))
}
