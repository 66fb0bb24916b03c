use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{claims, identity, AuthError, Session, SessionStore, User};

/// Owns the session: the only component that writes to the session store.
///
/// Cloning is cheap and every clone shares the same session, so the request
/// pipeline and the front end observe the same state.
#[derive(Clone)]
pub struct AuthManager {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    store: Box<dyn SessionStore>,
    /// In-memory mirror of the persisted session. Writers hold it across the
    /// store write, never across an await.
    current: RwLock<Session>,
}

impl AuthManager {
    /// Create a manager, loading whatever session the store holds.
    pub fn new(http: Client, base_url: impl Into<String>, store: Box<dyn SessionStore>) -> Self {
        let current = store.load();
        debug!(authenticated = current.is_authenticated(), "Session loaded");

        Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.into(),
                store,
                current: RwLock::new(current),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Authenticate and replace the current session.
    ///
    /// On any failure the previous session stays exactly as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let pair = identity::obtain_token_pair(
            &self.inner.http,
            &self.inner.base_url,
            username,
            password,
        )
        .await?;

        let user = claims::user_from_access_token(&pair.access, username);
        let session = Session {
            access_token: Some(pair.access),
            refresh_token: Some(pair.refresh),
            user: Some(user),
        };

        {
            let mut current = self.inner.current.write();
            self.inner.store.save(&session)?;
            *current = session.clone();
        }

        info!(username, "Logged in");
        Ok(session)
    }

    /// Drop the session. Safe to call when already signed out.
    pub fn logout(&self) {
        self.clear_session();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.current.read().is_authenticated()
    }

    pub fn session(&self) -> Session {
        self.inner.current.read().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.current.read().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.current.read().access_token.clone()
    }

    pub(crate) fn refresh_token(&self) -> Option<String> {
        self.inner.current.read().refresh_token.clone()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Record an access token obtained by exchanging `used_refresh`.
    ///
    /// Dropped if the session no longer holds that refresh token, which means a
    /// logout or a new login happened while the refresh was in flight. The
    /// in-memory session is updated even if persisting fails, so the request
    /// being retried still goes out with the new token.
    pub(crate) fn record_access_token(&self, used_refresh: &str, access_token: String) -> bool {
        let mut current = self.inner.current.write();
        if current.refresh_token.as_deref() != Some(used_refresh) {
            debug!("Session changed during refresh, discarding refreshed token");
            return false;
        }
        current.access_token = Some(access_token);

        if let Err(e) = self.inner.store.save(&current) {
            warn!(error = %e, "Failed to persist refreshed access token");
        }
        true
    }

    /// Tear down a session that could not be renewed with `used_refresh`.
    ///
    /// A session that has moved on since (a fresh login) is left alone.
    pub(crate) fn expire(&self, used_refresh: Option<&str>) {
        let mut current = self.inner.current.write();
        if current.refresh_token.as_deref() != used_refresh {
            debug!("Session changed during refresh, not expiring it");
            return;
        }
        *current = Session::default();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        info!("Session expired");
    }

    fn clear_session(&self) {
        let mut current = self.inner.current.write();
        *current = Session::default();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }
}
