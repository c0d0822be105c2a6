use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Route the favorite guard sends anonymous users to.
pub const LOGIN_PATH: &str = "/login";

/// Navigation side effect owned by the UI shell.
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Per-session authentication state. `is_login` is observable through a
/// watch channel so controllers can react to transitions.
pub struct Session {
    token: RwLock<Option<String>>,
    login: watch::Sender<bool>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (login, _) = watch::channel(false);
        Self {
            token: RwLock::new(None),
            login,
        }
    }

    pub async fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.login(token).await;
        session
    }

    pub fn is_login(&self) -> bool {
        *self.login.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.login.subscribe()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn login(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
        self.set_login(true);
    }

    pub async fn logout(&self) {
        self.token.write().await.take();
        self.set_login(false);
    }

    fn set_login(&self, logged_in: bool) {
        let changed = self.login.send_if_modified(|current| {
            if *current == logged_in {
                return false;
            }
            *current = logged_in;
            true
        });
        if changed {
            debug!(logged_in, "session: login state changed");
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
