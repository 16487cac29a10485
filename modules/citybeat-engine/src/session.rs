//! Backend session establishment and the transient auth error message.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::store::MapState;
use crate::traits::MapGateway;

/// Text shown when the backend rejects the credentials.
pub const AUTH_ERROR_MESSAGE: &str = "Incorrect login / password, please try again";

/// How long the auth error message stays visible.
pub const AUTH_ERROR_VISIBLE: Duration = Duration::from_secs(2);

pub struct SessionManager {
    gateway: Arc<dyn MapGateway>,
    state: Arc<RwLock<MapState>>,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn MapGateway>, state: Arc<RwLock<MapState>>) -> Self {
        Self { gateway, state }
    }

    /// Try to establish the backend session.
    ///
    /// On rejection the auth error message is shown, then cleared again
    /// after a fixed two seconds by a background task. Rejection is never
    /// fatal; the caller decides whether to retry.
    pub async fn login(&self, login: &str, password: &str) -> bool {
        match self.gateway.login(login, password).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                state.authenticated = true;
                state.auth_error.clear();
                info!("session established");
                true
            }
            Err(e) => {
                warn!(error = %e, "login rejected");
                self.state.write().await.auth_error = AUTH_ERROR_MESSAGE.to_string();

                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    sleep(AUTH_ERROR_VISIBLE).await;
                    let mut state = state.write().await;
                    // A newer login attempt may have replaced the message.
                    if state.auth_error == AUTH_ERROR_MESSAGE {
                        state.auth_error.clear();
                    }
                });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;
    use citybeat_common::cities::city_profile;

    fn make_state() -> Arc<RwLock<MapState>> {
        Arc::new(RwLock::new(MapState::new(city_profile("spb").unwrap())))
    }

    #[tokio::test]
    async fn successful_login_marks_session() {
        let state = make_state();
        let session = SessionManager::new(Arc::new(MockGateway::new()), Arc::clone(&state));

        assert!(session.login("demo", "demo").await);
        let state = state.read().await;
        assert!(state.authenticated);
        assert!(state.auth_error.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_login_shows_then_clears_the_message() {
        let state = make_state();
        let gateway = Arc::new(MockGateway::new().reject_login());
        let session = SessionManager::new(gateway, Arc::clone(&state));

        assert!(!session.login("demo", "wrong").await);
        assert_eq!(state.read().await.auth_error, AUTH_ERROR_MESSAGE);
        assert!(!state.read().await.authenticated);

        // Just shy of the clear deadline the message is still up.
        sleep(Duration::from_millis(1900)).await;
        assert_eq!(state.read().await.auth_error, AUTH_ERROR_MESSAGE);

        sleep(Duration::from_millis(200)).await;
        assert!(
            state.read().await.auth_error.is_empty(),
            "message must auto-clear two seconds after rejection"
        );
    }
}
