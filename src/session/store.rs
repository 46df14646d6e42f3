//! Session store: phone submission, OTP verification and logout.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::core::errors::ChatResult;
use crate::persistence::{self, AUTH_NAMESPACE, KeyValueStore};
use crate::session::types::{PendingVerification, SessionPhase, SessionSnapshot, User};
use crate::transport::{Operation, Transport};
use crate::validation::validate_otp;

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    pending: Option<PendingVerification>,
    in_flight: usize,
}

/// Persisted shape of the auth namespace.
#[derive(Serialize, Deserialize)]
struct AuthBlob {
    user: Option<User>,
}

/// Owner of the authenticated identity and the OTP flow.
pub struct SessionStore {
    state: RwLock<SessionState>,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KeyValueStore>,
    persist_lock: Mutex<()>,
}

impl SessionStore {
    /// Create an anonymous session.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            transport,
            storage,
            persist_lock: Mutex::new(()),
        }
    }

    /// Load the persisted user, if any. In-flight OTP state never survives.
    ///
    /// # Errors
    /// Returns an error if the stored blob cannot be read or decoded.
    pub async fn restore(&self) -> ChatResult<Option<User>> {
        let blob: Option<AuthBlob> =
            persistence::load_json(self.storage.as_ref(), AUTH_NAMESPACE).await?;
        let user = blob.and_then(|blob| blob.user);

        let mut state = self.state.write().await;
        state.user.clone_from(&user);
        if let Some(user) = &user {
            info!(user_id = %user.id, "Restored session");
        }
        Ok(user)
    }

    /// Request a verification code for `phone`.
    ///
    /// Inputs are not validated here; see [`crate::validation`]. Calling
    /// again replaces the captured phone number (resend).
    ///
    /// # Errors
    /// Returns `ChatError::TransportFailure` if the round-trip fails; state
    /// is left unchanged.
    pub async fn send_verification_code(&self, phone: &str, country_code: &str) -> ChatResult<bool> {
        self.state.write().await.in_flight += 1;
        let outcome = self.transport.round_trip(Operation::SendCode).await;

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        outcome?;

        state.pending = Some(PendingVerification {
            phone: phone.to_string(),
            country_code: country_code.to_string(),
            sent_at: Utc::now(),
        });
        info!(country_code, "Verification code sent");
        Ok(true)
    }

    /// Verify `code` against the pending phone number.
    ///
    /// Succeeds only for exactly six digits after a code was sent. The new
    /// user carries the phone number captured by the last send, so a
    /// well-formed code with nothing pending returns `Ok(false)` rather
    /// than signing in a user without a phone number.
    ///
    /// # Errors
    /// Returns `ChatError::TransportFailure` if the round-trip fails.
    pub async fn verify_code(&self, code: &str) -> ChatResult<bool> {
        self.state.write().await.in_flight += 1;
        let outcome = self.transport.round_trip(Operation::VerifyCode).await;

        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        outcome?;

        if let Err(err) = validate_otp(code) {
            debug!(%err, "Rejected verification code");
            return Ok(false);
        }
        let Some(pending) = state.pending.take() else {
            warn!("Verification attempted before a code was sent");
            return Ok(false);
        };

        let waited = Utc::now() - pending.sent_at;
        let user = User::verified(pending);
        state.user = Some(user.clone());
        drop(state);

        info!(
            user_id = %user.id,
            waited_secs = waited.num_seconds(),
            "User authenticated"
        );
        self.persist().await;
        Ok(true)
    }

    /// Sign out, clear every OTP flag and remove the persisted user.
    pub async fn logout(&self) {
        {
            let mut state = self.state.write().await;
            *state = SessionState::default();
        }
        info!("User logged out");
        self.persist().await;
    }

    /// Signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Current lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.snapshot().await.phase()
    }

    /// Read-only view for rendering.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            user: state.user.clone(),
            otp_sent: state.pending.is_some(),
            is_loading: state.in_flight > 0,
        }
    }

    /// Write the live user, or remove the namespace when signed out.
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let user = self.state.read().await.user.clone();
        let outcome = if user.is_some() {
            persistence::save_json(self.storage.as_ref(), AUTH_NAMESPACE, &AuthBlob { user }).await
        } else {
            self.storage.remove(AUTH_NAMESPACE).await
        };
        if let Err(err) = outcome {
            warn!(?err, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ChatConfig, DelayConfig};
    use crate::core::errors::ChatError;
    use crate::persistence::{MemoryStore, StoreFuture};
    use crate::transport::SimulatedTransport;
    use std::time::Duration;

    /// Memory store whose writes take 100 ms.
    #[derive(Default)]
    struct SlowWriteStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for SlowWriteStore {
        fn get(&self, key: &str) -> StoreFuture<'_, ChatResult<Option<String>>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> StoreFuture<'_, ChatResult<()>> {
            let key = key.to_string();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                self.inner.set(&key, value).await
            })
        }

        fn remove(&self, key: &str) -> StoreFuture<'_, ChatResult<()>> {
            self.inner.remove(key)
        }
    }

    fn session_with(config: &ChatConfig, storage: Arc<MemoryStore>) -> SessionStore {
        SessionStore::new(Arc::new(SimulatedTransport::new(config)), storage)
    }

    fn session() -> SessionStore {
        session_with(&ChatConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_login_flow() {
        let session = session();
        assert_eq!(session.phase().await, SessionPhase::Anonymous);

        assert!(session.send_verification_code("5551234567", "+44").await.unwrap());
        assert_eq!(session.phase().await, SessionPhase::CodeSent);

        assert!(session.verify_code("123456").await.unwrap());
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.phase(), SessionPhase::Authenticated);
        assert!(!snapshot.otp_sent);
        assert!(!snapshot.is_loading);

        let user = snapshot.user.unwrap();
        assert_eq!(user.phone, "5551234567");
        assert_eq!(user.country_code, "+44");
        assert!(user.is_authenticated);
        assert_eq!(user.display_phone(), "+44 5551234567");
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_codes_leave_state_unchanged() {
        let session = session();
        session.send_verification_code("5551234567", "+1").await.unwrap();
        let before = session.snapshot().await;

        assert!(!session.verify_code("12a456").await.unwrap());
        assert!(!session.verify_code("12345").await.unwrap());
        assert_eq!(session.snapshot().await, before);
        assert_eq!(session.phase().await, SessionPhase::CodeSent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_without_sent_code_fails() {
        let session = session();
        assert!(!session.verify_code("123456").await.unwrap());
        assert!(session.current_user().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_replaces_captured_phone() {
        let session = session();
        session.send_verification_code("1111111111", "+1").await.unwrap();
        session.send_verification_code("2222222222", "+33").await.unwrap();
        session.verify_code("000000").await.unwrap();

        let user = session.current_user().await.unwrap();
        assert_eq!(user.phone, "2222222222");
        assert_eq!(user.country_code, "+33");
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag_during_send() {
        let session = Arc::new(session());
        let task = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.send_verification_code("5551234567", "+1").await })
        };

        tokio::task::yield_now().await;
        assert!(session.snapshot().await.is_loading);

        assert!(task.await.unwrap().unwrap());
        assert!(!session.snapshot().await.is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_clears_and_persists() {
        let storage = Arc::new(MemoryStore::new());
        let session = session_with(&ChatConfig::default(), Arc::clone(&storage));
        session.send_verification_code("5551234567", "+1").await.unwrap();
        session.verify_code("123456").await.unwrap();

        let restored = session_with(&ChatConfig::default(), Arc::clone(&storage));
        assert!(restored.restore().await.unwrap().is_some());
        assert_eq!(restored.phase().await, SessionPhase::Authenticated);

        session.logout().await;
        assert_eq!(session.phase().await, SessionPhase::Anonymous);

        let restored = session_with(&ChatConfig::default(), storage);
        assert!(restored.restore().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_removes_auth_blob() {
        let storage = Arc::new(MemoryStore::new());
        let session = session_with(&ChatConfig::default(), Arc::clone(&storage));
        session.send_verification_code("5551234567", "+1").await.unwrap();
        session.verify_code("123456").await.unwrap();
        assert!(storage.get(AUTH_NAMESPACE).await.unwrap().is_some());

        session.logout().await;
        assert!(storage.get(AUTH_NAMESPACE).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_slow_login_write_stays_logged_out() {
        let config = ChatConfig::new().with_delays(DelayConfig::instant());
        let storage = Arc::new(SlowWriteStore::default());
        let session = Arc::new(SessionStore::new(
            Arc::new(SimulatedTransport::new(&config)),
            Arc::clone(&storage) as Arc<dyn KeyValueStore>,
        ));
        session.send_verification_code("5551234567", "+1").await.unwrap();

        let verify = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.verify_code("123456").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.logout().await;
        assert!(verify.await.unwrap().unwrap());
        assert!(session.current_user().await.is_none());

        let restarted = SessionStore::new(Arc::new(SimulatedTransport::new(&config)), storage);
        assert!(restarted.restore().await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_keeps_state() {
        let config = ChatConfig::new()
            .with_delays(DelayConfig::instant())
            .with_failure_rate(1.0);
        let session = session_with(&config, Arc::new(MemoryStore::new()));

        let err = session
            .send_verification_code("5551234567", "+1")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::TransportFailure { .. }));

        let snapshot = session.snapshot().await;
        assert!(!snapshot.otp_sent);
        assert!(!snapshot.is_loading);
    }
}
