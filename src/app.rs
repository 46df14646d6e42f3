//! Application state shared by every consumer of the chat core.

use std::sync::Arc;

use tracing::{info, warn};

use crate::conversation::ConversationStore;
use crate::core::config::ChatConfig;
use crate::core::errors::ChatResult;
use crate::persistence::{JsonFileStore, KeyValueStore};
use crate::session::SessionStore;
use crate::transport::{SimulatedTransport, Transport};

/// Composition root: one session store and one conversation store sharing
/// a transport and a blob store.
pub struct AppState {
    /// Authentication lifecycle.
    pub session: Arc<SessionStore>,
    /// Chatrooms and messages.
    pub conversations: Arc<ConversationStore>,
    /// Configuration the stores were built from.
    pub config: ChatConfig,
}

impl AppState {
    /// Build state backed by JSON files under `config.storage_dir`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ChatConfig) -> ChatResult<Arc<Self>> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&config.storage_dir));
        Self::with_storage(config, storage)
    }

    /// Build state over an arbitrary blob store.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_storage(
        config: ChatConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> ChatResult<Arc<Self>> {
        config.validate()?;
        let transport: Arc<dyn Transport> = Arc::new(SimulatedTransport::new(&config));

        let session = Arc::new(SessionStore::new(
            Arc::clone(&transport),
            Arc::clone(&storage),
        ));
        let conversations = Arc::new(ConversationStore::new(&config, transport, storage));

        Ok(Arc::new(Self {
            session,
            conversations,
            config,
        }))
    }

    /// Rehydrate both stores. A namespace that fails to load starts empty.
    pub async fn restore(&self) {
        match self.session.restore().await {
            Ok(user) => info!(signed_in = user.is_some(), "Session namespace loaded"),
            Err(err) => warn!(?err, "Failed to restore session; starting signed out"),
        }
        match self.conversations.restore().await {
            Ok(count) => info!(count, "Chat namespace loaded"),
            Err(err) => warn!(?err, "Failed to restore chatrooms; starting empty"),
        }
    }
}

/// Install the fmt subscriber, honouring `RUST_LOG` with `info` as the floor.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DelayConfig;
    use crate::persistence::MemoryStore;

    #[tokio::test]
    async fn test_state_shares_storage() {
        let storage = Arc::new(MemoryStore::new());
        let config = ChatConfig::new().with_delays(DelayConfig::instant());
        let state = AppState::with_storage(config.clone(), storage.clone()).unwrap();

        state.session.send_verification_code("5551234567", "+1").await.unwrap();
        state.session.verify_code("123456").await.unwrap();
        state.conversations.create_chatroom("Hello").await.unwrap();

        let reloaded = AppState::with_storage(config, storage).unwrap();
        reloaded.restore().await;
        assert!(reloaded.session.current_user().await.is_some());
        assert_eq!(reloaded.conversations.chatrooms().await.len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ChatConfig::new().with_failure_rate(2.0);
        assert!(AppState::with_storage(config, Arc::new(MemoryStore::new())).is_err());
    }
}
