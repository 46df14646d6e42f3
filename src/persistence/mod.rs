//! Key-value blob persistence for session and chat state.
//!
//! State is stored as JSON under two independent namespaces, each wrapped in
//! a versioned envelope.

pub mod file_store;
pub mod kv_store;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::ChatResult;

pub use file_store::JsonFileStore;
pub use kv_store::{KeyValueStore, MemoryStore, StoreFuture};

/// Namespace holding the authenticated user.
pub const AUTH_NAMESPACE: &str = "auth-storage";

/// Namespace holding chatrooms and the current selection.
pub const CHAT_NAMESPACE: &str = "chat-storage";

/// Current envelope version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    #[serde(flatten)]
    data: T,
}

/// Wrap `value` in the current envelope and encode it.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode_json<T: Serialize>(value: &T) -> ChatResult<String> {
    Ok(serde_json::to_string(&Envelope {
        version: SCHEMA_VERSION,
        data: value,
    })?)
}

/// Serialize `value` into its namespace.
///
/// # Errors
/// Returns an error if serialization or the underlying store fails.
pub async fn save_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> ChatResult<()> {
    let json = encode_json(value)?;
    store.set(key, json).await
}

/// Load and deserialize a namespace.
///
/// Returns `Ok(None)` when the namespace is empty or was written with an
/// unknown schema version.
///
/// # Errors
/// Returns an error if the store fails or the blob is malformed.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> ChatResult<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let version = value.get("version").and_then(serde_json::Value::as_u64);
    if version != Some(u64::from(SCHEMA_VERSION)) {
        warn!(key, ?version, "Ignoring blob with unsupported schema version");
        return Ok(None);
    }

    let envelope: Envelope<T> = serde_json::from_value(value)?;
    Ok(Some(envelope.data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
    }

    #[tokio::test]
    async fn test_versioned_round_trip() {
        let store = MemoryStore::new();
        let sample = Sample {
            name: "parley".to_string(),
        };
        save_json(&store, "sample", &sample).await.unwrap();

        let raw = store.get("sample").await.unwrap().unwrap();
        assert!(raw.contains("\"version\":1"));

        let loaded: Option<Sample> = load_json(&store, "sample").await.unwrap();
        assert_eq!(loaded, Some(sample));
    }

    #[tokio::test]
    async fn test_unknown_version_is_ignored() {
        let store = MemoryStore::new();
        store
            .set("sample", r#"{"version":99,"name":"future"}"#.to_string())
            .await
            .unwrap();
        let loaded: Option<Sample> = load_json(&store, "sample").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_missing_and_malformed() {
        let store = MemoryStore::new();
        let missing: Option<Sample> = load_json(&store, "nothing").await.unwrap();
        assert!(missing.is_none());

        store.set("broken", "{not json".to_string()).await.unwrap();
        assert!(load_json::<Sample>(&store, "broken").await.is_err());
    }
}
