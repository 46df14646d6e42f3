//! Core configuration, errors and identifiers.

pub mod config;
pub mod errors;
pub mod ids;

pub use config::{ChatConfig, DelayConfig, HistoryConfig};
pub use errors::{ChatError, ChatResult};
pub use ids::{ChatroomId, MessageId, UserId};
