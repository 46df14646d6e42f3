//! Simulated network seam.
//!
//! Every operation that would talk to a backend in a real deployment goes
//! through a [`Transport`]. The shipped implementation only sleeps and can be
//! told to fail at a configured rate.

pub mod simulated;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::core::errors::ChatResult;

pub use simulated::SimulatedTransport;

/// Boxed future type for transport calls.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Operations that incur a simulated round-trip.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Request a verification code.
    SendCode,
    /// Submit a verification code.
    VerifyCode,
    /// Create a chatroom.
    CreateChatroom,
    /// Delete a chatroom.
    DeleteChatroom,
    /// Fetch a page of older messages.
    LoadOlder,
    /// Assistant typing delay before a reply.
    AssistantReply,
}

impl Operation {
    /// Stable string form for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SendCode => "send_code",
            Self::VerifyCode => "verify_code",
            Self::CreateChatroom => "create_chatroom",
            Self::DeleteChatroom => "delete_chatroom",
            Self::LoadOlder => "load_older",
            Self::AssistantReply => "assistant_reply",
        }
    }

    /// Whether the operation stands for a backend call that may fail.
    ///
    /// The assistant delay is local and never fails.
    #[must_use]
    pub const fn can_fail(self) -> bool {
        !matches!(self, Self::AssistantReply)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend round-trip abstraction.
pub trait Transport: Send + Sync {
    /// Perform one round-trip for `operation`.
    ///
    /// # Errors
    /// Returns `ChatError::TransportFailure` when the backend rejects the call.
    fn round_trip(&self, operation: Operation) -> TransportFuture<'_, ChatResult<()>>;
}
