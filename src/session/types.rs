//! Session identity and OTP-flow types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::UserId;

/// Identity produced by a successful OTP verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user identifier.
    pub id: UserId,
    /// Phone number digits, without the dial code.
    pub phone: String,
    /// Dial code such as `+1`.
    pub country_code: String,
    /// Always true for a stored user.
    pub is_authenticated: bool,
}

impl User {
    /// Build the user for a completed verification.
    #[must_use]
    pub fn verified(pending: PendingVerification) -> Self {
        Self {
            id: UserId::new(),
            phone: pending.phone,
            country_code: pending.country_code,
            is_authenticated: true,
        }
    }

    /// Phone number with its dial code, e.g. `+1 5551234567`.
    #[must_use]
    pub fn display_phone(&self) -> String {
        format!("{} {}", self.country_code, self.phone)
    }
}

/// Phone number captured when a code was sent, awaiting verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingVerification {
    /// Phone number digits.
    pub phone: String,
    /// Dial code.
    pub country_code: String,
    /// When the most recent code was sent.
    pub sent_at: DateTime<Utc>,
}

/// Authentication lifecycle phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionPhase {
    /// No user and no code in flight.
    Anonymous,
    /// A code was sent and not yet verified.
    CodeSent,
    /// A user is signed in.
    Authenticated,
}

/// Read-only view of the session for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Signed-in user, if any.
    pub user: Option<User>,
    /// Whether a code was sent and is awaiting verification.
    pub otp_sent: bool,
    /// Whether a send or verify round-trip is in progress.
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// Derived lifecycle phase.
    ///
    /// A pending code takes precedence so a signed-in user re-verifying is
    /// shown the code step.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        if self.otp_sent {
            SessionPhase::CodeSent
        } else if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}
