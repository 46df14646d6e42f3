//! Authentication lifecycle: phone submission, OTP verification, logout.
//!
//! ```text
//! Anonymous --send--> CodeSent --verify ok--> Authenticated --logout--> Anonymous
//!                     CodeSent --verify fail--> CodeSent
//! ```

pub mod store;
pub mod types;

pub use store::SessionStore;
pub use types::{PendingVerification, SessionPhase, SessionSnapshot, User};
