//! Chat core with a simulated phone/OTP sign-in, chatroom store and mock assistant.

// Hard bans
#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(non_camel_case_types)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::missing_const_for_fn)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::module_inception)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
#![deny(overflowing_literals)]
// Test modules unwrap freely.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Composition root and tracing setup.
pub mod app;
/// Chatrooms, messages, pagination and search.
#[allow(clippy::significant_drop_tightening)]
pub mod conversation;
/// Configuration, errors and identifiers.
pub mod core;
/// Versioned JSON blob persistence.
pub mod persistence;
/// Mock assistant replies.
pub mod reply;
/// Phone/OTP authentication lifecycle.
#[allow(clippy::significant_drop_tightening)]
pub mod session;
/// Entry helpers for the `parley` binary.
pub mod start_parley;
/// Simulated backend round-trips.
pub mod transport;
/// Input checks for the sign-in form and attachments.
pub mod validation;
