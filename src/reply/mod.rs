//! Mock assistant: scripted answers with a random fallback.

pub mod simulator;

pub use simulator::{
    GENERIC_REPLIES, ReplySimulator, SUGGESTIONS, Suggestion, generate_reply, scripted_answer,
};
