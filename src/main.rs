//! Binary entrypoint for the scripted chat walkthrough.

use std::process::ExitCode;

use parley_chat::start_parley;

/// Sign in, chat once and page in history against the local blob store.
fn main() -> ExitCode {
    start_parley::run()
}
