//! Startup helpers for the `parley` binary.
//!
//! Runs a scripted walk through the core: sign in, open a chatroom, trade a
//! message with the assistant and page in older history.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use crate::app::{self, AppState};
use crate::core::config::ChatConfig;
use crate::reply::SUGGESTIONS;
use crate::validation::{validate_country_code, validate_otp, validate_phone};

const DEMO_PHONE: &str = "5551234567";
const DEMO_COUNTRY: &str = "+1";
const DEMO_CODE: &str = "123456";

/// Run the scripted session.
///
/// # Returns
/// `ExitCode::SUCCESS` when every step completes, `1` otherwise.
#[must_use]
pub fn run() -> ExitCode {
    app::init_tracing();
    info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };
    info!(storage_dir = %config.storage_dir.display(), "Using blob store");

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create state: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(walkthrough(state)) {
        tracing::error!("Walkthrough failed: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Drive every store operation once.
///
/// # Errors
/// Returns an error if any step is rejected.
pub async fn walkthrough(state: Arc<AppState>) -> anyhow::Result<()> {
    state.restore().await;

    if state.session.current_user().await.is_none() {
        validate_phone(DEMO_PHONE)?;
        validate_country_code(DEMO_COUNTRY)?;
        state
            .session
            .send_verification_code(DEMO_PHONE, DEMO_COUNTRY)
            .await
            .context("sending verification code")?;

        validate_otp(DEMO_CODE)?;
        if !state.session.verify_code(DEMO_CODE).await? {
            bail!("verification code was rejected");
        }
    }
    let user = state
        .session
        .current_user()
        .await
        .context("no user after verification")?;
    info!(phone = %user.display_phone(), "Signed in");

    let room = state
        .conversations
        .create_chatroom("Getting started")
        .await
        .context("creating chatroom")?;

    let prompt = SUGGESTIONS.first().map_or("Hello!", |s| s.question);
    if let Some(reply) = state.conversations.send_message(prompt, None).await? {
        info!(reply = %reply.content, "Assistant replied");
    }

    let page = state
        .conversations
        .load_older_messages(room.id)
        .await
        .context("loading older messages")?;
    info!(count = page.len(), "Loaded history page");

    for summary in state.conversations.summaries().await {
        info!(
            chatroom_id = %summary.id,
            title = %summary.title,
            messages = summary.message_count,
            "Chatroom"
        );
    }
    Ok(())
}
