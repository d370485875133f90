//! Form Bot Example
//!
//! A multi-step registration dialogue built on the Colloquy FSM layer.
//! The bot walks each user through a short form, remembering where every
//! conversation stands between messages:
//!
//! ```text
//! (no state) ──anything──▶ waiting_name ──"Alice"──▶ waiting_age ──"34"──▶ done (cleared)
//!                                                        │
//!                                                 "not a number"
//!                                                        │
//!                                                        ▼
//!                                                 stays in waiting_age
//! ```
//!
//! # State Routing
//!
//! Each matcher is gated on a state of the `Registration` group, so the
//! same incoming text is routed to a different handler depending on where
//! that user's conversation stands. Two users in the same chat fill in the
//! form independently.
//!
//! # Events
//!
//! There is no transport here: `main` feeds a scripted conversation into
//! the dispatcher. Swap `send` for a real adapter loop to go live.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package form-bot
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use colloquy::prelude::*;
use colloquy::runtime::{ColloquyConfig, LoggingBuilder, validate_config};
use serde::Deserialize;
use serde_json::json;
use tracing::{Level, info};

// ============================================================================
// Platform Types (normally provided by an adapter)
// ============================================================================

/// A plain chat message with just enough identity for conversation routing.
struct ChatMessage {
    chat_id: i64,
    user_id: i64,
    text: String,
}

impl Event for ChatMessage {
    fn event_name(&self) -> &'static str {
        "chat_message"
    }

    fn event_type(&self) -> EventType {
        EventType::Message
    }

    fn origin(&self) -> EventOrigin {
        EventOrigin::chat_user(self.chat_id, self.user_id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A bot identity without a platform behind it.
struct SimBot;

impl Bot for SimBot {
    fn id(&self) -> i64 {
        7
    }
}

/// "Sends" a reply by logging it in the bot's voice.
fn reply(msg: &ChatMessage, text: &str) {
    info!("[chat {}] bot → {}: {}", msg.chat_id, msg.user_id, text);
}

// ============================================================================
// The Registration Form
// ============================================================================

states_group! {
    /// Steps of the registration dialogue.
    pub group Registration {
        waiting_name,
        waiting_age,
    }
}

/// The finished form, read back from conversation data.
#[derive(Debug, Deserialize)]
struct Form {
    name: String,
    age: u8,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// Greets a user with no conversation in progress and starts the form.
async fn start(fsm: FsmContext, event: BoxedEvent) -> Result<()> {
    let Some(msg) = event.downcast_ref::<ChatMessage>() else {
        return Ok(());
    };

    reply(msg, "Hi! Let's get you registered. What's your name?");
    fsm.set_state(Registration::waiting_name()).await?;
    Ok(())
}

/// Stores the name and moves the conversation on to the age question.
async fn got_name(fsm: FsmContext, event: BoxedEvent) -> Result<()> {
    let Some(msg) = event.downcast_ref::<ChatMessage>() else {
        return Ok(());
    };

    let name = msg.text.trim();
    fsm.update_data(HashMap::from([("name".to_string(), json!(name))]))
        .await?;
    fsm.set_state(Registration::waiting_age()).await?;

    reply(msg, &format!("Nice to meet you, {name}! How old are you?"));
    Ok(())
}

/// Validates the age, then reads the whole form back and finishes.
async fn got_age(fsm: FsmContext, event: BoxedEvent) -> Result<()> {
    let Some(msg) = event.downcast_ref::<ChatMessage>() else {
        return Ok(());
    };

    let Ok(age) = msg.text.trim().parse::<u8>() else {
        // Stay in waiting_age; the next message gets another try.
        reply(msg, "That doesn't look like an age. Digits only, please!");
        return Ok(());
    };

    fsm.update_data(HashMap::from([("age".to_string(), json!(age))]))
        .await?;

    let form: Form = fsm.get_typed_data().await?;
    reply(
        msg,
        &format!("All done! Registered {} (age {}).", form.name, form.age),
    );

    // Registration finished, release the conversation record.
    fsm.clear().await?;
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

/// Feeds one scripted message into the dispatcher.
async fn send(
    dispatcher: &Dispatcher,
    bot: &BoxedBot,
    chat_id: i64,
    user_id: i64,
    text: &str,
) -> Result<()> {
    info!("[chat {}] {} → bot: {}", chat_id, user_id, text);
    let event = BoxedEvent::new(ChatMessage {
        chat_id,
        user_id,
        text: text.to_string(),
    });
    dispatcher.dispatch(event, Arc::clone(bot)).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    LoggingBuilder::new()
        .with_level(Level::INFO)
        .directive("colloquy_fsm=debug")
        .init();

    // Default config: in-memory storage, per-key in-process isolation
    let config = ColloquyConfig::default();
    validate_config(&config)?;
    let fsm = build_fsm_middleware(&config.fsm).await?;

    let dispatcher = Dispatcher::new()
        .with_middleware(fsm)
        .with(
            Matcher::new()
                .name("registration_name")
                .on::<ChatMessage>()
                .state(Registration::waiting_name())
                .block(true)
                .handler(got_name),
        )
        .with(
            Matcher::new()
                .name("registration_age")
                .on::<ChatMessage>()
                .state(Registration::waiting_age())
                .block(true)
                .handler(got_age),
        )
        .with(
            // Last: anything from a user we're not mid-form with starts one
            Matcher::new()
                .name("registration_start")
                .on::<ChatMessage>()
                .state_absent()
                .block(true)
                .handler(start),
        );

    let bot: BoxedBot = Arc::new(SimBot);
    const CHAT: i64 = -1001;
    const ALICE: i64 = 42;
    const BOB: i64 = 57;

    // Two users fill in the form in the same chat, interleaved.
    send(&dispatcher, &bot, CHAT, ALICE, "hello").await?;
    send(&dispatcher, &bot, CHAT, ALICE, "Alice").await?;
    send(&dispatcher, &bot, CHAT, BOB, "hi there").await?;
    send(&dispatcher, &bot, CHAT, ALICE, "thirty-four").await?;
    send(&dispatcher, &bot, CHAT, ALICE, "34").await?;
    send(&dispatcher, &bot, CHAT, BOB, "Bob").await?;
    send(&dispatcher, &bot, CHAT, BOB, "51").await?;

    Ok(())
}
