//! Echo Bot Example
//!
//! Echoes every text message back to its sender and greets users who open a
//! conversation.
//!
//! # Commands
//!
//! ```text
//! /ping        - Pong!
//! /info        - What the bot knows about you
//! /help        - This help
//! anything else is echoed back
//! ```
//!
//! # Usage
//!
//! ```bash
//! VIBER_BOT__AUTH_TOKEN=... cargo run --package echo-bot -- \
//!     --webhook-url https://example.com/viber/webhook
//! ```
//!
//! The webhook URL must be public HTTPS that forwards to `--listen`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use viber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "echo-bot", about = "A Viber echo bot")]
struct Args {
    /// Configuration file (defaults to viber.toml / config.toml lookup)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Public HTTPS URL to register as the webhook
    #[arg(short, long)]
    webhook_url: Option<String>,

    /// Address to listen on, overriding webhook.host / webhook.port
    #[arg(short, long)]
    listen: Option<String>,
}

const HELP: &str = "Echo Bot - Commands\n\
    /ping - Pong!\n\
    /info - What I know about you\n\
    /help - This help\n\
    Anything else is echoed back.";

// ============================================================================
// Handlers
// ============================================================================

async fn echo(message: Message, response: Response) -> HandlerResult {
    let text = message.text_content().unwrap_or_default().trim();

    let reply = match text {
        "/ping" => Message::text("Pong!"),
        "/help" => Message::text(HELP),
        "/info" => {
            let user = response.bot().get_user_details(response.user_profile()).await?;
            Message::text(format!(
                "Name: {}\nCountry: {}\nLanguage: {}\nDevice: {} ({})",
                user.name, user.country, user.language, user.device_type, user.primary_device_os
            ))
        }
        _ => message,
    };

    response.send(reply, None).await?;
    Ok(())
}

async fn log_message(message: Message, response: Response) -> HandlerResult {
    info!(
        from = %response.user_profile().name,
        kind = message.type_name().unwrap_or("keyboard"),
        text = message.text_content().unwrap_or_default(),
        "Message received"
    );
    Ok(())
}

async fn welcome(
    user: UserProfile,
    subscribed: bool,
    context: Option<String>,
    finish: ConversationFinish,
) -> HandlerResult {
    info!(user = %user.id, subscribed, context = ?context, "Conversation started");

    if subscribed {
        finish.done();
    } else {
        finish.reply(
            Message::text(format!(
                "Hi {}! Send me anything and I'll send it back. Try /help.",
                user.name
            )),
            Some(Document::new().with("origin", "welcome")),
        );
    }
    Ok(())
}

async fn greet_subscriber(response: Response) -> HandlerResult {
    let greeting = format!(
        "Thanks for subscribing, {}!",
        response.user_profile().name
    );
    response.send(Message::text(greeting), None).await?;
    Ok(())
}

async fn log_unsubscribe(user_id: String) -> HandlerResult {
    info!(user_id = %user_id, "User unsubscribed");
    Ok(())
}

async fn log_error(error: BotError) {
    error!("Bot error: {}", error);
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load().context("failed to load configuration")?;

    if let Some(listen) = &args.listen {
        let (host, port) = listen
            .rsplit_once(':')
            .context("--listen expects host:port")?;
        config.webhook.host = host.to_string();
        config.webhook.port = port.parse().context("--listen has an invalid port")?;
    }
    if let Some(url) = args.webhook_url {
        config.webhook.public_url = Some(url);
    }

    validate_config(&config)?;
    init_from_config(&config.logging);

    let bot = Bot::new(config.bot.clone())?;

    let _ = bot.on_error(log_error);
    let _ = bot.on_message(log_message);
    let _ = bot.on_text_message(Regex::new(".+")?, echo);
    let _ = bot.on_conversation_started(welcome);
    let _ = bot.on_subscribe(greet_subscriber);
    let _ = bot.on_unsubscribe(log_unsubscribe);

    let listener = bot.listen(&config.webhook).await?;
    info!(addr = %listener.local_addr(), path = %config.webhook.path, "Echo bot ready");

    match &config.webhook.public_url {
        Some(url) => {
            let response = bot.set_webhook(url, config.webhook.is_inline).await?;
            info!(event_types = ?response.event_types, "Webhook set");
        }
        None => warn!("No public webhook URL configured, assuming it is already set"),
    }

    match bot.get_bot_profile().await {
        Ok(account) => info!(
            name = %account.name,
            uri = %account.uri,
            subscribers = account.subscribers_count,
            "Account info"
        ),
        Err(e) => warn!(error = %e, "Could not fetch account info"),
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    listener.shutdown().await;

    Ok(())
}
