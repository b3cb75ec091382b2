use clap::Parser;
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tg_menu_bot::bot::{BotContext, UpdateDispatcher};
use tg_menu_bot::config::BotConfig;
use tg_menu_bot::handlers::PaymentHandler;
use tg_menu_bot::http::{self, ApiState};
use tg_menu_bot::ledger::PaymentLedger;
use tg_menu_bot::platform;

const UPDATE_CHANNEL_CAPACITY: usize = 100;

#[derive(Parser)]
#[command(name = "tg-menu-bot")]
#[command(about = "A Telegram bot with menus, a scream mode and Stars invoices")]
struct Args {
    /// address of the invoice endpoint, overrides HTTP_ADDR
    #[arg(long)]
    http_addr: Option<SocketAddr>,

    /// run without the invoice endpoint
    #[arg(long)]
    no_http: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        // only warn if .env file exists but failed to load
        match e {
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // .env file not found, which is fine
            }
            _ => {
                eprintln!("warning: failed to load .env file: {}", e);
            }
        }
    }

    // info by default, RUST_LOG takes precedence
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    let mut config = BotConfig::from_env()?;
    if let Some(addr) = args.http_addr {
        config.http_addr = addr;
    }
    if args.no_http {
        config.http_enabled = false;
    }

    info!("Starting bot...");

    let bot = Bot::new(&config.bot_token);
    // an invalid token aborts here
    let me = bot.get_me().await?;
    let bot_username = me.user.username.clone().unwrap_or_default();
    info!("Authorized as @{}", bot_username);

    let platform = Arc::new(bot.clone());
    let ledger = PaymentLedger::new();
    let ctx = BotContext {
        platform: platform.clone(),
        payment_handler: PaymentHandler::new(ledger),
    };

    if config.http_enabled {
        let state = ApiState {
            platform: platform.clone(),
            invoice_chat_id: config.invoice_chat_id,
            bot_username,
            link_domain: config.link_domain.clone(),
        };
        let app = http::router(state, config.allowed_origin.clone());
        let listener = http::bind(config.http_addr).await?;
        tokio::spawn(async move {
            if let Err(e) = http::serve(listener, app).await {
                error!("Invoice endpoint stopped: {}", e);
            }
        });
    }

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    tokio::spawn(platform::poll_updates(bot, tx, cancel.clone()));

    let mut dispatcher = UpdateDispatcher::new(ctx);
    let dispatcher_cancel = cancel.clone();
    tokio::spawn(async move {
        dispatcher.run(rx, dispatcher_cancel).await;
    });

    info!("Start listening for updates. Press enter to stop");
    wait_for_stop().await;

    // in-flight handling is not awaited
    cancel.cancel();
    info!("Stopped");

    Ok(())
}

/// resolves on a newline from stdin or on ctrl-c
async fn wait_for_stop() {
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = stdin.read_line(&mut line) => match result {
            Ok(0) => {
                info!("stdin closed, press ctrl-c to stop");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for ctrl-c: {}", e);
                }
            }
            Ok(_) => {}
            Err(e) => error!("Failed to read stdin: {}", e),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c");
        }
    }
}
