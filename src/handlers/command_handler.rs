use log::{debug, info};
use teloxide::prelude::*;
use teloxide::types::ChatId;

use crate::bot::{BotContext, Command, ReplyMode, Session};
use crate::handlers::{CallbackHandler, PaymentHandler};
use crate::menu::Menu;
use crate::platform::Platform;

pub const STATUS_PROMPT: &str =
    "Please provide a payload to check the status. (/status {your_payload})";

pub struct CommandHandler;

impl CommandHandler {
    pub async fn handle_command<P: Platform>(
        ctx: &BotContext<P>,
        session: &mut Session,
        chat_id: ChatId,
        cmd: Command,
    ) -> ResponseResult<()> {
        match cmd {
            Command::Scream => {
                session.reply_mode = ReplyMode::Screaming;
            }
            Command::Whisper => {
                session.reply_mode = ReplyMode::Normal;
            }
            Command::Menu => {
                CallbackHandler::send_menu(ctx, chat_id, Menu::First).await?;
            }
            Command::Buy => {
                PaymentHandler::send_chat_invoice(
                    ctx.platform.as_ref(),
                    chat_id,
                    "Something",
                    " Please pay for something",
                )
                .await?;
            }
            Command::Status(payload) => {
                Self::handle_status_command(ctx, chat_id, &payload).await?;
            }
            Command::List => {
                PaymentHandler::send_chat_invoice(
                    ctx.platform.as_ref(),
                    chat_id,
                    "You are buying something",
                    " Please pay the something",
                )
                .await?;
            }
            // TODO: /refund is a stub that only re-sends the first menu, no refund is issued
            Command::Refund => {
                CallbackHandler::send_menu(ctx, chat_id, Menu::First).await?;
            }
            Command::Unknown(name) => {
                debug!("Ignoring unknown command {}", name);
            }
        }
        Ok(())
    }

    async fn handle_status_command<P: Platform>(
        ctx: &BotContext<P>,
        chat_id: ChatId,
        payload: &str,
    ) -> ResponseResult<()> {
        if payload.is_empty() {
            ctx.platform
                .send_text(chat_id, STATUS_PROMPT, Vec::new())
                .await?;
        } else {
            // no status lookup exists yet
            info!("Status requested for payload {}", payload);
        }
        Ok(())
    }
}
