use log::{error, warn};
use teloxide::prelude::*;
use teloxide::types::ChatId;

use crate::bot::{BotContext, ButtonClick};
use crate::menu::{self, Menu};
use crate::platform::Platform;

pub struct CallbackHandler;

impl CallbackHandler {
    pub async fn send_menu<P: Platform>(
        ctx: &BotContext<P>,
        chat_id: ChatId,
        menu: Menu,
    ) -> ResponseResult<()> {
        ctx.platform
            .send_html(chat_id, menu.body(), menu.keyboard())
            .await
    }

    /// swaps the menu in place according to the pressed button
    pub async fn handle_callback_query<P: Platform>(
        ctx: &BotContext<P>,
        click: ButtonClick,
    ) -> ResponseResult<()> {
        let (text, keyboard) = menu::render_for_callback(&click.data);

        // clear the spinner on the button even if the edit below fails
        if let Err(e) = ctx.platform.answer_callback(&click.id).await {
            error!("Failed to answer callback query {}: {}", click.id, e);
        }

        match click.location {
            Some((chat_id, message_id)) => {
                ctx.platform
                    .edit_html(chat_id, message_id, text, keyboard)
                    .await
            }
            None => {
                warn!("Callback query {} has no message to edit", click.id);
                Ok(())
            }
        }
    }
}
