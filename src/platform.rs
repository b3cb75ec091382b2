use async_trait::async_trait;
use futures_util::StreamExt;
use log::{error, info};
use std::pin::pin;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardMarkup, MessageEntity, MessageId, ParseMode, Update,
};
use teloxide::update_listeners::{AsUpdateStream, Polling};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::handlers::payment_handler::InvoiceRequest;

// long-poll window, kept below the default http client timeout of teloxide
const POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// outbound operations the bot performs against the chat platform
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        entities: Vec<MessageEntity>,
    ) -> ResponseResult<()>;

    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> ResponseResult<()>;

    /// forwards a message without the sender attribution
    async fn copy_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> ResponseResult<()>;

    async fn edit_html(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        html: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> ResponseResult<()>;

    async fn answer_callback(&self, callback_id: &str) -> ResponseResult<()>;

    async fn send_invoice(&self, invoice: &InvoiceRequest) -> ResponseResult<()>;

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        ok: bool,
        error_message: Option<&str>,
    ) -> ResponseResult<()>;
}

#[async_trait]
impl Platform for Bot {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        entities: Vec<MessageEntity>,
    ) -> ResponseResult<()> {
        let request = self.send_message(chat_id, text);
        if entities.is_empty() {
            request.await?;
        } else {
            request.entities(entities).await?;
        }
        Ok(())
    }

    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> ResponseResult<()> {
        self.send_message(chat_id, html)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> ResponseResult<()> {
        Requester::copy_message(self, chat_id, from_chat_id, message_id).await?;
        Ok(())
    }

    async fn edit_html(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        html: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> ResponseResult<()> {
        self.edit_message_text(chat_id, message_id, html)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> ResponseResult<()> {
        self.answer_callback_query(callback_id).await?;
        Ok(())
    }

    async fn send_invoice(&self, invoice: &InvoiceRequest) -> ResponseResult<()> {
        let request = Requester::send_invoice(
            self,
            invoice.chat_id,
            invoice.title.as_str(),
            invoice.description.as_str(),
            invoice.payload.as_str(),
            invoice.currency.as_str(),
            invoice.prices.clone(),
        )
        .provider_token("")
        .start_parameter(invoice.start_parameter.as_str());

        if invoice.suggested_tip_amounts.is_empty() {
            request.await?;
        } else {
            request
                .suggested_tip_amounts(invoice.suggested_tip_amounts.clone())
                .await?;
        }
        Ok(())
    }

    async fn answer_pre_checkout(
        &self,
        query_id: &str,
        ok: bool,
        error_message: Option<&str>,
    ) -> ResponseResult<()> {
        let request = self.answer_pre_checkout_query(query_id, ok);
        match error_message {
            Some(message) => request.error_message(message).await?,
            None => request.await?,
        };
        Ok(())
    }
}

/// long-polls the update feed and pushes every update into `tx`
///
/// Stops when `cancel` fires or the receiving side is dropped. Fetch errors
/// are logged; the listener backs off on its own before polling again.
pub async fn poll_updates(bot: Bot, tx: mpsc::Sender<Update>, cancel: CancellationToken) {
    info!("Starting update poller");

    let mut listener = Polling::builder(bot).timeout(POLL_TIMEOUT).build();
    let stream = listener.as_stream();
    let mut stream = pin!(stream);

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(update)) => {
                if tx.send(update).await.is_err() {
                    info!("Update channel closed, stopping poller");
                    return;
                }
            }
            Some(Err(e)) => error!("Failed to fetch updates: {}", e),
            None => break,
        }
    }

    info!("Update poller stopped");
}
