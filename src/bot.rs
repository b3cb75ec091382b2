use log::{debug, error, info};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, MaybeInaccessibleMessage, MessageEntity, MessageId, PreCheckoutQuery,
    Update, UpdateKind,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::handlers::{CallbackHandler, CommandHandler, PaymentHandler};
use crate::platform::Platform;

pub const COMMAND_PREFIX: char = '/';

/// text commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scream,
    Whisper,
    Menu,
    Buy,
    Status(String),
    List,
    Refund,
    Unknown(String),
}

impl Command {
    /// parses `/command payload`; returns `None` for text that is not a command
    pub fn parse(text: &str) -> Option<Command> {
        if !text.starts_with(COMMAND_PREFIX) {
            return None;
        }

        // split only on the first separator, the payload keeps its spaces
        let (name, payload) = match text.split_once(' ') {
            Some((name, payload)) => (name, payload),
            None => (text, ""),
        };

        let command = match name {
            "/scream" => Command::Scream,
            "/whisper" => Command::Whisper,
            "/menu" => Command::Menu,
            "/buy" => Command::Buy,
            "/status" => Command::Status(payload.to_string()),
            "/list" => Command::List,
            "/refund" => Command::Refund,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    #[default]
    Normal,
    Screaming,
}

/// state owned by the update loop and threaded into command handling
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub reply_mode: ReplyMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// first name of the sender; service messages have none
    pub sender: Option<String>,
    pub text: String,
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonClick {
    pub id: String,
    pub data: String,
    /// chat and message the pressed keyboard is attached to
    pub location: Option<(ChatId, MessageId)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutQuery {
    pub id: String,
    pub payload: String,
    pub total_amount: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedPayment {
    pub chat_id: ChatId,
    pub payload: String,
    pub charge_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Message(IncomingMessage),
    ButtonClick(ButtonClick),
    PreCheckout(CheckoutQuery),
    Payment(CompletedPayment),
}

impl Event {
    /// classifies an update; anything the bot does not react to yields `None`
    pub fn from_update(update: Update) -> Option<Event> {
        match update.kind {
            UpdateKind::Message(msg) => Some(Self::from_message(msg)),
            UpdateKind::CallbackQuery(query) => Some(Self::from_callback_query(query)),
            UpdateKind::PreCheckoutQuery(query) => Some(Self::from_pre_checkout_query(query)),
            _ => None,
        }
    }

    fn from_message(msg: Message) -> Event {
        if let Some(payment) = msg.successful_payment() {
            return Event::Payment(CompletedPayment {
                chat_id: msg.chat.id,
                payload: payment.invoice_payload.clone(),
                charge_id: payment.provider_payment_charge_id.clone(),
            });
        }

        Event::Message(IncomingMessage {
            chat_id: msg.chat.id,
            message_id: msg.id,
            sender: msg.from.as_ref().map(|user| user.first_name.clone()),
            text: msg.text().unwrap_or_default().to_string(),
            entities: msg.entities().map(|e| e.to_vec()).unwrap_or_default(),
        })
    }

    fn from_callback_query(query: CallbackQuery) -> Event {
        let location = query.message.as_ref().map(|message| match message {
            MaybeInaccessibleMessage::Regular(msg) => (msg.chat.id, msg.id),
            MaybeInaccessibleMessage::Inaccessible(msg) => (msg.chat.id, msg.message_id),
        });

        Event::ButtonClick(ButtonClick {
            id: query.id.to_string(),
            data: query.data.unwrap_or_default(),
            location,
        })
    }

    fn from_pre_checkout_query(query: PreCheckoutQuery) -> Event {
        Event::PreCheckout(CheckoutQuery {
            id: query.id.to_string(),
            payload: query.invoice_payload,
            total_amount: query.total_amount,
        })
    }
}

pub struct BotContext<P: Platform> {
    pub platform: Arc<P>,
    pub payment_handler: PaymentHandler,
}

impl<P: Platform> Clone for BotContext<P> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            payment_handler: self.payment_handler.clone(),
        }
    }
}

/// sequential consumer of the update feed
pub struct UpdateDispatcher<P: Platform> {
    ctx: BotContext<P>,
    session: Session,
}

impl<P: Platform> UpdateDispatcher<P> {
    pub fn new(ctx: BotContext<P>) -> Self {
        Self {
            ctx,
            session: Session::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// handles updates one at a time until `cancel` fires or the feed closes
    pub async fn run(&mut self, mut updates: mpsc::Receiver<Update>, cancel: CancellationToken) {
        info!("Start listening for updates");

        loop {
            let update = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Update processing cancelled");
                    break;
                }
                update = updates.recv() => match update {
                    Some(update) => update,
                    None => {
                        info!("Update feed closed");
                        break;
                    }
                },
            };

            match Event::from_update(update) {
                Some(event) => self.dispatch(event).await,
                None => debug!("Ignoring unsupported update"),
            }
        }
    }

    /// routes one event to its handler; handler failures are logged here
    pub async fn dispatch(&mut self, event: Event) {
        match event {
            Event::Message(msg) => {
                if let Err(e) = Self::handle_message(&self.ctx, &mut self.session, msg).await {
                    error!("An error occurred: {}", e);
                }
            }
            Event::ButtonClick(click) => {
                if let Err(e) = CallbackHandler::handle_callback_query(&self.ctx, click).await {
                    error!("Failed to update menu: {}", e);
                }
            }
            Event::PreCheckout(query) => {
                if let Err(e) =
                    PaymentHandler::handle_pre_checkout_query(self.ctx.platform.as_ref(), query)
                        .await
                {
                    error!(
                        "Error occurred while responding to pre-checkout query: {}",
                        e
                    );
                }
            }
            Event::Payment(payment) => {
                if let Err(e) = self
                    .ctx
                    .payment_handler
                    .handle_successful_payment(self.ctx.platform.as_ref(), payment)
                    .await
                {
                    error!("Failed to confirm payment: {}", e);
                }
            }
        }
    }

    async fn handle_message(
        ctx: &BotContext<P>,
        session: &mut Session,
        msg: IncomingMessage,
    ) -> ResponseResult<()> {
        let Some(sender) = msg.sender.as_deref() else {
            return Ok(());
        };

        info!("{} wrote {}", sender, msg.text);

        if let Some(command) = Command::parse(&msg.text) {
            CommandHandler::handle_command(ctx, session, msg.chat_id, command).await
        } else if session.reply_mode == ReplyMode::Screaming && !msg.text.is_empty() {
            // entities keep bold/italic spans on the upper-cased copy
            ctx.platform
                .send_text(msg.chat_id, &scream(&msg.text), msg.entities)
                .await
        } else {
            ctx.platform
                .copy_message(msg.chat_id, msg.chat_id, msg.message_id)
                .await
        }
    }
}

/// upper-cases `text` one char at a time
///
/// Chars whose upper case would change the utf-16 length (`ß` -> `SS`) are
/// kept as is, so entity offsets still point at the same characters.
pub fn scream(text: &str) -> String {
    text.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) if u.len_utf16() == c.len_utf16() => u,
                _ => c,
            }
        })
        .collect()
}
