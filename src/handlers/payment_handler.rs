use log::{error, info, warn};
use teloxide::prelude::*;
use teloxide::types::{ChatId, LabeledPrice};
use uuid::Uuid;

use crate::bot::{CheckoutQuery, CompletedPayment};
use crate::ledger::PaymentLedger;
use crate::platform::Platform;

// payment configuration constants
pub const INVOICE_CURRENCY: &str = "XTR";
pub const INVOICE_PRICE: u32 = 1;
pub const INVOICE_START_PARAMETER: &str = "StartParam";
pub const CHAT_INVOICE_LABEL: &str = "Price";

pub const THANK_YOU_MESSAGE: &str = "Thank you for your payment! Your balance has been updated.";

/// a single invoice about to be sent; never stored
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRequest {
    pub chat_id: ChatId,
    pub title: String,
    pub description: String,
    /// correlation id echoed back by the platform on payment
    pub payload: String,
    pub currency: String,
    pub prices: Vec<LabeledPrice>,
    pub start_parameter: String,
    pub suggested_tip_amounts: Vec<u32>,
}

impl InvoiceRequest {
    /// builds an invoice with a fresh payload and one line item of quantity 1
    pub fn new(chat_id: ChatId, title: &str, description: &str, label: &str) -> Self {
        Self {
            chat_id,
            title: title.to_string(),
            description: description.to_string(),
            payload: Uuid::new_v4().to_string(),
            currency: INVOICE_CURRENCY.to_string(),
            prices: vec![LabeledPrice {
                label: label.to_string(),
                amount: INVOICE_PRICE,
            }],
            start_parameter: INVOICE_START_PARAMETER.to_string(),
            suggested_tip_amounts: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct PaymentHandler {
    ledger: PaymentLedger,
}

impl PaymentHandler {
    pub fn new(ledger: PaymentLedger) -> Self {
        Self { ledger }
    }

    /// sends a fresh invoice and returns its payload
    pub async fn send_payment_invoice<P: Platform + ?Sized>(
        platform: &P,
        chat_id: ChatId,
        title: &str,
        description: &str,
        label: &str,
    ) -> ResponseResult<String> {
        let invoice = InvoiceRequest::new(chat_id, title, description, label);
        platform.send_invoice(&invoice).await?;

        info!(
            "Sent invoice {} ({}) to chat {}",
            invoice.payload, invoice.title, chat_id.0
        );
        Ok(invoice.payload)
    }

    /// invoice requested from a chat command
    ///
    /// Follows up with the payload and chat id whether or not the invoice
    /// went out; the invoice error is what gets returned.
    pub async fn send_chat_invoice<P: Platform + ?Sized>(
        platform: &P,
        chat_id: ChatId,
        title: &str,
        description: &str,
    ) -> ResponseResult<()> {
        let invoice = InvoiceRequest::new(chat_id, title, description, CHAT_INVOICE_LABEL);
        let result = platform.send_invoice(&invoice).await;

        let note = format!(
            "Payload of the transaction: {}Chat ID: {}",
            invoice.payload, chat_id.0
        );
        if let Err(e) = platform.send_text(chat_id, &note, Vec::new()).await {
            error!("Failed to send payload note to chat {}: {}", chat_id.0, e);
        }

        result
    }

    pub async fn handle_pre_checkout_query<P: Platform + ?Sized>(
        platform: &P,
        query: CheckoutQuery,
    ) -> ResponseResult<()> {
        // every query is approved; funds, stock and order integrity are not checked
        warn!(
            "Approving pre-checkout query {} for payload {} without validation",
            query.id, query.payload
        );
        platform.answer_pre_checkout(&query.id, true, None).await?;
        info!(
            "Approved pre-checkout query for {} stars",
            query.total_amount
        );
        Ok(())
    }

    pub async fn handle_successful_payment<P: Platform + ?Sized>(
        &self,
        platform: &P,
        payment: CompletedPayment,
    ) -> ResponseResult<()> {
        if let Some(previous) = self.ledger.record(&payment.charge_id, &payment.payload).await {
            warn!(
                "Charge {} was already recorded with payload {}",
                payment.charge_id, previous
            );
        }

        info!(
            "Recorded payment {} for payload {}",
            payment.charge_id, payment.payload
        );

        platform
            .send_text(payment.chat_id, THANK_YOU_MESSAGE, Vec::new())
            .await
    }
}
