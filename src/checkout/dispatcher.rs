//! Post-commit notification dispatch
//!
//! Fired after the order row exists. Each channel runs in its own task;
//! failures are logged and never surface to the customer, the order
//! already went through.

use std::sync::Arc;

use tracing::warn;

use crate::db::models::Order;
use crate::services::invoice_email::send_order_invoice_email;
use crate::services::{MailerService, WhatsAppService};

pub fn dispatch(
    mailer: Option<Arc<MailerService>>,
    whatsapp: Option<Arc<WhatsAppService>>,
    store_name: String,
    order: Order,
) {
    if let Some(mailer) = mailer {
        let order = order.clone();
        let store_name = store_name.clone();
        tokio::spawn(async move {
            if let Err(e) = send_order_invoice_email(&mailer, &store_name, &order).await {
                warn!(invoice = %order.invoice_no, error = %e, "Invoice email failed");
            }
        });
    }

    if let Some(whatsapp) = whatsapp {
        tokio::spawn(async move {
            if let Err(e) = whatsapp.send_order_confirmation(&order).await {
                warn!(invoice = %order.invoice_no, error = %e, "WhatsApp confirmation failed");
            }
        });
    }
}
