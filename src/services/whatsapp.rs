//! WhatsApp order confirmations via the Twilio Content API
//!
//! Sends a pre-approved template message; the seven content variables are
//! positional and must match the template registered with Twilio.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, info};

use crate::db::models::Order;
use crate::services::invoice_email::payment_description;
use crate::utils::money::format_fils;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Preferred sender; falls back to `from` when empty
    pub messaging_service_sid: Option<String>,
    /// `whatsapp:+...` sender address
    pub from: Option<String>,
    pub template_sid: String,
    /// Default country calling code for local numbers
    pub country_code: String,
    pub status_callback: Option<String>,
    /// Human-readable delivery window quoted in the template
    pub delivery_eta: String,
}

/// Normalize a phone number to E.164 for WhatsApp.
///
/// - already `+`-prefixed numbers pass through
/// - bare 8-digit local numbers get the configured country code
/// - numbers already starting with the country code get a `+`
/// - anything else is unusable
pub fn to_e164(phone: &str, country_code: &str) -> Option<String> {
    let trimmed = phone.trim();
    if let Some(rest) = trimmed.strip_prefix('+') {
        let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
        return (digits.len() >= 8).then(|| format!("+{digits}"));
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 8 {
        return Some(format!("+{country_code}{digits}"));
    }
    if digits.starts_with(country_code) && digits.len() > country_code.len() {
        return Some(format!("+{digits}"));
    }
    None
}

#[derive(Debug, Deserialize)]
struct TwilioMessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Clone)]
pub struct WhatsAppService {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppService {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Positional template variables, keyed "1".."7"
    fn content_variables(&self, order: &Order) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("1".to_string(), order.customer.name.clone());
        vars.insert("2".to_string(), order.invoice_no.clone());
        vars.insert("3".to_string(), format_fils(order.total_in_fils));
        vars.insert("4".to_string(), order.currency.clone());
        vars.insert(
            "5".to_string(),
            payment_description(&order.payment_method).to_string(),
        );
        vars.insert("6".to_string(), order.shipping_address.formatted());
        vars.insert("7".to_string(), self.config.delivery_eta.clone());
        vars
    }

    /// Send the order confirmation template to the customer's phone.
    /// Numbers that cannot be normalized are skipped without error.
    pub async fn send_order_confirmation(&self, order: &Order) -> AppResult<()> {
        let Some(to) = to_e164(&order.customer.phone, &self.config.country_code) else {
            debug!(invoice = %order.invoice_no, "Skipping WhatsApp: phone not E.164-normalizable");
            return Ok(());
        };

        let vars = serde_json::to_string(&self.content_variables(order))
            .map_err(|e| AppError::internal(format!("Failed to encode template vars: {e}")))?;

        let mut form: Vec<(&str, String)> = vec![
            ("To", format!("whatsapp:{to}")),
            ("ContentSid", self.config.template_sid.clone()),
            ("ContentVariables", vars),
        ];
        match (&self.config.messaging_service_sid, &self.config.from) {
            (Some(sid), _) if !sid.is_empty() => {
                form.push(("MessagingServiceSid", sid.clone()));
            }
            (_, Some(from)) if !from.is_empty() => {
                form.push(("From", format!("whatsapp:{from}")));
            }
            _ => {
                return Err(AppError::internal(
                    "WhatsApp sender not configured (messaging service sid or from number)",
                ));
            }
        }
        if let Some(callback) = &self.config.status_callback
            && !callback.is_empty()
        {
            form.push(("StatusCallback", callback.clone()));
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Twilio request failed: {e}")))?;

        if response.status().is_success() {
            let body: TwilioMessageResponse = response
                .json()
                .await
                .map_err(|e| AppError::internal(format!("Twilio response parse failed: {e}")))?;
            info!(invoice = %order.invoice_no, sid = %body.sid, "WhatsApp confirmation sent");
            Ok(())
        } else {
            let status = response.status();
            let error: TwilioErrorResponse = response.json().await.unwrap_or(TwilioErrorResponse {
                message: "unknown error".to_string(),
                code: None,
            });
            Err(AppError::internal(format!(
                "Twilio rejected message ({status}, code {:?}): {}",
                error.code, error.message
            )))
        }
    }
}
