//! SMTP mailer
//!
//! Thin wrapper over lettre's async transport. The store operator address
//! is BCC'd on every invoice so the back office sees each order even when
//! the customer gave no email.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{info, warn};

use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    /// Back-office address BCC'd on every outgoing invoice
    pub order_receiver: Option<String>,
}

/// One outgoing message. `to` may be absent (guest checkout without an
/// email); the mail still goes out to the BCC receiver.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Clone)]
pub struct MailerService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    order_receiver: Option<Mailbox>,
}

impl MailerService {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AppError::internal(format!("SMTP relay error: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {e}")))?;

        let order_receiver = match &config.order_receiver {
            Some(addr) if !addr.trim().is_empty() => Some(
                addr.parse()
                    .map_err(|e| AppError::internal(format!("Invalid receiver address: {e}")))?,
            ),
            _ => None,
        };

        Ok(Self {
            transport,
            from,
            order_receiver,
        })
    }

    pub async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(&mail.subject);

        let mut has_recipient = false;
        if let Some(to) = &mail.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|e| AppError::internal(format!("Invalid to address: {e}")))?;
            builder = builder.to(mailbox);
            has_recipient = true;
        }
        if let Some(bcc) = &self.order_receiver {
            builder = builder.bcc(bcc.clone());
            has_recipient = true;
        }
        if !has_recipient {
            warn!(subject = %mail.subject, "Mail dropped: no recipient and no receiver configured");
            return Ok(());
        }

        let message = builder
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))
            .map_err(|e| AppError::internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::internal(format!("Failed to send email: {e}")))?;
        info!(subject = %mail.subject, "Invoice email sent");
        Ok(())
    }
}
