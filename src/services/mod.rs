//! Outbound side-effect services

pub mod invoice_email;
pub mod mailer;
pub mod whatsapp;

pub use mailer::{MailerService, OutgoingMail, SmtpConfig};
pub use whatsapp::{WhatsAppConfig, WhatsAppService};
