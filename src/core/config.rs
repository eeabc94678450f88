//! Server configuration
//!
//! All settings load from environment variables with sensible defaults.
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | WORK_DIR | ./data | database, uploads and logs root |
//! | HTTP_PORT | 5000 | HTTP listen port |
//! | ENVIRONMENT | development | development / staging / production |
//! | CLIENT_ORIGIN | (permissive) | storefront origin allowed by CORS |
//! | STORE_NAME | 24ozKw | brand name on invoices |
//! | DEFAULT_CURRENCY | KWD | fallback currency code |
//! | FREE_SHIP_THRESHOLD_IN_FILS | 15000 | free shipping floor |
//! | BASE_SHIPPING_IN_FILS | 2000 | flat shipping fee |
//! | SMTP_HOST et al. | (unset) | invoice mail transport |
//! | TWILIO_ACCOUNT_SID et al. | (unset) | WhatsApp confirmations |

use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::checkout::ShippingPolicy;
use crate::services::{SmtpConfig, WhatsAppConfig};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root for database files, uploads and logs
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    /// Storefront origin for CORS; unset means permissive (dev)
    pub client_origin: Option<String>,
    pub store_name: String,
    pub default_currency: String,
    pub jwt: JwtConfig,
    pub shipping: ShippingPolicy,
    /// Invoice mail; None disables the channel
    pub smtp: Option<SmtpConfig>,
    /// WhatsApp confirmations; None disables the channel
    pub whatsapp: Option<WhatsAppConfig>,
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            client_origin: env_opt("CLIENT_ORIGIN"),
            store_name: std::env::var("STORE_NAME").unwrap_or_else(|_| "24ozKw".into()),
            default_currency: std::env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| "KWD".into()),
            jwt: JwtConfig::default(),
            shipping: ShippingPolicy {
                free_threshold_fils: env_i64("FREE_SHIP_THRESHOLD_IN_FILS", 15_000),
                base_fee_fils: env_i64("BASE_SHIPPING_IN_FILS", 2_000),
            },
            smtp: Self::smtp_from_env(),
            whatsapp: Self::whatsapp_from_env(),
        }
    }

    /// The mail channel activates only when a host is configured
    fn smtp_from_env() -> Option<SmtpConfig> {
        let host = env_opt("SMTP_HOST")?;
        Some(SmtpConfig {
            host,
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USER").unwrap_or_default(),
            password: std::env::var("SMTP_PASS").unwrap_or_default(),
            from_email: std::env::var("MAIL_FROM_EMAIL")
                .unwrap_or_else(|_| "orders@24ozkw.com".into()),
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "24ozKw".into()),
            order_receiver: env_opt("ORDER_RECEIVER_EMAIL"),
        })
    }

    /// WhatsApp activates only with full Twilio credentials
    fn whatsapp_from_env() -> Option<WhatsAppConfig> {
        let account_sid = env_opt("TWILIO_ACCOUNT_SID")?;
        let auth_token = env_opt("TWILIO_AUTH_TOKEN")?;
        let template_sid = env_opt("TWILIO_TEMPLATE_SID")?;
        Some(WhatsAppConfig {
            account_sid,
            auth_token,
            messaging_service_sid: env_opt("TWILIO_MESSAGING_SERVICE_SID"),
            from: env_opt("TWILIO_WHATSAPP_FROM"),
            template_sid,
            country_code: std::env::var("WHATSAPP_COUNTRY_CODE").unwrap_or_else(|_| "965".into()),
            status_callback: env_opt("TWILIO_STATUS_CALLBACK"),
            delivery_eta: std::env::var("DELIVERY_ETA")
                .unwrap_or_else(|_| "1-3 business days".into()),
        })
    }

    /// Override the fields tests care about
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn db_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("db")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
