//! Server state
//!
//! Holds shared references to every service. Notification clients are
//! constructed once here and injected; handlers never build transports.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};

use crate::auth::JwtService;
use crate::checkout::dispatcher;
use crate::core::Config;
use crate::db::DbService;
use crate::db::models::Order;
use crate::services::{MailerService, WhatsAppService};
use crate::utils::AppResult;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    /// None when SMTP is not configured (channel disabled)
    pub mailer: Option<Arc<MailerService>>,
    /// None when Twilio is not configured (channel disabled)
    pub whatsapp: Option<Arc<WhatsAppService>>,
}

impl ServerState {
    /// Build all services from configuration
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        std::fs::create_dir_all(config.db_dir()).map_err(|e| {
            crate::utils::AppError::internal(format!("Failed to create db dir: {e}"))
        })?;
        std::fs::create_dir_all(config.uploads_dir()).map_err(|e| {
            crate::utils::AppError::internal(format!("Failed to create uploads dir: {e}"))
        })?;

        let db = DbService::new(&config.db_dir()).await?;
        Self::with_db(config.clone(), db)
    }

    /// Build state around an existing database (used by tests with the
    /// memory engine)
    pub fn with_db(config: Config, db: DbService) -> AppResult<Self> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        let mailer = match &config.smtp {
            Some(smtp) => match MailerService::new(smtp) {
                Ok(service) => Some(Arc::new(service)),
                Err(e) => {
                    warn!(error = %e, "SMTP misconfigured; invoice emails disabled");
                    None
                }
            },
            None => {
                info!("SMTP not configured; invoice emails disabled");
                None
            }
        };

        let whatsapp = config
            .whatsapp
            .as_ref()
            .map(|cfg| Arc::new(WhatsAppService::new(cfg.clone())));
        if whatsapp.is_none() {
            info!("Twilio not configured; WhatsApp confirmations disabled");
        }

        Ok(Self {
            config,
            db,
            jwt_service,
            mailer,
            whatsapp,
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn surreal(&self) -> Surreal<Db> {
        self.db.db().clone()
    }

    /// Fire the post-commit notification tasks for a placed order
    pub fn dispatch_order_notifications(&self, order: Order) {
        dispatcher::dispatch(
            self.mailer.clone(),
            self.whatsapp.clone(),
            self.config.store_name.clone(),
            order,
        );
    }
}
