pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    certificate_service::CertificateGenerator,
    event_dispatcher::EventWebhookDispatcher,
    notifier_service::{Notifier, WebhookNotifier},
};

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub inbound_secret: Option<String>,
    pub generator: CertificateGenerator,
    pub dispatcher: EventWebhookDispatcher,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new()?);
        Ok(Self::with_notifier(config, notifier))
    }

    /// Wires both dispatch paths around one notifier. Each path keeps its
    /// own `WebhookConfig`.
    pub fn with_notifier(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        let generator = CertificateGenerator::new(notifier.clone(), config.certificate_api.clone());
        let dispatcher = EventWebhookDispatcher::new(notifier, config.event_webhook.clone());

        Self {
            service_name: config.service_name.clone(),
            inbound_secret: config.inbound_secret.clone(),
            generator,
            dispatcher,
        }
    }
}
