//! Application State

use std::sync::Arc;

use retreat_core::Validator;
use retreat_payments::{CallbackUrls, CheckoutRouter, PaymentLookup, WebhookHandler};
use retreat_sheets::SpreadsheetGateway;

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Validator for the configured form variant
    pub validator: Validator,

    /// Registrant and question storage
    pub sheets: Arc<dyn SpreadsheetGateway>,

    /// Checkout providers (each `None` inside if not configured)
    pub payments: CheckoutRouter,

    /// Payment notification processing
    pub webhook: Arc<WebhookHandler<dyn SpreadsheetGateway>>,

    pub urls: Arc<CallbackUrls>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        sheets: Arc<dyn SpreadsheetGateway>,
        payments: CheckoutRouter,
        lookup: Option<Arc<dyn PaymentLookup>>,
        webhook_secret: Option<String>,
    ) -> Self {
        let webhook = WebhookHandler::new(Arc::clone(&sheets), lookup).with_secret(webhook_secret);
        Self {
            validator: Validator::new(config.form_variant),
            urls: Arc::new(CallbackUrls::from_base(&config.public_base_url)),
            config: Arc::new(config),
            sheets,
            payments,
            webhook: Arc::new(webhook),
        }
    }
}
