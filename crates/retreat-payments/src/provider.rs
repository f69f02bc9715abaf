//! Checkout Providers and Selection
//!
//! Each provider is one strategy for turning a [`PaymentIntent`] into a
//! hosted checkout. [`CheckoutRouter`] picks the strategy per method.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use retreat_core::PaymentMethod;

use crate::error::{PaymentError, Result};
use crate::intent::{CallbackUrls, CheckoutSession, PaymentIntent};

/// Supported checkout providers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "mercadopago")]
    MercadoPago,
    Stripe,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MercadoPago => "mercadopago",
            Self::Stripe => "stripe",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mercadopago" | "mercado_pago" => Some(Self::MercadoPago),
            "stripe" => Some(Self::Stripe),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A third-party checkout (Strategy pattern)
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether this provider can charge `method`
    fn supports(&self, method: PaymentMethod) -> bool;

    /// Submit the checkout and return where to send the payer
    async fn create_session(
        &self,
        intent: &PaymentIntent,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession>;
}

/// Picks a provider per payment method
///
/// PIX always goes through Mercado Pago. Card goes through the configured
/// card provider unless the request names one.
#[derive(Clone)]
pub struct CheckoutRouter {
    mercadopago: Option<Arc<dyn CheckoutProvider>>,
    stripe: Option<Arc<dyn CheckoutProvider>>,
    card_provider: ProviderKind,
}

impl CheckoutRouter {
    pub fn new(
        mercadopago: Option<Arc<dyn CheckoutProvider>>,
        stripe: Option<Arc<dyn CheckoutProvider>>,
        card_provider: ProviderKind,
    ) -> Self {
        Self {
            mercadopago,
            stripe,
            card_provider,
        }
    }

    /// Providers that have credentials
    pub fn configured(&self) -> Vec<ProviderKind> {
        [&self.mercadopago, &self.stripe]
            .into_iter()
            .flatten()
            .map(|p| p.kind())
            .collect()
    }

    pub const fn card_provider(&self) -> ProviderKind {
        self.card_provider
    }

    /// Provider for `method`, honoring an explicit request when possible
    pub fn select(
        &self,
        method: PaymentMethod,
        requested: Option<ProviderKind>,
    ) -> Result<Arc<dyn CheckoutProvider>> {
        let kind = match method {
            PaymentMethod::Pix => requested.unwrap_or(ProviderKind::MercadoPago),
            PaymentMethod::Card => requested.unwrap_or(self.card_provider),
            PaymentMethod::Cash => {
                return Err(PaymentError::InvalidIntent(
                    "cash is paid on site, not online".into(),
                ));
            }
        };

        let provider = match kind {
            ProviderKind::MercadoPago => self.mercadopago.as_ref(),
            ProviderKind::Stripe => self.stripe.as_ref(),
        }
        .ok_or_else(|| PaymentError::Config(format!("{kind} is not configured")))?;

        if !provider.supports(method) {
            return Err(PaymentError::UnsupportedMethod {
                provider: kind.as_str(),
                method: method.as_str(),
            });
        }

        debug!(provider = %kind, %method, "Selected checkout provider");
        Ok(Arc::clone(provider))
    }

    /// Select a provider and create the checkout
    pub async fn initiate(
        &self,
        intent: &PaymentIntent,
        requested: Option<ProviderKind>,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession> {
        let provider = self.select(intent.method, requested)?;
        provider.create_session(intent, urls).await.inspect_err(|e| {
            warn!(provider = %provider.kind(), error = %e, "Checkout creation failed");
        })
    }
}
