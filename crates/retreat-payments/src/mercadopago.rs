//! Mercado Pago Checkout Pro
//!
//! PIX and card share one hosted checkout; which one the payer sees is
//! decided by the excluded payment types on the preference.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use retreat_core::PaymentMethod;

use crate::error::{PaymentError, Result};
use crate::fees::MAX_INSTALLMENTS;
use crate::intent::{CallbackUrls, CheckoutSession, PaymentIntent};
use crate::provider::{CheckoutProvider, ProviderKind};
use crate::webhook::{PaymentDetails, PaymentLookup};

/// Production API host
pub const DEFAULT_API_BASE: &str = "https://api.mercadopago.com";

const STATEMENT_DESCRIPTOR: &str = "RETIRO CLOSER";
const COUNTRY_CODE: &str = "55";

/// Mercado Pago credentials
#[derive(Clone, Debug)]
pub struct MercadoPagoConfig {
    pub access_token: String,
    /// Secret for `x-signature` checks on notifications
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

impl MercadoPagoConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            webhook_secret: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let access_token = std::env::var("MERCADOPAGO_ACCESS_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PaymentError::Config("MERCADOPAGO_ACCESS_TOKEN not set".into()))?;

        Ok(Self {
            access_token,
            webhook_secret: std::env::var("MERCADOPAGO_WEBHOOK_SECRET")
                .ok()
                .filter(|v| !v.is_empty()),
            api_base: std::env::var("MERCADOPAGO_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        })
    }
}

#[derive(Serialize)]
struct PreferenceRequest<'a> {
    items: [PreferenceItem; 1],
    payer: PreferencePayer<'a>,
    payment_methods: PaymentMethods,
    back_urls: BackUrls<'a>,
    auto_return: &'static str,
    notification_url: &'a str,
    external_reference: &'a str,
    statement_descriptor: &'static str,
}

#[derive(Serialize)]
struct PreferenceItem {
    title: String,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    currency_id: &'static str,
}

#[derive(Serialize)]
struct PreferencePayer<'a> {
    name: &'a str,
    email: &'a str,
    phone: PayerPhone<'a>,
}

#[derive(Serialize)]
struct PayerPhone<'a> {
    area_code: &'static str,
    number: &'a str,
}

#[derive(Serialize)]
struct PaymentMethods {
    excluded_payment_types: Vec<ExcludedType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    installments: Option<u8>,
}

#[derive(Serialize)]
struct ExcludedType {
    id: &'static str,
}

#[derive(Serialize)]
struct BackUrls<'a> {
    success: &'a str,
    failure: &'a str,
    pending: &'a str,
}

#[derive(Deserialize)]
struct PreferenceResponse {
    id: Option<String>,
    init_point: Option<String>,
}

fn payment_methods(method: PaymentMethod) -> PaymentMethods {
    let (excluded, installments): (&[&'static str], _) = match method {
        PaymentMethod::Card => (&["ticket", "atm"], Some(MAX_INSTALLMENTS)),
        _ => (&["credit_card", "debit_card", "ticket", "atm"], None),
    };
    PaymentMethods {
        excluded_payment_types: excluded.iter().map(|&id| ExcludedType { id }).collect(),
        installments,
    }
}

/// Mercado Pago REST client
pub struct MercadoPagoClient {
    http: reqwest::Client,
    config: MercadoPagoConfig,
}

impl MercadoPagoClient {
    pub fn new(config: MercadoPagoConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(MercadoPagoConfig::from_env()?))
    }

    /// Secret for notification signatures, when configured
    pub fn webhook_secret(&self) -> Option<&str> {
        self.config.webhook_secret.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base.trim_end_matches('/'))
    }

    /// Create a Checkout Pro preference and return its hosted page
    #[instrument(skip(self, intent, urls), fields(email = %intent.payer_email, method = %intent.method))]
    pub async fn create_preference(
        &self,
        intent: &PaymentIntent,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession> {
        let body = PreferenceRequest {
            items: [PreferenceItem {
                title: format!("Inscrição Retiro Closer - {}", intent.payer_name),
                quantity: 1,
                unit_price: intent.amount,
                currency_id: "BRL",
            }],
            payer: PreferencePayer {
                name: &intent.payer_name,
                email: &intent.payer_email,
                phone: PayerPhone {
                    area_code: COUNTRY_CODE,
                    number: &intent.payer_phone,
                },
            },
            payment_methods: payment_methods(intent.method),
            back_urls: BackUrls {
                success: &urls.success,
                failure: &urls.failure,
                pending: &urls.pending,
            },
            auto_return: "approved",
            notification_url: &urls.notification,
            external_reference: &intent.payer_email,
            statement_descriptor: STATEMENT_DESCRIPTOR,
        };

        let response = self
            .http
            .post(self.url("/checkout/preferences"))
            .bearer_auth(&self.config.access_token)
            .header("X-Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw: Value = response.json().await?;
        let parsed: PreferenceResponse = serde_json::from_value(raw.clone())
            .unwrap_or(PreferenceResponse {
                id: None,
                init_point: None,
            });

        match (parsed.init_point, parsed.id) {
            (Some(redirect_url), Some(session_id)) if status.is_success() => {
                info!(preference_id = %session_id, "Mercado Pago preference created");
                Ok(CheckoutSession {
                    redirect_url,
                    session_id,
                })
            }
            _ => {
                warn!(%status, "Mercado Pago preference without init_point");
                Err(PaymentError::Rejected {
                    provider: ProviderKind::MercadoPago.as_str(),
                    message: format!("no init_point (HTTP {status})"),
                    details: raw,
                })
            }
        }
    }

    /// Fetch a payment by id, for notifications
    #[instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        let response = self
            .http
            .get(self.url(&format!("/v1/payments/{payment_id}")))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.json().await.unwrap_or(Value::Null);
            return Err(PaymentError::Rejected {
                provider: ProviderKind::MercadoPago.as_str(),
                message: format!("payment lookup returned HTTP {status}"),
                details,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CheckoutProvider for MercadoPagoClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MercadoPago
    }

    fn supports(&self, method: PaymentMethod) -> bool {
        matches!(method, PaymentMethod::Pix | PaymentMethod::Card)
    }

    async fn create_session(
        &self,
        intent: &PaymentIntent,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession> {
        self.create_preference(intent, urls).await
    }
}

#[async_trait]
impl PaymentLookup for MercadoPagoClient {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentDetails> {
        self.get_payment(payment_id).await
    }
}
