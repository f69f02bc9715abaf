//! Stripe Checkout (Hosted)
//!
//! Card only. The charged amount is grossed up by [`FeeSchedule::STRIPE_BR`]
//! so the retreat nets the base price.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    Currency,
};
use tracing::{info, instrument};

use retreat_core::PaymentMethod;

use crate::error::{PaymentError, Result};
use crate::fees::FeeSchedule;
use crate::intent::{CallbackUrls, CheckoutSession, PaymentIntent, to_cents};
use crate::provider::{CheckoutProvider, ProviderKind};

/// Everything sent to Stripe for one session, before it is borrowed into
/// the SDK's parameter struct
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionPlan {
    pub customer_email: String,
    pub client_reference_id: String,
    pub product_name: String,
    pub product_description: String,
    /// Fee-inclusive, in centavos
    pub unit_amount: i64,
    pub total: Decimal,
    pub fee: Decimal,
    pub metadata: HashMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

impl SessionPlan {
    pub fn new(intent: &PaymentIntent, urls: &CallbackUrls, fees: &FeeSchedule) -> Result<Self> {
        let total = fees.gross_up(intent.amount);
        let fee = total - intent.amount;

        let metadata = HashMap::from([
            ("nomeInscrito".to_string(), intent.payer_name.clone()),
            ("email".to_string(), intent.payer_email.clone()),
            ("telefone".to_string(), intent.payer_phone.clone()),
            ("valorBase".to_string(), intent.amount.to_string()),
            ("taxa".to_string(), fee.to_string()),
        ]);

        Ok(Self {
            customer_email: intent.payer_email.clone(),
            client_reference_id: format!("{}_{}", Utc::now().timestamp_millis(), intent.payer_email),
            product_name: format!("Inscrição Retiro Closer - {}", intent.payer_name),
            product_description: format!("Inscrição de {} ({})", intent.payer_name, intent.payer_phone),
            unit_amount: to_cents(total)?,
            total,
            fee,
            metadata,
            success_url: urls.card_success.clone(),
            cancel_url: urls.card_cancel.clone(),
        })
    }

    fn params(&self) -> CreateCheckoutSession<'_> {
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.customer_email = Some(&self.customer_email);
        params.client_reference_id = Some(&self.client_reference_id);
        params.success_url = Some(&self.success_url);
        params.cancel_url = Some(&self.cancel_url);
        params.metadata = Some(self.metadata.clone());
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::BRL,
                unit_amount: Some(self.unit_amount),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: self.product_name.clone(),
                    description: Some(self.product_description.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);
        params
    }
}

/// Stripe client wrapper
pub struct StripeClient {
    client: Client,
    fees: FeeSchedule,
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            fees: FeeSchedule::STRIPE_BR,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;

        Ok(Self::new(&secret_key))
    }

    pub const fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Create a Stripe Checkout session (Hosted approach)
    ///
    /// Returns a URL to redirect the user to Stripe's hosted checkout page.
    #[instrument(skip(self, intent, urls), fields(email = %intent.payer_email))]
    pub async fn create_checkout_session(
        &self,
        intent: &PaymentIntent,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession> {
        if intent.method != PaymentMethod::Card {
            return Err(PaymentError::UnsupportedMethod {
                provider: ProviderKind::Stripe.as_str(),
                method: intent.method.as_str(),
            });
        }

        let plan = SessionPlan::new(intent, urls, &self.fees)?;
        let session = StripeCheckoutSession::create(&self.client, plan.params())
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let redirect_url = session.url.ok_or_else(|| PaymentError::Rejected {
            provider: ProviderKind::Stripe.as_str(),
            message: "No checkout URL returned".into(),
            details: serde_json::json!({ "sessionId": session.id.to_string() }),
        })?;

        info!(
            session_id = %session.id,
            base = %intent.amount,
            fee = %plan.fee,
            total = %plan.total,
            "Stripe checkout session created"
        );

        Ok(CheckoutSession {
            redirect_url,
            session_id: session.id.to_string(),
        })
    }
}

#[async_trait]
impl CheckoutProvider for StripeClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Stripe
    }

    fn supports(&self, method: PaymentMethod) -> bool {
        method == PaymentMethod::Card
    }

    async fn create_session(
        &self,
        intent: &PaymentIntent,
        urls: &CallbackUrls,
    ) -> Result<CheckoutSession> {
        self.create_checkout_session(intent, urls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn intent(method: PaymentMethod) -> PaymentIntent {
        PaymentIntent::new("Ana Silva", "ana@x.com", "51987654321", dec!(100.00), method).unwrap()
    }

    #[test]
    fn test_plan_charges_fee_inclusive_amount() {
        let urls = CallbackUrls::from_base("https://retiro.example");
        let plan = SessionPlan::new(&intent(PaymentMethod::Card), &urls, &FeeSchedule::STRIPE_BR).unwrap();

        assert_eq!(plan.total, dec!(103.39));
        assert_eq!(plan.fee, dec!(3.39));
        assert_eq!(plan.unit_amount, 10339);
        assert_eq!(plan.metadata["valorBase"], "100.00");
        assert_eq!(plan.metadata["taxa"], "3.39");
        assert!(plan.client_reference_id.ends_with("_ana@x.com"));
        assert_eq!(
            plan.success_url,
            "https://retiro.example/pagamento/sucesso?session_id={CHECKOUT_SESSION_ID}"
        );
        assert_eq!(plan.cancel_url, "https://retiro.example/pagamento?canceled=true");
    }

    #[test]
    fn test_params_are_card_only_brl_payment() {
        let urls = CallbackUrls::from_base("https://retiro.example");
        let plan = SessionPlan::new(&intent(PaymentMethod::Card), &urls, &FeeSchedule::STRIPE_BR).unwrap();
        let params = plan.params();

        assert_eq!(params.mode, Some(CheckoutSessionMode::Payment));
        let items = params.line_items.unwrap();
        let price = items[0].price_data.as_ref().unwrap();
        assert_eq!(price.currency, Currency::BRL);
        assert_eq!(price.unit_amount, Some(10339));
    }

    #[tokio::test]
    async fn test_pix_is_unsupported_without_calling_stripe() {
        let client = StripeClient::new("sk_test_unused");
        let urls = CallbackUrls::from_base("https://retiro.example");

        let result = client.create_checkout_session(&intent(PaymentMethod::Pix), &urls).await;
        assert!(matches!(result, Err(PaymentError::UnsupportedMethod { .. })));
    }
}
