//! Payment Intents and Checkout Results

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use retreat_core::PaymentMethod;
use retreat_core::sanitize::{digits_only, normalize_email};

use crate::error::{PaymentError, Result};

/// Largest single charge accepted, in BRL
pub const MAX_AMOUNT: Decimal = dec!(100000);

/// What the payer wants to pay. Lives only for one initiation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentIntent {
    pub payer_name: String,
    /// Normalized; the only link between a payment and a sheet row
    pub payer_email: String,
    /// Digits only
    pub payer_phone: String,
    /// BRL, positive
    pub amount: Decimal,
    pub method: PaymentMethod,
}

impl PaymentIntent {
    /// Normalize and check an intent. Cash never goes through a provider.
    pub fn new(
        payer_name: &str,
        payer_email: &str,
        payer_phone: &str,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<Self> {
        let payer_name = payer_name.trim().to_string();
        if payer_name.is_empty() {
            return Err(PaymentError::InvalidIntent("payerName is required".into()));
        }

        let payer_email = normalize_email(payer_email);
        if !payer_email.contains('@') {
            return Err(PaymentError::InvalidIntent("payerEmail is invalid".into()));
        }

        if !is_valid_amount(amount) {
            return Err(PaymentError::InvalidIntent(format!(
                "amount must be greater than 0 and at most {MAX_AMOUNT}"
            )));
        }

        if method == PaymentMethod::Cash {
            return Err(PaymentError::InvalidIntent(
                "cash is paid on site, not online".into(),
            ));
        }

        Ok(Self {
            payer_name,
            payer_email,
            payer_phone: digits_only(payer_phone),
            amount,
            method,
        })
    }
}

/// `0 < amount <= MAX_AMOUNT`
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= MAX_AMOUNT
}

/// Amount in centavos, rounded half away from zero
pub fn to_cents(amount: Decimal) -> Result<i64> {
    (amount * dec!(100))
        .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| PaymentError::InvalidIntent(format!("amount {amount} out of range")))
}

/// Where providers send the payer (and their notifications) afterwards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
    pub notification: String,
    pub card_success: String,
    pub card_cancel: String,
}

impl CallbackUrls {
    /// Derive every callback from the site's public base URL
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            success: format!("{base}/pagamento/sucesso"),
            failure: format!("{base}/pagamento"),
            pending: format!("{base}/pagamento/pendente"),
            notification: format!("{base}/payment/webhook"),
            card_success: format!("{base}/pagamento/sucesso?session_id={{CHECKOUT_SESSION_ID}}"),
            card_cancel: format!("{base}/pagamento?canceled=true"),
        }
    }
}

/// Result of creating a checkout with any provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Provider-hosted page to send the payer to
    pub redirect_url: String,
    /// Provider's id for the preference or session
    pub session_id: String,
}
