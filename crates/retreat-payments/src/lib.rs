//! # retreat-payments
//!
//! Checkout sessions and payment notifications for the retreat site.
//!
//! ## Providers
//!
//! ### 1. Mercado Pago Checkout Pro - PIX and card
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  /pagamento │────▶│  Mercado Pago    │────▶│ /pagamento/      │
//! │  (PIX/card) │     │  hosted checkout │     │ sucesso|pendente │
//! └─────────────┘     └──────────────────┘     └──────────────────┘
//!                              │
//!                              └── notification ──▶ /payment/webhook
//! ```
//!
//! PIX and card are mutually exclusive preferences: PIX excludes every card
//! type; card excludes boleto/ATM and allows up to 12 installments.
//!
//! ### 2. Stripe Checkout (Hosted) - card only
//!
//! The charged amount is grossed up so the retreat receives the base price
//! after Stripe's `R$ 0,30 + 2,99%`.
//!
//! ## Notifications
//!
//! [`WebhookHandler`] resolves the payer's email from the provider's payment
//! record and updates the sheet. It always acknowledges.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use retreat_payments::{CallbackUrls, CheckoutRouter, PaymentIntent, ProviderKind};
//!
//! let router = CheckoutRouter::new(Some(mercadopago), Some(stripe), ProviderKind::MercadoPago);
//! let intent = PaymentIntent::new("Ana Silva", "ana@x.com", "51987654321", dec!(289), PaymentMethod::Pix)?;
//! let session = router.initiate(&intent, None, &CallbackUrls::from_base(base)).await?;
//!
//! // Redirect payer to: session.redirect_url
//! ```

mod error;
pub mod fees;
mod intent;
mod mercadopago;
mod provider;
mod checkout;
mod webhook;

pub use error::{PaymentError, Result};
pub use fees::{FeeSchedule, InstallmentOption, installment_plan};
pub use intent::{CallbackUrls, CheckoutSession, MAX_AMOUNT, PaymentIntent, is_valid_amount};
pub use mercadopago::{MercadoPagoClient, MercadoPagoConfig};
pub use provider::{CheckoutProvider, CheckoutRouter, ProviderKind};
pub use checkout::{SessionPlan, StripeClient};
pub use webhook::{
    AckStatus, PaymentDetails, PaymentLookup, PaymentNotification, SignatureHeaders,
    WebhookAck, WebhookHandler, verify_signature,
};
