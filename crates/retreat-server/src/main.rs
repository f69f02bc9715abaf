//! Retreat registration HTTP server
//!
//! Axum server for the signup form, payment checkout, provider
//! notifications and anonymous questions. Also serves the WASM frontend.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use retreat_payments::{CheckoutProvider, CheckoutRouter, MercadoPagoClient, PaymentLookup, StripeClient};
use retreat_sheets::{GoogleSheetsGateway, MemorySheetGateway, SheetsConfig, SpreadsheetGateway};

use crate::config::{ServerConfig, SheetsBackend};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env();
    tracing::info!("Form variant: {}", config.form_variant);

    // Initialize storage
    let sheets: Arc<dyn SpreadsheetGateway> = match config.sheets_backend {
        SheetsBackend::Google => {
            let sheets_config = SheetsConfig::from_env();
            if sheets_config.spreadsheet_id.is_none() {
                tracing::warn!("⚠ GOOGLE_SHEETS_ID not set - registrations will not be stored");
            } else {
                tracing::info!("✓ Google Sheets configured");
            }
            Arc::new(GoogleSheetsGateway::new(sheets_config))
        }
        SheetsBackend::Memory => {
            tracing::warn!("⚠ Using in-memory sheets - data is lost on restart");
            Arc::new(MemorySheetGateway::new())
        }
    };

    // Initialize payments
    let mercadopago = MercadoPagoClient::from_env().ok().map(Arc::new);
    let webhook_secret = mercadopago
        .as_ref()
        .and_then(|mp| mp.webhook_secret())
        .map(str::to_string);

    if mercadopago.is_some() {
        tracing::info!("✓ Mercado Pago configured");
        if webhook_secret.is_none() {
            tracing::warn!("⚠ MERCADOPAGO_WEBHOOK_SECRET not set - notifications are not verified");
        }
    } else {
        tracing::warn!("⚠ Mercado Pago not configured - PIX disabled");
        tracing::warn!("  Set MERCADOPAGO_ACCESS_TOKEN in .env");
    }

    let stripe = StripeClient::from_env().ok().map(Arc::new);
    if stripe.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - card via Stripe disabled");
    }

    let lookup = mercadopago.clone().map(|mp| mp as Arc<dyn PaymentLookup>);
    let payments = CheckoutRouter::new(
        mercadopago.map(|mp| mp as Arc<dyn CheckoutProvider>),
        stripe.map(|s| s as Arc<dyn CheckoutProvider>),
        config.card_provider,
    );
    tracing::info!("Card payments via {}", payments.card_provider());

    let addr = config.bind_addr.clone();
    let state = AppState::new(config, sheets, payments, lookup, webhook_secret);
    let app = routes::app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 retreat-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health               - Health check");
    tracing::info!("  POST /registration         - Register one person");
    tracing::info!("  POST /payment/initiate     - Create checkout");
    tracing::info!("  POST /payment/webhook      - Provider notifications");
    tracing::info!("  GET  /payment/installments - Card installment table");
    tracing::info!("  GET  /questions            - List questions");
    tracing::info!("  POST /questions            - Send anonymous question");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
