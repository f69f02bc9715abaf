//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::handlers::{
    health_check, initiate_payment, installments, list_questions, payment_webhook, register,
    submit_question,
};
use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Unknown paths get index.html so client-side routes survive a reload
    let static_dir = &state.config.static_dir;
    let frontend = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", get(health_check))
        // Registration
        .route("/registration", post(register))
        // Payments
        .route("/payment/initiate", post(initiate_payment))
        .route("/payment/webhook", post(payment_webhook))
        .route("/payment/installments", get(installments))
        // Anonymous questions
        .route("/questions", get(list_questions).post(submit_question))
        // Static files (WASM frontend)
        .fallback_service(frontend)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
