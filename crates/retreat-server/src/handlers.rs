//! HTTP Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use retreat_core::{
    FieldError, FormVariant, MAX_QUESTION_CHARS, PaymentMethod, Question, RawRegistrant,
};
use retreat_payments::{
    InstallmentOption, PaymentIntent, ProviderKind, SignatureHeaders, WebhookAck,
    installment_plan,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sheets: String,
    pub payment_providers: Vec<ProviderKind>,
    pub card_provider: ProviderKind,
    pub form_variant: FormVariant,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub payer_name: String,
    pub payer_email: String,
    #[serde(default)]
    pub payer_phone: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Card only; the configured card provider when absent
    #[serde(default)]
    pub provider: Option<ProviderKind>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub redirect_url: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentFailure {
    pub success: bool,
    pub error: String,
    pub details: Value,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(rename = "pergunta", default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "perguntas")]
    pub questions: Vec<Question>,
}

type PaymentResult = Result<Json<InitiatePaymentResponse>, (StatusCode, Json<PaymentFailure>)>;

fn payment_failure(status: StatusCode, error: &str, details: Value) -> (StatusCode, Json<PaymentFailure>) {
    (
        status,
        Json(PaymentFailure {
            success: false,
            error: error.to_string(),
            details,
        }),
    )
}

fn question_reply(status: StatusCode, success: bool, message: &str) -> (StatusCode, Json<QuestionResponse>) {
    (
        status,
        Json(QuestionResponse {
            success,
            message: message.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sheets: state.sheets.name().to_string(),
        payment_providers: state.payments.configured(),
        card_provider: state.payments.card_provider(),
        form_variant: state.config.form_variant,
    })
}

/// Validate one registrant and append it to the sheet.
///
/// A sheet failure is logged and the registrant still gets a success: the
/// organizers reconcile by hand rather than lose the person.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RawRegistrant>, JsonRejection>,
) -> (StatusCode, Json<RegistrationResponse>) {
    let Json(raw) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unreadable registration body");
            return (
                StatusCode::BAD_REQUEST,
                Json(RegistrationResponse {
                    success: false,
                    message: "Corpo da requisição inválido".into(),
                    errors: Vec::new(),
                }),
            );
        }
    };

    let record = match state.validator.validate(&raw) {
        Ok(record) => record,
        Err(errors) => {
            tracing::info!(failures = errors.len(), "Registration rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(RegistrationResponse {
                    success: false,
                    message: "Dados inválidos".into(),
                    errors: errors.into_inner(),
                }),
            );
        }
    };

    tracing::info!(email = %record.email, "Registration validated");

    if let Err(e) = state.sheets.append_registrant(&record).await {
        tracing::error!(
            email = %record.email,
            error = %e,
            retryable = e.is_retryable(),
            "Failed to store registrant; answering success anyway"
        );
    }

    (
        StatusCode::OK,
        Json(RegistrationResponse {
            success: true,
            message: "Inscrição realizada com sucesso!".into(),
            errors: Vec::new(),
        }),
    )
}

/// Create a hosted checkout and hand back where to redirect the payer
pub async fn initiate_payment(
    State(state): State<AppState>,
    payload: Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> PaymentResult {
    let Json(request) = payload.map_err(|rejection| {
        payment_failure(
            StatusCode::BAD_REQUEST,
            "Dados de pagamento inválidos.",
            Value::String(rejection.body_text()),
        )
    })?;

    let intent = PaymentIntent::new(
        &request.payer_name,
        &request.payer_email,
        &request.payer_phone,
        request.amount,
        request.method,
    )
    .map_err(|e| payment_failure(StatusCode::BAD_REQUEST, e.user_message(), e.details()))?;

    let session = state
        .payments
        .initiate(&intent, request.provider, &state.urls)
        .await
        .map_err(|e| {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            tracing::error!(email = %intent.payer_email, error = %e, "Payment initiation failed");
            payment_failure(status, e.user_message(), e.details())
        })?;

    tracing::info!(
        email = %intent.payer_email,
        method = %intent.method,
        session_id = %session.session_id,
        "Payment initiated"
    );

    Ok(Json(InitiatePaymentResponse {
        success: true,
        redirect_url: session.redirect_url,
        session_id: session.session_id,
    }))
}

/// Provider payment notification. Always 200.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<WebhookAck> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let signature = SignatureHeaders {
        signature: header("x-signature"),
        request_id: header("x-request-id"),
    };

    Json(state.webhook.handle(&body, &signature).await)
}

/// Card installment table for the payment page
pub async fn installments() -> Json<Vec<InstallmentOption>> {
    Json(installment_plan())
}

/// Store an anonymous question
pub async fn submit_question(
    State(state): State<AppState>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> (StatusCode, Json<QuestionResponse>) {
    let text = match payload {
        Ok(Json(request)) => request.text.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Unreadable question body");
            return question_reply(StatusCode::BAD_REQUEST, false, "Pergunta não pode estar vazia");
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return question_reply(StatusCode::BAD_REQUEST, false, "Pergunta não pode estar vazia");
    }
    if text.chars().count() > MAX_QUESTION_CHARS {
        return question_reply(
            StatusCode::BAD_REQUEST,
            false,
            "Pergunta muito longa (máximo 1000 caracteres)",
        );
    }

    match state.sheets.save_question(text).await {
        Ok(()) => question_reply(StatusCode::OK, true, "Pergunta enviada com sucesso!"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to save question");
            question_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "Erro ao enviar pergunta. Tente novamente.",
            )
        }
    }
}

/// List every anonymous question
pub async fn list_questions(
    State(state): State<AppState>,
) -> (StatusCode, Json<QuestionListResponse>) {
    match state.sheets.list_questions().await {
        Ok(questions) => (
            StatusCode::OK,
            Json(QuestionListResponse {
                success: true,
                message: None,
                questions,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list questions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(QuestionListResponse {
                    success: false,
                    message: Some("Erro ao buscar perguntas".into()),
                    questions: Vec::new(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use retreat_payments::{
        CallbackUrls, CheckoutProvider, CheckoutRouter, CheckoutSession, PaymentDetails,
        PaymentError, PaymentLookup,
    };
    use retreat_sheets::{MemorySheetGateway, SpreadsheetGateway};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::config::{ServerConfig, SheetsBackend};
    use crate::routes::app;
    use crate::state::AppState;

    use super::*;

    struct StubCheckout(ProviderKind);

    #[async_trait]
    impl CheckoutProvider for StubCheckout {
        fn kind(&self) -> ProviderKind {
            self.0
        }

        fn supports(&self, method: PaymentMethod) -> bool {
            method == PaymentMethod::Card || self.0 == ProviderKind::MercadoPago
        }

        async fn create_session(
            &self,
            intent: &PaymentIntent,
            urls: &CallbackUrls,
        ) -> retreat_payments::Result<CheckoutSession> {
            if intent.payer_name == "Recusado" {
                return Err(PaymentError::Rejected {
                    provider: self.0.as_str(),
                    message: "no init_point".into(),
                    details: json!({ "message": "invalid payer" }),
                });
            }
            Ok(CheckoutSession {
                redirect_url: format!("{}?provider={}", urls.success, self.0),
                session_id: format!("{}-{}", self.0, intent.method),
            })
        }
    }

    struct StubLookup(Value);

    #[async_trait]
    impl PaymentLookup for StubLookup {
        async fn fetch_payment(&self, _payment_id: &str) -> retreat_payments::Result<PaymentDetails> {
            serde_json::from_value(self.0.clone()).map_err(|e| PaymentError::WebhookParse(e.to_string()))
        }
    }

    fn state_with(sheets: Arc<MemorySheetGateway>, payment: Value) -> AppState {
        let config = ServerConfig {
            sheets_backend: SheetsBackend::Memory,
            public_base_url: "https://retiro.example".into(),
            ..ServerConfig::default()
        };
        let payments = CheckoutRouter::new(
            Some(Arc::new(StubCheckout(ProviderKind::MercadoPago))),
            Some(Arc::new(StubCheckout(ProviderKind::Stripe))),
            ProviderKind::MercadoPago,
        );
        let sheets: Arc<dyn SpreadsheetGateway> = sheets;
        AppState::new(
            config,
            sheets,
            payments,
            Some(Arc::new(StubLookup(payment))),
            None,
        )
    }

    fn state(sheets: Arc<MemorySheetGateway>) -> AppState {
        state_with(sheets, json!({ "status": "approved", "payer": { "email": "ana@x.com" } }))
    }

    async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> Response {
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        app(state).oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ana() -> Value {
        json!({
            "nome": "Ana Silva",
            "email": "ANA@X.com ",
            "telefone": "(51) 98765-4321",
            "idade": "20",
            "beliche": "baixo",
            "participouAntes": "nao",
            "comoConheceu": "instagram",
            "tipoPagamento": "pix",
        })
    }

    #[tokio::test]
    async fn test_registration_stores_sanitized_record() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let response = send(state(sheets.clone()), "POST", "/registration", Some(ana())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);

        let rows = sheets.registrant_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "ana@x.com");
        assert_eq!(rows[0][2], "51987654321");
        assert_eq!(rows[0][11], "Pendente");
    }

    #[tokio::test]
    async fn test_registration_rejects_with_every_field_error() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let mut body = ana();
        body["idade"] = json!("10");
        body["beliche"] = json!("rede");

        let response = send(state(sheets.clone()), "POST", "/registration", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["field"], "idade");
        assert_eq!(errors[1]["field"], "beliche");
        assert!(sheets.registrant_rows().is_empty());
    }

    #[tokio::test]
    async fn test_registration_unreadable_body_is_400() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let response = send(state(sheets.clone()), "POST", "/registration", Some(json!([1, 2]))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(sheets.registrant_rows().is_empty());
    }

    #[tokio::test]
    async fn test_registration_succeeds_when_sheet_is_down() {
        let sheets = Arc::new(MemorySheetGateway::new());
        sheets.set_unavailable(true);

        let response = send(state(sheets), "POST", "/registration", Some(ana())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
    }

    #[tokio::test]
    async fn test_webhook_approved_confirms_registrant() {
        let sheets = Arc::new(MemorySheetGateway::new());
        send(state(sheets.clone()), "POST", "/registration", Some(ana())).await;

        let response = send(
            state(sheets.clone()),
            "POST",
            "/payment/webhook",
            Some(json!({ "type": "payment", "data": { "id": "123" } })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["received"], true);
        assert_eq!(json["status"], "approved");
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Confirmado"));
    }

    #[tokio::test]
    async fn test_webhook_confirms_email_with_apostrophe() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let mut body = ana();
        body["email"] = json!("O'Brien@x.com");
        let response = send(state(sheets.clone()), "POST", "/registration", Some(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sheets.registrant_rows()[0][1], "o'brien@x.com");

        let state = state_with(
            sheets.clone(),
            json!({ "status": "approved", "payer": { "email": "o'brien@x.com" } }),
        );
        send(
            state,
            "POST",
            "/payment/webhook",
            Some(json!({ "type": "payment", "data": { "id": "77" } })),
        )
        .await;

        assert_eq!(sheets.status_of("o'brien@x.com").as_deref(), Some("Confirmado"));
    }

    #[tokio::test]
    async fn test_webhook_garbage_is_acknowledged_without_mutation() {
        let sheets = Arc::new(MemorySheetGateway::new());
        send(state(sheets.clone()), "POST", "/registration", Some(ana())).await;

        for body in [json!("nope"), json!({ "type": "plan" }), json!({})] {
            let response = send(state(sheets.clone()), "POST", "/payment/webhook", Some(body)).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await, json!({ "received": true }));
        }

        let request = Request::builder()
            .method("POST")
            .uri("/payment/webhook")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(state(sheets.clone())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Pendente"));
    }

    #[tokio::test]
    async fn test_webhook_rejected_payment_marks_row() {
        let sheets = Arc::new(MemorySheetGateway::new());
        send(state(sheets.clone()), "POST", "/registration", Some(ana())).await;

        let state = state_with(
            sheets.clone(),
            json!({ "status": "rejected", "payer": { "email": "ana@x.com" } }),
        );
        let response = send(
            state,
            "POST",
            "/payment/webhook",
            Some(json!({ "type": "payment", "data": { "id": 5 } })),
        )
        .await;

        assert_eq!(json_body(response).await["status"], "rejected");
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Recusado"));
    }

    #[tokio::test]
    async fn test_initiate_pix_payment() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let response = send(
            state(sheets),
            "POST",
            "/payment/initiate",
            Some(json!({
                "payerName": "Ana Silva",
                "payerEmail": "ana@x.com",
                "payerPhone": "(51) 98765-4321",
                "amount": 289,
                "method": "pix",
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["sessionId"], "mercadopago-pix");
        assert_eq!(
            json["redirectUrl"],
            "https://retiro.example/pagamento/sucesso?provider=mercadopago"
        );
    }

    #[tokio::test]
    async fn test_initiate_card_with_requested_provider() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let response = send(
            state(sheets),
            "POST",
            "/payment/initiate",
            Some(json!({
                "payerName": "Ana Silva",
                "payerEmail": "ana@x.com",
                "amount": "296.00",
                "method": "cartao",
                "provider": "stripe",
            })),
        )
        .await;

        assert_eq!(json_body(response).await["sessionId"], "stripe-cartao");
    }

    #[tokio::test]
    async fn test_initiate_rejects_bad_amount_and_surfaces_provider_details() {
        let sheets = Arc::new(MemorySheetGateway::new());

        let response = send(
            state(sheets.clone()),
            "POST",
            "/payment/initiate",
            Some(json!({ "payerName": "Ana", "payerEmail": "ana@x.com", "amount": 0, "method": "pix" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);

        let response = send(
            state(sheets),
            "POST",
            "/payment/initiate",
            Some(json!({ "payerName": "Recusado", "payerEmail": "ana@x.com", "amount": 10, "method": "pix" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["message"], "invalid payer");
    }

    #[tokio::test]
    async fn test_initiate_pix_on_stripe_is_400() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let response = send(
            state(sheets),
            "POST",
            "/payment/initiate",
            Some(json!({
                "payerName": "Ana",
                "payerEmail": "ana@x.com",
                "amount": 10,
                "method": "pix",
                "provider": "stripe",
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_questions_round_trip() {
        let sheets = Arc::new(MemorySheetGateway::new());

        let response = send(
            state(sheets.clone()),
            "POST",
            "/questions",
            Some(json!({ "pergunta": "  Posso levar violão?  " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(state(sheets), "GET", "/questions", None).await;
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["perguntas"][0]["id"], 1);
        assert_eq!(json["perguntas"][0]["pergunta"], "Posso levar violão?");
        assert_eq!(json["perguntas"][0]["status"], "Pendente");
        assert_eq!(json["perguntas"][0]["resposta"], "");
    }

    #[tokio::test]
    async fn test_question_validation() {
        let sheets = Arc::new(MemorySheetGateway::new());

        for body in [json!({ "pergunta": "   " }), json!({}), json!({ "pergunta": "a".repeat(1001) })] {
            let response = send(state(sheets.clone()), "POST", "/questions", Some(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = send(
            state(sheets.clone()),
            "POST",
            "/questions",
            Some(json!({ "pergunta": "a".repeat(1000) })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(sheets.list_questions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let sheets = Arc::new(MemorySheetGateway::new());
        let response = send(state(sheets), "GET", "/health", None).await;

        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["sheets"], "memory");
        assert_eq!(json["paymentProviders"], json!(["mercadopago", "stripe"]));
        assert_eq!(json["formVariant"], "basic");
    }

    #[tokio::test]
    async fn test_installments_table() {
        let response = send(state(Arc::new(MemorySheetGateway::new())), "GET", "/payment/installments", None).await;
        let json = json_body(response).await;
        assert_eq!(json.as_array().unwrap().len(), 12);
        assert_eq!(json[0]["installments"], 1);
    }
}
