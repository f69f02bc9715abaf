//! API Client

use retreat_core::{FormVariant, PayerSummary, PaymentMethod, Question, RawRegistrant};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Local storage key holding the [`PayerSummary`] between signup and payment
const PAYER_KEY: &str = "inscricaoData";

const CONNECTION_ERROR: &str = "Erro ao conectar com o servidor";

const NAVIGATION_ERROR: &str = "Não foi possível abrir a próxima página. Recarregue e tente novamente.";

/// Site origin, used to build absolute request URLs
pub fn origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into())
}

fn endpoint(path: &str) -> String {
    format!("{}{path}", origin())
}

/// Send the browser to another page
pub fn navigate(path: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or(NAVIGATION_ERROR)?;
    window
        .location()
        .set_href(path)
        .map_err(|_| NAVIGATION_ERROR.to_string())
}

/// Form variant the server is configured for
pub async fn form_variant() -> FormVariant {
    let response = match reqwest::get(endpoint("/health")).await {
        Ok(response) => response,
        Err(_) => return FormVariant::default(),
    };
    let data: serde_json::Value = response.json().await.unwrap_or_default();
    data["formVariant"]
        .as_str()
        .and_then(FormVariant::parse)
        .unwrap_or_default()
}

/// POST every registrant in order, stopping at the first failure
pub async fn register_all(registrants: &[RawRegistrant]) -> Result<(), String> {
    let client = reqwest::Client::new();

    for registrant in registrants {
        let response = client
            .post(endpoint("/registration"))
            .json(registrant)
            .send()
            .await
            .map_err(|_| CONNECTION_ERROR.to_string())?;

        if !response.status().is_success() {
            let data: serde_json::Value = response.json().await.unwrap_or_default();
            return Err(data["message"]
                .as_str()
                .unwrap_or("Erro ao enviar inscrição")
                .to_string());
        }
    }

    Ok(())
}

/// Checkout request for the payer stored at signup
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payer_name: String,
    pub payer_email: String,
    pub payer_phone: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
}

impl PaymentRequest {
    pub fn new(payer: &PayerSummary, amount: Decimal, method: PaymentMethod) -> Self {
        Self {
            payer_name: payer.name.clone(),
            payer_email: payer.email.clone(),
            payer_phone: payer.phone.clone(),
            amount,
            method,
        }
    }
}

/// Create a checkout and return the provider's redirect URL
pub async fn initiate_payment(request: &PaymentRequest) -> Result<String, String> {
    let response = reqwest::Client::new()
        .post(endpoint("/payment/initiate"))
        .json(request)
        .send()
        .await
        .map_err(|_| CONNECTION_ERROR.to_string())?;

    let data: serde_json::Value = response.json().await.unwrap_or_default();
    match data["redirectUrl"].as_str() {
        Some(url) if data["success"] == true => Ok(url.to_string()),
        _ => Err(data["error"]
            .as_str()
            .unwrap_or("Erro ao criar sessão de pagamento")
            .to_string()),
    }
}

/// One row of the card installment table
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub installments: u8,
    pub per_installment: Decimal,
    pub total: Decimal,
}

pub async fn installments() -> Result<Vec<Installment>, String> {
    let response = reqwest::get(endpoint("/payment/installments"))
        .await
        .map_err(|_| CONNECTION_ERROR.to_string())?;
    response.json().await.map_err(|e| e.to_string())
}

/// Send an anonymous question; the server's message either way
pub async fn submit_question(text: &str) -> Result<String, String> {
    let response = reqwest::Client::new()
        .post(endpoint("/questions"))
        .json(&serde_json::json!({ "pergunta": text }))
        .send()
        .await
        .map_err(|_| CONNECTION_ERROR.to_string())?;

    let success = response.status().is_success();
    let data: serde_json::Value = response.json().await.unwrap_or_default();
    let message = data["message"].as_str().unwrap_or_default().to_string();
    if success { Ok(message) } else { Err(message) }
}

#[derive(Deserialize)]
struct QuestionList {
    #[serde(rename = "perguntas", default)]
    questions: Vec<Question>,
}

pub async fn list_questions() -> Result<Vec<Question>, String> {
    let response = reqwest::get(endpoint("/questions"))
        .await
        .map_err(|_| CONNECTION_ERROR.to_string())?;
    if !response.status().is_success() {
        return Err("Erro ao buscar perguntas".into());
    }
    let list: QuestionList = response.json().await.map_err(|e| e.to_string())?;
    Ok(list.questions)
}

// ============================================================================
// Local storage
// ============================================================================

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Remember the payer for the payment page
pub fn save_payer(payer: &PayerSummary) -> Result<(), String> {
    let storage = local_storage().ok_or("Armazenamento local indisponível")?;
    let json = serde_json::to_string(payer).map_err(|e| e.to_string())?;
    storage
        .set_item(PAYER_KEY, &json)
        .map_err(|_| "Armazenamento local indisponível".to_string())
}

pub fn load_payer() -> Option<PayerSummary> {
    let json = local_storage()?.get_item(PAYER_KEY).ok().flatten()?;
    serde_json::from_str(&json).ok()
}
