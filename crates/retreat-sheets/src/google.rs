//! Google Sheets v4 REST Gateway

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use retreat_core::{PaymentStatus, Question, RegistrantRecord};

use crate::auth::{ServiceAccount, StaticToken, TokenSource};
use crate::error::{Result, SheetsError};
use crate::gateway::{
    QUESTION_DATA_CELLS, REGISTRANT_DATA_CELLS, STATUS_COLUMN, SpreadsheetGateway, UpdateOutcome,
    column_letter, find_email_row, parse_question_rows, question_row, registrant_row,
};

/// Default Sheets API host
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Default tab holding anonymous questions
pub const DEFAULT_QUESTIONS_TAB: &str = "Perguntas";

/// Cells are stored as typed; user text starting with `=` stays text
const VALUE_INPUT_OPTION: &str = "RAW";

/// Connection settings, read lazily from the environment
///
/// Nothing here is validated at startup; a missing id or credential only
/// surfaces as [`SheetsError::Config`] when an operation runs.
#[derive(Clone, Debug, Default)]
pub struct SheetsConfig {
    /// Spreadsheet holding registrants
    pub spreadsheet_id: Option<String>,
    /// Spreadsheet holding questions; falls back to `spreadsheet_id`
    pub questions_spreadsheet_id: Option<String>,
    /// Registrant tab; the first tab when unset
    pub registrants_tab: Option<String>,
    pub questions_tab: String,
    pub service_account_email: Option<String>,
    pub private_key: Option<String>,
    /// Pre-issued bearer token, used instead of the service account
    pub access_token: Option<String>,
    pub api_base: String,
}

impl SheetsConfig {
    /// Read `GOOGLE_SHEETS_*` and `GOOGLE_*` credentials from the environment
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            spreadsheet_id: var("GOOGLE_SHEETS_ID"),
            questions_spreadsheet_id: var("GOOGLE_SHEETS_PERGUNTAS_ID"),
            registrants_tab: var("GOOGLE_SHEETS_INSCRICOES_TAB"),
            questions_tab: var("GOOGLE_SHEETS_PERGUNTAS_TAB")
                .unwrap_or_else(|| DEFAULT_QUESTIONS_TAB.to_string()),
            service_account_email: var("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
            private_key: var("GOOGLE_PRIVATE_KEY"),
            access_token: var("GOOGLE_SHEETS_ACCESS_TOKEN"),
            api_base: var("GOOGLE_SHEETS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    fn registrants_sheet(&self) -> Result<&str> {
        self.spreadsheet_id
            .as_deref()
            .ok_or_else(|| SheetsError::Config("GOOGLE_SHEETS_ID not set".into()))
    }

    fn questions_sheet(&self) -> Result<&str> {
        self.questions_spreadsheet_id
            .as_deref()
            .or(self.spreadsheet_id.as_deref())
            .ok_or_else(|| {
                SheetsError::Config("GOOGLE_SHEETS_PERGUNTAS_ID or GOOGLE_SHEETS_ID not set".into())
            })
    }

    fn registrants_range(&self, cells: &str) -> String {
        match &self.registrants_tab {
            Some(tab) => format!("{tab}!{cells}"),
            None => cells.to_string(),
        }
    }

    fn questions_range(&self, cells: &str) -> String {
        format!("{}!{cells}", self.questions_tab)
    }
}

#[derive(Serialize)]
struct ValueRangeBody<'a> {
    values: &'a [Vec<String>],
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Sheets gateway backed by the Google REST API
pub struct GoogleSheetsGateway {
    config: SheetsConfig,
    http: Client,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl GoogleSheetsGateway {
    /// Build from config. A broken private key is logged and surfaces as a
    /// config error on first use.
    pub fn new(config: SheetsConfig) -> Self {
        let tokens = match Self::token_source(&config) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Sheets credentials unusable");
                None
            }
        };
        Self {
            config,
            http: Client::new(),
            tokens,
        }
    }

    /// Build with an explicit token source
    pub fn with_token_source(config: SheetsConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            config,
            http: Client::new(),
            tokens: Some(tokens),
        }
    }

    fn token_source(config: &SheetsConfig) -> Result<Option<Arc<dyn TokenSource>>> {
        if let Some(token) = &config.access_token {
            return Ok(Some(Arc::new(StaticToken::new(token.clone()))));
        }
        match (&config.service_account_email, &config.private_key) {
            (Some(email), Some(key)) => Ok(Some(Arc::new(ServiceAccount::new(email.clone(), key)?))),
            _ => Ok(None),
        }
    }

    async fn bearer(&self) -> Result<String> {
        match &self.tokens {
            Some(tokens) => tokens.access_token().await,
            None => Err(SheetsError::Config(
                "GOOGLE_SERVICE_ACCOUNT_EMAIL and GOOGLE_PRIVATE_KEY not set".into(),
            )),
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| SheetsError::Config(format!("invalid Sheets API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| SheetsError::Config("Sheets API base cannot hold a path".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values"])
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.bearer().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SheetsError::Auth(format!("Sheets API returned {status}")));
        }
        Err(SheetsError::Api {
            status: status.as_u16(),
            body,
        })
    }

    async fn append_row(&self, spreadsheet_id: &str, range: &str, row: Vec<String>) -> Result<()> {
        let url = self.values_url(spreadsheet_id, range, ":append")?;
        let rows = [row];
        let builder = self
            .request(Method::POST, url)
            .await?
            .query(&[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&ValueRangeBody { values: &rows });
        Self::send(builder).await?;
        Ok(())
    }

    async fn read_rows(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, range, "")?;
        let response = Self::send(self.request(Method::GET, url).await?).await?;
        let range: ValueRange = response.json().await?;
        Ok(range.values)
    }
}

#[async_trait]
impl SpreadsheetGateway for GoogleSheetsGateway {
    #[instrument(skip(self, record), fields(email = %record.email))]
    async fn append_registrant(&self, record: &RegistrantRecord) -> Result<()> {
        let sheet = self.config.registrants_sheet()?;
        let range = self.config.registrants_range("A2");
        self.append_row(sheet, &range, registrant_row(record, Utc::now()))
            .await?;
        info!("Registrant appended");
        Ok(())
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn update_payment_status(
        &self,
        email: &str,
        status: PaymentStatus,
    ) -> Result<UpdateOutcome> {
        let sheet = self.config.registrants_sheet()?;
        let rows = self
            .read_rows(sheet, &self.config.registrants_range(REGISTRANT_DATA_CELLS))
            .await?;

        let Some(row) = find_email_row(&rows, email) else {
            warn!(email, "No registrant row for payment email");
            return Ok(UpdateOutcome::NotFound);
        };

        let cell = format!("{}{row}", column_letter(STATUS_COLUMN));
        let url = self.values_url(sheet, &self.config.registrants_range(&cell), "")?;
        let values = [vec![status.as_str().to_string()]];
        let builder = self
            .request(Method::PUT, url)
            .await?
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .json(&ValueRangeBody { values: &values });
        Self::send(builder).await?;

        info!(row, "Payment status updated");
        Ok(UpdateOutcome::Updated { row })
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn save_question(&self, text: &str) -> Result<()> {
        let sheet = self.config.questions_sheet()?;
        let range = self.config.questions_range("A2");
        self.append_row(sheet, &range, question_row(text, Utc::now()))
            .await?;
        info!("Question saved");
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        let sheet = self.config.questions_sheet()?;
        let rows = self
            .read_rows(sheet, &self.config.questions_range(QUESTION_DATA_CELLS))
            .await?;
        debug!(count = rows.len(), "Questions read");
        Ok(parse_question_rows(&rows))
    }

    fn name(&self) -> &str {
        "google-sheets"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::extract::{Path, Query, State};
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use retreat_core::{BunkPreference, PaymentMethod, ReferralSource, YesNo};
    use serde_json::{Value, json};

    /// Recorded calls of the fake Sheets server
    #[derive(Default)]
    struct Recorded {
        calls: Vec<(String, String, Value)>,
        rows: Vec<Vec<String>>,
    }

    type Shared = Arc<Mutex<Recorded>>;

    async fn append(
        State(shared): State<Shared>,
        Path((id, range)): Path<(String, String)>,
        Query(query): Query<std::collections::HashMap<String, String>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        assert_eq!(headers["authorization"], "Bearer test-token");
        assert_eq!(query["valueInputOption"], "RAW");
        shared
            .lock()
            .unwrap()
            .calls
            .push(("POST".into(), format!("{id}/{range}"), body));
        Json(json!({ "updates": { "updatedRows": 1 } }))
    }

    async fn read(State(shared): State<Shared>, Path((id, range)): Path<(String, String)>) -> Json<Value> {
        let mut recorded = shared.lock().unwrap();
        recorded
            .calls
            .push(("GET".into(), format!("{id}/{range}"), Value::Null));
        Json(json!({ "range": range, "values": recorded.rows }))
    }

    async fn write(
        State(shared): State<Shared>,
        Path((id, range)): Path<(String, String)>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        shared
            .lock()
            .unwrap()
            .calls
            .push(("PUT".into(), format!("{id}/{range}"), body));
        Json(json!({ "updatedCells": 1 }))
    }

    async fn fake_sheets(rows: Vec<Vec<String>>) -> (String, Shared) {
        let shared: Shared = Arc::new(Mutex::new(Recorded {
            rows,
            ..Recorded::default()
        }));
        let app = Router::new()
            .route("/v4/spreadsheets/{id}/values/{range}", get(read).put(write).post(append))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}"), shared)
    }

    fn config(api_base: String) -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: Some("sheet-1".into()),
            questions_tab: DEFAULT_QUESTIONS_TAB.into(),
            access_token: Some("test-token".into()),
            api_base,
            ..SheetsConfig::default()
        }
    }

    fn record() -> RegistrantRecord {
        RegistrantRecord {
            name: "Ana Silva".into(),
            email: "ana@x.com".into(),
            phone: "51987654321".into(),
            age: 20,
            allergy: String::new(),
            bunk: BunkPreference::Bottom,
            prior_attendance: YesNo::No,
            referral: ReferralSource::Instagram,
            payment_method: PaymentMethod::Pix,
            needs_transport: None,
        }
    }

    #[tokio::test]
    async fn test_append_registrant_posts_one_row() {
        let (base, shared) = fake_sheets(Vec::new()).await;
        let gateway = GoogleSheetsGateway::new(config(base));

        gateway.append_registrant(&record()).await.unwrap();

        let recorded = shared.lock().unwrap();
        let (method, path, body) = &recorded.calls[0];
        assert_eq!(method, "POST");
        assert_eq!(path, "sheet-1/A2:append");
        assert_eq!(body["values"][0][1], "ana@x.com");
        assert_eq!(body["values"][0][11], "Pendente");
    }

    #[tokio::test]
    async fn test_update_status_writes_column_l_of_matching_row() {
        let rows = vec![
            vec!["Bruno".into(), "bruno@x.com".into()],
            vec!["Ana".into(), "ana@x.com".into()],
        ];
        let (base, shared) = fake_sheets(rows).await;
        let gateway = GoogleSheetsGateway::new(config(base));

        let outcome = gateway
            .update_payment_status("ana@x.com", PaymentStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated { row: 3 });

        let recorded = shared.lock().unwrap();
        assert_eq!(recorded.calls[0].1, "sheet-1/A2:M");
        let (method, path, body) = &recorded.calls[1];
        assert_eq!(method, "PUT");
        assert_eq!(path, "sheet-1/L3");
        assert_eq!(body["values"][0][0], "Confirmado");
    }

    #[tokio::test]
    async fn test_update_status_unknown_email_writes_nothing() {
        let (base, shared) = fake_sheets(vec![vec!["Bruno".into(), "bruno@x.com".into()]]).await;
        let gateway = GoogleSheetsGateway::new(config(base));

        let outcome = gateway
            .update_payment_status("ana@x.com", PaymentStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert_eq!(shared.lock().unwrap().calls.len(), 1);
    }

    #[tokio::test]
    async fn test_questions_use_their_own_tab() {
        let rows = vec![vec!["01/03/2025, 10:00:00".into(), "Tem piscina?".into()]];
        let (base, shared) = fake_sheets(rows).await;
        let gateway = GoogleSheetsGateway::new(config(base));

        gateway.save_question("Posso levar violão?").await.unwrap();
        let questions = gateway.list_questions().await.unwrap();

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].status, "Pendente");

        let recorded = shared.lock().unwrap();
        assert_eq!(recorded.calls[0].1, "sheet-1/Perguntas!A2:append");
        assert_eq!(recorded.calls[0].2["values"][0][1], "Posso levar violão?");
        assert_eq!(recorded.calls[1].1, "sheet-1/Perguntas!A2:D");
    }

    #[tokio::test]
    async fn test_missing_sheet_id_is_config_error() {
        let gateway = GoogleSheetsGateway::new(SheetsConfig {
            access_token: Some("t".into()),
            ..SheetsConfig::default()
        });
        let result = gateway.append_registrant(&record()).await;
        assert!(matches!(result, Err(SheetsError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_config_error() {
        let gateway = GoogleSheetsGateway::new(SheetsConfig {
            spreadsheet_id: Some("sheet-1".into()),
            api_base: DEFAULT_API_BASE.into(),
            ..SheetsConfig::default()
        });
        let result = gateway.list_questions().await;
        assert!(matches!(result, Err(SheetsError::Config(_))));
    }
}
