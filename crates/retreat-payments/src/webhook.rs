//! Payment Notification Handling
//!
//! Mercado Pago notifies payment changes with `{type, data: {id}}`. The
//! handler fetches the payment, resolves the payer's email and moves the
//! matching sheet row to `Confirmado` or `Recusado`.
//!
//! Every notification is acknowledged, whatever happens inside; the provider
//! must never be asked to resend.

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, error, info, warn};

use retreat_core::PaymentStatus;
use retreat_core::sanitize::normalize_email;
use retreat_sheets::{SpreadsheetGateway, UpdateOutcome};

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Incoming notification body
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaymentNotification {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub action: Option<String>,
    pub data: Option<NotificationData>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotificationData {
    /// String or number, depending on the notification version
    pub id: Option<Value>,
}

impl PaymentNotification {
    pub fn is_payment(&self) -> bool {
        self.kind.as_deref() == Some("payment")
    }

    /// `data.id` as text
    pub fn payment_id(&self) -> Option<String> {
        match self.data.as_ref()?.id.as_ref()? {
            Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Signature headers sent alongside a notification
#[derive(Clone, Debug, Default)]
pub struct SignatureHeaders {
    /// `x-signature: ts=...,v1=...`
    pub signature: Option<String>,
    /// `x-request-id`
    pub request_id: Option<String>,
}

/// Signed text for a notification
pub fn signature_manifest(data_id: &str, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if !data_id.is_empty() {
        manifest.push_str(&format!("id:{};", data_id.to_lowercase()));
    }
    if let Some(request_id) = request_id.filter(|r| !r.is_empty()) {
        manifest.push_str(&format!("request-id:{request_id};"));
    }
    manifest.push_str(&format!("ts:{ts};"));
    manifest
}

/// Check `x-signature` against the shared secret
pub fn verify_signature(secret: &str, headers: &SignatureHeaders, data_id: &str) -> Result<()> {
    let signature = headers
        .signature
        .as_deref()
        .ok_or_else(|| PaymentError::WebhookSignature("missing x-signature".into()))?;

    let mut ts = None;
    let mut v1 = None;
    for part in signature.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim()),
            Some(("v1", value)) => v1 = Some(value.trim()),
            _ => {}
        }
    }
    let (Some(ts), Some(v1)) = (ts, v1) else {
        return Err(PaymentError::WebhookSignature("malformed x-signature".into()));
    };

    let expected = hex::decode(v1)
        .map_err(|e| PaymentError::WebhookSignature(format!("v1 is not hex: {e}")))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(e.to_string()))?;
    mac.update(signature_manifest(data_id, headers.request_id.as_deref(), ts).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::WebhookSignature("signature mismatch".into()))
}

/// Payment as returned by the provider's lookup API
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub id: Value,
    pub status: Option<String>,
    pub payer: Option<PaymentPayer>,
    pub external_reference: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PaymentPayer {
    pub email: Option<String>,
}

impl PaymentDetails {
    /// Payer email, else the external reference, else the description;
    /// only values that look like an email count
    pub fn email(&self) -> Option<String> {
        let payer = self.payer.as_ref().and_then(|p| p.email.as_deref());
        [
            payer,
            self.external_reference.as_deref(),
            self.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(normalize_email)
        .find(|email| email.contains('@'))
    }
}

/// Looks up a payment by id (Strategy pattern)
#[async_trait]
pub trait PaymentLookup: Send + Sync {
    async fn fetch_payment(&self, payment_id: &str) -> Result<PaymentDetails>;
}

/// Interpreted payment status echoed in the acknowledgement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Approved,
    Pending,
    Rejected,
}

/// Body of every webhook response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AckStatus>,
}

impl WebhookAck {
    pub const fn received() -> Self {
        Self {
            received: true,
            status: None,
        }
    }

    pub const fn with_status(status: AckStatus) -> Self {
        Self {
            received: true,
            status: Some(status),
        }
    }
}

/// Webhook handler
pub struct WebhookHandler<G: SpreadsheetGateway + ?Sized> {
    sheets: Arc<G>,
    lookup: Option<Arc<dyn PaymentLookup>>,
    secret: Option<String>,
}

impl<G: SpreadsheetGateway + ?Sized> WebhookHandler<G> {
    pub fn new(sheets: Arc<G>, lookup: Option<Arc<dyn PaymentLookup>>) -> Self {
        Self {
            sheets,
            lookup,
            secret: None,
        }
    }

    /// Require a valid `x-signature` on payment notifications
    #[must_use]
    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret;
        self
    }

    /// Process a raw notification. Never fails.
    pub async fn handle(&self, body: &[u8], headers: &SignatureHeaders) -> WebhookAck {
        match self.process(body, headers).await {
            Ok(ack) => ack,
            Err(e @ (PaymentError::WebhookParse(_) | PaymentError::WebhookSignature(_))) => {
                warn!(error = %e, "Ignoring payment notification");
                WebhookAck::received()
            }
            Err(e) => {
                error!(error = %e, "Payment notification failed");
                WebhookAck::received()
            }
        }
    }

    async fn process(&self, body: &[u8], headers: &SignatureHeaders) -> Result<WebhookAck> {
        let notification: PaymentNotification = serde_json::from_slice(body)
            .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

        if !notification.is_payment() {
            debug!(kind = ?notification.kind, action = ?notification.action, "Unhandled notification type");
            return Ok(WebhookAck::received());
        }

        let payment_id = notification
            .payment_id()
            .ok_or_else(|| PaymentError::WebhookParse("missing data.id".into()))?;

        if let Some(secret) = &self.secret {
            verify_signature(secret, headers, &payment_id)?;
        }

        let lookup = self
            .lookup
            .as_ref()
            .ok_or_else(|| PaymentError::Config("no payment lookup configured".into()))?;
        let payment = lookup.fetch_payment(&payment_id).await?;

        info!(payment_id = %payment_id, status = ?payment.status, "Processing payment notification");

        let (ack, target) = match payment.status.as_deref() {
            Some("approved") => (AckStatus::Approved, Some(PaymentStatus::Confirmed)),
            Some("pending") => (AckStatus::Pending, None),
            _ => (AckStatus::Rejected, Some(PaymentStatus::Rejected)),
        };

        if let Some(status) = target {
            self.record(&payment_id, &payment, status).await;
        }

        Ok(WebhookAck::with_status(ack))
    }

    async fn record(&self, payment_id: &str, payment: &PaymentDetails, status: PaymentStatus) {
        let Some(email) = payment.email() else {
            warn!(payment_id, "Payment has no payer email; sheet not updated");
            return;
        };

        match self.sheets.update_payment_status(&email, status).await {
            Ok(UpdateOutcome::Updated { row }) => {
                info!(payment_id, email = %email, row, %status, "Registrant payment status recorded");
            }
            Ok(UpdateOutcome::NotFound) => {
                warn!(payment_id, email = %email, %status, "No registrant for paid email");
            }
            Err(e) => {
                error!(payment_id, email = %email, error = %e, "Failed to record payment status");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retreat_core::{BunkPreference, PaymentMethod, ReferralSource, RegistrantRecord, YesNo};
    use retreat_sheets::MemorySheetGateway;
    use serde_json::json;

    struct StubLookup(std::result::Result<Value, String>);

    #[async_trait]
    impl PaymentLookup for StubLookup {
        async fn fetch_payment(&self, _payment_id: &str) -> Result<PaymentDetails> {
            match &self.0 {
                Ok(value) => Ok(serde_json::from_value(value.clone()).unwrap()),
                Err(message) => Err(PaymentError::Config(message.clone())),
            }
        }
    }

    async fn sheets_with_ana() -> Arc<MemorySheetGateway> {
        let sheets = Arc::new(MemorySheetGateway::new());
        sheets
            .append_registrant(&RegistrantRecord {
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
            })
            .await
            .unwrap();
        sheets
    }

    fn handler(sheets: &Arc<MemorySheetGateway>, payment: Value) -> WebhookHandler<MemorySheetGateway> {
        WebhookHandler::new(Arc::clone(sheets), Some(Arc::new(StubLookup(Ok(payment)))))
    }

    fn body(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[tokio::test]
    async fn test_approved_payment_confirms_row() {
        let sheets = sheets_with_ana().await;
        let handler = handler(&sheets, json!({ "id": 123, "status": "approved", "payer": { "email": "ana@x.com" } }));

        let ack = handler
            .handle(&body(&json!({ "type": "payment", "data": { "id": "123" } })), &SignatureHeaders::default())
            .await;

        assert_eq!(ack, WebhookAck::with_status(AckStatus::Approved));
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Confirmado"));
    }

    #[tokio::test]
    async fn test_pending_payment_only_acknowledges() {
        let sheets = sheets_with_ana().await;
        let handler = handler(&sheets, json!({ "status": "pending", "payer": { "email": "ana@x.com" } }));

        let ack = handler
            .handle(&body(&json!({ "type": "payment", "data": { "id": 9 } })), &SignatureHeaders::default())
            .await;

        assert_eq!(ack.status, Some(AckStatus::Pending));
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Pendente"));
    }

    #[tokio::test]
    async fn test_other_status_rejects_row_via_external_reference() {
        let sheets = sheets_with_ana().await;
        let handler = handler(
            &sheets,
            json!({ "status": "cancelled", "payer": { "email": null }, "external_reference": " ANA@x.com" }),
        );

        let ack = handler
            .handle(&body(&json!({ "type": "payment", "data": { "id": "7" } })), &SignatureHeaders::default())
            .await;

        assert_eq!(ack.status, Some(AckStatus::Rejected));
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Recusado"));
    }

    #[tokio::test]
    async fn test_malformed_and_foreign_bodies_are_acknowledged() {
        let sheets = sheets_with_ana().await;
        let handler = handler(&sheets, json!({ "status": "approved", "payer": { "email": "ana@x.com" } }));

        for raw in [
            b"not json".to_vec(),
            body(&json!({ "type": "merchant_order", "data": { "id": "1" } })),
            body(&json!({ "type": "payment" })),
            body(&json!({ "type": "payment", "data": { "id": {} } })),
        ] {
            let ack = handler.handle(&raw, &SignatureHeaders::default()).await;
            assert_eq!(ack, WebhookAck::received());
        }
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Pendente"));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_swallowed() {
        let sheets = sheets_with_ana().await;
        let handler = WebhookHandler::new(
            Arc::clone(&sheets),
            Some(Arc::new(StubLookup(Err("down".into()))) as Arc<dyn PaymentLookup>),
        );

        let ack = handler
            .handle(&body(&json!({ "type": "payment", "data": { "id": "1" } })), &SignatureHeaders::default())
            .await;
        assert_eq!(ack, WebhookAck::received());
    }

    #[tokio::test]
    async fn test_sheet_failure_is_swallowed() {
        let sheets = sheets_with_ana().await;
        sheets.set_unavailable(true);
        let handler = handler(&sheets, json!({ "status": "approved", "payer": { "email": "ana@x.com" } }));

        let ack = handler
            .handle(&body(&json!({ "type": "payment", "data": { "id": "1" } })), &SignatureHeaders::default())
            .await;
        assert_eq!(ack.status, Some(AckStatus::Approved));
    }

    fn sign(secret: &str, manifest: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(manifest.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_signature_manifest() {
        assert_eq!(
            signature_manifest("ABC123", Some("req-1"), "1700000000"),
            "id:abc123;request-id:req-1;ts:1700000000;"
        );
        assert_eq!(signature_manifest("5", None, "1"), "id:5;ts:1;");
    }

    #[test]
    fn test_verify_signature() {
        let v1 = sign("s3cret", "id:123;request-id:req-1;ts:1700000000;");
        let headers = SignatureHeaders {
            signature: Some(format!("ts=1700000000,v1={v1}")),
            request_id: Some("req-1".into()),
        };

        assert!(verify_signature("s3cret", &headers, "123").is_ok());
        assert!(verify_signature("other", &headers, "123").is_err());
        assert!(verify_signature("s3cret", &headers, "124").is_err());
        assert!(verify_signature("s3cret", &SignatureHeaders::default(), "123").is_err());
    }

    #[tokio::test]
    async fn test_bad_signature_blocks_mutation() {
        let sheets = sheets_with_ana().await;
        let handler = handler(&sheets, json!({ "status": "approved", "payer": { "email": "ana@x.com" } }))
            .with_secret(Some("s3cret".into()));
        let headers = SignatureHeaders {
            signature: Some("ts=1,v1=00".into()),
            request_id: None,
        };

        let ack = handler
            .handle(&body(&json!({ "type": "payment", "data": { "id": "1" } })), &headers)
            .await;

        assert_eq!(ack, WebhookAck::received());
        assert_eq!(sheets.status_of("ana@x.com").as_deref(), Some("Pendente"));
    }

    #[test]
    fn test_email_resolution_order() {
        let details: PaymentDetails = serde_json::from_value(json!({
            "payer": { "email": "" },
            "external_reference": "Inscrição",
            "description": " Bruno@X.com ",
        }))
        .unwrap();
        assert_eq!(details.email().as_deref(), Some("bruno@x.com"));

        assert_eq!(PaymentDetails::default().email(), None);
    }
}
