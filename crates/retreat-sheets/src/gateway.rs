//! Gateway Trait and Row Layout
//!
//! The cell layout is shared by every implementation so that the in-memory
//! gateway behaves exactly like the real sheet.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use retreat_core::{PaymentStatus, Question, RegistrantRecord};

use crate::error::Result;

/// Header row of the registrant sheet
pub const REGISTRANT_HEADERS: [&str; 13] = [
    "Nome",
    "Email",
    "Telefone",
    "Idade",
    "Alergia",
    "Beliche",
    "Participou Antes",
    "Como Conheceu",
    "Tipo Pagamento",
    "Precisa Transporte",
    "Payment ID",
    "Status Pagamento",
    "Data Inscrição",
];

/// Zero-based index of the email column (B)
pub const EMAIL_COLUMN: usize = 1;

/// Zero-based index of the payment reference column (K)
pub const PAYMENT_REFERENCE_COLUMN: usize = 10;

/// Zero-based index of the payment status column (L)
pub const STATUS_COLUMN: usize = 11;

/// Data rows start below the header
pub const FIRST_DATA_ROW: usize = 2;

/// Cells covering every registrant data row
pub const REGISTRANT_DATA_CELLS: &str = "A2:M";

/// Cells covering every question data row
pub const QUESTION_DATA_CELLS: &str = "A2:D";

/// Outcome of a status update by email
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The status cell of this 1-based sheet row was overwritten
    Updated { row: usize },
    /// No row carries that email; nothing was written
    NotFound,
}

/// Row-oriented store for registrants and questions (Strategy pattern)
///
/// Every operation is independent and may fail on its own; nothing here is
/// transactional, and concurrent status updates are last-write-wins.
#[async_trait]
pub trait SpreadsheetGateway: Send + Sync {
    /// Append one registrant with status `Pendente` and a server timestamp.
    /// Not idempotent.
    async fn append_registrant(&self, record: &RegistrantRecord) -> Result<()>;

    /// Overwrite the status of the first row whose email matches exactly
    async fn update_payment_status(&self, email: &str, status: PaymentStatus)
    -> Result<UpdateOutcome>;

    /// Append an anonymous question with status `Pendente` and no reply
    async fn save_question(&self, text: &str) -> Result<()>;

    /// Every question, top to bottom
    async fn list_questions(&self) -> Result<Vec<Question>>;

    /// Backend name, for logs and the health endpoint
    fn name(&self) -> &str;
}

/// Cells for a freshly registered person
pub fn registrant_row(record: &RegistrantRecord, created_at: DateTime<Utc>) -> Vec<String> {
    vec![
        record.name.clone(),
        record.email.clone(),
        record.phone.clone(),
        record.age.to_string(),
        record.allergy.clone(),
        record.bunk.as_str().into(),
        record.prior_attendance.as_str().into(),
        record.referral.as_str().into(),
        record.payment_method.as_str().into(),
        record
            .needs_transport
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        String::new(),
        PaymentStatus::Pending.as_str().into(),
        sheet_timestamp(created_at),
    ]
}

/// Cells for a new anonymous question
pub fn question_row(text: &str, submitted_at: DateTime<Utc>) -> Vec<String> {
    vec![
        sheet_timestamp(submitted_at),
        text.to_string(),
        PaymentStatus::Pending.as_str().into(),
        String::new(),
    ]
}

/// Read question rows back, filling blanks the way organizers expect
pub fn parse_question_rows(rows: &[Vec<String>]) -> Vec<Question> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
            let status = cell(2);
            Question {
                id: index + 1,
                submitted_at: cell(0),
                text: cell(1),
                status: if status.is_empty() {
                    PaymentStatus::Pending.as_str().into()
                } else {
                    status
                },
                reply: cell(3),
            }
        })
        .collect()
}

/// 1-based sheet row of the first data row whose email equals `email`
pub fn find_email_row(rows: &[Vec<String>], email: &str) -> Option<usize> {
    rows.iter()
        .position(|row| row.get(EMAIL_COLUMN).is_some_and(|cell| cell == email))
        .map(|index| index + FIRST_DATA_ROW)
}

/// A1 letter for a zero-based column index (0 → A, 11 → L, 26 → AA)
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        let rem = u8::try_from(index % 26).unwrap_or(0);
        letters.push(char::from(b'A' + rem));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// `dd/mm/yyyy, HH:MM:SS` in Brasília time, as the organizers read it
pub fn sheet_timestamp(at: DateTime<Utc>) -> String {
    // Brazil dropped daylight saving in 2019; a fixed offset is exact.
    (at.naive_utc() - TimeDelta::hours(3))
        .format("%d/%m/%Y, %H:%M:%S")
        .to_string()
}
