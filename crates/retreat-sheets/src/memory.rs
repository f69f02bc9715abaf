//! In-Memory Gateway
//!
//! Keeps the exact cell layout of the real sheet, so behavior (first match
//! wins, status column, question defaults) is identical.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use retreat_core::{PaymentStatus, Question, RegistrantRecord};

use crate::error::{Result, SheetsError};
use crate::gateway::{
    EMAIL_COLUMN, FIRST_DATA_ROW, STATUS_COLUMN, SpreadsheetGateway, UpdateOutcome,
    find_email_row, parse_question_rows, question_row, registrant_row,
};

/// Development and test gateway
#[derive(Default)]
pub struct MemorySheetGateway {
    registrants: RwLock<Vec<Vec<String>>>,
    questions: RwLock<Vec<Vec<String>>>,
    unavailable: AtomicBool,
}

impl MemorySheetGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail, as if the sheet could not be reached
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Copy of every registrant row, top to bottom
    pub fn registrant_rows(&self) -> Vec<Vec<String>> {
        self.registrants
            .read()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Status cell of the first row carrying `email`
    pub fn status_of(&self, email: &str) -> Option<String> {
        self.registrant_rows()
            .into_iter()
            .find(|row| row.get(EMAIL_COLUMN).is_some_and(|cell| cell == email))
            .and_then(|row| row.get(STATUS_COLUMN).cloned())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SheetsError::Storage("sheet unavailable".into()));
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> SheetsError {
    SheetsError::Storage("lock poisoned".into())
}

#[async_trait]
impl SpreadsheetGateway for MemorySheetGateway {
    async fn append_registrant(&self, record: &RegistrantRecord) -> Result<()> {
        self.check_available()?;
        let row = registrant_row(record, Utc::now());
        self.registrants.write().map_err(poisoned)?.push(row);
        info!(email = %record.email, "Registrant appended");
        Ok(())
    }

    async fn update_payment_status(
        &self,
        email: &str,
        status: PaymentStatus,
    ) -> Result<UpdateOutcome> {
        self.check_available()?;
        let mut rows = self.registrants.write().map_err(poisoned)?;

        let Some(row) = find_email_row(&rows, email) else {
            warn!(email, "No registrant row for payment email");
            return Ok(UpdateOutcome::NotFound);
        };

        let cells = &mut rows[row - FIRST_DATA_ROW];
        if cells.len() <= STATUS_COLUMN {
            cells.resize(STATUS_COLUMN + 1, String::new());
        }
        cells[STATUS_COLUMN] = status.as_str().to_string();

        info!(row, %status, "Payment status updated");
        Ok(UpdateOutcome::Updated { row })
    }

    async fn save_question(&self, text: &str) -> Result<()> {
        self.check_available()?;
        self.questions
            .write()
            .map_err(poisoned)?
            .push(question_row(text, Utc::now()));
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>> {
        self.check_available()?;
        let rows = self.questions.read().map_err(poisoned)?;
        Ok(parse_question_rows(&rows))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
