//! # retreat-sheets
//!
//! Spreadsheet persistence for the retreat site. Registrants and anonymous
//! questions live in Google Sheets; this crate is the only writer.
//!
//! ## Sheet layout
//!
//! ```text
//! Registrants (A2:M)
//! ┌──────┬───────┬──────────┬───────┬─────────┬─────────┬─────┬─────┬──────┬────────────┬────────────┬──────────┬────────────┐
//! │ Nome │ Email │ Telefone │ Idade │ Alergia │ Beliche │ ... │ ... │ Pgto │ Transporte │ Payment ID │ Status   │ Criado em  │
//! └──────┴───────┴──────────┴───────┴─────────┴─────────┴─────┴─────┴──────┴────────────┴────────────┴──────────┴────────────┘
//!                  B: lookup key                                                                       L: Pendente →
//!                                                                                                         Confirmado/Recusado
//! Perguntas (A2:D)
//! ┌───────────┬──────────┬──────────┬──────────┐
//! │ Data      │ Pergunta │ Status   │ Resposta │
//! └───────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Two implementations of [`SpreadsheetGateway`] are provided:
//!
//! - [`GoogleSheetsGateway`] talks to the Sheets v4 REST API.
//! - [`MemorySheetGateway`] keeps the same cell layout in memory, for
//!   development and tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use retreat_sheets::{GoogleSheetsGateway, SheetsConfig, SpreadsheetGateway};
//!
//! let sheets = GoogleSheetsGateway::new(SheetsConfig::from_env());
//! sheets.append_registrant(&record).await?;
//! sheets.update_payment_status("ana@x.com", PaymentStatus::Confirmed).await?;
//! ```

pub mod auth;
mod error;
pub mod gateway;
mod google;
mod memory;

pub use auth::{ServiceAccount, StaticToken, TokenSource};
pub use error::{Result, SheetsError};
pub use gateway::{SpreadsheetGateway, UpdateOutcome};
pub use google::{GoogleSheetsGateway, SheetsConfig};
pub use memory::MemorySheetGateway;
