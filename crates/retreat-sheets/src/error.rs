//! Spreadsheet Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SheetsError>;

/// Spreadsheet gateway errors
#[derive(Error, Debug)]
pub enum SheetsError {
    /// Sheet id or credential missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token exchange failed or the API refused the credential
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure talking to Google
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success response from the Sheets API
    #[error("Sheets API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// In-memory store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SheetsError {
    /// Check if a later manual retry could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            Self::Config(_) => "Planilha não configurada.",
            Self::Auth(_) => "Falha de autenticação com a planilha.",
            _ => "Erro ao acessar a planilha. Tente novamente.",
        }
    }
}
