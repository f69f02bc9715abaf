//! Payment Error Types

use serde_json::Value;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Intent rejected before any provider call
    #[error("Invalid payment intent: {0}")]
    InvalidIntent(String),

    /// The selected provider cannot charge this method
    #[error("{provider} does not support {method}")]
    UnsupportedMethod {
        provider: &'static str,
        method: &'static str,
    },

    /// Provider answered but without a redirect or session id
    #[error("{provider} rejected the checkout: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
        details: Value,
    },

    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Transport-level failure talking to a provider
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Stripe(_) | Self::Network(_))
    }

    /// Whether the caller, not the server, is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidIntent(_) | Self::UnsupportedMethod { .. } | Self::Rejected { .. }
        )
    }

    /// Raw provider payload or message to pass back as `details`
    pub fn details(&self) -> Value {
        match self {
            Self::Rejected { details, .. } => details.clone(),
            other => Value::String(other.to_string()),
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            Self::InvalidIntent(_) => "Dados de pagamento inválidos.",
            Self::UnsupportedMethod { .. } => "Forma de pagamento indisponível.",
            Self::Rejected { .. } => "Erro ao gerar pagamento.",
            Self::Config(_) => "Pagamento não configurado.",
            _ => "Erro ao processar pagamento.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejection_keeps_raw_payload() {
        let error = PaymentError::Rejected {
            provider: "mercadopago",
            message: "no init_point".into(),
            details: json!({ "message": "invalid token" }),
        };
        assert!(error.is_client_error());
        assert!(!error.is_retryable());
        assert_eq!(error.details()["message"], "invalid token");
    }

    #[test]
    fn test_config_is_server_side() {
        let error = PaymentError::Config("MERCADOPAGO_ACCESS_TOKEN not set".into());
        assert!(!error.is_client_error());
        assert_eq!(error.user_message(), "Pagamento não configurado.");
    }
}
