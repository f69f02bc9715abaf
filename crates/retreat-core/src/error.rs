//! Validation Error Types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for validation
pub type Result<T> = std::result::Result<T, ValidationErrors>;

/// A field of the signup form, named by its wire key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    #[serde(rename = "nome")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "telefone")]
    Phone,
    #[serde(rename = "idade")]
    Age,
    #[serde(rename = "alergia")]
    Allergy,
    #[serde(rename = "beliche")]
    Bunk,
    #[serde(rename = "participouAntes")]
    PriorAttendance,
    #[serde(rename = "comoConheceu")]
    Referral,
    #[serde(rename = "tipoPagamento")]
    PaymentMethod,
    #[serde(rename = "precisaTransporte")]
    NeedsTransport,
}

impl Field {
    /// All fields in form order
    pub const ALL: [Self; 10] = [
        Self::Name,
        Self::Email,
        Self::Phone,
        Self::Age,
        Self::Allergy,
        Self::Bunk,
        Self::PriorAttendance,
        Self::Referral,
        Self::PaymentMethod,
        Self::NeedsTransport,
    ];

    /// Key used in JSON bodies and form inputs
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Name => "nome",
            Self::Email => "email",
            Self::Phone => "telefone",
            Self::Age => "idade",
            Self::Allergy => "alergia",
            Self::Bunk => "beliche",
            Self::PriorAttendance => "participouAntes",
            Self::Referral => "comoConheceu",
            Self::PaymentMethod => "tipoPagamento",
            Self::NeedsTransport => "precisaTransporte",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.wire_name() == name)
    }
}

/// One failing field and its human-readable message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every failing field of one submission, in form order. Never empty.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("Dados inválidos: {}", self.messages().join("; "))]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Returns `None` when `errors` is empty
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// Built by the validator, which pushes one entry per `None` it returns
    pub(crate) fn from_failures(errors: Vec<FieldError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Message for a given field, if it failed
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Messages only, in order (the legacy `errors: [...]` response shape)
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.0
    }
}
