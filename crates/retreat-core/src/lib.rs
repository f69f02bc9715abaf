//! # retreat-core
//!
//! Domain types, field validation and signup form state for the retreat
//! registration site.
//!
//! ## Registration flow
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ FormController│──▶│  Validator  │──▶│ Spreadsheet  │──▶│   Webhook    │
//! │ (browser)    │    │  (server)   │    │ row Pendente │    │ Confirmado / │
//! └──────────────┘    └─────────────┘    └──────────────┘    │ Recusado     │
//!                                                            └──────────────┘
//! ```
//!
//! Everything in this crate is pure: no I/O, no clocks. The same
//! [`Validator`] runs in the browser (via `retreat-web`) and on the server.
//!
//! ## Usage
//!
//! ```rust
//! use retreat_core::{FormVariant, RawRegistrant, Validator};
//!
//! let raw: RawRegistrant = serde_json::from_value(serde_json::json!({
//!     "nome": "Ana Silva",
//!     "email": "ANA@X.com ",
//!     "telefone": "(51) 98765-4321",
//!     "idade": "20",
//!     "beliche": "baixo",
//!     "participouAntes": "nao",
//!     "comoConheceu": "instagram",
//!     "tipoPagamento": "pix",
//! })).unwrap();
//!
//! let record = Validator::new(FormVariant::Basic).validate(&raw).unwrap();
//! assert_eq!(record.email, "ana@x.com");
//! assert_eq!(record.phone, "51987654321");
//! ```

pub mod error;
pub mod form;
pub mod mask;
pub mod model;
pub mod sanitize;
pub mod validation;

pub use error::{Field, FieldError, ValidationErrors};
pub use form::{FormController, PayerSummary, RegistrantDraft, Stage, SubmitOutcome};
pub use model::{
    BunkPreference, FormVariant, PaymentMethod, PaymentStatus, Question, RegistrantRecord,
    ReferralSource, YesNo,
};
pub use validation::{RawRegistrant, Validator};

/// Maximum length of an anonymous question, in characters.
pub const MAX_QUESTION_CHARS: usize = 1000;
