//! Domain Models
//!
//! Registrant records and the closed value sets the signup form accepts.
//! Wire values are the Portuguese strings the form and the spreadsheet use.

use serde::{Deserialize, Serialize};

/// Declares a closed enum whose variants map 1:1 onto wire strings.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every member of the set, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Exact, case-sensitive match against the wire value
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Preferred bunk bed position
    pub enum BunkPreference {
        Top => "cima",
        Bottom => "baixo",
        NoPreference => "sem_preferencia",
    }
}

wire_enum! {
    /// Binary answer used by "attended before" and "needs transport"
    pub enum YesNo {
        Yes => "sim",
        No => "nao",
    }
}

wire_enum! {
    /// How the registrant heard about the retreat
    pub enum ReferralSource {
        Instagram => "instagram",
        Facebook => "facebook",
        Whatsapp => "whatsapp",
        Friend => "amigo",
        Church => "igreja",
        Other => "outro",
    }
}

wire_enum! {
    /// Payment method chosen on the signup form
    pub enum PaymentMethod {
        Pix => "pix",
        Card => "cartao",
        Cash => "dinheiro",
    }
}

wire_enum! {
    /// Value of the spreadsheet's payment status column
    pub enum PaymentStatus {
        Confirmed => "Confirmado",
        Pending => "Pendente",
        Rejected => "Recusado",
    }
}

wire_enum! {
    /// Which edition of the signup form is being served.
    ///
    /// `Basic` accepts cash and has no transport question. `Transport` asks
    /// whether the registrant needs a ride and only offers PIX or card.
    pub enum FormVariant {
        Basic => "basic",
        Transport => "transport",
    }
}

impl Default for FormVariant {
    fn default() -> Self {
        Self::Basic
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl FormVariant {
    /// Payment methods this variant offers
    pub const fn payment_methods(self) -> &'static [PaymentMethod] {
        match self {
            Self::Basic => &[PaymentMethod::Pix, PaymentMethod::Card, PaymentMethod::Cash],
            Self::Transport => &[PaymentMethod::Pix, PaymentMethod::Card],
        }
    }

    /// Whether the transport question is asked (and required)
    pub const fn asks_transport(self) -> bool {
        matches!(self, Self::Transport)
    }
}

/// A validated, sanitized registrant.
///
/// Only [`crate::Validator`] produces these; every field already satisfies
/// its rule and free text is HTML-escaped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantRecord {
    /// Letters and whitespace only, 3-100 chars
    #[serde(rename = "nome")]
    pub name: String,

    /// Lower-cased, whitespace-free
    pub email: String,

    /// Digits only, optional 2-digit area code
    #[serde(rename = "telefone")]
    pub phone: String,

    #[serde(rename = "idade")]
    pub age: u8,

    /// Escaped free text, empty when not provided
    #[serde(rename = "alergia")]
    pub allergy: String,

    #[serde(rename = "beliche")]
    pub bunk: BunkPreference,

    #[serde(rename = "participouAntes")]
    pub prior_attendance: YesNo,

    #[serde(rename = "comoConheceu")]
    pub referral: ReferralSource,

    #[serde(rename = "tipoPagamento")]
    pub payment_method: PaymentMethod,

    /// Present only for [`FormVariant::Transport`]
    #[serde(rename = "precisaTransporte", default, skip_serializing_if = "Option::is_none")]
    pub needs_transport: Option<YesNo>,
}

/// An anonymous question as listed back from the question sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// 1-based position in the sheet
    pub id: usize,

    /// Submission timestamp as written to the sheet
    #[serde(rename = "data")]
    pub submitted_at: String,

    #[serde(rename = "pergunta")]
    pub text: String,

    /// Free-form; organizers edit it by hand in the sheet
    pub status: String,

    #[serde(rename = "resposta")]
    pub reply: String,
}
