//! Registrant Validation
//!
//! Turns one untrusted form submission into a [`RegistrantRecord`], or
//! reports every failing field at once. Validation is all-or-nothing: a
//! record is produced only when no field fails.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::error::{Field, FieldError, ValidationErrors};
use crate::model::{
    BunkPreference, FormVariant, PaymentMethod, ReferralSource, RegistrantRecord, YesNo,
};
use crate::sanitize::{
    MAX_ALLERGY_CHARS, MAX_EMAIL_CHARS, digits_only, normalize_email, sanitize_name,
    sanitize_text,
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})?\d{8,9}$").expect("phone pattern compiles"));

const MIN_NAME_CHARS: usize = 3;
const MIN_AGE: u8 = 11;
const MAX_AGE: u8 = 120;

/// Raw registrant payload exactly as the form posts it.
///
/// Every field is optional at this layer; presence is a validation rule, not
/// a parse rule. Numbers are accepted wherever a string is expected, so
/// `"idade": 20` and `"idade": "20"` are equivalent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRegistrant {
    #[serde(rename = "nome", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(rename = "telefone", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(rename = "idade", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    #[serde(rename = "alergia", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub allergy: Option<String>,

    #[serde(rename = "beliche", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub bunk: Option<String>,

    #[serde(rename = "participouAntes", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub prior_attendance: Option<String>,

    #[serde(rename = "comoConheceu", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,

    #[serde(rename = "tipoPagamento", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,

    #[serde(rename = "precisaTransporte", default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub needs_transport: Option<String>,
}

/// Accepts a JSON string, number or boolean as text; `null` as absent.
/// Objects and arrays are a parse error.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

impl RawRegistrant {
    /// Value of a field by its form key
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Age => &self.age,
            Field::Allergy => &self.allergy,
            Field::Bunk => &self.bunk,
            Field::PriorAttendance => &self.prior_attendance,
            Field::Referral => &self.referral,
            Field::PaymentMethod => &self.payment_method,
            Field::NeedsTransport => &self.needs_transport,
        };
        value.as_deref()
    }
}

/// Field-level validator for one registrant.
///
/// Checks every field independently and collects all failures; never stops
/// at the first one.
#[derive(Clone, Copy, Debug, Default)]
pub struct Validator {
    variant: FormVariant,
}

impl Validator {
    pub const fn new(variant: FormVariant) -> Self {
        Self { variant }
    }

    pub const fn variant(&self) -> FormVariant {
        self.variant
    }

    /// Validate and sanitize one submission
    pub fn validate(
        &self,
        raw: &RawRegistrant,
    ) -> std::result::Result<RegistrantRecord, ValidationErrors> {
        let mut errors = Vec::new();

        let name = collect(&mut errors, Field::Name, validate_name(raw.name.as_deref()));
        let email = collect(&mut errors, Field::Email, validate_email(raw.email.as_deref()));
        let phone = collect(&mut errors, Field::Phone, validate_phone(raw.phone.as_deref()));
        let age = collect(&mut errors, Field::Age, validate_age(raw.age.as_deref()));
        let allergy = sanitize_allergy(raw.allergy.as_deref());
        let bunk = collect(
            &mut errors,
            Field::Bunk,
            closed_set(raw.bunk.as_deref(), BunkPreference::parse, "Beliche inválido"),
        );
        let prior_attendance = collect(
            &mut errors,
            Field::PriorAttendance,
            closed_set(
                raw.prior_attendance.as_deref(),
                YesNo::parse,
                "Campo de experiência inválido",
            ),
        );
        let referral = collect(
            &mut errors,
            Field::Referral,
            closed_set(
                raw.referral.as_deref(),
                ReferralSource::parse,
                "Campo \"Como soube\" inválido",
            ),
        );
        let payment_method = collect(
            &mut errors,
            Field::PaymentMethod,
            self.validate_payment_method(raw.payment_method.as_deref()),
        );
        let needs_transport = if self.variant.asks_transport() {
            collect(
                &mut errors,
                Field::NeedsTransport,
                closed_set(raw.needs_transport.as_deref(), YesNo::parse, "Transporte inválido"),
            )
            .map(Some)
        } else {
            Some(None)
        };

        let (
            Some(name),
            Some(email),
            Some(phone),
            Some(age),
            Some(bunk),
            Some(prior_attendance),
            Some(referral),
            Some(payment_method),
            Some(needs_transport),
        ) = (
            name,
            email,
            phone,
            age,
            bunk,
            prior_attendance,
            referral,
            payment_method,
            needs_transport,
        )
        else {
            tracing::debug!(failed = errors.len(), "Registrant rejected");
            return Err(ValidationErrors::from_failures(errors));
        };

        Ok(RegistrantRecord {
            name,
            email,
            phone,
            age,
            allergy,
            bunk,
            prior_attendance,
            referral,
            payment_method,
            needs_transport,
        })
    }

    fn validate_payment_method(&self, value: Option<&str>) -> Result<PaymentMethod, String> {
        const MESSAGE: &str = "Tipo de pagamento inválido";
        let method = closed_set(value, PaymentMethod::parse, MESSAGE)?;
        if self.variant.payment_methods().contains(&method) {
            Ok(method)
        } else {
            Err(MESSAGE.into())
        }
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, field: Field, result: Result<T, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_name(value: Option<&str>) -> Result<String, String> {
    let value = present(value).ok_or("Nome é obrigatório")?;
    let name = sanitize_name(value);
    if name.chars().count() < MIN_NAME_CHARS {
        return Err("Nome deve ter no mínimo 3 caracteres".into());
    }
    Ok(name)
}

fn validate_email(value: Option<&str>) -> Result<String, String> {
    const MESSAGE: &str = "Email inválido";
    let email = normalize_email(present(value).ok_or(MESSAGE)?);
    if email.chars().count() > MAX_EMAIL_CHARS || !EMAIL_PATTERN.is_match(&email) {
        return Err(MESSAGE.into());
    }
    // Stored verbatim: payment lookups match on it
    Ok(email)
}

fn validate_phone(value: Option<&str>) -> Result<String, String> {
    const MESSAGE: &str = "Telefone inválido";
    let digits = digits_only(present(value).ok_or(MESSAGE)?);
    if PHONE_PATTERN.is_match(&digits) {
        Ok(digits)
    } else {
        Err(MESSAGE.into())
    }
}

fn validate_age(value: Option<&str>) -> Result<u8, String> {
    const MESSAGE: &str = "Idade deve estar entre 11 e 120 anos";
    let age: i64 = present(value)
        .and_then(|v| v.trim().parse().ok())
        .ok_or(MESSAGE)?;
    u8::try_from(age)
        .ok()
        .filter(|age| (MIN_AGE..=MAX_AGE).contains(age))
        .ok_or_else(|| MESSAGE.into())
}

fn sanitize_allergy(value: Option<&str>) -> String {
    value
        .map(|v| sanitize_text(v, MAX_ALLERGY_CHARS))
        .unwrap_or_default()
}

fn closed_set<T>(
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    message: &str,
) -> Result<T, String> {
    value.and_then(parse).ok_or_else(|| message.to_string())
}
