//! Form Input Masks
//!
//! Applied on every keystroke by the signup form before a value is stored in
//! the draft. Masks shape what the user sees; the validator still has the
//! final word.

use crate::error::Field;
use crate::sanitize::{digits_only, normalize_email};

const MAX_PHONE_DIGITS: usize = 11;
const MAX_AGE_DIGITS: usize = 3;

/// Apply the mask registered for `field`. Select fields pass through.
pub fn apply(field: Field, value: &str) -> String {
    match field {
        Field::Name => mask_name(value),
        Field::Email => normalize_email(value),
        Field::Phone => mask_phone(value),
        Field::Age => mask_age(value),
        Field::Allergy => mask_allergy(value),
        Field::Bunk
        | Field::PriorAttendance
        | Field::Referral
        | Field::PaymentMethod
        | Field::NeedsTransport => value.to_string(),
    }
}

/// Letters and whitespace only. Not trimmed, so the user can type spaces.
pub fn mask_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect()
}

/// Letters, whitespace and commas ("amendoim, camarão").
pub fn mask_allergy(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || *c == ',')
        .collect()
}

/// Up to three digits.
pub fn mask_age(value: &str) -> String {
    digits_only(value).chars().take(MAX_AGE_DIGITS).collect()
}

/// Regroup phone digits as `(AA) NNNN-NNNN` or `(AA) NNNNN-NNNN`.
///
/// Partial input is grouped as far as it goes: `"519"` → `"(51) 9"`.
pub fn mask_phone(value: &str) -> String {
    let digits: String = digits_only(value).chars().take(MAX_PHONE_DIGITS).collect();
    if digits.len() < 2 {
        return digits;
    }

    let (area, number) = digits.split_at(2);
    let head = if digits.len() <= 10 { 4 } else { 5 };
    if number.len() > head {
        let (first, last) = number.split_at(head);
        format!("({area}) {first}-{last}")
    } else {
        format!("({area}) {number}")
    }
}
