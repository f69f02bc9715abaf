//! Signup Form Controller
//!
//! Browser-side state for the signup form, kept free of any UI framework so
//! it can be driven by the Leptos front-end and tested natively.
//!
//! ```text
//!   Prompt ──"já inscrito"──▶ go to payment
//!     │
//!     └──"quero me inscrever"──▶ Registration
//!                                  │  edit ─▶ mask ─▶ draft
//!                                  │  submit current draft
//!                                  ├─ invalid ─▶ inline errors, stay
//!                                  ├─ valid, more drafts ─▶ next draft
//!                                  └─ all valid ─▶ Ready(payloads)
//! ```
//!
//! Sending the payloads, storing the [`PayerSummary`] and navigating are the
//! caller's job; the controller only decides what should happen next.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationErrors};
use crate::mask;
use crate::model::FormVariant;
use crate::sanitize::digits_only;
use crate::validation::{RawRegistrant, Validator};

/// Which screen of the signup flow is showing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// "Você já se inscreveu?"
    Prompt,
    /// Filling in one or more registrants
    Registration,
}

/// One in-progress registrant, exactly as typed (after masking)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantDraft {
    values: BTreeMap<Field, String>,
}

impl RegistrantDraft {
    /// Current value of a field; empty when untouched
    pub fn value(&self, field: Field) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    fn set(&mut self, field: Field, value: String) {
        self.values.insert(field, value);
    }

    /// Payload for the registration endpoint. Empty fields are omitted.
    pub fn to_raw(&self) -> RawRegistrant {
        let take = |field| {
            let value = self.value(field);
            (!value.is_empty()).then(|| value.to_string())
        };
        RawRegistrant {
            name: take(Field::Name),
            email: take(Field::Email),
            phone: take(Field::Phone),
            age: take(Field::Age),
            allergy: take(Field::Allergy),
            bunk: take(Field::Bunk),
            prior_attendance: take(Field::PriorAttendance),
            referral: take(Field::Referral),
            payment_method: take(Field::PaymentMethod),
            needs_transport: take(Field::NeedsTransport),
        }
    }
}

/// Minimal payer details handed to the payment page through local storage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerSummary {
    #[serde(rename = "nome")]
    pub name: String,

    pub email: String,

    /// Digits only
    #[serde(rename = "telefone")]
    pub phone: String,

    #[serde(rename = "quantidadeInscritos")]
    pub registrant_count: usize,
}

/// What the caller should do after a submit
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Show these errors next to their fields; the focus did not move
    Invalid(ValidationErrors),
    /// The focused draft passed; focus moved to the draft at this index
    Advanced(usize),
    /// Every draft passed; send these payloads in order
    Ready(Vec<RawRegistrant>),
}

/// Multi-registrant signup form state
#[derive(Clone, Debug)]
pub struct FormController {
    validator: Validator,
    stage: Stage,
    drafts: Vec<RegistrantDraft>,
    current: usize,
    errors: BTreeMap<Field, String>,
}

impl FormController {
    pub fn new(variant: FormVariant) -> Self {
        Self {
            validator: Validator::new(variant),
            stage: Stage::Prompt,
            drafts: vec![RegistrantDraft::default()],
            current: 0,
            errors: BTreeMap::new(),
        }
    }

    pub const fn stage(&self) -> Stage {
        self.stage
    }

    pub const fn variant(&self) -> FormVariant {
        self.validator.variant()
    }

    /// Leave the prompt and show the form
    pub fn start_registration(&mut self) {
        self.stage = Stage::Registration;
    }

    pub fn drafts(&self) -> &[RegistrantDraft] {
        &self.drafts
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    /// Always false; the controller keeps at least one draft
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub const fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &RegistrantDraft {
        &self.drafts[self.current]
    }

    /// `(position, total)` for the "Pessoa 1 de 3" indicator
    pub fn progress(&self) -> (usize, usize) {
        (self.current + 1, self.drafts.len())
    }

    /// Inline error for a field of the focused draft
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Whether the focused draft is the last one
    pub fn on_last_draft(&self) -> bool {
        self.current + 1 == self.drafts.len()
    }

    /// Store a keystroke into the focused draft, masked, and clear that
    /// field's error.
    pub fn edit(&mut self, field: Field, value: &str) {
        let masked = mask::apply(field, value);
        self.drafts[self.current].set(field, masked);
        self.errors.remove(&field);
    }

    /// Append an empty draft. Focus stays where it is.
    pub fn add_draft(&mut self) {
        self.drafts.push(RegistrantDraft::default());
    }

    /// Drop the focused draft and step back one. Refuses to remove the last
    /// remaining draft.
    pub fn remove_current(&mut self) -> bool {
        if self.drafts.len() <= 1 {
            return false;
        }
        self.drafts.remove(self.current);
        self.current = self.current.saturating_sub(1);
        self.errors.clear();
        true
    }

    /// Validate the focused draft and decide the next step
    pub fn submit(&mut self) -> SubmitOutcome {
        self.errors.clear();

        if let Err(errors) = self.validator.validate(&self.current().to_raw()) {
            self.show(&errors);
            return SubmitOutcome::Invalid(errors);
        }

        if !self.on_last_draft() {
            self.current += 1;
            tracing::debug!(index = self.current, "Advanced to next registrant");
            return SubmitOutcome::Advanced(self.current);
        }

        // Earlier drafts passed when they were left, but re-check them all
        // before anything is sent.
        for (index, draft) in self.drafts.iter().enumerate() {
            if let Err(errors) = self.validator.validate(&draft.to_raw()) {
                self.current = index;
                self.show(&errors);
                return SubmitOutcome::Invalid(errors);
            }
        }

        SubmitOutcome::Ready(self.drafts.iter().map(RegistrantDraft::to_raw).collect())
    }

    /// Summary of the first registrant, who is treated as the payer
    pub fn payer_summary(&self) -> PayerSummary {
        let payer = &self.drafts[0];
        PayerSummary {
            name: payer.value(Field::Name).trim().to_string(),
            email: payer.value(Field::Email).to_string(),
            phone: digits_only(payer.value(Field::Phone)),
            registrant_count: self.drafts.len(),
        }
    }

    fn show(&mut self, errors: &ValidationErrors) {
        self.errors = errors
            .iter()
            .map(|e| (e.field, e.message.clone()))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(form: &mut FormController, name: &str, email: &str) {
        form.edit(Field::Name, name);
        form.edit(Field::Email, email);
        form.edit(Field::Phone, "51987654321");
        form.edit(Field::Age, "20");
        form.edit(Field::Bunk, "baixo");
        form.edit(Field::PriorAttendance, "nao");
        form.edit(Field::Referral, "instagram");
        form.edit(Field::PaymentMethod, "pix");
    }

    #[test]
    fn test_starts_at_prompt_with_one_draft() {
        let mut form = FormController::new(FormVariant::Basic);
        assert_eq!(form.stage(), Stage::Prompt);
        assert_eq!(form.len(), 1);

        form.start_registration();
        assert_eq!(form.stage(), Stage::Registration);
    }

    #[test]
    fn test_edit_applies_masks() {
        let mut form = FormController::new(FormVariant::Basic);
        form.edit(Field::Phone, "51987654321");
        form.edit(Field::Email, " ANA@X.com ");
        form.edit(Field::Age, "20 anos");

        assert_eq!(form.current().value(Field::Phone), "(51) 98765-4321");
        assert_eq!(form.current().value(Field::Email), "ana@x.com");
        assert_eq!(form.current().value(Field::Age), "20");
    }

    #[test]
    fn test_invalid_submit_stays_and_shows_errors() {
        let mut form = FormController::new(FormVariant::Basic);
        form.add_draft();
        form.edit(Field::Name, "Ana Silva");

        let SubmitOutcome::Invalid(errors) = form.submit() else {
            panic!("expected errors");
        };
        assert!(errors.get(Field::Email).is_some());
        assert_eq!(form.current_index(), 0);
        assert!(form.error(Field::Email).is_some());
        assert!(form.error(Field::Name).is_none());

        form.edit(Field::Email, "ana@x.com");
        assert!(form.error(Field::Email).is_none());
    }

    #[test]
    fn test_submit_advances_then_completes() {
        let mut form = FormController::new(FormVariant::Basic);
        form.add_draft();
        assert_eq!(form.progress(), (1, 2));

        fill(&mut form, "Ana Silva", "ana@x.com");
        assert_eq!(form.submit(), SubmitOutcome::Advanced(1));
        assert_eq!(form.progress(), (2, 2));

        fill(&mut form, "Bruno Souza", "bruno@x.com");
        let SubmitOutcome::Ready(payloads) = form.submit() else {
            panic!("expected ready");
        };
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].email.as_deref(), Some("ana@x.com"));
        assert_eq!(payloads[1].phone.as_deref(), Some("(51) 98765-4321"));
        assert_eq!(payloads[0].allergy, None);
    }

    #[test]
    fn test_remove_keeps_at_least_one_draft() {
        let mut form = FormController::new(FormVariant::Basic);
        assert!(!form.remove_current());

        form.add_draft();
        form.add_draft();
        fill(&mut form, "Ana Silva", "ana@x.com");
        form.submit();
        assert_eq!(form.current_index(), 1);

        assert!(form.remove_current());
        assert_eq!(form.len(), 2);
        assert_eq!(form.current_index(), 0);
        assert_eq!(form.current().value(Field::Name), "Ana Silva");
    }

    #[test]
    fn test_payer_summary_uses_first_draft() {
        let mut form = FormController::new(FormVariant::Basic);
        fill(&mut form, "Ana Silva", "ana@x.com");
        form.add_draft();

        let summary = form.payer_summary();
        assert_eq!(summary.name, "Ana Silva");
        assert_eq!(summary.phone, "51987654321");
        assert_eq!(summary.registrant_count, 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["quantidadeInscritos"], 2);
        assert_eq!(json["telefone"], "51987654321");
    }

    #[test]
    fn test_transport_variant_needs_transport_field() {
        let mut form = FormController::new(FormVariant::Transport);
        fill(&mut form, "Ana Silva", "ana@x.com");

        let SubmitOutcome::Invalid(errors) = form.submit() else {
            panic!("expected errors");
        };
        assert_eq!(errors.len(), 1);

        form.edit(Field::NeedsTransport, "sim");
        assert!(matches!(form.submit(), SubmitOutcome::Ready(_)));
    }
}
