//! UI Components

use leptos::prelude::*;
use retreat_core::{Field, FormController, PaymentMethod};

/// Choices for a `<select>`: wire value and label
pub type Choices = &'static [(&'static str, &'static str)];

pub const BUNK_CHOICES: Choices = &[
    ("cima", "Cima"),
    ("baixo", "Baixo"),
    ("sem_preferencia", "Sem preferência"),
];

pub const YES_NO_CHOICES: Choices = &[("sim", "Sim"), ("nao", "Não")];

pub const REFERRAL_CHOICES: Choices = &[
    ("instagram", "Instagram"),
    ("facebook", "Facebook"),
    ("whatsapp", "WhatsApp"),
    ("amigo", "Amigo"),
    ("igreja", "Igreja"),
    ("outro", "Outro"),
];

pub const fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Pix => "PIX",
        PaymentMethod::Card => "Cartão de crédito",
        PaymentMethod::Cash => "Dinheiro (no local)",
    }
}

fn field_error(form: RwSignal<FormController>, field: Field) -> impl IntoView {
    move || {
        form.with(|f| {
            f.error(field)
                .map(|message| view! { <span class="field-error">{message.to_string()}</span> })
        })
    }
}

/// Text input bound to one field of the focused draft
#[component]
pub fn TextField(
    form: RwSignal<FormController>,
    field: Field,
    label: &'static str,
    #[prop(default = "text")] input_type: &'static str,
    #[prop(optional)] placeholder: &'static str,
) -> impl IntoView {
    view! {
        <div class="field" class:invalid=move || form.with(|f| f.error(field).is_some())>
            <label>{label}</label>
            <input
                type=input_type
                placeholder=placeholder
                prop:value=move || form.with(|f| f.current().value(field).to_string())
                on:input=move |ev| form.update(|f| f.edit(field, &event_target_value(&ev)))
            />
            {field_error(form, field)}
        </div>
    }
}

/// Select bound to one field of the focused draft
#[component]
pub fn SelectField(
    form: RwSignal<FormController>,
    field: Field,
    label: &'static str,
    choices: Vec<(&'static str, &'static str)>,
) -> impl IntoView {
    view! {
        <div class="field" class:invalid=move || form.with(|f| f.error(field).is_some())>
            <label>{label}</label>
            <select
                prop:value=move || form.with(|f| f.current().value(field).to_string())
                on:change=move |ev| form.update(|f| f.edit(field, &event_target_value(&ev)))
            >
                <option value="">"Selecione"</option>
                {choices
                    .into_iter()
                    .map(|(value, text)| view! { <option value=value>{text}</option> })
                    .collect_view()}
            </select>
            {field_error(form, field)}
        </div>
    }
}

/// Banner for a request failure
#[component]
pub fn ErrorBanner(message: ReadSignal<Option<String>>) -> impl IntoView {
    move || {
        message
            .get()
            .map(|message| view! { <div class="error-banner">"❌ " {message}</div> })
    }
}
