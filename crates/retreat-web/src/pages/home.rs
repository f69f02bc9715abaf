//! Home Page

use leptos::prelude::*;
use retreat_core::{Field, FormController, FormVariant, Stage, SubmitOutcome};

use crate::api;
use crate::components::{
    BUNK_CHOICES, ErrorBanner, REFERRAL_CHOICES, SelectField, TextField, YES_NO_CHOICES,
    payment_label,
};

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <div class="home">
            <header class="hero">
                <h1>"Retiro Closer 2026"</h1>
                <p class="tagline">"Um fim de semana para se aproximar de Deus e de quem caminha com você"</p>
                <div class="cta">
                    <a href="#inscricao" class="btn btn-primary">"Quero me inscrever"</a>
                    <a href="/perguntas" class="btn">"Enviar uma pergunta"</a>
                </div>
            </header>

            <section class="features">
                <div class="feature">
                    <h3>"🏕️ Hospedagem"</h3>
                    <p>"Quartos com beliches, refeições inclusas."</p>
                </div>
                <div class="feature">
                    <h3>"🎶 Louvor"</h3>
                    <p>"Momentos de adoração, palavra e comunhão."</p>
                </div>
                <div class="feature">
                    <h3>"💬 Perguntas"</h3>
                    <p>"Envie dúvidas anônimas e veja as respostas."</p>
                </div>
            </section>

            <SignupForm />
        </div>
    }
}

/// "Already registered?" prompt followed by the multi-person form
#[component]
fn SignupForm() -> impl IntoView {
    let form = RwSignal::new(FormController::new(FormVariant::default()));

    // Nothing can have been typed while the prompt is still showing
    leptos::task::spawn_local(async move {
        let variant = api::form_variant().await;
        form.update(|f| {
            if f.stage() == Stage::Prompt && f.variant() != variant {
                *f = FormController::new(variant);
            }
        });
    });

    view! {
        <section id="inscricao" class="signup">
            <Show
                when=move || form.with(|f| f.stage() == Stage::Prompt)
                fallback=move || view! { <RegistrationForm form=form /> }
            >
                <div class="prompt">
                    <h2>"Você já se inscreveu?"</h2>
                    <div class="cta">
                        <a href="/pagamento" class="btn">"Sim, ir para o pagamento"</a>
                        <button
                            class="btn btn-primary"
                            on:click=move |_| form.update(FormController::start_registration)
                        >
                            "Não, quero me inscrever"
                        </button>
                    </div>
                </div>
            </Show>
        </section>
    }
}

#[component]
fn RegistrationForm(form: RwSignal<FormController>) -> impl IntoView {
    let (sending, set_sending) = signal(false);
    let (error, set_error) = signal(None::<String>);

    let variant = form.with_untracked(FormController::variant);
    let payment_choices: Vec<_> = variant
        .payment_methods()
        .iter()
        .map(|&method| (method.as_str(), payment_label(method)))
        .collect();

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if sending.get_untracked() {
            return;
        }

        let Some(SubmitOutcome::Ready(registrants)) = form.try_update(FormController::submit)
        else {
            return;
        };
        let payer = form.with_untracked(FormController::payer_summary);

        set_error.set(None);
        set_sending.set(true);
        leptos::task::spawn_local(async move {
            let done = api::register_all(&registrants)
                .await
                .and_then(|()| api::save_payer(&payer))
                .and_then(|()| api::navigate("/pagamento"));
            if let Err(e) = done {
                set_error.set(Some(e));
            }
            set_sending.set(false);
        });
    };

    let submit_label = move || {
        if sending.get() {
            "Enviando..."
        } else if form.with(FormController::on_last_draft) {
            "Finalizar inscrição"
        } else {
            "Próxima pessoa"
        }
    };

    view! {
        <form class="registration" on:submit=submit>
            <div class="progress">
                {move || {
                    let (position, total) = form.with(FormController::progress);
                    format!("Pessoa {position} de {total}")
                }}
            </div>

            <TextField form=form field=Field::Name label="Nome completo" />
            <TextField form=form field=Field::Email label="Email" input_type="email" />
            <TextField
                form=form
                field=Field::Phone
                label="Telefone"
                input_type="tel"
                placeholder="(51) 99999-9999"
            />
            <TextField form=form field=Field::Age label="Idade" input_type="text" />
            <TextField form=form field=Field::Allergy label="Alergia ou restrição alimentar" />
            <SelectField
                form=form
                field=Field::Bunk
                label="Preferência de beliche"
                choices=BUNK_CHOICES.to_vec()
            />
            <SelectField
                form=form
                field=Field::PriorAttendance
                label="Já participou do retiro?"
                choices=YES_NO_CHOICES.to_vec()
            />
            <SelectField
                form=form
                field=Field::Referral
                label="Como conheceu o retiro?"
                choices=REFERRAL_CHOICES.to_vec()
            />
            <SelectField
                form=form
                field=Field::PaymentMethod
                label="Forma de pagamento"
                choices=payment_choices
            />
            {variant
                .asks_transport()
                .then(|| {
                    view! {
                        <SelectField
                            form=form
                            field=Field::NeedsTransport
                            label="Precisa de transporte?"
                            choices=YES_NO_CHOICES.to_vec()
                        />
                    }
                })}

            <div class="actions">
                <button type="button" class="btn" on:click=move |_| form.update(FormController::add_draft)>
                    "+ Adicionar pessoa"
                </button>
                <Show when=move || form.with(|f| f.len() > 1)>
                    <button
                        type="button"
                        class="btn"
                        on:click=move |_| form.update(|f| {
                            f.remove_current();
                        })
                    >
                        "Remover esta pessoa"
                    </button>
                </Show>
                <button type="submit" class="btn btn-primary" disabled=move || sending.get()>
                    {submit_label}
                </button>
            </div>

            <ErrorBanner message=error />
        </form>
    }
}
