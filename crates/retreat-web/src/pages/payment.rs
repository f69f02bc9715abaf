//! Payment Pages

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use retreat_core::PaymentMethod;
use rust_decimal::Decimal;

use crate::api::{self, PaymentRequest};
use crate::components::ErrorBanner;

/// Per-person price paid by PIX
const PIX_PRICE: i64 = 289;

/// Per-person price paid by card, before installment interest
const CARD_PRICE: i64 = 296;

#[component]
pub fn PaymentPage() -> impl IntoView {
    let Some(payer) = api::load_payer() else {
        return view! {
            <div class="payment">
                <h1>"Nenhuma inscrição encontrada"</h1>
                <p>"Faça sua inscrição antes de pagar."</p>
                <a href="/#inscricao" class="btn btn-primary">"Ir para a inscrição"</a>
            </div>
        }
        .into_any();
    };

    let (loading, set_loading) = signal(false);
    let (error, set_error) = signal(None::<String>);
    let (plan, set_plan) = signal(Vec::<api::Installment>::new());

    let query = use_query_map();
    let canceled = move || query.with(|q| q.get("canceled").is_some_and(|v| v == "true"));

    leptos::task::spawn_local(async move {
        if let Ok(rows) = api::installments().await {
            set_plan.set(rows);
        }
    });

    let people = Decimal::from(payer.registrant_count.max(1));
    let pix_total = Decimal::from(PIX_PRICE) * people;
    let card_total = Decimal::from(CARD_PRICE) * people;
    let heading = format!("{}, complete seu pagamento", payer.name);
    let payer = StoredValue::new(payer);

    let pay = move |method: PaymentMethod, amount: Decimal| {
        if loading.get_untracked() {
            return;
        }
        let request = payer.with_value(|p| PaymentRequest::new(p, amount, method));

        set_error.set(None);
        set_loading.set(true);
        leptos::task::spawn_local(async move {
            let redirected = api::initiate_payment(&request)
                .await
                .and_then(|url| api::navigate(&url));
            if let Err(e) = redirected {
                set_error.set(Some(e));
            }
            set_loading.set(false);
        });
    };

    view! {
        <div class="payment">
            <h1>{heading}</h1>
            <p class="subtitle">"Escolha a forma de pagamento mais conveniente"</p>

            <Show when=canceled>
                <div class="notice">"Pagamento cancelado. Você pode tentar novamente."</div>
            </Show>

            <div class="methods">
                <button
                    class="method pix"
                    disabled=move || loading.get()
                    on:click=move |_| pay(PaymentMethod::Pix, pix_total)
                >
                    <h3>"📲 PIX"</h3>
                    <p>"Pagamento instantâneo"</p>
                    <p class="price">{format!("R$ {pix_total:.2}")}</p>
                </button>

                <button
                    class="method card"
                    disabled=move || loading.get()
                    on:click=move |_| pay(PaymentMethod::Card, card_total)
                >
                    <h3>"💳 Cartão de crédito"</h3>
                    <p>"Parcelado com juros"</p>
                    <p class="price">{format!("R$ {card_total:.2}")}</p>
                </button>
            </div>

            <Show when=move || !plan.with(Vec::is_empty)>
                <details class="installments">
                    <summary>"Simulação de parcelamento (por pessoa)"</summary>
                    <ul>
                        <For
                            each=move || plan.get()
                            key=|row| row.installments
                            children=|row| {
                                view! {
                                    <li>
                                        {format!(
                                            "{}x de R$ {:.2} (total R$ {:.2})",
                                            row.installments,
                                            row.per_installment,
                                            row.total,
                                        )}
                                    </li>
                                }
                            }
                        />
                    </ul>
                </details>
            </Show>

            <ErrorBanner message=error />

            <ul class="info">
                <li>"✓ Seu pagamento é processado com segurança pelo provedor"</li>
                <li>"✓ A confirmação aparece na planilha assim que o pagamento é aprovado"</li>
            </ul>
        </div>
    }
    .into_any()
}

#[component]
pub fn PaymentSuccessPage() -> impl IntoView {
    view! {
        <div class="payment-result">
            <h1>"✅ Pagamento recebido!"</h1>
            <p>"Sua inscrição será confirmada assim que o provedor aprovar o pagamento."</p>
            <a href="/" class="btn">"Voltar ao início"</a>
        </div>
    }
}

#[component]
pub fn PaymentPendingPage() -> impl IntoView {
    view! {
        <div class="payment-result">
            <h1>"⏳ Pagamento pendente"</h1>
            <p>"Assim que o pagamento for compensado, sua inscrição será confirmada."</p>
            <a href="/" class="btn">"Voltar ao início"</a>
        </div>
    }
}
