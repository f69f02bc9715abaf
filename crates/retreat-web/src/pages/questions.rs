//! Anonymous Questions

use leptos::prelude::*;
use retreat_core::{MAX_QUESTION_CHARS, Question};

use crate::api;
use crate::components::ErrorBanner;

#[component]
pub fn QuestionsPage() -> impl IntoView {
    let (text, set_text) = signal(String::new());
    let (sending, set_sending) = signal(false);
    let (notice, set_notice) = signal(None::<String>);
    let (error, set_error) = signal(None::<String>);

    let remaining = move || MAX_QUESTION_CHARS.saturating_sub(text.with(|t| t.chars().count()));

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if sending.get_untracked() {
            return;
        }

        let question = text.get_untracked();
        if question.trim().is_empty() {
            set_error.set(Some("Pergunta não pode estar vazia".into()));
            return;
        }

        set_error.set(None);
        set_notice.set(None);
        set_sending.set(true);
        leptos::task::spawn_local(async move {
            match api::submit_question(&question).await {
                Ok(message) => {
                    set_text.set(String::new());
                    set_notice.set(Some(message));
                }
                Err(message) => set_error.set(Some(message)),
            }
            set_sending.set(false);
        });
    };

    view! {
        <div class="questions">
            <h1>"Pergunta anônima"</h1>
            <p class="subtitle">"Ninguém vai saber quem perguntou."</p>

            <form on:submit=submit>
                <textarea
                    placeholder="Escreva sua pergunta..."
                    maxlength=MAX_QUESTION_CHARS.to_string()
                    prop:value=move || text.get()
                    on:input=move |ev| set_text.set(event_target_value(&ev))
                />
                <div class="counter">{move || format!("{} caracteres restantes", remaining())}</div>
                <button type="submit" class="btn btn-primary" disabled=move || sending.get()>
                    {move || if sending.get() { "Enviando..." } else { "Enviar pergunta" }}
                </button>
            </form>

            {move || notice.get().map(|message| view! { <div class="notice">"✅ " {message}</div> })}
            <ErrorBanner message=error />

            <a href="/respostas">"Ver perguntas respondidas"</a>
        </div>
    }
}

#[component]
pub fn AnswersPage() -> impl IntoView {
    let (questions, set_questions) = signal(Vec::<Question>::new());
    let (loading, set_loading) = signal(true);
    let (error, set_error) = signal(None::<String>);

    leptos::task::spawn_local(async move {
        match api::list_questions().await {
            Ok(list) => set_questions.set(list),
            Err(e) => set_error.set(Some(e)),
        }
        set_loading.set(false);
    });

    view! {
        <div class="answers">
            <h1>"Perguntas e respostas"</h1>

            <Show when=move || loading.get()>
                <p class="loading">"Carregando..."</p>
            </Show>
            <ErrorBanner message=error />

            <For
                each=move || questions.get()
                key=|question| question.id
                children=|question| {
                    let reply = question.reply;
                    view! {
                        <article class="question">
                            <p class="text">{question.text}</p>
                            <span class="status">{question.status}</span>
                            {(!reply.is_empty()).then(move || view! { <p class="reply">{reply}</p> })}
                            <time>{question.submitted_at}</time>
                        </article>
                    }
                }
            />

            <a href="/perguntas">"Enviar uma pergunta"</a>
        </div>
    }
}
