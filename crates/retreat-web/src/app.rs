//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::pages::{
    AnswersPage, HomePage, PaymentPage, PaymentPendingPage, PaymentSuccessPage, QuestionsPage,
};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <main class="app">
                <Routes fallback=|| view! { <p>"Página não encontrada"</p> }>
                    <Route path=path!("/") view=HomePage />
                    <Route path=path!("/pagamento") view=PaymentPage />
                    <Route path=path!("/pagamento/sucesso") view=PaymentSuccessPage />
                    <Route path=path!("/pagamento/pendente") view=PaymentPendingPage />
                    <Route path=path!("/perguntas") view=QuestionsPage />
                    <Route path=path!("/respostas") view=AnswersPage />
                </Routes>
            </main>
        </Router>
    }
}
