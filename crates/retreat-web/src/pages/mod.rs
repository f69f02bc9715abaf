//! Page Components

mod home;
mod payment;
mod questions;

pub use home::HomePage;
pub use payment::{PaymentPage, PaymentPendingPage, PaymentSuccessPage};
pub use questions::{AnswersPage, QuestionsPage};
