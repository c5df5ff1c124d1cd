//! Rule-based French chatbot: classify the question, pick out known names,
//! run the matching query and phrase the answer.

pub mod answers;
pub mod entities;
pub mod handlers;
pub mod history;
pub mod intent;
pub mod service;
