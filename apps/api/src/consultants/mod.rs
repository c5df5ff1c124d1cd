// Consultant profiles: search, derived figures, CRUD and statistics.

pub mod handlers;
pub mod metrics;
pub mod query;
pub mod service;
