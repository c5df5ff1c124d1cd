// Missions: consultant assignments at clients, with TJM and derived revenue.

pub mod handlers;
pub mod service;
