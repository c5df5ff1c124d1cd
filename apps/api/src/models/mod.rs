pub mod business_manager;
pub mod competence;
pub mod consultant;
pub mod document;
pub mod mission;
pub mod practice;
