// CV analysis: text extraction from uploads and structured profile extraction.
// All model calls go through llm_client.

pub mod analyzer;
pub mod extract;
pub mod keywords;
pub mod models;
pub mod prompts;
