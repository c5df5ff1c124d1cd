//! CV analyzers: pluggable, trait-based backends that turn CV text into a `CvAnalysis`.
//!
//! `AppState` holds an `Arc<dyn CvAnalyzer>` chosen at startup: the LLM analyzer when
//! an API key is configured, the keyword analyzer otherwise.

use async_trait::async_trait;
use tracing::info;

use crate::cv::extract::truncate_chars;
use crate::cv::keywords::{analyze_keywords, find_email, find_phone};
use crate::cv::models::CvAnalysis;
use crate::cv::prompts::{CV_ANALYSIS_PROMPT, CV_ANALYSIS_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;

/// Characters of CV text sent to the model.
pub const MAX_CV_CHARS: usize = 12_000;

#[async_trait]
pub trait CvAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<CvAnalysis, AppError>;

    /// Short backend label, for logs.
    fn name(&self) -> String;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordCvAnalyzer (offline fallback)
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust analyzer: regexes for contact details, vocabularies for skills and languages.
pub struct KeywordCvAnalyzer;

#[async_trait]
impl CvAnalyzer for KeywordCvAnalyzer {
    async fn analyze(&self, text: &str) -> Result<CvAnalysis, AppError> {
        Ok(analyze_keywords(text))
    }

    fn name(&self) -> String {
        "keyword".to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmCvAnalyzer
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmCvAnalyzer(pub LlmClient);

pub fn build_prompt(text: &str) -> String {
    CV_ANALYSIS_PROMPT
        .replace("{no_invention}", NO_INVENTION_INSTRUCTION.trim())
        .replace("{cv_text}", truncate_chars(text, MAX_CV_CHARS))
}

/// Fills contact fields the model left empty from the regex heuristics.
pub fn complete_contact(mut analysis: CvAnalysis, text: &str) -> CvAnalysis {
    if analysis.candidate.email.is_none() {
        analysis.candidate.email = find_email(text);
    }
    if analysis.candidate.phone.is_none() {
        analysis.candidate.phone = find_phone(text);
    }
    analysis
}

#[async_trait]
impl CvAnalyzer for LlmCvAnalyzer {
    async fn analyze(&self, text: &str) -> Result<CvAnalysis, AppError> {
        let prompt = build_prompt(text);
        let system = format!("{CV_ANALYSIS_SYSTEM} {JSON_ONLY_SYSTEM}");
        let analysis: CvAnalysis = self
            .0
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("CV analysis failed: {e}")))?;

        info!(
            "LLM CV analysis: {} missions, {} technical skills",
            analysis.missions.len(),
            analysis.technical_skills.len()
        );

        let mut analysis = complete_contact(analysis, text);
        analysis.analyzer = self.name();
        Ok(analysis)
    }

    fn name(&self) -> String {
        format!("llm:{}", self.0.model())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_analyzer_runs_offline() {
        let analysis = KeywordCvAnalyzer
            .analyze("Python, Airflow et Anglais. Contact: a.b@corp.fr")
            .await
            .unwrap();
        assert_eq!(analysis.technical_skills, vec!["Python", "Airflow"]);
        assert_eq!(analysis.languages, vec!["Anglais"]);
        assert_eq!(analysis.candidate.email.as_deref(), Some("a.b@corp.fr"));
    }

    #[test]
    fn test_prompt_embeds_truncated_text() {
        let long = "x".repeat(MAX_CV_CHARS + 500);
        let prompt = build_prompt(&long);
        assert!(prompt.contains(&"x".repeat(MAX_CV_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_CV_CHARS + 1)));
        assert!(!prompt.contains("{cv_text}"));
        assert!(!prompt.contains("{no_invention}"));
    }

    #[test]
    fn test_complete_contact_keeps_model_values() {
        let mut analysis = CvAnalysis::default();
        analysis.candidate.email = Some("model@corp.fr".to_string());
        let completed = complete_contact(analysis, "regex@corp.fr 06 11 22 33 44");
        assert_eq!(completed.candidate.email.as_deref(), Some("model@corp.fr"));
        assert_eq!(completed.candidate.phone.as_deref(), Some("06 11 22 33 44"));
    }
}
