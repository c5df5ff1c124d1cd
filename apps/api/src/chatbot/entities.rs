//! Entity extraction against names that exist in the database.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::text::{contains_words, normalize};

/// Vocabulary terms shorter than this are ignored ("C", "R" would match everywhere).
const MIN_TERM_CHARS: usize = 2;
/// Last names alone must be at least this long to count as a mention.
const MIN_LAST_NAME_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultantRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entities {
    pub consultants: Vec<ConsultantRef>,
    pub clients: Vec<String>,
    pub practices: Vec<String>,
    pub competences: Vec<String>,
    pub languages: Vec<String>,
    pub numbers: Vec<i64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct NamedConsultant {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

/// Everything the extractor can recognise, loaded fresh for each question.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub consultants: Vec<NamedConsultant>,
    pub clients: Vec<String>,
    pub practices: Vec<String>,
    pub competences: Vec<String>,
    pub languages: Vec<String>,
}

impl Vocabulary {
    pub async fn load(pool: &PgPool) -> Result<Self, AppError> {
        let consultants = sqlx::query_as::<_, NamedConsultant>(
            "SELECT id, first_name, last_name FROM consultants ORDER BY last_name, first_name",
        )
        .fetch_all(pool)
        .await?;
        let clients = sqlx::query_scalar::<_, String>("SELECT DISTINCT client FROM missions")
            .fetch_all(pool)
            .await?;
        let practices = sqlx::query_scalar::<_, String>("SELECT name FROM practices")
            .fetch_all(pool)
            .await?;
        let competences = sqlx::query_scalar::<_, String>("SELECT name FROM competences")
            .fetch_all(pool)
            .await?;
        let languages = sqlx::query_scalar::<_, String>("SELECT name FROM languages")
            .fetch_all(pool)
            .await?;
        Ok(Self {
            consultants,
            clients,
            practices,
            competences,
            languages,
        })
    }
}

/// Finds vocabulary mentions in an already-normalized question.
pub fn extract_entities(question: &str, vocabulary: &Vocabulary) -> Entities {
    Entities {
        consultants: match_consultants(question, &vocabulary.consultants),
        clients: match_terms(question, &vocabulary.clients),
        practices: match_terms(question, &vocabulary.practices),
        competences: match_terms(question, &vocabulary.competences),
        languages: match_terms(question, &vocabulary.languages),
        numbers: question
            .split_whitespace()
            .filter_map(|token| token.parse::<i64>().ok())
            .collect(),
    }
}

/// Full names ("jean dupont" or "dupont jean") win; last names alone are
/// only used when no full name matched.
fn match_consultants(question: &str, consultants: &[NamedConsultant]) -> Vec<ConsultantRef> {
    let to_ref = |c: &NamedConsultant| ConsultantRef {
        id: c.id,
        name: format!("{} {}", c.first_name, c.last_name),
    };

    let full: Vec<ConsultantRef> = consultants
        .iter()
        .filter(|c| {
            let first = normalize(&c.first_name);
            let last = normalize(&c.last_name);
            contains_words(question, &format!("{first} {last}"))
                || contains_words(question, &format!("{last} {first}"))
        })
        .map(to_ref)
        .collect();
    if !full.is_empty() {
        return full;
    }

    consultants
        .iter()
        .filter(|c| {
            let last = normalize(&c.last_name);
            last.chars().count() >= MIN_LAST_NAME_CHARS && contains_words(question, &last)
        })
        .map(to_ref)
        .collect()
}

fn match_terms(question: &str, terms: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .filter(|term| {
            let needle = normalize(term);
            needle.chars().count() >= MIN_TERM_CHARS
                && contains_words(question, &needle)
                && seen.insert(needle)
        })
        .map(|term| term.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consultant(first: &str, last: &str) -> NamedConsultant {
        NamedConsultant {
            id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    fn vocabulary() -> Vocabulary {
        Vocabulary {
            consultants: vec![
                consultant("Jean", "Dupont"),
                consultant("Marie", "Dupont"),
                consultant("Hélène", "Lefèvre"),
                consultant("Li", "Wu"),
            ],
            clients: vec!["Société Générale".to_string(), "AXA".to_string()],
            practices: vec!["Data".to_string(), "Cloud & DevOps".to_string()],
            competences: vec![
                "Java".to_string(),
                "JavaScript".to_string(),
                "C".to_string(),
                "Node.js".to_string(),
            ],
            languages: vec!["Anglais".to_string(), "Espagnol".to_string()],
        }
    }

    #[test]
    fn test_full_name_beats_shared_last_name() {
        let e = extract_entities(&normalize("Quel est le salaire de Marie Dupont ?"), &vocabulary());
        assert_eq!(e.consultants.len(), 1);
        assert_eq!(e.consultants[0].name, "Marie Dupont");
    }

    #[test]
    fn test_last_name_alone_is_ambiguous() {
        let e = extract_entities(&normalize("Contact de Dupont"), &vocabulary());
        assert_eq!(e.consultants.len(), 2);
    }

    #[test]
    fn test_accented_names_match_unaccented_questions() {
        let e = extract_entities(&normalize("experience de helene lefevre"), &vocabulary());
        assert_eq!(e.consultants.len(), 1);
        assert_eq!(e.consultants[0].name, "Hélène Lefèvre");
    }

    #[test]
    fn test_short_last_names_need_full_name() {
        let v = vocabulary();
        assert!(extract_entities(&normalize("wu"), &v).consultants.is_empty());
        assert_eq!(extract_entities(&normalize("Li Wu"), &v).consultants.len(), 1);
    }

    #[test]
    fn test_terms_respect_word_boundaries() {
        let e = extract_entities(&normalize("Qui connaît JavaScript et Node.js ?"), &vocabulary());
        assert_eq!(e.competences, vec!["JavaScript", "Node.js"]);
    }

    #[test]
    fn test_single_letter_terms_are_ignored() {
        let e = extract_entities(&normalize("C'est qui le meilleur en C ?"), &vocabulary());
        assert!(e.competences.is_empty());
    }

    #[test]
    fn test_clients_practices_languages_and_numbers() {
        let e = extract_entities(
            &normalize("Missions chez Société Générale pour la practice Data en 2023, anglais requis"),
            &vocabulary(),
        );
        assert_eq!(e.clients, vec!["Société Générale"]);
        assert_eq!(e.practices, vec!["Data"]);
        assert_eq!(e.languages, vec!["Anglais"]);
        assert_eq!(e.numbers, vec![2023]);
    }

    #[test]
    fn test_practice_with_punctuation() {
        let e = extract_entities(&normalize("Effectif de Cloud & DevOps"), &vocabulary());
        assert_eq!(e.practices, vec!["Cloud & DevOps"]);
    }
}
