use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompetenceRow {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// A consultant's competence joined with the catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConsultantCompetenceRow {
    pub id: Uuid,
    pub consultant_id: Uuid,
    pub competence_id: Uuid,
    pub name: String,
    pub category: String,
    pub kind: String,
    pub level: String,
    pub years_experience: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConsultantLanguageRow {
    pub id: Uuid,
    pub consultant_id: Uuid,
    pub language_id: Uuid,
    pub name: String,
    pub level: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetenceKind {
    Technique,
    Fonctionnelle,
}

impl CompetenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetenceKind::Technique => "technique",
            CompetenceKind::Fonctionnelle => "fonctionnelle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Debutant,
    Intermediaire,
    Avance,
    Expert,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Debutant => "debutant",
            SkillLevel::Intermediaire => "intermediaire",
            SkillLevel::Avance => "avance",
            SkillLevel::Expert => "expert",
        }
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::text::fold(s.trim()).as_str() {
            "debutant" => Ok(SkillLevel::Debutant),
            "intermediaire" => Ok(SkillLevel::Intermediaire),
            "avance" => Ok(SkillLevel::Avance),
            "expert" => Ok(SkillLevel::Expert),
            _ => Err(format!("unknown skill level '{s}'")),
        }
    }
}

/// CEFR level, plus native speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LanguageLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[serde(rename = "natif")]
    Native,
}

impl LanguageLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageLevel::A1 => "A1",
            LanguageLevel::A2 => "A2",
            LanguageLevel::B1 => "B1",
            LanguageLevel::B2 => "B2",
            LanguageLevel::C1 => "C1",
            LanguageLevel::C2 => "C2",
            LanguageLevel::Native => "natif",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_level_ordering() {
        assert!(SkillLevel::Expert > SkillLevel::Avance);
        assert!(SkillLevel::Debutant < SkillLevel::Intermediaire);
    }

    #[test]
    fn test_skill_level_parses_accented_label() {
        assert_eq!("Avancé".parse::<SkillLevel>().unwrap(), SkillLevel::Avance);
        assert_eq!("Intermédiaire".parse::<SkillLevel>().unwrap(), SkillLevel::Intermediaire);
    }

    #[test]
    fn test_language_level_serde() {
        let level: LanguageLevel = serde_json::from_str("\"natif\"").unwrap();
        assert_eq!(level, LanguageLevel::Native);
        assert_eq!(serde_json::to_string(&LanguageLevel::B2).unwrap(), "\"B2\"");
    }
}
