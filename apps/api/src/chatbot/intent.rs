//! Keyword scoring over normalized questions.
//!
//! Each intent owns a keyword list. A keyword counts once when it appears on
//! word boundaries. The best score wins; ties go to the intent listed first
//! in `RULES`.

use serde::{Deserialize, Serialize};

use crate::chatbot::entities::Entities;
use crate::text::contains_words;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Salary,
    Experience,
    Skills,
    Missions,
    Contact,
    ConsultantList,
    Statistics,
    SkillSearch,
    Availability,
    Practices,
    BusinessManager,
    Languages,
    Documents,
    General,
}

impl Intent {
    /// Intents answered about one consultant, where a follow-up may omit the name.
    pub fn is_consultant_scoped(&self) -> bool {
        matches!(
            self,
            Intent::Salary
                | Intent::Experience
                | Intent::Skills
                | Intent::Missions
                | Intent::Contact
                | Intent::Availability
                | Intent::BusinessManager
                | Intent::Languages
                | Intent::Documents
        )
    }
}

/// Keywords are pre-normalized: lowercase, no accents, single spaces.
const RULES: &[(Intent, &[&str])] = &[
    (
        Intent::SkillSearch,
        &[
            "qui connait",
            "qui maitrise",
            "qui sait",
            "qui a des competences",
            "qui fait du",
            "qui fait de la",
            "expert en",
            "experts en",
            "profil",
            "profils",
        ],
    ),
    (
        Intent::Salary,
        &[
            "salaire",
            "salaires",
            "paie",
            "paye",
            "remuneration",
            "gagne",
            "cjm",
            "cout journalier",
        ],
    ),
    (
        Intent::Experience,
        &[
            "experience",
            "anciennete",
            "annees d experience",
            "ans d experience",
            "depuis quand",
        ],
    ),
    (
        Intent::Skills,
        &[
            "competence",
            "competences",
            "skills",
            "technologies",
            "techno",
            "stack",
            "sait faire",
            "maitrise",
        ],
    ),
    (
        Intent::Missions,
        &[
            "mission",
            "missions",
            "client",
            "clients",
            "projet",
            "projets",
            "travaille chez",
            "tjm",
        ],
    ),
    (
        Intent::Contact,
        &[
            "contact",
            "email",
            "mail",
            "telephone",
            "tel",
            "numero",
            "joindre",
            "coordonnees",
        ],
    ),
    (
        Intent::Availability,
        &[
            "disponible",
            "disponibles",
            "dispo",
            "dispos",
            "disponibilite",
            "libre",
            "libres",
            "intercontrat",
            "inter contrat",
        ],
    ),
    (
        Intent::BusinessManager,
        &[
            "business manager",
            "business managers",
            "bm",
            "commercial",
            "responsable commercial",
            "gere",
            "suivi par",
        ],
    ),
    (
        Intent::Languages,
        &["langue", "langues", "parle", "parlent", "bilingue", "anglais"],
    ),
    (
        Intent::Documents,
        &["document", "documents", "cv", "fichier", "fichiers"],
    ),
    (
        Intent::Practices,
        &["practice", "practices", "pratique", "pratiques", "pole", "poles"],
    ),
    (
        Intent::Statistics,
        &[
            "statistique",
            "statistiques",
            "stats",
            "moyenne",
            "moyen",
            "total",
            "repartition",
            "effectif",
            "effectifs",
        ],
    ),
    (
        Intent::ConsultantList,
        &[
            "liste",
            "lister",
            "quels consultants",
            "quels sont les consultants",
            "tous les consultants",
            "consultants",
        ],
    ),
];

const COUNT_MARKERS: &[&str] = &["combien", "nombre"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    /// Keyword hits behind `intent`.
    pub hits: usize,
    pub confidence: f64,
    /// The question asks for a count ("combien", "nombre").
    pub wants_count: bool,
}

pub fn confidence_for(hits: usize) -> f64 {
    (0.5 + 0.25 * hits as f64).min(1.0)
}

fn keyword_hits(question: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|k| contains_words(question, k))
        .count()
}

/// Classifies an already-normalized question.
///
/// Entities add signal the keywords cannot: "qui" with a known skill is a
/// skill search, a known language name is a language question, and a known
/// client name points at missions.
pub fn classify(question: &str, entities: &Entities) -> Classification {
    let wants_count = COUNT_MARKERS.iter().any(|m| contains_words(question, m));

    let mut best = (Intent::General, 0usize);
    for (intent, keywords) in RULES {
        let mut hits = keyword_hits(question, keywords);
        match intent {
            Intent::SkillSearch
                if contains_words(question, "qui") && !entities.competences.is_empty() =>
            {
                hits += 1
            }
            Intent::Languages if !entities.languages.is_empty() => hits += 1,
            Intent::Missions if !entities.clients.is_empty() => hits += 1,
            Intent::Practices if !entities.practices.is_empty() => hits += 1,
            _ => {}
        }
        if hits > best.1 {
            best = (*intent, hits);
        }
    }

    let (intent, hits) = best;
    Classification {
        intent,
        hits,
        confidence: confidence_for(hits),
        wants_count,
    }
}
