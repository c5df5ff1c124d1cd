//! Network-free CV heuristics: contact details, known skills, languages.

use std::sync::LazyLock;

use regex::Regex;

use crate::cv::models::{CandidateInfo, CvAnalysis};
use crate::text::{contains_words, normalize};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("valid regex")
});

/// French numbers: 06 12 34 56 78, 06.12.34.56.78, +33 6 12 34 56 78.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+33\s?|0)[1-9](?:[\s.-]?\d{2}){4}").expect("valid regex")
});

/// Technical skills recognized in free text. Display spelling first.
pub const TECHNICAL_SKILLS: &[&str] = &[
    "Java", "Python", "JavaScript", "TypeScript", "C#", "C++", "Go", "Rust", "Scala", "Kotlin",
    "PHP", "Ruby", "SQL", "PL/SQL", "NoSQL", "PostgreSQL", "MySQL", "Oracle", "MongoDB",
    "Redis", "Kafka", "Spark", "Hadoop", "Airflow", "dbt", "Snowflake", "Databricks",
    "Power BI", "Tableau", "Qlik", "Excel", "VBA", "SAS", "R", "Spring", "Spring Boot",
    "Hibernate", "Angular", "React", "Vue.js", "Node.js", "Django", "Flask", "FastAPI",
    ".NET", "Docker", "Kubernetes", "Terraform", "Ansible", "Jenkins", "GitLab", "Git",
    "AWS", "Azure", "GCP", "Linux", "Unix", "Shell", "COBOL", "Murex", "Calypso",
    "Summit", "Sophis", "SAP", "Salesforce", "Selenium", "JIRA",
];

pub const FUNCTIONAL_SKILLS: &[&str] = &[
    "Gestion de projet", "Agile", "Scrum", "Kanban", "SAFe", "Product Owner",
    "Business Analysis", "MOA", "AMOA", "Recette", "Conduite du changement",
    "Finance de marché", "Risque de crédit", "Risque de marché", "ALM", "Bâle III",
    "Solvabilité II", "IFRS 9", "FRTB", "Conformité", "KYC", "Paiements", "Assurance",
    "Banque de détail", "Gestion d'actifs", "Trésorerie",
];

pub const LANGUAGES: &[&str] = &[
    "Français", "Anglais", "Espagnol", "Allemand", "Italien", "Portugais", "Arabe",
    "Chinois", "Japonais", "Russe", "Néerlandais",
];

/// Names from `vocabulary` that occur in `text` on word boundaries.
/// Single-letter names (like `R`) are only matched in their original case.
/// Names with a leading dot (like `.NET`) keep the dot when matching.
pub fn find_known_terms(text: &str, vocabulary: &[&str]) -> Vec<String> {
    let normalized = normalize(text);
    vocabulary
        .iter()
        .filter(|term| {
            if term.chars().count() == 1 {
                text.split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == **term)
            } else if term.starts_with('.') {
                contains_dotted_term(text, term)
            } else {
                contains_words(&normalized, &normalize(term))
            }
        })
        .map(|t| t.to_string())
        .collect()
}

fn contains_dotted_term(text: &str, term: &str) -> bool {
    let haystack = text.to_lowercase();
    let needle = term.to_lowercase();
    haystack.match_indices(&needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase())
}

pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().trim().to_string())
}

/// Builds an analysis from keyword matches only.
pub fn analyze_keywords(text: &str) -> CvAnalysis {
    CvAnalysis {
        candidate: CandidateInfo {
            name: None,
            email: find_email(text),
            phone: find_phone(text),
        },
        summary: None,
        technical_skills: find_known_terms(text, TECHNICAL_SKILLS),
        functional_skills: find_known_terms(text, FUNCTIONAL_SKILLS),
        languages: find_known_terms(text, LANGUAGES),
        missions: Vec::new(),
        education: Vec::new(),
        analyzer: "keyword".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CV: &str = "\
        Jean MARTIN — Consultant Senior\n\
        jean.martin@quanteam.fr | 06 12 34 56 78\n\
        Compétences : Java, Spring Boot, Kafka, SQL, C++, Node.js, R\n\
        Méthodes : Agile Scrum, Gestion de projet, Finance de marché\n\
        Langues : Français (natif), Anglais courant\n\
        Projet JavaScript front-end chez BNP Paribas";

    #[test]
    fn test_finds_contact_details() {
        assert_eq!(find_email(CV).as_deref(), Some("jean.martin@quanteam.fr"));
        assert_eq!(find_phone(CV).as_deref(), Some("06 12 34 56 78"));
        assert_eq!(find_phone("+33 6 12 34 56 78").as_deref(), Some("+33 6 12 34 56 78"));
        assert_eq!(find_email("no contact"), None);
    }

    #[test]
    fn test_finds_skills_on_word_boundaries() {
        let analysis = analyze_keywords(CV);
        for skill in ["Java", "Spring Boot", "Spring", "Kafka", "SQL", "C++", "Node.js", "JavaScript", "R"] {
            assert!(
                analysis.technical_skills.iter().any(|s| s == skill),
                "missing {skill} in {:?}",
                analysis.technical_skills
            );
        }
        assert!(!analysis.technical_skills.iter().any(|s| s == "Go"));
        assert!(!analysis.technical_skills.iter().any(|s| s == "Rust"));
    }

    #[test]
    fn test_single_letter_skill_needs_exact_case() {
        assert!(find_known_terms("langage r", &["R"]).is_empty());
        assert_eq!(find_known_terms("Stats en R et SAS", &["R"]), vec!["R"]);
    }

    #[test]
    fn test_dotnet_needs_the_leading_dot() {
        assert_eq!(
            find_known_terms("Développeur .NET / C# depuis 2015", &[".NET"]),
            vec![".NET"]
        );
        assert!(find_known_terms("Salaire net annuel, réseau NET interne", &[".NET"]).is_empty());
        assert!(find_known_terms("Projet intranet", &[".NET"]).is_empty());
    }

    #[test]
    fn test_finds_functional_skills_and_languages() {
        let analysis = analyze_keywords(CV);
        assert!(analysis.functional_skills.contains(&"Agile".to_string()));
        assert!(analysis.functional_skills.contains(&"Finance de marché".to_string()));
        assert_eq!(analysis.languages, vec!["Français", "Anglais"]);
        assert_eq!(analysis.analyzer, "keyword");
    }
}
