//! French phrasing for chatbot answers. Pure functions over query results.

use chrono::NaiveDate;

use crate::consultants::service::ConsultantStats;
use crate::missions::service::MissionView;
use crate::models::business_manager::{AssignmentDetailRow, BusinessManagerRow};
use crate::models::competence::{ConsultantCompetenceRow, ConsultantLanguageRow};
use crate::models::consultant::ConsultantRow;
use crate::models::document::DocumentRow;
use crate::models::practice::PracticeOverviewRow;

/// Names listed before the answer switches to "et N autres".
pub const MAX_LISTED: usize = 10;

pub const HELP: &str = "Je peux répondre aux questions sur les consultants : salaire, \
expérience, compétences, missions, contact, disponibilité, langues, documents, \
business manager, practices et statistiques. Exemple : « Quel est le salaire de Jean Dupont ? »";

/// `45000.0` → `45 000`, `375.5` with 2 decimals → `375,50`.
pub fn format_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*c);
    }
    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped},{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn format_euros(value: f64) -> String {
    format!("{} €", format_number(value, 0))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// "A", "A et B", "A, B et C", then "(et N autres)" past `MAX_LISTED`.
pub fn join_names(names: &[String]) -> String {
    let shown = &names[..names.len().min(MAX_LISTED)];
    let mut out = match shown {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} et {last}", init.join(", ")),
    };
    if names.len() > MAX_LISTED {
        out.push_str(&format!(" (et {} autres)", names.len() - MAX_LISTED));
    }
    out
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count > 1 {
        format!("{count} {plural}")
    } else {
        format!("{count} {singular}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Consultant-scoped
// ────────────────────────────────────────────────────────────────────────────

pub fn missing_consultant() -> String {
    "De quel consultant parlez-vous ? Indiquez son nom, par exemple « Jean Dupont ».".to_string()
}

pub fn ambiguous_consultant(names: &[String]) -> String {
    format!(
        "Plusieurs consultants correspondent : {}. Précisez le prénom.",
        join_names(names)
    )
}

pub fn salary(name: &str, salary: Option<f64>, cjm: Option<f64>) -> String {
    match (salary, cjm) {
        (Some(s), Some(c)) if s > 0.0 => format!(
            "Le salaire de {name} est de {} brut annuel (CJM : {} €).",
            format_euros(s),
            format_number(c, 2)
        ),
        _ => format!("Je n'ai pas de salaire renseigné pour {name}."),
    }
}

pub fn experience(name: &str, years: Option<f64>) -> String {
    match years {
        Some(y) => format!(
            "{name} a {} an(s) d'expérience.",
            format_number(y, 1)
        ),
        None => format!("Je n'ai pas de date de début de carrière pour {name}."),
    }
}

pub fn skills(name: &str, competences: &[ConsultantCompetenceRow]) -> String {
    if competences.is_empty() {
        return format!("Aucune compétence n'est enregistrée pour {name}.");
    }
    let items: Vec<String> = competences
        .iter()
        .map(|c| format!("{} ({})", c.name, c.level))
        .collect();
    format!("Compétences de {name} : {}.", join_names(&items))
}

pub fn missions_of(name: &str, missions: &[MissionView], wants_count: bool) -> String {
    if missions.is_empty() {
        return format!("{name} n'a aucune mission enregistrée.");
    }
    if wants_count {
        return format!("{name} a {}.", plural(missions.len(), "mission", "missions"));
    }
    let items: Vec<String> = missions
        .iter()
        .map(|m| {
            format!(
                "{} chez {} depuis le {}",
                m.mission.name,
                m.mission.client,
                format_date(m.mission.start_date)
            )
        })
        .collect();
    format!(
        "{name} a {} : {}.",
        plural(missions.len(), "mission", "missions"),
        join_names(&items)
    )
}

pub fn contact(consultant: &ConsultantRow) -> String {
    match consultant.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(phone) => format!(
            "{} : {} / {}.",
            consultant.full_name(),
            consultant.email,
            phone
        ),
        None => format!("{} : {}.", consultant.full_name(), consultant.email),
    }
}

pub fn availability_of(name: &str, available_now: bool, availability_date: Option<NaiveDate>) -> String {
    match (available_now, availability_date) {
        (true, _) => format!("{name} est disponible."),
        (false, Some(date)) => format!("{name} sera disponible à partir du {}.", format_date(date)),
        (false, None) => format!("{name} n'est pas disponible."),
    }
}

pub fn business_manager_of(name: &str, assignment: Option<&AssignmentDetailRow>) -> String {
    match assignment {
        Some(a) => format!(
            "Le business manager de {name} est {} {} ({}), depuis le {}.",
            a.first_name,
            a.last_name,
            a.email,
            format_date(a.start_date)
        ),
        None => format!("{name} n'a pas de business manager attribué."),
    }
}

pub fn languages_of(name: &str, languages: &[ConsultantLanguageRow]) -> String {
    if languages.is_empty() {
        return format!("Aucune langue n'est enregistrée pour {name}.");
    }
    let items: Vec<String> = languages
        .iter()
        .map(|l| format!("{} ({})", l.name, l.level))
        .collect();
    format!("{name} parle {}.", join_names(&items))
}

pub fn documents_of(name: &str, documents: &[DocumentRow]) -> String {
    if documents.is_empty() {
        return format!("Aucun document n'est associé à {name}.");
    }
    let items: Vec<String> = documents.iter().map(|d| d.file_name.clone()).collect();
    format!(
        "{name} a {} : {}.",
        plural(documents.len(), "document", "documents"),
        join_names(&items)
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Collections
// ────────────────────────────────────────────────────────────────────────────

/// `scope` completes "consultant(s) …", e.g. "disponibles" or "qui connaissent Java".
pub fn consultant_names(scope: &str, names: &[String], wants_count: bool) -> String {
    let scope = if scope.is_empty() {
        String::new()
    } else {
        format!(" {scope}")
    };
    match (names.len(), wants_count) {
        (0, _) => format!("Aucun consultant{scope}."),
        (n, true) => format!("Il y a {}{scope}.", plural(n, "consultant", "consultants")),
        (n, false) => format!(
            "{}{scope} : {}.",
            plural(n, "consultant", "consultants"),
            join_names(names)
        ),
    }
}

pub fn missions_at_client(client: &str, missions: &[String], wants_count: bool) -> String {
    match (missions.len(), wants_count) {
        (0, _) => format!("Aucune mission enregistrée chez {client}."),
        (n, true) => format!("Il y a {} chez {client}.", plural(n, "mission", "missions")),
        (n, false) => format!(
            "{} chez {client} : {}.",
            plural(n, "mission", "missions"),
            join_names(missions)
        ),
    }
}

pub fn average_salary(stats: &ConsultantStats) -> String {
    match (stats.average_salary, stats.average_cjm) {
        (Some(s), Some(c)) => format!(
            "Le salaire moyen est de {} (CJM moyen : {} €).",
            format_euros(s),
            format_number(c, 2)
        ),
        (Some(s), None) => format!("Le salaire moyen est de {}.", format_euros(s)),
        _ => "Aucun salaire n'est renseigné.".to_string(),
    }
}

pub fn statistics(stats: &ConsultantStats) -> String {
    let mut parts = vec![format!(
        "{} dont {} disponible(s)",
        plural(stats.total_consultants.max(0) as usize, "consultant", "consultants"),
        stats.available_consultants
    )];
    parts.push(format!(
        "{} en cours",
        plural(stats.active_missions.max(0) as usize, "mission", "missions")
    ));
    if let Some(s) = stats.average_salary {
        parts.push(format!("salaire moyen {}", format_euros(s)));
    }
    if let Some(tjm) = stats.average_daily_rate {
        parts.push(format!("TJM moyen {}", format_euros(tjm)));
    }
    format!("Statistiques : {}.", parts.join(", "))
}

pub fn practices(rows: &[PracticeOverviewRow]) -> String {
    if rows.is_empty() {
        return "Aucune practice n'est enregistrée.".to_string();
    }
    let items: Vec<String> = rows
        .iter()
        .map(|p| format!("{} ({} consultants)", p.name, p.consultant_count))
        .collect();
    format!("{} : {}.", plural(rows.len(), "practice", "practices"), join_names(&items))
}

pub fn practice_detail(row: &PracticeOverviewRow, wants_count: bool) -> String {
    if wants_count {
        return format!(
            "La practice {} compte {}.",
            row.name,
            plural(row.consultant_count.max(0) as usize, "consultant", "consultants")
        );
    }
    format!(
        "La practice {} compte {}, dont {} disponible(s).",
        row.name,
        plural(row.consultant_count.max(0) as usize, "consultant", "consultants"),
        row.available_count
    )
}

pub fn business_managers(rows: &[BusinessManagerRow]) -> String {
    let names: Vec<String> = rows.iter().filter(|b| b.active).map(|b| b.full_name()).collect();
    if names.is_empty() {
        return "Aucun business manager actif.".to_string();
    }
    format!(
        "{} : {}.",
        plural(names.len(), "business manager actif", "business managers actifs"),
        join_names(&names)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(45000.0, 0), "45 000");
        assert_eq!(format_number(1234567.891, 2), "1 234 567,89");
        assert_eq!(format_number(375.0, 2), "375,00");
        assert_eq!(format_number(-1500.0, 0), "-1 500");
        assert_eq!(format_number(0.0, 1), "0,0");
    }

    #[test]
    fn test_join_names() {
        let names = |n: usize| (1..=n).map(|i| format!("C{i}")).collect::<Vec<_>>();
        assert_eq!(join_names(&[]), "");
        assert_eq!(join_names(&names(1)), "C1");
        assert_eq!(join_names(&names(3)), "C1, C2 et C3");
        assert!(join_names(&names(12)).ends_with("C10 (et 2 autres)"));
    }

    #[test]
    fn test_salary_answer() {
        assert_eq!(
            salary("Jean Dupont", Some(45000.0), Some(375.0)),
            "Le salaire de Jean Dupont est de 45 000 € brut annuel (CJM : 375,00 €)."
        );
        assert!(salary("Jean Dupont", None, None).contains("pas de salaire"));
    }

    #[test]
    fn test_experience_answer() {
        assert_eq!(experience("Marie", Some(5.3)), "Marie a 5,3 an(s) d'expérience.");
        assert!(experience("Marie", None).contains("pas de date"));
    }

    #[test]
    fn test_availability_answer() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(availability_of("Marie", true, None), "Marie est disponible.");
        assert_eq!(
            availability_of("Marie", false, Some(date)),
            "Marie sera disponible à partir du 01/03/2026."
        );
    }

    #[test]
    fn test_consultant_names_count_and_list() {
        let names = vec!["Jean Dupont".to_string(), "Marie Martin".to_string()];
        assert_eq!(
            consultant_names("disponibles", &names, true),
            "Il y a 2 consultants disponibles."
        );
        assert_eq!(
            consultant_names("qui connaissent Java", &names, false),
            "2 consultants qui connaissent Java : Jean Dupont et Marie Martin."
        );
        assert_eq!(consultant_names("", &[], false), "Aucun consultant.");
    }

    #[test]
    fn test_missions_at_client() {
        let missions = vec!["Refonte SI".to_string()];
        assert_eq!(
            missions_at_client("AXA", &missions, false),
            "1 mission chez AXA : Refonte SI."
        );
        assert_eq!(
            missions_at_client("AXA", &[], true),
            "Aucune mission enregistrée chez AXA."
        );
    }
}
