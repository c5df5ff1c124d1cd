use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Structured profile extracted from a CV. Stored as JSON on the document row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    #[serde(default)]
    pub candidate: CandidateInfo,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub functional_skills: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub missions: Vec<CvMission>,
    #[serde(default)]
    pub education: Vec<String>,
    /// Which analyzer produced this: "llm:<model>" or "keyword".
    #[serde(default)]
    pub analyzer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvMission {
    pub client: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl CvAnalysis {
    /// Technical then functional skills, deduplicated case/accent-insensitively.
    pub fn all_skills(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.technical_skills
            .iter()
            .chain(self.functional_skills.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(crate::text::fold(s)))
            .map(str::to_string)
            .collect()
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `MM/YYYY` or `YYYY`; anything else becomes `None`.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some((y, m)) = raw.split_once('-') {
        if let (Ok(y), Ok(m)) = (y.parse::<i32>(), m.parse::<u32>()) {
            return NaiveDate::from_ymd_opt(y, m, 1);
        }
    }
    if let Some((m, y)) = raw.split_once('/') {
        if let (Ok(m), Ok(y)) = (m.parse::<u32>(), y.parse::<i32>()) {
            return NaiveDate::from_ymd_opt(y, m, 1);
        }
    }
    if raw.len() == 4 {
        if let Ok(y) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(y, 1, 1);
        }
    }
    None
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_loose_date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loose_date_formats() {
        assert_eq!(parse_loose_date("2021-03-15"), NaiveDate::from_ymd_opt(2021, 3, 15));
        assert_eq!(parse_loose_date("2021-03"), NaiveDate::from_ymd_opt(2021, 3, 1));
        assert_eq!(parse_loose_date("09/2019"), NaiveDate::from_ymd_opt(2019, 9, 1));
        assert_eq!(parse_loose_date("2018"), NaiveDate::from_ymd_opt(2018, 1, 1));
        assert_eq!(parse_loose_date("aujourd'hui"), None);
        assert_eq!(parse_loose_date("2021-13"), None);
    }

    #[test]
    fn test_analysis_deserializes_partial_llm_output() {
        let json = r#"{
            "candidate": {"name": "Marie Dupont", "email": "marie@corp.fr"},
            "technical_skills": ["Java", "Kafka"],
            "missions": [
                {"client": "Société Générale", "role": "Développeuse", "start_date": "2020-01", "end_date": "présent", "technologies": ["Java"]}
            ]
        }"#;
        let analysis: CvAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.candidate.name.as_deref(), Some("Marie Dupont"));
        assert_eq!(analysis.missions[0].start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(analysis.missions[0].end_date, None);
        assert!(analysis.languages.is_empty());
    }

    #[test]
    fn test_all_skills_dedup() {
        let analysis = CvAnalysis {
            technical_skills: vec!["SQL".to_string(), " ".to_string(), "sql".to_string()],
            functional_skills: vec!["Gestion de projet".to_string()],
            ..Default::default()
        };
        assert_eq!(analysis.all_skills(), vec!["SQL", "Gestion de projet"]);
    }
}
