use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MissionRow {
    pub id: Uuid,
    pub consultant_id: Uuid,
    pub name: String,
    pub client: String,
    pub role: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: String,
    /// TJM, in euros per day.
    pub daily_rate: Option<f64>,
    pub revenue: Option<f64>,
    pub technologies: Vec<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    EnCours,
    Terminee,
    Planifiee,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::EnCours => "en_cours",
            MissionStatus::Terminee => "terminee",
            MissionStatus::Planifiee => "planifiee",
        }
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::text::fold(s.trim()).replace([' ', '-'], "_").as_str() {
            "en_cours" => Ok(MissionStatus::EnCours),
            "terminee" => Ok(MissionStatus::Terminee),
            "planifiee" => Ok(MissionStatus::Planifiee),
            _ => Err(format!("unknown mission status '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_accents_and_spaces() {
        assert_eq!("Terminée".parse::<MissionStatus>().unwrap(), MissionStatus::Terminee);
        assert_eq!("en cours".parse::<MissionStatus>().unwrap(), MissionStatus::EnCours);
        assert!("cancelled".parse::<MissionStatus>().is_err());
    }
}
