use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::text::fold;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConsultantRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub salary: Option<f64>,
    pub available: bool,
    pub availability_date: Option<NaiveDate>,
    pub grade: String,
    pub contract_type: String,
    pub company: String,
    pub practice_id: Option<Uuid>,
    pub hire_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
    pub first_mission_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConsultantRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Consultant row joined with the columns the search listing needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConsultantListingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub consultant: ConsultantRow,
    pub practice_name: Option<String>,
    pub mission_count: i64,
    pub current_client: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    Junior,
    #[serde(rename = "Confirmé")]
    Confirme,
    Senior,
    Manager,
    Directeur,
}

impl Grade {
    pub const ALL: [Grade; 5] = [
        Grade::Junior,
        Grade::Confirme,
        Grade::Senior,
        Grade::Manager,
        Grade::Directeur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Junior => "Junior",
            Grade::Confirme => "Confirmé",
            Grade::Senior => "Senior",
            Grade::Manager => "Manager",
            Grade::Directeur => "Directeur",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s.trim());
        Grade::ALL
            .into_iter()
            .find(|g| fold(g.as_str()) == folded)
            .ok_or_else(|| format!("unknown grade '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "CDI")]
    Cdi,
    #[serde(rename = "CDD")]
    Cdd,
    Freelance,
    Stagiaire,
    Alternant,
}

impl ContractType {
    pub const ALL: [ContractType; 5] = [
        ContractType::Cdi,
        ContractType::Cdd,
        ContractType::Freelance,
        ContractType::Stagiaire,
        ContractType::Alternant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Cdi => "CDI",
            ContractType::Cdd => "CDD",
            ContractType::Freelance => "Freelance",
            ContractType::Stagiaire => "Stagiaire",
            ContractType::Alternant => "Alternant",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = fold(s.trim());
        ContractType::ALL
            .into_iter()
            .find(|c| fold(c.as_str()) == folded)
            .ok_or_else(|| format!("unknown contract type '{s}'"))
    }
}
