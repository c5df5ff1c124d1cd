use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BusinessManagerRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl BusinessManagerRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A consultant ↔ business manager assignment. `end_date = None` marks the active one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssignmentRow {
    pub id: Uuid,
    pub consultant_id: Uuid,
    pub business_manager_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AssignmentRow {
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Assignment joined with the business manager's display columns.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssignmentDetailRow {
    pub id: Uuid,
    pub business_manager_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub comment: Option<String>,
}
