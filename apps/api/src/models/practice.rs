use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PracticeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub manager_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PracticeOverviewRow {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub consultant_count: i64,
    pub available_count: i64,
}
