use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::consultants::metrics::{compute_cjm, margin_rate, round2, working_days_between};
use crate::consultants::service::{get_consultant, today};
use crate::errors::AppError;
use crate::models::mission::{MissionRow, MissionStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct NewMission {
    pub consultant_id: Uuid,
    pub name: String,
    pub client: String,
    pub role: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: Option<MissionStatus>,
    pub daily_rate: Option<f64>,
    pub revenue: Option<f64>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MissionPatch {
    pub name: Option<String>,
    pub client: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub role: Option<Option<String>>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub status: Option<MissionStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub daily_rate: Option<Option<f64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub revenue: Option<Option<f64>>,
    pub technologies: Option<Vec<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

/// A mission with its derived figures.
#[derive(Debug, Clone, Serialize)]
pub struct MissionView {
    #[serde(flatten)]
    pub mission: MissionRow,
    pub duration_days: i64,
    pub estimated_revenue: Option<f64>,
    pub margin_rate: Option<f64>,
}

impl MissionView {
    /// `salary` is the consultant's, used for the CJM side of the margin.
    pub fn derive(mission: MissionRow, salary: Option<f64>, today: NaiveDate) -> Self {
        let end = mission.end_date.unwrap_or(today);
        let duration_days = working_days_between(mission.start_date, end);
        let estimated_revenue = mission.revenue.or_else(|| {
            mission
                .daily_rate
                .map(|tjm| round2(tjm * duration_days as f64))
        });
        let margin_rate = margin_rate(mission.daily_rate, compute_cjm(salary));
        Self {
            mission,
            duration_days,
            estimated_revenue,
            margin_rate,
        }
    }
}

fn validate_fields(
    name: &str,
    client: &str,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    daily_rate: Option<f64>,
) -> Result<(), AppError> {
    if name.trim().is_empty() || client.trim().is_empty() {
        return Err(AppError::Validation(
            "mission name and client are required".to_string(),
        ));
    }
    if let Some(end) = end_date {
        if end < start_date {
            return Err(AppError::Validation(
                "end_date cannot be before start_date".to_string(),
            ));
        }
    }
    if daily_rate.is_some_and(|r| !r.is_finite() || r < 0.0) {
        return Err(AppError::Validation(
            "daily_rate must be a positive amount".to_string(),
        ));
    }
    Ok(())
}

/// Status implied by dates when the caller does not give one.
pub fn infer_status(start_date: NaiveDate, end_date: Option<NaiveDate>, today: NaiveDate) -> MissionStatus {
    if start_date > today {
        MissionStatus::Planifiee
    } else if end_date.is_some_and(|end| end < today) {
        MissionStatus::Terminee
    } else {
        MissionStatus::EnCours
    }
}

pub async fn get_mission(pool: &PgPool, id: Uuid) -> Result<MissionRow, AppError> {
    sqlx::query_as::<_, MissionRow>("SELECT * FROM missions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mission {id} not found")))
}

pub async fn get_mission_view(pool: &PgPool, id: Uuid) -> Result<MissionView, AppError> {
    let mission = get_mission(pool, id).await?;
    let consultant = get_consultant(pool, mission.consultant_id).await?;
    Ok(MissionView::derive(mission, consultant.salary, today()))
}

/// Missions of a consultant, most recent first.
pub async fn list_for_consultant(pool: &PgPool, consultant_id: Uuid) -> Result<Vec<MissionView>, AppError> {
    let consultant = get_consultant(pool, consultant_id).await?;
    let rows = sqlx::query_as::<_, MissionRow>(
        "SELECT * FROM missions WHERE consultant_id = $1 ORDER BY start_date DESC, id",
    )
    .bind(consultant_id)
    .fetch_all(pool)
    .await?;
    let today = today();
    Ok(rows
        .into_iter()
        .map(|m| MissionView::derive(m, consultant.salary, today))
        .collect())
}

pub async fn list_by_client(pool: &PgPool, client: &str) -> Result<Vec<MissionRow>, AppError> {
    Ok(sqlx::query_as::<_, MissionRow>(
        "SELECT * FROM missions WHERE lower(client) = lower($1) ORDER BY start_date DESC, id",
    )
    .bind(client.trim())
    .fetch_all(pool)
    .await?)
}

pub async fn list_clients(pool: &PgPool) -> Result<Vec<String>, AppError> {
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT client FROM missions ORDER BY client",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn create_mission(pool: &PgPool, new: NewMission) -> Result<MissionView, AppError> {
    validate_fields(&new.name, &new.client, new.start_date, new.end_date, new.daily_rate)?;
    let consultant = get_consultant(pool, new.consultant_id).await?;
    let today = today();
    let status = new
        .status
        .unwrap_or_else(|| infer_status(new.start_date, new.end_date, today));

    let row = sqlx::query_as::<_, MissionRow>(
        r#"
        INSERT INTO missions
            (consultant_id, name, client, role, start_date, end_date, status,
             daily_rate, revenue, technologies, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(new.consultant_id)
    .bind(new.name.trim())
    .bind(new.client.trim())
    .bind(new.role)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(status.as_str())
    .bind(new.daily_rate)
    .bind(new.revenue)
    .bind(&new.technologies)
    .bind(new.description)
    .fetch_one(pool)
    .await?;

    info!(
        "Created mission {} at {} for consultant {}",
        row.id, row.client, row.consultant_id
    );
    Ok(MissionView::derive(row, consultant.salary, today))
}

/// Applies a patch on top of an existing mission; `null` clears a nullable field.
pub fn apply_patch(mut row: MissionRow, patch: MissionPatch) -> Result<MissionRow, AppError> {
    if let Some(v) = patch.name {
        row.name = v.trim().to_string();
    }
    if let Some(v) = patch.client {
        row.client = v.trim().to_string();
    }
    if let Some(v) = patch.role {
        row.role = v;
    }
    if let Some(v) = patch.start_date {
        row.start_date = v;
    }
    if let Some(v) = patch.end_date {
        row.end_date = v;
    }
    if let Some(v) = patch.status {
        row.status = v.as_str().to_string();
    }
    if let Some(v) = patch.daily_rate {
        row.daily_rate = v;
    }
    if let Some(v) = patch.revenue {
        row.revenue = v;
    }
    if let Some(v) = patch.technologies {
        row.technologies = v;
    }
    if let Some(v) = patch.description {
        row.description = v;
    }
    validate_fields(&row.name, &row.client, row.start_date, row.end_date, row.daily_rate)?;
    Ok(row)
}

pub async fn update_mission(pool: &PgPool, id: Uuid, patch: MissionPatch) -> Result<MissionView, AppError> {
    let row = apply_patch(get_mission(pool, id).await?, patch)?;

    let updated = sqlx::query_as::<_, MissionRow>(
        r#"
        UPDATE missions SET
            name = $2, client = $3, role = $4, start_date = $5, end_date = $6, status = $7,
            daily_rate = $8, revenue = $9, technologies = $10, description = $11
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&row.name)
    .bind(&row.client)
    .bind(&row.role)
    .bind(row.start_date)
    .bind(row.end_date)
    .bind(&row.status)
    .bind(row.daily_rate)
    .bind(row.revenue)
    .bind(&row.technologies)
    .bind(&row.description)
    .fetch_one(pool)
    .await?;

    let consultant = get_consultant(pool, updated.consultant_id).await?;
    info!("Updated mission {id}");
    Ok(MissionView::derive(updated, consultant.salary, today()))
}

pub async fn delete_mission(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM missions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Mission {id} not found")));
    }
    info!("Deleted mission {id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mission(start: NaiveDate, end: Option<NaiveDate>, tjm: Option<f64>) -> MissionRow {
        MissionRow {
            id: Uuid::nil(),
            consultant_id: Uuid::nil(),
            name: "Migration SI".to_string(),
            client: "BNP Paribas".to_string(),
            role: Some("Tech lead".to_string()),
            start_date: start,
            end_date: end,
            status: "terminee".to_string(),
            daily_rate: tjm,
            revenue: None,
            technologies: vec!["Java".to_string()],
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_null_reopens_finished_mission() {
        let m = mission(date(2024, 3, 4), Some(date(2024, 3, 15)), Some(550.0));
        let patch: MissionPatch =
            serde_json::from_str(r#"{"end_date": null, "status": "en_cours"}"#).unwrap();
        let row = apply_patch(m, patch).unwrap();
        assert_eq!(row.end_date, None);
        assert_eq!(row.status, "en_cours");
        assert_eq!(row.daily_rate, Some(550.0));
        assert_eq!(row.role.as_deref(), Some("Tech lead"));
    }

    #[test]
    fn test_patch_end_before_start_rejected() {
        let m = mission(date(2024, 3, 4), None, None);
        let patch: MissionPatch = serde_json::from_str(r#"{"end_date": "2024-03-01"}"#).unwrap();
        assert!(matches!(apply_patch(m, patch), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_view_estimates_revenue_from_tjm() {
        // Monday 2024-03-04 .. Friday 2024-03-15 → 10 working days
        let m = mission(date(2024, 3, 4), Some(date(2024, 3, 15)), Some(550.0));
        let view = MissionView::derive(m, Some(48_000.0), date(2024, 6, 1));
        assert_eq!(view.duration_days, 10);
        assert_eq!(view.estimated_revenue, Some(5_500.0));
        // (550 - 400) / 550 = 0.2727
        assert_eq!(view.margin_rate, Some(0.27));
    }

    #[test]
    fn test_view_keeps_recorded_revenue() {
        let mut m = mission(date(2024, 3, 4), Some(date(2024, 3, 15)), Some(550.0));
        m.revenue = Some(7_000.0);
        let view = MissionView::derive(m, None, date(2024, 6, 1));
        assert_eq!(view.estimated_revenue, Some(7_000.0));
        assert_eq!(view.margin_rate, None);
    }

    #[test]
    fn test_open_mission_runs_until_today() {
        let m = mission(date(2024, 3, 4), None, None);
        let view = MissionView::derive(m, None, date(2024, 3, 8));
        assert_eq!(view.duration_days, 5);
        assert_eq!(view.estimated_revenue, None);
    }

    #[test]
    fn test_infer_status() {
        let today = date(2024, 5, 1);
        assert_eq!(infer_status(date(2024, 6, 1), None, today), MissionStatus::Planifiee);
        assert_eq!(
            infer_status(date(2023, 1, 1), Some(date(2024, 1, 1)), today),
            MissionStatus::Terminee
        );
        assert_eq!(infer_status(date(2024, 1, 1), None, today), MissionStatus::EnCours);
    }

    #[test]
    fn test_validate_fields() {
        let start = date(2024, 1, 1);
        assert!(validate_fields("M", "C", start, None, Some(500.0)).is_ok());
        assert!(validate_fields(" ", "C", start, None, None).is_err());
        assert!(validate_fields("M", "C", start, Some(date(2023, 12, 31)), None).is_err());
        assert!(validate_fields("M", "C", start, None, Some(-1.0)).is_err());
    }
}
