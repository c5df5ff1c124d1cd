use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::consultants::service::today;
use crate::errors::AppError;
use crate::models::practice::{PracticeOverviewRow, PracticeRow};

#[derive(Debug, Clone, Deserialize)]
pub struct NewPractice {
    pub name: String,
    pub description: Option<String>,
    pub manager_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PracticePatch {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub manager_name: Option<Option<String>>,
    pub active: Option<bool>,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("practice name is required".to_string()));
    }
    Ok(())
}

pub async fn list_practices(pool: &PgPool) -> Result<Vec<PracticeRow>, AppError> {
    Ok(sqlx::query_as::<_, PracticeRow>("SELECT * FROM practices ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn get_practice(pool: &PgPool, id: Uuid) -> Result<PracticeRow, AppError> {
    sqlx::query_as::<_, PracticeRow>("SELECT * FROM practices WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Practice {id} not found")))
}

pub async fn create_practice(pool: &PgPool, new: NewPractice) -> Result<PracticeRow, AppError> {
    validate_name(&new.name)?;
    let name = new.name.trim().to_string();
    let row = sqlx::query_as::<_, PracticeRow>(
        "INSERT INTO practices (name, description, manager_name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&name)
    .bind(new.description)
    .bind(new.manager_name)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Practice '{name}' already exists")))?;

    info!("Created practice {} ({})", row.id, row.name);
    Ok(row)
}

pub async fn update_practice(pool: &PgPool, id: Uuid, patch: PracticePatch) -> Result<PracticeRow, AppError> {
    let mut row = get_practice(pool, id).await?;
    if let Some(v) = patch.name {
        row.name = v.trim().to_string();
    }
    if let Some(v) = patch.description {
        row.description = v;
    }
    if let Some(v) = patch.manager_name {
        row.manager_name = v;
    }
    if let Some(v) = patch.active {
        row.active = v;
    }
    validate_name(&row.name)?;

    let name = row.name.clone();
    sqlx::query_as::<_, PracticeRow>(
        "UPDATE practices SET name = $2, description = $3, manager_name = $4, active = $5 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(&row.manager_name)
    .bind(row.active)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Practice '{name}' already exists")))
}

/// Refuses to delete a practice that still has consultants attached.
pub async fn delete_practice(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let attached: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consultants WHERE practice_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if attached > 0 {
        return Err(AppError::Conflict(format!(
            "Practice {id} still has {attached} consultant(s)"
        )));
    }

    let result = sqlx::query("DELETE FROM practices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Practice {id} not found")));
    }
    info!("Deleted practice {id}");
    Ok(())
}

/// Consultant and availability counts per practice.
pub async fn practice_overview(pool: &PgPool) -> Result<Vec<PracticeOverviewRow>, AppError> {
    Ok(sqlx::query_as::<_, PracticeOverviewRow>(
        r#"
        SELECT p.id, p.name, p.active,
               COUNT(c.id) AS consultant_count,
               COUNT(c.id) FILTER (
                   WHERE c.available OR (c.availability_date IS NOT NULL AND c.availability_date <= $1)
               ) AS available_count
        FROM practices p
        LEFT JOIN consultants c ON c.practice_id = p.id
        GROUP BY p.id, p.name, p.active
        ORDER BY p.name
        "#,
    )
    .bind(today())
    .fetch_all(pool)
    .await?)
}
