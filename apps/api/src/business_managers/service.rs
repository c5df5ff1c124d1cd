//! Business managers and their consultant portfolios.
//!
//! A consultant has at most one active assignment (`end_date IS NULL`).
//! Reassignment closes the current row and opens a new one in a single
//! transaction; a partial unique index backs the rule in the schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::consultants::service::{get_consultant, today, validate_email};
use crate::errors::AppError;
use crate::models::business_manager::{AssignmentDetailRow, AssignmentRow, BusinessManagerRow};
use crate::models::consultant::ConsultantRow;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBusinessManager {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessManagerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub business_manager_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub comment: Option<String>,
}

/// What `assign` did, so callers can tell a real reassignment from a no-op.
#[derive(Debug, Clone, Serialize)]
pub struct AssignOutcome {
    pub assignment: AssignmentRow,
    pub closed_assignment_id: Option<Uuid>,
    pub unchanged: bool,
}

/// How a requested assignment relates to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignPlan {
    KeepExisting,
    Open,
    Replace { close_on: NaiveDate },
}

/// Decides what to do given the current active assignment.
pub fn plan_assignment(
    current: Option<&AssignmentRow>,
    business_manager_id: Uuid,
    start_date: NaiveDate,
) -> Result<AssignPlan, AppError> {
    match current {
        None => Ok(AssignPlan::Open),
        Some(active) if active.business_manager_id == business_manager_id => {
            Ok(AssignPlan::KeepExisting)
        }
        Some(active) if start_date < active.start_date => Err(AppError::Validation(format!(
            "start_date {start_date} is before the current assignment start {}",
            active.start_date
        ))),
        Some(_) => Ok(AssignPlan::Replace {
            close_on: start_date,
        }),
    }
}

pub async fn list_business_managers(pool: &PgPool) -> Result<Vec<BusinessManagerRow>, AppError> {
    Ok(sqlx::query_as::<_, BusinessManagerRow>(
        "SELECT * FROM business_managers ORDER BY last_name, first_name",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn get_business_manager(pool: &PgPool, id: Uuid) -> Result<BusinessManagerRow, AppError> {
    sqlx::query_as::<_, BusinessManagerRow>("SELECT * FROM business_managers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Business manager {id} not found")))
}

pub async fn create_business_manager(
    pool: &PgPool,
    new: NewBusinessManager,
) -> Result<BusinessManagerRow, AppError> {
    if new.first_name.trim().is_empty() || new.last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }
    validate_email(&new.email)?;
    let email = new.email.trim().to_lowercase();

    let row = sqlx::query_as::<_, BusinessManagerRow>(
        r#"
        INSERT INTO business_managers (first_name, last_name, email, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(&email)
    .bind(new.phone)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{email}' is already used")))?;

    info!("Created business manager {} ({})", row.id, row.full_name());
    Ok(row)
}

pub async fn update_business_manager(
    pool: &PgPool,
    id: Uuid,
    patch: BusinessManagerPatch,
) -> Result<BusinessManagerRow, AppError> {
    let mut row = get_business_manager(pool, id).await?;
    if let Some(v) = patch.first_name {
        row.first_name = v.trim().to_string();
    }
    if let Some(v) = patch.last_name {
        row.last_name = v.trim().to_string();
    }
    if let Some(v) = patch.email {
        validate_email(&v)?;
        row.email = v.trim().to_lowercase();
    }
    if let Some(v) = patch.phone {
        row.phone = v;
    }
    if let Some(v) = patch.active {
        row.active = v;
    }
    if row.first_name.is_empty() || row.last_name.is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }

    let email = row.email.clone();
    sqlx::query_as::<_, BusinessManagerRow>(
        r#"
        UPDATE business_managers
        SET first_name = $2, last_name = $3, email = $4, phone = $5, active = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.email)
    .bind(&row.phone)
    .bind(row.active)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{email}' is already used")))
}

pub async fn delete_business_manager(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM business_managers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Business manager {id} not found")));
    }
    info!("Deleted business manager {id}");
    Ok(())
}

/// The consultant's current business manager, if any.
pub async fn active_assignment(
    pool: &PgPool,
    consultant_id: Uuid,
) -> Result<Option<AssignmentDetailRow>, AppError> {
    Ok(sqlx::query_as::<_, AssignmentDetailRow>(
        r#"
        SELECT a.id, a.business_manager_id, bm.first_name, bm.last_name, bm.email,
               a.start_date, a.end_date, a.comment
        FROM consultant_business_managers a
        JOIN business_managers bm ON bm.id = a.business_manager_id
        WHERE a.consultant_id = $1 AND a.end_date IS NULL
        "#,
    )
    .bind(consultant_id)
    .fetch_optional(pool)
    .await?)
}

/// All assignments of a consultant, most recent first.
pub async fn history_of(pool: &PgPool, consultant_id: Uuid) -> Result<Vec<AssignmentDetailRow>, AppError> {
    get_consultant(pool, consultant_id).await?;
    Ok(sqlx::query_as::<_, AssignmentDetailRow>(
        r#"
        SELECT a.id, a.business_manager_id, bm.first_name, bm.last_name, bm.email,
               a.start_date, a.end_date, a.comment
        FROM consultant_business_managers a
        JOIN business_managers bm ON bm.id = a.business_manager_id
        WHERE a.consultant_id = $1
        ORDER BY a.start_date DESC, a.created_at DESC
        "#,
    )
    .bind(consultant_id)
    .fetch_all(pool)
    .await?)
}

/// Consultants currently managed by a business manager.
pub async fn list_consultants_of(pool: &PgPool, business_manager_id: Uuid) -> Result<Vec<ConsultantRow>, AppError> {
    get_business_manager(pool, business_manager_id).await?;
    Ok(sqlx::query_as::<_, ConsultantRow>(
        r#"
        SELECT c.*
        FROM consultants c
        JOIN consultant_business_managers a ON a.consultant_id = c.id
        WHERE a.business_manager_id = $1 AND a.end_date IS NULL
        ORDER BY c.last_name, c.first_name
        "#,
    )
    .bind(business_manager_id)
    .fetch_all(pool)
    .await?)
}

/// Makes `request.business_manager_id` the consultant's active business manager.
pub async fn assign(
    pool: &PgPool,
    consultant_id: Uuid,
    request: AssignRequest,
) -> Result<AssignOutcome, AppError> {
    get_consultant(pool, consultant_id).await?;
    let manager = get_business_manager(pool, request.business_manager_id).await?;
    if !manager.active {
        return Err(AppError::Validation(format!(
            "Business manager {} is inactive",
            manager.full_name()
        )));
    }
    let start_date = request.start_date.unwrap_or_else(today);

    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, AssignmentRow>(
        r#"
        SELECT * FROM consultant_business_managers
        WHERE consultant_id = $1 AND end_date IS NULL
        FOR UPDATE
        "#,
    )
    .bind(consultant_id)
    .fetch_optional(&mut *tx)
    .await?;

    let closed_assignment_id = match plan_assignment(current.as_ref(), manager.id, start_date)? {
        AssignPlan::KeepExisting => {
            tx.rollback().await?;
            let assignment = current.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("active assignment vanished during assign"))
            })?;
            return Ok(AssignOutcome {
                assignment,
                closed_assignment_id: None,
                unchanged: true,
            });
        }
        AssignPlan::Open => None,
        AssignPlan::Replace { close_on } => {
            let previous = current.as_ref().map(|a| a.id);
            sqlx::query("UPDATE consultant_business_managers SET end_date = $2 WHERE id = $1")
                .bind(previous)
                .bind(close_on)
                .execute(&mut *tx)
                .await?;
            previous
        }
    };

    let assignment = sqlx::query_as::<_, AssignmentRow>(
        r#"
        INSERT INTO consultant_business_managers
            (consultant_id, business_manager_id, start_date, comment)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(consultant_id)
    .bind(manager.id)
    .bind(start_date)
    .bind(request.comment)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, "Consultant already has an active business manager")
    })?;

    tx.commit().await?;

    info!(
        "Assigned consultant {consultant_id} to business manager {} from {start_date}",
        manager.id
    );
    Ok(AssignOutcome {
        assignment,
        closed_assignment_id,
        unchanged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn active(bm: Uuid, start: NaiveDate) -> AssignmentRow {
        AssignmentRow {
            id: Uuid::new_v4(),
            consultant_id: Uuid::nil(),
            business_manager_id: bm,
            start_date: start,
            end_date: None,
            comment: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_assignment_opens() {
        let plan = plan_assignment(None, Uuid::new_v4(), date(2024, 1, 1)).unwrap();
        assert_eq!(plan, AssignPlan::Open);
    }

    #[test]
    fn test_same_manager_is_noop() {
        let bm = Uuid::new_v4();
        let current = active(bm, date(2023, 1, 1));
        assert!(current.is_active());
        let plan = plan_assignment(Some(&current), bm, date(2024, 1, 1)).unwrap();
        assert_eq!(plan, AssignPlan::KeepExisting);
    }

    #[test]
    fn test_new_manager_closes_current_on_start_date() {
        let current = active(Uuid::new_v4(), date(2023, 1, 1));
        let plan = plan_assignment(Some(&current), Uuid::new_v4(), date(2024, 2, 1)).unwrap();
        assert_eq!(
            plan,
            AssignPlan::Replace {
                close_on: date(2024, 2, 1)
            }
        );
    }

    #[test]
    fn test_backdated_reassignment_rejected() {
        let current = active(Uuid::new_v4(), date(2024, 1, 1));
        let result = plan_assignment(Some(&current), Uuid::new_v4(), date(2023, 6, 1));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
