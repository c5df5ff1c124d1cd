//! Consultant persistence and aggregation.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::business_managers::service::active_assignment;
use crate::competences::service::{list_consultant_competences, list_consultant_languages};
use crate::consultants::metrics::{compute_cjm, round2, DerivedFields};
use crate::consultants::query::{build_count_query, build_search_query, SearchParams};
use crate::errors::AppError;
use crate::missions::service::{list_for_consultant, MissionView};
use crate::models::business_manager::AssignmentDetailRow;
use crate::models::competence::{ConsultantCompetenceRow, ConsultantLanguageRow};
use crate::models::consultant::{ConsultantListingRow, ConsultantRow, ContractType, Grade};
use crate::models::practice::PracticeRow;
use crate::pagination::Page;
use crate::practices::service::get_practice;

pub const DEFAULT_COMPANY: &str = "Quanteam";

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct NewConsultant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub salary: Option<f64>,
    #[serde(default = "default_available")]
    pub available: bool,
    pub availability_date: Option<NaiveDate>,
    pub grade: Option<Grade>,
    pub contract_type: Option<ContractType>,
    pub company: Option<String>,
    pub practice_id: Option<Uuid>,
    pub hire_date: Option<NaiveDate>,
    pub first_mission_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn default_available() -> bool {
    true
}

/// Partial update: absent fields are left unchanged, `null` clears a nullable field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultantPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub salary: Option<Option<f64>>,
    pub available: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub availability_date: Option<Option<NaiveDate>>,
    pub grade: Option<Grade>,
    pub contract_type: Option<ContractType>,
    pub company: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub practice_id: Option<Option<Uuid>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub hire_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub departure_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub first_mission_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultantSummary {
    #[serde(flatten)]
    pub listing: ConsultantListingRow,
    #[serde(flatten)]
    pub derived: DerivedFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultantDetail {
    pub consultant: ConsultantRow,
    #[serde(flatten)]
    pub derived: DerivedFields,
    pub practice: Option<PracticeRow>,
    pub business_manager: Option<AssignmentDetailRow>,
    pub missions: Vec<MissionView>,
    pub competences: Vec<ConsultantCompetenceRow>,
    pub languages: Vec<ConsultantLanguageRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BreakdownRow {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultantStats {
    pub total_consultants: i64,
    pub available_consultants: i64,
    pub by_practice: Vec<BreakdownRow>,
    pub by_grade: Vec<BreakdownRow>,
    pub average_salary: Option<f64>,
    pub average_cjm: Option<f64>,
    pub active_missions: i64,
    pub average_daily_rate: Option<f64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

fn validate_identity(first_name: &str, last_name: &str, email: &str) -> Result<(), AppError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(AppError::Validation(
            "first_name and last_name are required".to_string(),
        ));
    }
    validate_email(email)
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("'{email}' is not a valid email")))
    }
}

fn validate_salary(salary: Option<f64>) -> Result<(), AppError> {
    match salary {
        Some(s) if !s.is_finite() || s < 0.0 => Err(AppError::Validation(
            "salary must be a positive amount".to_string(),
        )),
        _ => Ok(()),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

/// Paginated, filtered consultant listing with derived fields.
pub async fn search_consultants(
    pool: &PgPool,
    params: &SearchParams,
) -> Result<Page<ConsultantSummary>, AppError> {
    let today = today();

    let total: i64 = build_count_query(params, today)
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let rows: Vec<ConsultantListingRow> = build_search_query(params, today)
        .build_query_as()
        .fetch_all(pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|listing| ConsultantSummary {
            derived: DerivedFields::for_consultant(&listing.consultant, today),
            listing,
        })
        .collect();

    Ok(Page::new(items, total, params.page.page, params.page.per_page))
}

pub async fn get_consultant(pool: &PgPool, id: Uuid) -> Result<ConsultantRow, AppError> {
    sqlx::query_as::<_, ConsultantRow>("SELECT * FROM consultants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Consultant {id} not found")))
}

pub async fn list_all_consultants(pool: &PgPool) -> Result<Vec<ConsultantRow>, AppError> {
    Ok(sqlx::query_as::<_, ConsultantRow>(
        "SELECT * FROM consultants ORDER BY last_name, first_name",
    )
    .fetch_all(pool)
    .await?)
}

/// Full profile: consultant, practice, active business manager, missions, skills, languages.
pub async fn get_consultant_detail(pool: &PgPool, id: Uuid) -> Result<ConsultantDetail, AppError> {
    let consultant = get_consultant(pool, id).await?;
    let today = today();

    let practice = match consultant.practice_id {
        Some(practice_id) => Some(get_practice(pool, practice_id).await?),
        None => None,
    };
    let business_manager = active_assignment(pool, id).await?;
    let missions = list_for_consultant(pool, id).await?;
    let competences = list_consultant_competences(pool, id).await?;
    let languages = list_consultant_languages(pool, id).await?;

    Ok(ConsultantDetail {
        derived: DerivedFields::for_consultant(&consultant, today),
        consultant,
        practice,
        business_manager,
        missions,
        competences,
        languages,
    })
}

async fn email_taken(pool: &PgPool, email: &str, except: Option<Uuid>) -> Result<bool, AppError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM consultants WHERE lower(email) = lower($1) AND ($2::UUID IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn create_consultant(pool: &PgPool, new: NewConsultant) -> Result<ConsultantRow, AppError> {
    validate_identity(&new.first_name, &new.last_name, &new.email)?;
    validate_salary(new.salary)?;

    let email = normalize_email(&new.email);
    if email_taken(pool, &email, None).await? {
        return Err(AppError::Conflict(format!(
            "A consultant with email '{email}' already exists"
        )));
    }
    if let Some(practice_id) = new.practice_id {
        get_practice(pool, practice_id).await?;
    }

    let row = sqlx::query_as::<_, ConsultantRow>(
        r#"
        INSERT INTO consultants
            (first_name, last_name, email, phone, salary, available, availability_date,
             grade, contract_type, company, practice_id, hire_date, first_mission_date, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(&email)
    .bind(new.phone)
    .bind(new.salary)
    .bind(new.available)
    .bind(new.availability_date)
    .bind(new.grade.unwrap_or(Grade::Junior).as_str())
    .bind(new.contract_type.unwrap_or(ContractType::Cdi).as_str())
    .bind(new.company.unwrap_or_else(|| DEFAULT_COMPANY.to_string()))
    .bind(new.practice_id)
    .bind(new.hire_date)
    .bind(new.first_mission_date)
    .bind(new.notes)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{email}' is already used")))?;

    info!("Created consultant {} ({})", row.id, row.full_name());
    Ok(row)
}

/// Applies a patch on top of an existing row. Pure so it can be validated before any write.
pub fn apply_patch(mut row: ConsultantRow, patch: ConsultantPatch) -> Result<ConsultantRow, AppError> {
    if let Some(v) = patch.first_name {
        row.first_name = v.trim().to_string();
    }
    if let Some(v) = patch.last_name {
        row.last_name = v.trim().to_string();
    }
    if let Some(v) = patch.email {
        row.email = normalize_email(&v);
    }
    if let Some(v) = patch.phone {
        row.phone = v;
    }
    if let Some(v) = patch.salary {
        row.salary = v;
    }
    if let Some(v) = patch.available {
        row.available = v;
    }
    if let Some(v) = patch.availability_date {
        row.availability_date = v;
    }
    if let Some(v) = patch.grade {
        row.grade = v.as_str().to_string();
    }
    if let Some(v) = patch.contract_type {
        row.contract_type = v.as_str().to_string();
    }
    if let Some(v) = patch.company {
        row.company = v;
    }
    if let Some(v) = patch.practice_id {
        row.practice_id = v;
    }
    if let Some(v) = patch.hire_date {
        row.hire_date = v;
    }
    if let Some(v) = patch.departure_date {
        row.departure_date = v;
    }
    if let Some(v) = patch.first_mission_date {
        row.first_mission_date = v;
    }
    if let Some(v) = patch.notes {
        row.notes = v;
    }

    validate_identity(&row.first_name, &row.last_name, &row.email)?;
    validate_salary(row.salary)?;
    if let (Some(hire), Some(departure)) = (row.hire_date, row.departure_date) {
        if departure < hire {
            return Err(AppError::Validation(
                "departure_date cannot be before hire_date".to_string(),
            ));
        }
    }
    Ok(row)
}

pub async fn update_consultant(
    pool: &PgPool,
    id: Uuid,
    patch: ConsultantPatch,
) -> Result<ConsultantRow, AppError> {
    let existing = get_consultant(pool, id).await?;
    let practice_changed = matches!(patch.practice_id, Some(p) if p != existing.practice_id);
    let row = apply_patch(existing, patch)?;

    if email_taken(pool, &row.email, Some(id)).await? {
        return Err(AppError::Conflict(format!(
            "A consultant with email '{}' already exists",
            row.email
        )));
    }
    if practice_changed {
        if let Some(practice_id) = row.practice_id {
            get_practice(pool, practice_id).await?;
        }
    }

    let updated = sqlx::query_as::<_, ConsultantRow>(
        r#"
        UPDATE consultants SET
            first_name = $2, last_name = $3, email = $4, phone = $5, salary = $6,
            available = $7, availability_date = $8, grade = $9, contract_type = $10,
            company = $11, practice_id = $12, hire_date = $13, departure_date = $14,
            first_mission_date = $15, notes = $16, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.email)
    .bind(&row.phone)
    .bind(row.salary)
    .bind(row.available)
    .bind(row.availability_date)
    .bind(&row.grade)
    .bind(&row.contract_type)
    .bind(&row.company)
    .bind(row.practice_id)
    .bind(row.hire_date)
    .bind(row.departure_date)
    .bind(row.first_mission_date)
    .bind(&row.notes)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Email '{}' is already used", row.email)))?;

    info!("Updated consultant {id}");
    Ok(updated)
}

pub async fn delete_consultant(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM consultants WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Consultant {id} not found")));
    }
    info!("Deleted consultant {id}");
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Statistics
// ────────────────────────────────────────────────────────────────────────────

pub async fn consultant_stats(pool: &PgPool) -> Result<ConsultantStats, AppError> {
    let today = today();

    let (total_consultants, available_consultants, average_salary): (i64, i64, Option<f64>) =
        sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE available OR (availability_date IS NOT NULL AND availability_date <= $1)),
                   AVG(salary) FILTER (WHERE salary > 0)
            FROM consultants
            "#,
        )
        .bind(today)
        .fetch_one(pool)
        .await?;

    let by_practice = sqlx::query_as::<_, BreakdownRow>(
        r#"
        SELECT COALESCE(p.name, 'Sans practice') AS label, COUNT(*) AS count
        FROM consultants c
        LEFT JOIN practices p ON p.id = c.practice_id
        GROUP BY 1
        ORDER BY count DESC, label
        "#,
    )
    .fetch_all(pool)
    .await?;

    let by_grade = sqlx::query_as::<_, BreakdownRow>(
        "SELECT grade AS label, COUNT(*) AS count FROM consultants GROUP BY grade ORDER BY count DESC, label",
    )
    .fetch_all(pool)
    .await?;

    let (active_missions, average_daily_rate): (i64, Option<f64>) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE status = 'en_cours'), AVG(daily_rate) FILTER (WHERE daily_rate > 0) FROM missions",
    )
    .fetch_one(pool)
    .await?;

    Ok(ConsultantStats {
        total_consultants,
        available_consultants,
        by_practice,
        by_grade,
        average_salary: average_salary.map(round2),
        // CJM is linear in salary, so the mean CJM is the CJM of the mean salary.
        average_cjm: compute_cjm(average_salary),
        active_missions,
        average_daily_rate: average_daily_rate.map(round2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ConsultantRow {
        ConsultantRow {
            id: Uuid::nil(),
            first_name: "Marie".to_string(),
            last_name: "Dupont".to_string(),
            email: "marie.dupont@example.com".to_string(),
            phone: None,
            salary: Some(52_000.0),
            available: false,
            availability_date: None,
            grade: "Senior".to_string(),
            contract_type: "CDI".to_string(),
            company: DEFAULT_COMPANY.to_string(),
            practice_id: None,
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 6),
            departure_date: None,
            first_mission_date: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a.b@corp.fr").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@corp.fr").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a@corp.").is_err());
    }

    #[test]
    fn test_apply_patch_updates_only_given_fields() {
        let patch = ConsultantPatch {
            salary: Some(Some(60_000.0)),
            grade: Some(Grade::Manager),
            email: Some("  Marie.DUPONT@Example.com ".to_string()),
            ..Default::default()
        };
        let row = apply_patch(sample_row(), patch).unwrap();
        assert_eq!(row.salary, Some(60_000.0));
        assert_eq!(row.grade, "Manager");
        assert_eq!(row.email, "marie.dupont@example.com");
        assert_eq!(row.first_name, "Marie");
        assert_eq!(row.contract_type, "CDI");
    }

    #[test]
    fn test_apply_patch_null_clears_nullable_fields() {
        let mut row = sample_row();
        row.availability_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        row.practice_id = Some(Uuid::new_v4());
        row.phone = Some("0601020304".to_string());
        let patch: ConsultantPatch = serde_json::from_str(
            r#"{"availability_date": null, "practice_id": null, "phone": null}"#,
        )
        .unwrap();
        let row = apply_patch(row, patch).unwrap();
        assert_eq!(row.availability_date, None);
        assert_eq!(row.practice_id, None);
        assert_eq!(row.phone, None);
        assert_eq!(row.salary, Some(52_000.0));
    }

    #[test]
    fn test_apply_patch_absent_fields_are_kept() {
        let mut row = sample_row();
        row.availability_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        let patch: ConsultantPatch = serde_json::from_str(r#"{"notes": "retour de congé"}"#).unwrap();
        let row = apply_patch(row, patch).unwrap();
        assert_eq!(row.availability_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(row.notes.as_deref(), Some("retour de congé"));
    }

    #[test]
    fn test_apply_patch_rejects_blank_name() {
        let patch = ConsultantPatch {
            last_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            apply_patch(sample_row(), patch),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_apply_patch_rejects_departure_before_hire() {
        let patch = ConsultantPatch {
            departure_date: Some(NaiveDate::from_ymd_opt(2019, 12, 31)),
            ..Default::default()
        };
        assert!(apply_patch(sample_row(), patch).is_err());
    }

    #[test]
    fn test_negative_salary_rejected() {
        assert!(validate_salary(Some(-1.0)).is_err());
        assert!(validate_salary(Some(f64::NAN)).is_err());
        assert!(validate_salary(None).is_ok());
    }

    #[test]
    fn test_new_consultant_defaults_to_available() {
        let json = r#"{"first_name": "Paul", "last_name": "Martin", "email": "p.martin@corp.fr", "grade": "Confirmé"}"#;
        let new: NewConsultant = serde_json::from_str(json).unwrap();
        assert!(new.available);
        assert_eq!(new.grade, Some(Grade::Confirme));
        assert_eq!(new.contract_type, None);
    }
}
