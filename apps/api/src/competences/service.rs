//! Competence catalog and consultant skills/languages.

use serde::Deserialize;
use sqlx::{PgPool, Postgres};
use tracing::info;
use uuid::Uuid;

use crate::consultants::service::get_consultant;
use crate::errors::AppError;
use crate::models::competence::{
    CompetenceKind, CompetenceRow, ConsultantCompetenceRow, ConsultantLanguageRow, LanguageLevel,
    SkillLevel,
};
use crate::models::consultant::ConsultantRow;

pub const DEFAULT_CATEGORY: &str = "Autre";

#[derive(Debug, Clone, Deserialize)]
pub struct NewCompetence {
    pub name: String,
    pub category: Option<String>,
    pub kind: Option<CompetenceKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachCompetence {
    /// Existing catalog entry, or `name` to upsert one.
    pub competence_id: Option<Uuid>,
    pub name: Option<String>,
    pub level: SkillLevel,
    #[serde(default)]
    pub years_experience: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachLanguage {
    pub name: String,
    pub level: LanguageLevel,
    pub comment: Option<String>,
}

/// Splits "Java / Spring, SQL" style lists into clean, deduplicated skill names.
pub fn split_skill_list(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split([',', ';', '/', '\n', '|'])
        .map(|s| s.trim().trim_matches(|c: char| c == '-' || c == '•').trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(crate::text::fold(s)))
        .map(str::to_string)
        .collect()
}

pub async fn list_competences(pool: &PgPool) -> Result<Vec<CompetenceRow>, AppError> {
    Ok(sqlx::query_as::<_, CompetenceRow>(
        "SELECT * FROM competences ORDER BY category, name",
    )
    .fetch_all(pool)
    .await?)
}

pub async fn get_competence(pool: &PgPool, id: Uuid) -> Result<CompetenceRow, AppError> {
    sqlx::query_as::<_, CompetenceRow>("SELECT * FROM competences WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Competence {id} not found")))
}

pub async fn create_competence(pool: &PgPool, new: NewCompetence) -> Result<CompetenceRow, AppError> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("competence name is required".to_string()));
    }
    let row = sqlx::query_as::<_, CompetenceRow>(
        "INSERT INTO competences (name, category, kind) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&name)
    .bind(new.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
    .bind(new.kind.unwrap_or(CompetenceKind::Technique).as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, format!("Competence '{name}' already exists")))?;
    info!("Created competence {} ({})", row.id, row.name);
    Ok(row)
}

/// Returns the catalog entry with this name (case-insensitive), creating it if missing.
pub async fn upsert_by_name<'e, E>(
    executor: E,
    name: &str,
    kind: CompetenceKind,
) -> Result<CompetenceRow, AppError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("competence name is required".to_string()));
    }
    // The no-op update makes RETURNING yield the existing row on conflict.
    Ok(sqlx::query_as::<_, CompetenceRow>(
        r#"
        INSERT INTO competences (name, category, kind)
        VALUES ($1, $2, $3)
        ON CONFLICT (lower(name)) DO UPDATE SET name = competences.name
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(DEFAULT_CATEGORY)
    .bind(kind.as_str())
    .fetch_one(executor)
    .await?)
}

pub async fn list_consultant_competences(
    pool: &PgPool,
    consultant_id: Uuid,
) -> Result<Vec<ConsultantCompetenceRow>, AppError> {
    Ok(sqlx::query_as::<_, ConsultantCompetenceRow>(
        r#"
        SELECT cc.id, cc.consultant_id, cc.competence_id, c.name, c.category, c.kind,
               cc.level, cc.years_experience
        FROM consultant_competences cc
        JOIN competences c ON c.id = cc.competence_id
        WHERE cc.consultant_id = $1
        ORDER BY c.kind, c.name
        "#,
    )
    .bind(consultant_id)
    .fetch_all(pool)
    .await?)
}

pub async fn list_consultant_languages(
    pool: &PgPool,
    consultant_id: Uuid,
) -> Result<Vec<ConsultantLanguageRow>, AppError> {
    Ok(sqlx::query_as::<_, ConsultantLanguageRow>(
        r#"
        SELECT cl.id, cl.consultant_id, cl.language_id, l.name, cl.level, cl.comment
        FROM consultant_languages cl
        JOIN languages l ON l.id = cl.language_id
        WHERE cl.consultant_id = $1
        ORDER BY l.name
        "#,
    )
    .bind(consultant_id)
    .fetch_all(pool)
    .await?)
}

/// Attaches (or re-levels) a competence on a consultant.
pub async fn attach_competence(
    pool: &PgPool,
    consultant_id: Uuid,
    request: AttachCompetence,
) -> Result<ConsultantCompetenceRow, AppError> {
    get_consultant(pool, consultant_id).await?;
    if !request.years_experience.is_finite() || request.years_experience < 0.0 {
        return Err(AppError::Validation(
            "years_experience must be positive".to_string(),
        ));
    }

    let competence_id = match (request.competence_id, request.name.as_deref()) {
        (Some(id), _) => id,
        (None, Some(name)) => upsert_by_name(pool, name, CompetenceKind::Technique).await?.id,
        (None, None) => {
            return Err(AppError::Validation(
                "competence_id or name is required".to_string(),
            ))
        }
    };

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO consultant_competences (consultant_id, competence_id, level, years_experience)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (consultant_id, competence_id)
        DO UPDATE SET level = EXCLUDED.level, years_experience = EXCLUDED.years_experience
        RETURNING id
        "#,
    )
    .bind(consultant_id)
    .bind(competence_id)
    .bind(request.level.as_str())
    .bind(request.years_experience)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
            AppError::NotFound(format!("Competence {competence_id} not found"))
        }
        _ => AppError::Database(e),
    })?;

    list_consultant_competences(pool, consultant_id)
        .await?
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("attached competence {id} not readable")))
}

pub async fn detach_competence(pool: &PgPool, consultant_id: Uuid, competence_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        "DELETE FROM consultant_competences WHERE consultant_id = $1 AND competence_id = $2",
    )
    .bind(consultant_id)
    .bind(competence_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Competence {competence_id} is not attached to consultant {consultant_id}"
        )));
    }
    Ok(())
}

pub async fn attach_language(
    pool: &PgPool,
    consultant_id: Uuid,
    request: AttachLanguage,
) -> Result<ConsultantLanguageRow, AppError> {
    get_consultant(pool, consultant_id).await?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("language name is required".to_string()));
    }

    let mut tx = pool.begin().await?;
    let language_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO languages (name) VALUES ($1)
        ON CONFLICT (lower(name)) DO UPDATE SET name = languages.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, ConsultantLanguageRow>(
        r#"
        WITH upserted AS (
            INSERT INTO consultant_languages (consultant_id, language_id, level, comment)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (consultant_id, language_id)
            DO UPDATE SET level = EXCLUDED.level, comment = EXCLUDED.comment
            RETURNING *
        )
        SELECT u.id, u.consultant_id, u.language_id, l.name, u.level, u.comment
        FROM upserted u JOIN languages l ON l.id = u.language_id
        "#,
    )
    .bind(consultant_id)
    .bind(language_id)
    .bind(request.level.as_str())
    .bind(request.comment)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(row)
}

/// Consultants holding a competence, matched case-insensitively by name.
pub async fn find_consultants_with_skill(pool: &PgPool, name: &str) -> Result<Vec<ConsultantRow>, AppError> {
    Ok(sqlx::query_as::<_, ConsultantRow>(
        r#"
        SELECT DISTINCT c.*
        FROM consultants c
        JOIN consultant_competences cc ON cc.consultant_id = c.id
        JOIN competences k ON k.id = cc.competence_id
        WHERE lower(k.name) = lower($1)
        ORDER BY c.last_name, c.first_name
        "#,
    )
    .bind(name.trim())
    .fetch_all(pool)
    .await?)
}

/// Consultants speaking a language, matched case-insensitively by name.
pub async fn find_consultants_with_language(pool: &PgPool, name: &str) -> Result<Vec<ConsultantRow>, AppError> {
    Ok(sqlx::query_as::<_, ConsultantRow>(
        r#"
        SELECT DISTINCT c.*
        FROM consultants c
        JOIN consultant_languages cl ON cl.consultant_id = c.id
        JOIN languages l ON l.id = cl.language_id
        WHERE lower(l.name) = lower($1)
        ORDER BY c.last_name, c.first_name
        "#,
    )
    .bind(name.trim())
    .fetch_all(pool)
    .await?)
}

pub async fn list_language_names(pool: &PgPool) -> Result<Vec<String>, AppError> {
    Ok(sqlx::query_scalar::<_, String>("SELECT name FROM languages ORDER BY name")
        .fetch_all(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_skill_list_dedups_case_and_accents() {
        let skills = split_skill_list("Java / Spring, SQL; java\n- Modélisation | modelisation");
        assert_eq!(skills, vec!["Java", "Spring", "SQL", "Modélisation"]);
    }

    #[test]
    fn test_split_skill_list_empty() {
        assert!(split_skill_list(" , ; ").is_empty());
    }

    #[test]
    fn test_attach_request_defaults_years() {
        let req: AttachCompetence =
            serde_json::from_str(r#"{"name": "Rust", "level": "expert"}"#).unwrap();
        assert_eq!(req.level, SkillLevel::Expert);
        assert_eq!(req.years_experience, 0.0);
    }
}
