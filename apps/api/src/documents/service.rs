//! Document lifecycle: upload → extract → analyze → apply to the consultant profile.

use std::collections::HashSet;
use std::future::Future;

use bytes::Bytes;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::competences::service::{split_skill_list, upsert_by_name};
use crate::consultants::service::{get_consultant, today};
use crate::cv::analyzer::CvAnalyzer;
use crate::cv::extract::extract_text;
use crate::cv::models::{CvAnalysis, CvMission};
use crate::documents::storage::{delete_object, put_object, storage_key};
use crate::errors::AppError;
use crate::missions::service::infer_status;
use crate::models::competence::{CompetenceKind, SkillLevel};
use crate::models::document::DocumentRow;
use crate::models::mission::MissionRow;
use crate::text::fold;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where the S3 side of document operations goes.
pub struct Store<'a> {
    pub s3: &'a aws_sdk_s3::Client,
    pub bucket: &'a str,
}

pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ApplyReport {
    pub competences_added: usize,
    pub competences_already_present: usize,
    pub missions_created: usize,
    pub missions_skipped: usize,
}

pub async fn get_document(pool: &PgPool, id: Uuid) -> Result<DocumentRow, AppError> {
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
}

pub async fn list_documents(pool: &PgPool, consultant_id: Uuid) -> Result<Vec<DocumentRow>, AppError> {
    get_consultant(pool, consultant_id).await?;
    Ok(sqlx::query_as::<_, DocumentRow>(
        "SELECT * FROM documents WHERE consultant_id = $1 ORDER BY uploaded_at DESC",
    )
    .bind(consultant_id)
    .fetch_all(pool)
    .await?)
}

pub async fn upload_document(
    pool: &PgPool,
    store: Store<'_>,
    consultant_id: Uuid,
    upload: Upload,
) -> Result<DocumentRow, AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "uploaded file exceeds {} MB",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    get_consultant(pool, consultant_id).await?;

    let document_id = Uuid::new_v4();
    let key = storage_key(consultant_id, document_id, &upload.file_name);
    let size_bytes = upload.bytes.len() as i64;

    let extracted_text =
        extract_text(upload.bytes.clone(), &upload.content_type, &upload.file_name).await?;
    put_object(store.s3, store.bucket, &key, &upload.content_type, upload.bytes).await?;

    let inserted = sqlx::query_as::<_, DocumentRow>(
        r#"
        INSERT INTO documents
            (id, consultant_id, file_name, content_type, size_bytes, storage_key, extracted_text)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(document_id)
    .bind(consultant_id)
    .bind(&upload.file_name)
    .bind(&upload.content_type)
    .bind(size_bytes)
    .bind(&key)
    .bind(&extracted_text)
    .fetch_one(pool)
    .await
    .map_err(AppError::from);
    let row = undo_on_error(inserted, delete_object(store.s3, store.bucket, &key)).await?;

    info!(
        "Stored document {} for consultant {consultant_id} ({} bytes, text: {})",
        row.id,
        size_bytes,
        row.has_text()
    );
    Ok(row)
}

/// The row is only removed once the object is gone from the bucket.
pub async fn delete_document(pool: &PgPool, store: Store<'_>, id: Uuid) -> Result<(), AppError> {
    let document = get_document(pool, id).await?;
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM documents WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    delete_object(store.s3, store.bucket, &document.storage_key).await?;
    tx.commit().await?;
    info!("Deleted document {id}");
    Ok(())
}

/// Runs `undo` when `result` is an error, then returns `result` unchanged.
/// A failing `undo` is logged; the original error is what the caller sees.
pub async fn undo_on_error<T, U>(result: Result<T, AppError>, undo: U) -> Result<T, AppError>
where
    U: Future<Output = Result<(), AppError>>,
{
    if let Err(e) = &result {
        warn!("Undoing partial write after error: {e}");
        if let Err(undo_err) = undo.await {
            warn!("Undo failed: {undo_err}");
        }
    }
    result
}

/// Runs the analyzer on the document's text and stores the result.
pub async fn analyze_document(
    pool: &PgPool,
    analyzer: &dyn CvAnalyzer,
    id: Uuid,
) -> Result<DocumentRow, AppError> {
    let document = get_document(pool, id).await?;
    let text = match document.extracted_text.as_deref() {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            return Err(AppError::UnprocessableEntity(format!(
                "Document {id} has no extractable text"
            )))
        }
    };

    info!("Analyzing document {id} with {}", analyzer.name());
    let analysis = analyzer.analyze(text).await?;
    let value = serde_json::to_value(&analysis).map_err(|e| AppError::Internal(e.into()))?;

    Ok(sqlx::query_as::<_, DocumentRow>(
        "UPDATE documents SET analysis = $2, analyzed_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(value)
    .fetch_one(pool)
    .await?)
}

/// Analysed missions not already on the consultant (same client and start date).
/// Missions without a start date cannot be recorded and are skipped.
pub fn plan_missions<'a>(analysis: &'a CvAnalysis, existing: &[MissionRow]) -> (Vec<&'a CvMission>, usize) {
    let mut known: HashSet<(String, chrono::NaiveDate)> = existing
        .iter()
        .map(|m| (fold(m.client.trim()), m.start_date))
        .collect();
    let mut to_create = Vec::new();
    let mut skipped = 0;
    for mission in &analysis.missions {
        let client = mission.client.trim();
        match mission.start_date {
            Some(start) if !client.is_empty() && known.insert((fold(client), start)) => {
                to_create.push(mission)
            }
            _ => skipped += 1,
        }
    }
    (to_create, skipped)
}

/// Technologies may arrive as one comma-separated string from the model.
fn mission_technologies(mission: &CvMission) -> Vec<String> {
    mission
        .technologies
        .iter()
        .flat_map(|t| split_skill_list(t))
        .collect()
}

/// Copies analysed skills and missions onto the consultant, in one transaction.
pub async fn apply_analysis(pool: &PgPool, id: Uuid) -> Result<ApplyReport, AppError> {
    let document = get_document(pool, id).await?;
    let value = document.analysis.ok_or_else(|| {
        AppError::UnprocessableEntity(format!("Document {id} has not been analyzed yet"))
    })?;
    let analysis: CvAnalysis = serde_json::from_value(value).map_err(|e| {
        warn!("Stored analysis of document {id} is unreadable: {e}");
        AppError::UnprocessableEntity(format!("Stored analysis of document {id} is unreadable"))
    })?;
    let consultant_id = document.consultant_id;

    let existing = sqlx::query_as::<_, MissionRow>("SELECT * FROM missions WHERE consultant_id = $1")
        .bind(consultant_id)
        .fetch_all(pool)
        .await?;

    let mut report = ApplyReport::default();
    let mut tx = pool.begin().await?;

    let technical: HashSet<String> = analysis.technical_skills.iter().map(|s| fold(s.trim())).collect();
    for skill in analysis.all_skills() {
        let kind = if technical.contains(&fold(&skill)) {
            CompetenceKind::Technique
        } else {
            CompetenceKind::Fonctionnelle
        };
        let competence = upsert_by_name(&mut *tx, &skill, kind).await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO consultant_competences (consultant_id, competence_id, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (consultant_id, competence_id) DO NOTHING
            "#,
        )
        .bind(consultant_id)
        .bind(competence.id)
        .bind(SkillLevel::Intermediaire.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if inserted > 0 {
            report.competences_added += 1;
        } else {
            report.competences_already_present += 1;
        }
    }

    let today = today();
    let (to_create, skipped) = plan_missions(&analysis, &existing);
    report.missions_skipped = skipped;
    for mission in to_create {
        let Some(start_date) = mission.start_date else {
            continue;
        };
        let end_date = mission.end_date.filter(|end| *end >= start_date);
        let name = mission
            .role
            .as_deref()
            .map(|role| format!("{role} - {}", mission.client.trim()))
            .unwrap_or_else(|| format!("Mission {}", mission.client.trim()));
        sqlx::query(
            r#"
            INSERT INTO missions
                (consultant_id, name, client, role, start_date, end_date, status, technologies, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(consultant_id)
        .bind(name)
        .bind(mission.client.trim())
        .bind(&mission.role)
        .bind(start_date)
        .bind(end_date)
        .bind(infer_status(start_date, end_date, today).as_str())
        .bind(mission_technologies(mission))
        .bind(&mission.description)
        .execute(&mut *tx)
        .await?;
        report.missions_created += 1;
    }

    tx.commit().await?;
    info!(
        "Applied analysis of document {id} to consultant {consultant_id}: {:?}",
        report
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cv_mission(client: &str, start: Option<NaiveDate>) -> CvMission {
        CvMission {
            client: client.to_string(),
            role: None,
            start_date: start,
            end_date: None,
            description: None,
            technologies: vec!["Java, Spring".to_string(), "Kafka".to_string()],
        }
    }

    fn existing(client: &str, start: NaiveDate) -> MissionRow {
        MissionRow {
            id: Uuid::new_v4(),
            consultant_id: Uuid::nil(),
            name: "x".to_string(),
            client: client.to_string(),
            role: None,
            start_date: start,
            end_date: None,
            status: "en_cours".to_string(),
            daily_rate: None,
            revenue: None,
            technologies: vec![],
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_plan_missions_skips_known_undated_and_duplicates() {
        let analysis = CvAnalysis {
            missions: vec![
                cv_mission("Société Générale", Some(date(2020, 1, 1))),
                cv_mission("AXA", Some(date(2022, 3, 1))),
                cv_mission("AXA", Some(date(2022, 3, 1))),
                cv_mission("Orange", None),
                cv_mission("  ", Some(date(2021, 1, 1))),
            ],
            ..Default::default()
        };
        let current = vec![existing("societe generale", date(2020, 1, 1))];
        let (to_create, skipped) = plan_missions(&analysis, &current);
        assert_eq!(to_create.len(), 1);
        assert_eq!(to_create[0].client, "AXA");
        assert_eq!(skipped, 4);
    }

    #[test]
    fn test_mission_technologies_are_split() {
        let mission = cv_mission("AXA", None);
        assert_eq!(mission_technologies(&mission), vec!["Java", "Spring", "Kafka"]);
    }

    #[tokio::test]
    async fn test_undo_runs_when_write_fails() {
        let undone = std::sync::atomic::AtomicBool::new(false);
        let result: Result<(), AppError> = undo_on_error(
            Err(AppError::Conflict("row already exists".to_string())),
            async {
                undone.store(true, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(undone.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_undo_skipped_on_success() {
        let undone = std::sync::atomic::AtomicBool::new(false);
        let result = undo_on_error(Ok(7), async {
            undone.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert!(!undone.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_undo_keeps_original_error() {
        let result: Result<(), AppError> = undo_on_error(
            Err(AppError::Validation("bad row".to_string())),
            async { Err(AppError::Storage("bucket unreachable".to_string())) },
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
