use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;

use crate::business_managers::service::{active_assignment, list_business_managers};
use crate::chatbot::answers;
use crate::chatbot::entities::{extract_entities, ConsultantRef, Entities, Vocabulary};
use crate::chatbot::history::{last_consultant, validate_session_id, ChatHistory, ChatTurn};
use crate::chatbot::intent::{classify, Classification, Intent};
use crate::competences::service::{
    find_consultants_with_language, find_consultants_with_skill, list_consultant_competences,
    list_consultant_languages, list_language_names,
};
use crate::consultants::metrics::{compute_cjm, DerivedFields};
use crate::consultants::service::{consultant_stats, get_consultant, list_all_consultants, today};
use crate::documents::service::list_documents;
use crate::errors::AppError;
use crate::missions::service::{list_by_client, list_for_consultant};
use crate::models::consultant::ConsultantRow;
use crate::practices::service::practice_overview;
use crate::text::{contains_words, fold, normalize};

pub const MAX_QUESTION_CHARS: usize = 1000;

/// Words that turn a question into one about several consultants.
const COLLECTION_MARKERS: &[&str] = &["qui", "quels", "quelles", "consultants", "liste", "tous"];

/// Words asking for a figure over the whole firm ("salaire moyen", "TJM moyen").
const AGGREGATE_MARKERS: &[&str] = &["moyen", "moyens", "moyenne", "moyennes", "total", "repartition"];

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub intent: Intent,
    pub confidence: f64,
    pub wants_count: bool,
    pub answer: String,
    pub entities: Entities,
    /// Consultant the answer is about, named or carried over from the session.
    pub consultant: Option<ConsultantRef>,
    pub data: Value,
}

/// Who a question is about.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Nobody,
    One(ConsultantRef),
    Ambiguous(Vec<ConsultantRef>),
}

struct Reply {
    answer: String,
    data: Value,
}

impl Reply {
    fn text(answer: String) -> Self {
        Self {
            answer,
            data: Value::Null,
        }
    }
}

pub fn asks_for_aggregate(question: &str) -> bool {
    AGGREGATE_MARKERS.iter().any(|m| contains_words(question, m))
}

/// True when the question is about several consultants ("qui est disponible ?")
/// or about firm-wide figures ("quel est le salaire moyen ?").
pub fn asks_about_many(question: &str, classification: &Classification) -> bool {
    classification.wants_count
        || asks_for_aggregate(question)
        || COLLECTION_MARKERS.iter().any(|m| contains_words(question, m))
}

/// Named consultants first; otherwise the last one discussed, for
/// consultant-scoped follow-ups like "et son salaire ?".
pub fn resolve_subject(
    question: &str,
    classification: &Classification,
    entities: &Entities,
    turns: &[ChatTurn],
) -> Subject {
    match entities.consultants.as_slice() {
        [one] => Subject::One(one.clone()),
        [] => {
            let follow_up = classification.intent.is_consultant_scoped()
                && !asks_about_many(question, classification)
                && entities.clients.is_empty()
                && entities.languages.is_empty()
                && entities.competences.is_empty();
            match last_consultant(turns) {
                Some(previous) if follow_up => Subject::One(previous.clone()),
                _ => Subject::Nobody,
            }
        }
        many => Subject::Ambiguous(many.to_vec()),
    }
}

pub async fn answer_question(
    pool: &PgPool,
    history: &ChatHistory,
    request: ChatRequest,
) -> Result<ChatResponse, AppError> {
    validate_session_id(&request.session_id)?;
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }
    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(AppError::Validation(format!(
            "question cannot exceed {MAX_QUESTION_CHARS} characters"
        )));
    }

    let normalized = normalize(question);
    let vocabulary = Vocabulary::load(pool).await?;
    let entities = extract_entities(&normalized, &vocabulary);
    let classification = classify(&normalized, &entities);
    let turns = history.load_or_empty(&request.session_id).await;
    let subject = resolve_subject(&normalized, &classification, &entities, &turns);

    info!(
        "Chat session {}: intent {:?} ({} hits), subject {:?}",
        request.session_id, classification.intent, classification.hits, subject
    );

    let aggregate = asks_for_aggregate(&normalized);
    let reply = respond(pool, &classification, &entities, &subject, aggregate).await?;
    let consultant = match subject {
        Subject::One(c) => Some(c),
        _ => None,
    };

    history
        .record(
            &request.session_id,
            &ChatTurn {
                question: question.to_string(),
                intent: classification.intent,
                consultant: consultant.clone(),
                answer: reply.answer.clone(),
                at: chrono::Utc::now(),
            },
        )
        .await;

    Ok(ChatResponse {
        intent: classification.intent,
        confidence: classification.confidence,
        wants_count: classification.wants_count,
        answer: reply.answer,
        entities,
        consultant,
        data: reply.data,
    })
}

/// The consultant row, or `None` if it was deleted since the session named it.
async fn load_subject(pool: &PgPool, subject: &ConsultantRef) -> Result<Option<ConsultantRow>, AppError> {
    match get_consultant(pool, subject.id).await {
        Ok(row) => Ok(Some(row)),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn names(rows: &[ConsultantRow]) -> Vec<String> {
    rows.iter().map(ConsultantRow::full_name).collect()
}

async fn respond(
    pool: &PgPool,
    classification: &Classification,
    entities: &Entities,
    subject: &Subject,
    aggregate: bool,
) -> Result<Reply, AppError> {
    let intent = classification.intent;
    let wants_count = classification.wants_count;

    if intent.is_consultant_scoped() {
        match subject {
            Subject::Ambiguous(candidates) => {
                let candidate_names: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
                return Ok(Reply {
                    answer: answers::ambiguous_consultant(&candidate_names),
                    data: json!({ "candidates": candidates }),
                });
            }
            Subject::One(reference) => {
                return match load_subject(pool, reference).await? {
                    Some(consultant) => respond_about(pool, intent, wants_count, consultant).await,
                    None => Ok(Reply::text(answers::missing_consultant())),
                };
            }
            Subject::Nobody => {}
        }
    }

    match intent {
        Intent::Salary => {
            let stats = consultant_stats(pool).await?;
            Ok(Reply {
                answer: answers::average_salary(&stats),
                data: json!({
                    "average_salary": stats.average_salary,
                    "average_cjm": stats.average_cjm,
                }),
            })
        }
        Intent::Missions => match entities.clients.first() {
            Some(client) => {
                let missions = list_by_client(pool, client).await?;
                let labels: Vec<String> = missions.iter().map(|m| m.name.clone()).collect();
                Ok(Reply {
                    answer: answers::missions_at_client(client, &labels, wants_count),
                    data: json!({ "client": client, "missions": missions }),
                })
            }
            None if aggregate => {
                let stats = consultant_stats(pool).await?;
                Ok(Reply {
                    answer: answers::statistics(&stats),
                    data: json!(stats),
                })
            }
            None => Ok(Reply::text(answers::missing_consultant())),
        },
        Intent::Availability => {
            let today = today();
            let available: Vec<ConsultantRow> = list_all_consultants(pool)
                .await?
                .into_iter()
                .filter(|c| DerivedFields::for_consultant(c, today).is_available_now)
                .collect();
            Ok(Reply {
                answer: answers::consultant_names("disponibles", &names(&available), wants_count),
                data: json!({ "count": available.len(), "consultants": available }),
            })
        }
        Intent::BusinessManager => {
            let managers = list_business_managers(pool).await?;
            Ok(Reply {
                answer: answers::business_managers(&managers),
                data: json!({ "business_managers": managers }),
            })
        }
        Intent::Languages => match entities.languages.first() {
            Some(language) => {
                let speakers = find_consultants_with_language(pool, language).await?;
                Ok(Reply {
                    answer: answers::consultant_names(
                        &format!("qui parlent {language}"),
                        &names(&speakers),
                        wants_count,
                    ),
                    data: json!({ "language": language, "consultants": speakers }),
                })
            }
            None => {
                let languages = list_language_names(pool).await?;
                let answer = if languages.is_empty() {
                    "Aucune langue n'est référencée.".to_string()
                } else {
                    format!("Langues référencées : {}.", answers::join_names(&languages))
                };
                Ok(Reply {
                    answer,
                    data: json!({ "languages": languages }),
                })
            }
        },
        Intent::SkillSearch => match entities.competences.first() {
            Some(skill) => {
                let experts = find_consultants_with_skill(pool, skill).await?;
                Ok(Reply {
                    answer: answers::consultant_names(
                        &format!("qui connaissent {skill}"),
                        &names(&experts),
                        wants_count,
                    ),
                    data: json!({ "competence": skill, "consultants": experts }),
                })
            }
            None => Ok(Reply::text(
                "Quelle compétence recherchez-vous ? Par exemple « Qui connaît Java ? ».".to_string(),
            )),
        },
        Intent::ConsultantList => {
            let overview = practice_overview(pool).await?;
            let practice = entities
                .practices
                .first()
                .and_then(|name| overview.iter().find(|p| fold(&p.name) == fold(name)));
            let all = list_all_consultants(pool).await?;
            let (scope, selected): (String, Vec<ConsultantRow>) = match practice {
                Some(p) => (
                    format!("dans la practice {}", p.name),
                    all.into_iter().filter(|c| c.practice_id == Some(p.id)).collect(),
                ),
                None => (String::new(), all),
            };
            Ok(Reply {
                answer: answers::consultant_names(&scope, &names(&selected), wants_count),
                data: json!({ "count": selected.len(), "consultants": selected }),
            })
        }
        Intent::Statistics => {
            let stats = consultant_stats(pool).await?;
            Ok(Reply {
                answer: answers::statistics(&stats),
                data: json!(stats),
            })
        }
        Intent::Practices => {
            let overview = practice_overview(pool).await?;
            let matched = entities
                .practices
                .first()
                .and_then(|name| overview.iter().find(|p| fold(&p.name) == fold(name)));
            let answer = match matched {
                Some(p) => answers::practice_detail(p, wants_count),
                None => answers::practices(&overview),
            };
            Ok(Reply {
                answer,
                data: json!({ "practices": overview }),
            })
        }
        Intent::Experience | Intent::Skills | Intent::Contact | Intent::Documents => {
            Ok(Reply::text(answers::missing_consultant()))
        }
        Intent::General => Ok(Reply::text(answers::HELP.to_string())),
    }
}

/// Answers a consultant-scoped intent about one known consultant.
async fn respond_about(
    pool: &PgPool,
    intent: Intent,
    wants_count: bool,
    consultant: ConsultantRow,
) -> Result<Reply, AppError> {
    let name = consultant.full_name();
    let derived = DerivedFields::for_consultant(&consultant, today());
    let id = consultant.id;

    let reply = match intent {
        Intent::Salary => Reply {
            answer: answers::salary(&name, consultant.salary, compute_cjm(consultant.salary)),
            data: json!({ "consultant_id": id, "salary": consultant.salary, "cjm": derived.cjm }),
        },
        Intent::Experience => Reply {
            answer: answers::experience(&name, derived.experience_years),
            data: json!({ "consultant_id": id, "experience_years": derived.experience_years }),
        },
        Intent::Skills => {
            let competences = list_consultant_competences(pool, id).await?;
            Reply {
                answer: answers::skills(&name, &competences),
                data: json!({ "consultant_id": id, "competences": competences }),
            }
        }
        Intent::Missions => {
            let missions = list_for_consultant(pool, id).await?;
            Reply {
                answer: answers::missions_of(&name, &missions, wants_count),
                data: json!({ "consultant_id": id, "missions": missions }),
            }
        }
        Intent::Contact => Reply {
            answer: answers::contact(&consultant),
            data: json!({ "consultant_id": id, "email": consultant.email, "phone": consultant.phone }),
        },
        Intent::Availability => Reply {
            answer: answers::availability_of(
                &name,
                derived.is_available_now,
                consultant.availability_date,
            ),
            data: json!({
                "consultant_id": id,
                "available": derived.is_available_now,
                "availability_date": consultant.availability_date,
            }),
        },
        Intent::BusinessManager => {
            let assignment = active_assignment(pool, id).await?;
            Reply {
                answer: answers::business_manager_of(&name, assignment.as_ref()),
                data: json!({ "consultant_id": id, "business_manager": assignment }),
            }
        }
        Intent::Languages => {
            let languages = list_consultant_languages(pool, id).await?;
            Reply {
                answer: answers::languages_of(&name, &languages),
                data: json!({ "consultant_id": id, "languages": languages }),
            }
        }
        Intent::Documents => {
            let documents = list_documents(pool, id).await?;
            Reply {
                answer: answers::documents_of(&name, &documents),
                data: json!({ "consultant_id": id, "documents": documents }),
            }
        }
        _ => Reply::text(format!("Que souhaitez-vous savoir sur {name} ?")),
    };
    Ok(reply)
}
