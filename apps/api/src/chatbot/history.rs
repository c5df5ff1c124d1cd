//! Per-session conversation memory in Redis.
//!
//! Each session is a list at `chat:{session_id}`, newest turn first, trimmed
//! to `max_turns` and expiring `ttl_secs` after the last write.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chatbot::entities::ConsultantRef;
use crate::chatbot::intent::Intent;
use crate::errors::AppError;

const KEY_PREFIX: &str = "chat:";
const MAX_SESSION_ID_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub intent: Intent,
    pub consultant: Option<ConsultantRef>,
    pub answer: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ChatHistory {
    client: redis::Client,
    ttl_secs: u64,
    max_turns: usize,
}

pub fn history_key(session_id: &str) -> String {
    format!("{KEY_PREFIX}{session_id}")
}

pub fn validate_session_id(session_id: &str) -> Result<(), AppError> {
    if session_id.trim().is_empty() {
        return Err(AppError::Validation("session_id cannot be empty".to_string()));
    }
    if session_id.chars().count() > MAX_SESSION_ID_CHARS
        || !session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(format!(
            "session_id must be at most {MAX_SESSION_ID_CHARS} characters of [A-Za-z0-9_-]"
        )));
    }
    Ok(())
}

/// Most recent consultant the conversation was about. `turns` is newest first.
pub fn last_consultant(turns: &[ChatTurn]) -> Option<&ConsultantRef> {
    turns.iter().find_map(|t| t.consultant.as_ref())
}

/// Unreadable entries (older formats, manual edits) are skipped.
pub fn decode_turns(raw: &[String]) -> Vec<ChatTurn> {
    raw.iter()
        .filter_map(|entry| match serde_json::from_str::<ChatTurn>(entry) {
            Ok(turn) => Some(turn),
            Err(e) => {
                warn!("Skipping unreadable chat history entry: {e}");
                None
            }
        })
        .collect()
}

impl ChatHistory {
    pub fn new(client: redis::Client, ttl_secs: u64, max_turns: usize) -> Self {
        Self {
            client,
            ttl_secs,
            max_turns: max_turns.max(1),
        }
    }

    pub async fn load(&self, session_id: &str) -> Result<Vec<ChatTurn>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn
            .lrange(history_key(session_id), 0, self.max_turns as isize - 1)
            .await?;
        Ok(decode_turns(&raw))
    }

    pub async fn push(&self, session_id: &str, turn: &ChatTurn) -> Result<(), AppError> {
        let key = history_key(session_id);
        let payload = serde_json::to_string(turn).map_err(|e| AppError::Internal(e.into()))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .lpush(&key, payload)
            .ignore()
            .ltrim(&key, 0, self.max_turns as isize - 1)
            .ignore()
            .expire(&key, self.ttl_secs as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Loads history, degrading to an empty conversation when Redis is down.
    pub async fn load_or_empty(&self, session_id: &str) -> Vec<ChatTurn> {
        match self.load(session_id).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!("Chat history unavailable for session {session_id}: {e}");
                Vec::new()
            }
        }
    }

    /// Records a turn; failures are logged and otherwise ignored.
    pub async fn record(&self, session_id: &str, turn: &ChatTurn) {
        if let Err(e) = self.push(session_id, turn).await {
            warn!("Could not record chat turn for session {session_id}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn turn(consultant: Option<&str>) -> ChatTurn {
        ChatTurn {
            question: "q".to_string(),
            intent: Intent::Salary,
            consultant: consultant.map(|name| ConsultantRef {
                id: Uuid::new_v4(),
                name: name.to_string(),
            }),
            answer: "a".to_string(),
            at: Utc::now(),
        }
    }

    #[test]
    fn test_history_key() {
        assert_eq!(history_key("abc-1"), "chat:abc-1");
    }

    #[test]
    fn test_session_id_validation() {
        assert!(validate_session_id("user_42-tab1").is_ok());
        assert!(validate_session_id("  ").is_err());
        assert!(validate_session_id("a:b").is_err());
        assert!(validate_session_id(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_last_consultant_is_newest_mention() {
        let turns = vec![turn(None), turn(Some("Marie Dupont")), turn(Some("Jean Martin"))];
        assert_eq!(last_consultant(&turns).map(|c| c.name.as_str()), Some("Marie Dupont"));
        assert!(last_consultant(&[turn(None)]).is_none());
    }

    #[test]
    fn test_decode_skips_garbage() {
        let good = serde_json::to_string(&turn(Some("Marie Dupont"))).unwrap();
        let decoded = decode_turns(&[good, "not json".to_string()]);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].intent, Intent::Salary);
    }
}
