use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Evidence attached to an assistant turn: which document a snippet came
/// from and the snippet itself (already truncated for display).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub text: String,
}

/// One message in a session's ordered history. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            score: None,
            citations: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
            score: None,
            citations: None,
            timestamp: Utc::now(),
        }
    }
}

/// A user's single active interview-practice session. `turns` is the
/// JSONB-encoded ordered `Vec<Turn>`; appends go through a transactional
/// read-modify-write so concurrent queries cannot lose turns.
#[derive(Debug, Clone, FromRow)]
pub struct ChatSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub turns: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSessionRow {
    pub fn decode_turns(&self) -> Result<Vec<Turn>, serde_json::Error> {
        serde_json::from_value(self.turns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
        let role: Role = serde_json::from_str(r#""user""#).unwrap();
        assert_eq!(role, Role::User);
    }

    #[test]
    fn test_turn_omits_absent_score_and_citations() {
        let turn = Turn::user("hello".to_string());
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json.get("score").is_none());
        assert!(json.get("citations").is_none());
    }
}
