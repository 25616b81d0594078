use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assignment entity - one "who gives to whom" record of a raffle draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub group_id: String,
    pub draw_id: String,
    pub receiver_id: String,
    pub secret_santa_id: String,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Create a new assignment produced by a raffle draw.
    pub fn new(
        id: String,
        group_id: String,
        draw_id: String,
        receiver_id: String,
        secret_santa_id: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id.is_empty() || group_id.is_empty() || draw_id.is_empty() {
            return Err(DomainError::Validation(
                "Assignment requires id, group id and draw id".to_string(),
            ));
        }
        if receiver_id.is_empty() || secret_santa_id.is_empty() {
            return Err(DomainError::Validation(
                "Assignment requires receiver and secret santa".to_string(),
            ));
        }
        if receiver_id == secret_santa_id {
            return Err(DomainError::Validation(format!(
                "Self-assignment detected for user {}",
                receiver_id
            )));
        }

        Ok(Self {
            id,
            group_id,
            draw_id,
            receiver_id,
            secret_santa_id,
            created_at,
        })
    }

    /// Rebuild an assignment read back from storage.
    ///
    /// No invariants are checked: legacy or corrupted rows must still load.
    pub fn from_storage(
        id: String,
        group_id: String,
        draw_id: String,
        receiver_id: String,
        secret_santa_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            group_id,
            draw_id,
            receiver_id,
            secret_santa_id,
            created_at,
        }
    }
}
