use crate::domain::error::{DomainError, RaffleError};
use serde::Serialize;

/// Error shape handed to callers outside the crate
#[derive(Debug, Serialize, PartialEq)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    /// HTTP-style status for transports that need one
    pub status: u16,
}

impl From<RaffleError> for ApiError {
    fn from(err: RaffleError) -> Self {
        let status = match &err {
            RaffleError::GroupNotFound(_) | RaffleError::AssignmentNotFound => 404,
            RaffleError::NotGroupAdmin | RaffleError::NotGroupMember => 403,
            RaffleError::RaffleAlreadyCompleted
            | RaffleError::RaffleNotCompleted
            | RaffleError::AlreadyMember => 409,
            RaffleError::NotEnoughMembers { .. } | RaffleError::CannotRemoveAdmin => 422,
            RaffleError::Storage(DomainError::NotFound(_)) => 404,
            RaffleError::Storage(DomainError::Validation(_)) => 422,
            RaffleError::RaffleFailed(_) | RaffleError::Storage(_) => 500,
        };

        // Storage details stay in the logs
        let message = match &err {
            RaffleError::Storage(inner) => {
                tracing::error!("Storage failure: {}", inner);
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        ApiError {
            code: err.code(),
            message,
            status,
        }
    }
}
