use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for DomainError {
    fn from(err: rusqlite::Error) -> Self {
        DomainError::Database(err.to_string())
    }
}

impl From<mongodb::error::Error> for DomainError {
    fn from(err: mongodb::error::Error) -> Self {
        DomainError::Database(err.to_string())
    }
}

/// Failures surfaced by the raffle and group workflows.
///
/// Every gate of a workflow maps to exactly one variant so callers can
/// pattern-match on the kind instead of parsing messages.
#[derive(Error, Debug)]
pub enum RaffleError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Only the group admin can perform this action")]
    NotGroupAdmin,

    #[error("User is not a member of this group")]
    NotGroupMember,

    #[error("Raffle has already been completed for this group")]
    RaffleAlreadyCompleted,

    #[error("At least {minimum} members are required for a raffle")]
    NotEnoughMembers { minimum: usize },

    #[error("Raffle failed: {0}")]
    RaffleFailed(String),

    #[error("Raffle has not been completed yet")]
    RaffleNotCompleted,

    #[error("Assignment not found, contact the group admin")]
    AssignmentNotFound,

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("The group admin cannot be removed from the group")]
    CannotRemoveAdmin,

    #[error(transparent)]
    Storage(#[from] DomainError),
}

impl RaffleError {
    /// Stable machine-readable code for the boundary layer
    pub fn code(&self) -> &'static str {
        match self {
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::NotGroupAdmin => "NOT_GROUP_ADMIN",
            Self::NotGroupMember => "NOT_GROUP_MEMBER",
            Self::RaffleAlreadyCompleted => "RAFFLE_ALREADY_COMPLETED",
            Self::NotEnoughMembers { .. } => "NOT_ENOUGH_MEMBERS",
            Self::RaffleFailed(_) => "RAFFLE_FAILED",
            Self::RaffleNotCompleted => "RAFFLE_NOT_COMPLETED",
            Self::AssignmentNotFound => "ASSIGNMENT_NOT_FOUND",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::CannotRemoveAdmin => "CANNOT_REMOVE_ADMIN",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
