use crate::domain::error::DomainError;
use crate::domain::model::{Assignment, Group};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ulid::Ulid;

pub type Result<T> = std::result::Result<T, DomainError>;

/// Repository trait for Group entity
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>>;

    async fn insert(&self, group: &Group) -> Result<()>;

    /// Persist name, admin and members, but only while the stored group is
    /// still pending. Returns `false` once its raffle has completed. Raffle
    /// fields are only changed through `complete_raffle` and `reset_raffle`.
    ///
    /// Fails with `DomainError::NotFound` if the group no longer exists.
    async fn update(&self, group: &Group) -> Result<bool>;

    /// Mark the raffle completed, but only if the stored group is still
    /// pending and its members are exactly `members`, the list the draw was
    /// made from. Returns `false` when either no longer holds.
    async fn complete_raffle(
        &self,
        group_id: &str,
        draw_id: &str,
        members: &[String],
        raffle_date: DateTime<Utc>,
    ) -> Result<bool>;

    /// Move a completed group back to pending. Returns `false` when the
    /// stored group is not completed.
    async fn reset_raffle(&self, group_id: &str) -> Result<bool>;
}

/// Repository trait for Assignment entity
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    fn generate_id(&self) -> String {
        Ulid::new().to_string()
    }

    /// Write every assignment or none of them. No-op on an empty slice.
    async fn create_batch(&self, assignments: &[Assignment]) -> Result<()>;

    async fn find_by_group_and_secret_santa(
        &self,
        group_id: &str,
        draw_id: &str,
        secret_santa_id: &str,
    ) -> Result<Option<Assignment>>;

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Assignment>>;

    async fn delete_by_draw(&self, group_id: &str, draw_id: &str) -> Result<u64>;

    async fn delete_by_group(&self, group_id: &str) -> Result<u64>;
}

// Implement GroupRepository for Box<dyn GroupRepository> to allow dynamic dispatch
#[async_trait]
impl GroupRepository for Box<dyn GroupRepository> {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
        (**self).find_by_id(id).await
    }

    async fn insert(&self, group: &Group) -> Result<()> {
        (**self).insert(group).await
    }

    async fn update(&self, group: &Group) -> Result<bool> {
        (**self).update(group).await
    }

    async fn complete_raffle(
        &self,
        group_id: &str,
        draw_id: &str,
        members: &[String],
        raffle_date: DateTime<Utc>,
    ) -> Result<bool> {
        (**self)
            .complete_raffle(group_id, draw_id, members, raffle_date)
            .await
    }

    async fn reset_raffle(&self, group_id: &str) -> Result<bool> {
        (**self).reset_raffle(group_id).await
    }
}

// Implement AssignmentRepository for Box<dyn AssignmentRepository> to allow dynamic dispatch
#[async_trait]
impl AssignmentRepository for Box<dyn AssignmentRepository> {
    fn generate_id(&self) -> String {
        (**self).generate_id()
    }

    async fn create_batch(&self, assignments: &[Assignment]) -> Result<()> {
        (**self).create_batch(assignments).await
    }

    async fn find_by_group_and_secret_santa(
        &self,
        group_id: &str,
        draw_id: &str,
        secret_santa_id: &str,
    ) -> Result<Option<Assignment>> {
        (**self)
            .find_by_group_and_secret_santa(group_id, draw_id, secret_santa_id)
            .await
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Assignment>> {
        (**self).find_by_group(group_id).await
    }

    async fn delete_by_draw(&self, group_id: &str, draw_id: &str) -> Result<u64> {
        (**self).delete_by_draw(group_id, draw_id).await
    }

    async fn delete_by_group(&self, group_id: &str) -> Result<u64> {
        (**self).delete_by_group(group_id).await
    }
}
