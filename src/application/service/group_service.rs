use crate::domain::error::RaffleError;
use crate::domain::model::Group;
use crate::domain::repository::GroupRepository;

use super::raffle_service::ServiceResult;

pub struct GroupService<R: GroupRepository> {
    repo: R,
}

impl<R: GroupRepository> GroupService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Group> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| RaffleError::GroupNotFound(id.to_string()))
    }

    pub async fn create(&self, name: String, admin_id: String) -> ServiceResult<Group> {
        let group = Group::new(name, admin_id);
        self.repo.insert(&group).await?;
        tracing::info!("Created group {} ({})", group.id, group.name);
        Ok(group)
    }

    /// Load a group the requester administers and whose raffle is still open
    async fn editable(&self, group_id: &str, requester_id: &str) -> ServiceResult<Group> {
        let group = self.get(group_id).await?;
        if !group.is_admin(requester_id) {
            return Err(RaffleError::NotGroupAdmin);
        }
        if group.is_raffle_completed() {
            return Err(RaffleError::RaffleAlreadyCompleted);
        }
        Ok(group)
    }

    /// Write membership changes. The raffle may have completed since
    /// `editable` read the group, in which case nothing is written.
    async fn save_members(&self, group: &Group) -> ServiceResult<()> {
        if !self.repo.update(group).await? {
            tracing::warn!(
                "Membership change on group {} refused, raffle completed meanwhile",
                group.id
            );
            return Err(RaffleError::RaffleAlreadyCompleted);
        }
        Ok(())
    }

    pub async fn add_member(
        &self,
        group_id: &str,
        requester_id: &str,
        user_id: &str,
    ) -> ServiceResult<Group> {
        let mut group = self.editable(group_id, requester_id).await?;
        if !group.add_member(user_id) {
            return Err(RaffleError::AlreadyMember);
        }
        self.save_members(&group).await?;
        Ok(group)
    }

    pub async fn remove_member(
        &self,
        group_id: &str,
        requester_id: &str,
        user_id: &str,
    ) -> ServiceResult<Group> {
        let mut group = self.editable(group_id, requester_id).await?;
        if group.is_admin(user_id) {
            return Err(RaffleError::CannotRemoveAdmin);
        }
        if !group.remove_member(user_id) {
            return Err(RaffleError::NotGroupMember);
        }
        self.save_members(&group).await?;
        Ok(group)
    }
}
