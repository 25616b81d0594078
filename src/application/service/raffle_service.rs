use crate::domain::error::RaffleError;
use crate::domain::model::{Assignment, Group};
use crate::domain::raffle::{RaffleAssigner, MIN_PARTICIPANTS};
use crate::domain::repository::{AssignmentRepository, GroupRepository};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

pub type ServiceResult<T> = std::result::Result<T, RaffleError>;

/// Summary of a committed raffle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleOutcome {
    pub group_id: String,
    pub raffle_date: DateTime<Utc>,
    pub assignment_count: usize,
}

/// What a member sees of their own assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    pub id: String,
    pub group_id: String,
    pub receiver_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Assignment> for AssignmentView {
    fn from(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            group_id: assignment.group_id,
            receiver_id: assignment.receiver_id,
            created_at: assignment.created_at,
        }
    }
}

/// Runs raffles for groups and commits their results.
///
/// Every draw gets its own `draw_id`. Its assignments are written first and
/// the group then switches to completed only if it is still pending,
/// recording which draw won. Readers only look at the committed draw, so
/// batches from a lost race or an interrupted run are never visible.
pub struct RaffleService<G: GroupRepository, A: AssignmentRepository> {
    groups: G,
    assignments: A,
    assigner: RaffleAssigner,
}

impl<G: GroupRepository, A: AssignmentRepository> RaffleService<G, A> {
    pub fn new(groups: G, assignments: A) -> Self {
        Self::with_assigner(groups, assignments, RaffleAssigner::new())
    }

    pub fn with_assigner(groups: G, assignments: A, assigner: RaffleAssigner) -> Self {
        Self {
            groups,
            assignments,
            assigner,
        }
    }

    async fn load_group(&self, group_id: &str) -> ServiceResult<Group> {
        self.groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| RaffleError::GroupNotFound(group_id.to_string()))
    }

    /// Draw and commit the raffle of a group. Admin only, once per group.
    pub async fn perform_raffle(
        &self,
        group_id: &str,
        requester_id: &str,
    ) -> ServiceResult<RaffleOutcome> {
        let group = self.load_group(group_id).await?;

        if !group.is_admin(requester_id) {
            return Err(RaffleError::NotGroupAdmin);
        }
        if group.is_raffle_completed() {
            return Err(RaffleError::RaffleAlreadyCompleted);
        }
        if group.members.len() < MIN_PARTICIPANTS {
            return Err(RaffleError::NotEnoughMembers {
                minimum: MIN_PARTICIPANTS,
            });
        }

        let result = self.assigner.assign(&group.members);
        if !result.success {
            let reason = result
                .error
                .unwrap_or_else(|| "unknown raffle failure".to_string());
            tracing::warn!("Raffle for group {} failed: {}", group_id, reason);
            return Err(RaffleError::RaffleFailed(reason));
        }

        let draw_id = Ulid::new().to_string();
        let now = Utc::now();
        let assignments = result
            .assignments
            .into_iter()
            .map(|pair| {
                Assignment::new(
                    self.assignments.generate_id(),
                    group.id.clone(),
                    draw_id.clone(),
                    pair.receiver_id,
                    pair.secret_santa_id,
                    now,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.assignments.create_batch(&assignments).await?;

        let committed = self
            .groups
            .complete_raffle(&group.id, &draw_id, &group.members, now)
            .await?;
        if !committed {
            if let Err(e) = self.assignments.delete_by_draw(&group.id, &draw_id).await {
                tracing::warn!("Failed to discard draw {}: {}", draw_id, e);
            }
            if self.load_group(group_id).await?.is_raffle_completed() {
                tracing::warn!(
                    "Raffle for group {} lost to a concurrent draw, discarded draw {}",
                    group_id,
                    draw_id
                );
                return Err(RaffleError::RaffleAlreadyCompleted);
            }
            tracing::warn!(
                "Members of group {} changed during the raffle, discarded draw {}",
                group_id,
                draw_id
            );
            return Err(RaffleError::RaffleFailed(
                "Group members changed during the raffle".to_string(),
            ));
        }

        tracing::info!(
            "Raffle completed for group {} ({} assignments, draw {})",
            group_id,
            assignments.len(),
            draw_id
        );

        Ok(RaffleOutcome {
            group_id: group.id,
            raffle_date: now,
            assignment_count: assignments.len(),
        })
    }

    /// Who `user_id` has to buy a gift for.
    pub async fn get_my_assignment(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> ServiceResult<AssignmentView> {
        let group = self.load_group(group_id).await?;

        if !group.is_member(user_id) {
            return Err(RaffleError::NotGroupMember);
        }
        if !group.is_raffle_completed() {
            return Err(RaffleError::RaffleNotCompleted);
        }
        let Some(draw_id) = &group.draw_id else {
            tracing::error!("Completed group {} has no committed draw", group_id);
            return Err(RaffleError::AssignmentNotFound);
        };

        let assignment = self
            .assignments
            .find_by_group_and_secret_santa(&group.id, draw_id, user_id)
            .await?;

        match assignment {
            Some(assignment) => Ok(assignment.into()),
            None => {
                tracing::error!(
                    "Completed group {} has no assignment for member {}",
                    group_id,
                    user_id
                );
                Err(RaffleError::AssignmentNotFound)
            }
        }
    }

    /// Clear the raffle of a completed group so it can be drawn again.
    ///
    /// Returns how many assignment records were deleted.
    pub async fn reset_raffle(&self, group_id: &str, requester_id: &str) -> ServiceResult<u64> {
        let group = self.load_group(group_id).await?;

        if !group.is_admin(requester_id) {
            return Err(RaffleError::NotGroupAdmin);
        }
        if !group.is_raffle_completed() {
            return Err(RaffleError::RaffleNotCompleted);
        }

        // Delete while still completed: no new draw can start until the
        // status flips, so this never removes a fresh batch
        let deleted = self.assignments.delete_by_group(&group.id).await?;
        if !self.groups.reset_raffle(&group.id).await? {
            return Err(RaffleError::RaffleNotCompleted);
        }

        tracing::info!(
            "Raffle reset for group {} ({} assignments removed)",
            group_id,
            deleted
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::service::GroupService;
    use crate::domain::error::DomainError;
    use crate::domain::model::RaffleStatus;
    use crate::domain::raffle::RaffleAssigner;
    use crate::domain::repository::Result;
    use crate::infrastructure::persistence::sqlite::{
        init_in_memory, DbConnection, SqliteAssignmentRepository, SqliteGroupRepository,
    };
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    type SqliteRaffleService = RaffleService<SqliteGroupRepository, SqliteAssignmentRepository>;

    fn service(conn: &DbConnection) -> SqliteRaffleService {
        RaffleService::new(
            SqliteGroupRepository::new(conn.clone()),
            SqliteAssignmentRepository::new(conn.clone()),
        )
    }

    async fn seed_group(conn: &DbConnection, members: &[&str]) -> Group {
        let groups = GroupService::new(SqliteGroupRepository::new(conn.clone()));
        let group = groups
            .create("Office party".into(), members[0].to_string())
            .await
            .unwrap();
        for member in &members[1..] {
            groups.add_member(&group.id, members[0], member).await.unwrap();
        }
        groups.get(&group.id).await.unwrap()
    }

    async fn stored_group(conn: &DbConnection, id: &str) -> Group {
        SqliteGroupRepository::new(conn.clone())
            .find_by_id(id)
            .await
            .unwrap()
            .unwrap()
    }

    async fn stored_assignments(conn: &DbConnection, group_id: &str) -> Vec<Assignment> {
        SqliteAssignmentRepository::new(conn.clone())
            .find_by_group(group_id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_perform_raffle_success() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2", "m3"]).await;

        let outcome = service(&conn).perform_raffle(&group.id, "admin").await.unwrap();
        assert_eq!(outcome.group_id, group.id);
        assert_eq!(outcome.assignment_count, 4);

        let stored = stored_group(&conn, &group.id).await;
        assert_eq!(stored.raffle_status, RaffleStatus::Completed);
        assert_eq!(stored.raffle_date, Some(outcome.raffle_date));

        let assignments = stored_assignments(&conn, &group.id).await;
        assert_eq!(assignments.len(), 4);

        let members: HashSet<&str> = ["admin", "m1", "m2", "m3"].into_iter().collect();
        let receivers: HashSet<&str> = assignments.iter().map(|a| a.receiver_id.as_str()).collect();
        let santas: HashSet<&str> = assignments.iter().map(|a| a.secret_santa_id.as_str()).collect();
        assert_eq!(receivers, members);
        assert_eq!(santas, members);
        for assignment in &assignments {
            assert_ne!(assignment.receiver_id, assignment.secret_santa_id);
            assert_eq!(Some(&assignment.draw_id), stored.draw_id.as_ref());
        }
    }

    #[tokio::test]
    async fn test_deterministic_assigner_is_used() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["a", "b", "c"]).await;

        let service = RaffleService::with_assigner(
            SqliteGroupRepository::new(conn.clone()),
            SqliteAssignmentRepository::new(conn.clone()),
            RaffleAssigner::with_random_source(|| 0.0),
        );
        service.perform_raffle(&group.id, "a").await.unwrap();

        // j = 0 every step turns [a, b, c] into the ring b -> c -> a -> b
        assert_eq!(service.get_my_assignment(&group.id, "b").await.unwrap().receiver_id, "c");
        assert_eq!(service.get_my_assignment(&group.id, "c").await.unwrap().receiver_id, "a");
        assert_eq!(service.get_my_assignment(&group.id, "a").await.unwrap().receiver_id, "b");
    }

    #[tokio::test]
    async fn test_group_not_found() {
        let conn = init_in_memory().unwrap();
        let err = service(&conn).perform_raffle("missing", "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::GroupNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_admin_check_comes_first() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin"]).await;
        SqliteGroupRepository::new(conn.clone())
            .complete_raffle(&group.id, "old-draw", &group.members, Utc::now())
            .await
            .unwrap();

        let err = service(&conn).perform_raffle(&group.id, "intruder").await.unwrap_err();
        assert!(matches!(err, RaffleError::NotGroupAdmin));
    }

    #[tokio::test]
    async fn test_not_enough_members() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin"]).await;

        let err = service(&conn).perform_raffle(&group.id, "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::NotEnoughMembers { minimum: 2 }));
        assert!(stored_assignments(&conn, &group.id).await.is_empty());
        assert_eq!(
            stored_group(&conn, &group.id).await.raffle_status,
            RaffleStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_second_raffle_is_refused() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2"]).await;
        let service = service(&conn);

        service.perform_raffle(&group.id, "admin").await.unwrap();
        let err = service.perform_raffle(&group.id, "admin").await.unwrap_err();

        assert!(matches!(err, RaffleError::RaffleAlreadyCompleted));
        assert_eq!(stored_assignments(&conn, &group.id).await.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_members_fail_the_raffle() {
        let conn = init_in_memory().unwrap();
        let mut group = Group::new("Broken".into(), "admin".into());
        group.members = vec!["admin".into(), "m1".into(), "admin".into()];
        SqliteGroupRepository::new(conn.clone()).insert(&group).await.unwrap();

        let err = service(&conn).perform_raffle(&group.id, "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleFailed(reason) if reason.contains("Duplicate")));
        assert!(stored_assignments(&conn, &group.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_my_assignment_read_path() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2", "m3"]).await;
        let service = service(&conn);

        let err = service.get_my_assignment(&group.id, "m1").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleNotCompleted));

        let err = service.get_my_assignment(&group.id, "stranger").await.unwrap_err();
        assert!(matches!(err, RaffleError::NotGroupMember));

        service.perform_raffle(&group.id, "admin").await.unwrap();

        let view = service.get_my_assignment(&group.id, "m1").await.unwrap();
        let expected = stored_assignments(&conn, &group.id)
            .await
            .into_iter()
            .find(|a| a.secret_santa_id == "m1")
            .unwrap();
        assert_eq!(view.id, expected.id);
        assert_eq!(view.group_id, group.id);
        assert_eq!(view.receiver_id, expected.receiver_id);
        assert_ne!(view.receiver_id, "m1");
    }

    #[tokio::test]
    async fn test_missing_assignment_is_reported() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1"]).await;
        SqliteGroupRepository::new(conn.clone())
            .complete_raffle(&group.id, "draw-without-rows", &group.members, Utc::now())
            .await
            .unwrap();

        let err = service(&conn).get_my_assignment(&group.id, "m1").await.unwrap_err();
        assert!(matches!(err, RaffleError::AssignmentNotFound));
    }

    #[tokio::test]
    async fn test_completed_group_without_draw() {
        let conn = init_in_memory().unwrap();
        let mut group = Group::new("Imported".into(), "admin".into());
        group.add_member("m1");
        group.raffle_status = RaffleStatus::Completed;
        group.raffle_date = Some(Utc::now());
        SqliteGroupRepository::new(conn.clone()).insert(&group).await.unwrap();

        let err = service(&conn).get_my_assignment(&group.id, "m1").await.unwrap_err();
        assert!(matches!(err, RaffleError::AssignmentNotFound));
    }

    #[tokio::test]
    async fn test_empty_member_id_fails_the_raffle() {
        let conn = init_in_memory().unwrap();
        let mut group = Group::new("Broken".into(), "admin".into());
        group.members = vec!["admin".into(), "".into(), "m1".into()];
        SqliteGroupRepository::new(conn.clone()).insert(&group).await.unwrap();

        let err = service(&conn).perform_raffle(&group.id, "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleFailed(reason) if reason.contains("Empty")));
        assert!(stored_assignments(&conn, &group.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_orphan_batch_is_ignored() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2"]).await;

        // Leftovers of a run that crashed before the group was updated
        let orphan: Vec<Assignment> = [("admin", "m1"), ("m1", "m2"), ("m2", "admin")]
            .iter()
            .enumerate()
            .map(|(i, (santa, receiver))| {
                Assignment::new(
                    format!("orphan-{}", i),
                    group.id.clone(),
                    "crashed-draw".into(),
                    receiver.to_string(),
                    santa.to_string(),
                    Utc::now(),
                )
                .unwrap()
            })
            .collect();
        SqliteAssignmentRepository::new(conn.clone())
            .create_batch(&orphan)
            .await
            .unwrap();

        let service = service(&conn);
        service.perform_raffle(&group.id, "admin").await.unwrap();

        let view = service.get_my_assignment(&group.id, "admin").await.unwrap();
        assert!(!view.id.starts_with("orphan-"));

        // Reset clears everything, orphans included
        assert_eq!(service.reset_raffle(&group.id, "admin").await.unwrap(), 6);
    }

    /// Serves a pending snapshot on the first read, as a request that read
    /// the group just before another request changed it would see it. Later
    /// reads hit the store.
    struct StaleGroups {
        inner: SqliteGroupRepository,
        snapshot: Group,
        served: AtomicBool,
    }

    impl StaleGroups {
        fn new(conn: &DbConnection, snapshot: Group) -> Self {
            Self {
                inner: SqliteGroupRepository::new(conn.clone()),
                snapshot,
                served: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl GroupRepository for StaleGroups {
        async fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
            if self.served.swap(true, Ordering::SeqCst) {
                return self.inner.find_by_id(id).await;
            }
            Ok(Some(self.snapshot.clone()))
        }

        async fn insert(&self, group: &Group) -> Result<()> {
            self.inner.insert(group).await
        }

        async fn update(&self, group: &Group) -> Result<bool> {
            self.inner.update(group).await
        }

        async fn complete_raffle(
            &self,
            group_id: &str,
            draw_id: &str,
            members: &[String],
            raffle_date: DateTime<Utc>,
        ) -> Result<bool> {
            self.inner
                .complete_raffle(group_id, draw_id, members, raffle_date)
                .await
        }

        async fn reset_raffle(&self, group_id: &str) -> Result<bool> {
            self.inner.reset_raffle(group_id).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_raffle_loses_cleanly() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2", "m3"]).await;

        let winner = service(&conn);
        let loser = RaffleService::new(
            StaleGroups::new(&conn, group.clone()),
            SqliteAssignmentRepository::new(conn.clone()),
        );

        winner.perform_raffle(&group.id, "admin").await.unwrap();
        let committed = stored_group(&conn, &group.id).await;

        let err = loser.perform_raffle(&group.id, "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleAlreadyCompleted));

        // Only the winning draw remains
        let assignments = stored_assignments(&conn, &group.id).await;
        assert_eq!(assignments.len(), 4);
        assert!(assignments
            .iter()
            .all(|a| Some(&a.draw_id) == committed.draw_id.as_ref()));
        assert_eq!(stored_group(&conn, &group.id).await.draw_id, committed.draw_id);
    }

    #[tokio::test]
    async fn test_member_joining_mid_raffle_voids_the_draw() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2"]).await;
        let raffle = RaffleService::new(
            StaleGroups::new(&conn, group.clone()),
            SqliteAssignmentRepository::new(conn.clone()),
        );

        // Joins after the raffle read the member list
        GroupService::new(SqliteGroupRepository::new(conn.clone()))
            .add_member(&group.id, "admin", "late")
            .await
            .unwrap();

        let err = raffle.perform_raffle(&group.id, "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleFailed(reason) if reason.contains("changed")));

        let stored = stored_group(&conn, &group.id).await;
        assert_eq!(stored.raffle_status, RaffleStatus::Pending);
        assert_eq!(stored.members, vec!["admin", "m1", "m2", "late"]);
        assert!(stored_assignments(&conn, &group.id).await.is_empty());

        // A fresh draw includes the late member
        let outcome = service(&conn).perform_raffle(&group.id, "admin").await.unwrap();
        assert_eq!(outcome.assignment_count, 4);
    }

    #[tokio::test]
    async fn test_member_added_after_raffle_has_no_effect() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2"]).await;
        let groups = GroupService::new(StaleGroups::new(&conn, group.clone()));

        service(&conn).perform_raffle(&group.id, "admin").await.unwrap();

        // Stale read still sees the group as pending
        let err = groups.add_member(&group.id, "admin", "late").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleAlreadyCompleted));

        let stored = stored_group(&conn, &group.id).await;
        assert!(!stored.is_member("late"));
        assert!(matches!(
            service(&conn).get_my_assignment(&group.id, "late").await,
            Err(RaffleError::NotGroupMember)
        ));
    }

    #[tokio::test]
    async fn test_reset_allows_new_raffle() {
        let conn = init_in_memory().unwrap();
        let group = seed_group(&conn, &["admin", "m1", "m2"]).await;
        let service = service(&conn);

        let err = service.reset_raffle(&group.id, "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::RaffleNotCompleted));

        service.perform_raffle(&group.id, "admin").await.unwrap();

        let err = service.reset_raffle(&group.id, "m1").await.unwrap_err();
        assert!(matches!(err, RaffleError::NotGroupAdmin));

        assert_eq!(service.reset_raffle(&group.id, "admin").await.unwrap(), 3);
        let stored = stored_group(&conn, &group.id).await;
        assert_eq!(stored.raffle_status, RaffleStatus::Pending);
        assert!(stored.raffle_date.is_none());
        assert!(stored_assignments(&conn, &group.id).await.is_empty());

        let outcome = service.perform_raffle(&group.id, "admin").await.unwrap();
        assert_eq!(outcome.assignment_count, 3);
    }

    #[tokio::test]
    async fn test_storage_errors_are_wrapped() {
        let conn = init_in_memory().unwrap();
        conn.lock().unwrap().execute_batch("DROP TABLE groups").unwrap();

        let err = service(&conn).perform_raffle("g1", "admin").await.unwrap_err();
        assert!(matches!(err, RaffleError::Storage(DomainError::Database(_))));
    }
}
