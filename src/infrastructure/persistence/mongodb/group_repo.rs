//! MongoDB Group Repository implementation
//!
//! Uses `_id` as primary key (mapped from Group.id). Member edits and raffle
//! state changes are conditional `update_one` calls filtered on
//! `raffle_status`, so two racing draws cannot both commit and a member edit
//! cannot land on a completed group.

use crate::domain::error::DomainError;
use crate::domain::model::{Group, RaffleStatus};
use crate::domain::repository::{GroupRepository, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, to_bson, Bson};
use mongodb::Collection;
use std::sync::Arc;

use super::MongoConnection;

/// MongoDB document wrapper for Group with _id field
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct GroupDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    admin_id: String,
    members: Vec<String>,
    raffle_status: RaffleStatus,
    raffle_date: Option<DateTime<Utc>>,
    draw_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<Group> for GroupDocument {
    fn from(group: Group) -> Self {
        Self {
            id: group.id,
            name: group.name,
            admin_id: group.admin_id,
            members: group.members,
            raffle_status: group.raffle_status,
            raffle_date: group.raffle_date,
            draw_id: group.draw_id,
            created_at: group.created_at,
        }
    }
}

impl From<GroupDocument> for Group {
    fn from(doc: GroupDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            admin_id: doc.admin_id,
            members: doc.members,
            raffle_status: doc.raffle_status,
            raffle_date: doc.raffle_date,
            draw_id: doc.draw_id,
            created_at: doc.created_at,
        }
    }
}

fn bson_value<T: serde::Serialize>(value: &T) -> Result<Bson> {
    to_bson(value).map_err(|e| DomainError::Database(e.to_string()))
}

pub struct MongoGroupRepository {
    collection: Collection<GroupDocument>,
}

impl MongoGroupRepository {
    pub fn new(conn: Arc<MongoConnection>) -> Self {
        Self {
            collection: conn.collection("groups"),
        }
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let count = self.collection.count_documents(doc! { "_id": id }).await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl GroupRepository for MongoGroupRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
        let found = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(found.map(Group::from))
    }

    async fn insert(&self, group: &Group) -> Result<()> {
        self.collection
            .insert_one(GroupDocument::from(group.clone()))
            .await?;
        Ok(())
    }

    async fn update(&self, group: &Group) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "_id": &group.id,
                    "raffle_status": bson_value(&RaffleStatus::Pending)?,
                },
                doc! { "$set": {
                    "name": &group.name,
                    "admin_id": &group.admin_id,
                    "members": group.members.clone(),
                } },
            )
            .await?;

        if result.matched_count == 0 && !self.exists(&group.id).await? {
            return Err(DomainError::NotFound(format!("group {}", group.id)));
        }

        Ok(result.matched_count == 1)
    }

    async fn complete_raffle(
        &self,
        group_id: &str,
        draw_id: &str,
        members: &[String],
        raffle_date: DateTime<Utc>,
    ) -> Result<bool> {
        // Array equality is exact and ordered
        let result = self
            .collection
            .update_one(
                doc! {
                    "_id": group_id,
                    "raffle_status": bson_value(&RaffleStatus::Pending)?,
                    "members": members.to_vec(),
                },
                doc! { "$set": {
                    "raffle_status": bson_value(&RaffleStatus::Completed)?,
                    "raffle_date": bson_value(&raffle_date)?,
                    "draw_id": draw_id,
                } },
            )
            .await?;

        if result.matched_count == 0 && !self.exists(group_id).await? {
            return Err(DomainError::NotFound(format!("group {}", group_id)));
        }

        Ok(result.matched_count == 1)
    }

    async fn reset_raffle(&self, group_id: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! {
                    "_id": group_id,
                    "raffle_status": bson_value(&RaffleStatus::Completed)?,
                },
                doc! { "$set": {
                    "raffle_status": bson_value(&RaffleStatus::Pending)?,
                    "raffle_date": Bson::Null,
                    "draw_id": Bson::Null,
                } },
            )
            .await?;

        if result.matched_count == 0 && !self.exists(group_id).await? {
            return Err(DomainError::NotFound(format!("group {}", group_id)));
        }

        Ok(result.matched_count == 1)
    }
}
