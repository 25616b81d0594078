//! MongoDB Assignment Repository implementation
//!
//! `insert_many` is not transactional on a standalone server. A failed batch
//! is deleted by its draw id, and readers only ever look at the draw the
//! group committed, so a partial batch is never observed.

use crate::domain::model::Assignment;
use crate::domain::repository::{AssignmentRepository, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use mongodb::Collection;
use std::sync::Arc;

use super::MongoConnection;

/// MongoDB document wrapper for Assignment with _id field
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct AssignmentDocument {
    #[serde(rename = "_id")]
    id: String,
    group_id: String,
    draw_id: String,
    receiver_id: String,
    secret_santa_id: String,
    created_at: DateTime<Utc>,
}

impl From<&Assignment> for AssignmentDocument {
    fn from(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id.clone(),
            group_id: assignment.group_id.clone(),
            draw_id: assignment.draw_id.clone(),
            receiver_id: assignment.receiver_id.clone(),
            secret_santa_id: assignment.secret_santa_id.clone(),
            created_at: assignment.created_at,
        }
    }
}

impl From<AssignmentDocument> for Assignment {
    fn from(doc: AssignmentDocument) -> Self {
        Assignment::from_storage(
            doc.id,
            doc.group_id,
            doc.draw_id,
            doc.receiver_id,
            doc.secret_santa_id,
            doc.created_at,
        )
    }
}

pub struct MongoAssignmentRepository {
    collection: Collection<AssignmentDocument>,
}

impl MongoAssignmentRepository {
    pub fn new(conn: Arc<MongoConnection>) -> Self {
        Self {
            collection: conn.collection("assignments"),
        }
    }
}

#[async_trait]
impl AssignmentRepository for MongoAssignmentRepository {
    async fn create_batch(&self, assignments: &[Assignment]) -> Result<()> {
        let Some(first) = assignments.first() else {
            return Ok(());
        };

        let docs: Vec<AssignmentDocument> = assignments.iter().map(AssignmentDocument::from).collect();

        if let Err(e) = self.collection.insert_many(docs).await {
            let filter = doc! { "group_id": &first.group_id, "draw_id": &first.draw_id };
            if let Err(cleanup) = self.collection.delete_many(filter).await {
                tracing::warn!(
                    "Failed to clean up partial batch for draw {}: {}",
                    first.draw_id,
                    cleanup
                );
            }
            return Err(e.into());
        }

        tracing::debug!("Inserted {} assignments", assignments.len());
        Ok(())
    }

    async fn find_by_group_and_secret_santa(
        &self,
        group_id: &str,
        draw_id: &str,
        secret_santa_id: &str,
    ) -> Result<Option<Assignment>> {
        let found = self
            .collection
            .find_one(doc! {
                "group_id": group_id,
                "draw_id": draw_id,
                "secret_santa_id": secret_santa_id,
            })
            .await?;

        Ok(found.map(Assignment::from))
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Assignment>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": 1, "_id": 1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "group_id": group_id })
            .with_options(options)
            .await?;

        let docs: Vec<AssignmentDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(Assignment::from).collect())
    }

    async fn delete_by_draw(&self, group_id: &str, draw_id: &str) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "group_id": group_id, "draw_id": draw_id })
            .await?;

        Ok(result.deleted_count)
    }

    async fn delete_by_group(&self, group_id: &str) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "group_id": group_id })
            .await?;

        Ok(result.deleted_count)
    }
}
