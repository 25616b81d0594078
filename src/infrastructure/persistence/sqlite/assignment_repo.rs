use super::{lock, DbConnection};
use crate::domain::model::Assignment;
use crate::domain::repository::{AssignmentRepository, Result};
use async_trait::async_trait;
use rusqlite::{params, Row};

pub struct SqliteAssignmentRepository {
    conn: DbConnection,
}

impl SqliteAssignmentRepository {
    pub fn new(conn: DbConnection) -> Self {
        Self { conn }
    }
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment::from_storage(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

#[async_trait]
impl AssignmentRepository for SqliteAssignmentRepository {
    async fn create_batch(&self, assignments: &[Assignment]) -> Result<()> {
        if assignments.is_empty() {
            return Ok(());
        }

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO assignments
                 (id, group_id, draw_id, receiver_id, secret_santa_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;
            for assignment in assignments {
                stmt.execute(params![
                    assignment.id,
                    assignment.group_id,
                    assignment.draw_id,
                    assignment.receiver_id,
                    assignment.secret_santa_id,
                    assignment.created_at,
                ])?;
            }
        }
        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;

        tracing::debug!("Inserted {} assignments", assignments.len());
        Ok(())
    }

    async fn find_by_group_and_secret_santa(
        &self,
        group_id: &str,
        draw_id: &str,
        secret_santa_id: &str,
    ) -> Result<Option<Assignment>> {
        let conn = lock(&self.conn)?;

        let mut stmt = conn.prepare(
            "SELECT id, group_id, draw_id, receiver_id, secret_santa_id, created_at
             FROM assignments
             WHERE group_id = ? AND draw_id = ? AND secret_santa_id = ?",
        )?;

        let mut rows = stmt.query(params![group_id, draw_id, secret_santa_id])?;

        match rows.next()? {
            Some(row) => Ok(Some(from_row(row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_group(&self, group_id: &str) -> Result<Vec<Assignment>> {
        let conn = lock(&self.conn)?;

        let mut stmt = conn.prepare(
            "SELECT id, group_id, draw_id, receiver_id, secret_santa_id, created_at
             FROM assignments WHERE group_id = ? ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![group_id], from_row)?;

        let mut assignments = Vec::new();
        for assignment in rows {
            assignments.push(assignment?);
        }

        Ok(assignments)
    }

    async fn delete_by_draw(&self, group_id: &str, draw_id: &str) -> Result<u64> {
        let conn = lock(&self.conn)?;

        let deleted = conn.execute(
            "DELETE FROM assignments WHERE group_id = ? AND draw_id = ?",
            params![group_id, draw_id],
        )?;

        Ok(deleted as u64)
    }

    async fn delete_by_group(&self, group_id: &str) -> Result<u64> {
        let conn = lock(&self.conn)?;

        let deleted = conn.execute("DELETE FROM assignments WHERE group_id = ?", params![group_id])?;

        Ok(deleted as u64)
    }
}
