use super::{lock, DbConnection};
use crate::domain::error::DomainError;
use crate::domain::model::{Group, RaffleStatus};
use crate::domain::repository::{GroupRepository, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteGroupRepository {
    conn: DbConnection,
}

impl SqliteGroupRepository {
    pub fn new(conn: DbConnection) -> Self {
        Self { conn }
    }
}

fn members_json(members: &[String]) -> Result<String> {
    serde_json::to_string(members).map_err(|e| DomainError::Database(e.to_string()))
}

fn exists(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM groups WHERE id = ?", params![id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

#[async_trait]
impl GroupRepository for SqliteGroupRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Group>> {
        let conn = lock(&self.conn)?;

        let mut stmt = conn.prepare(
            "SELECT id, name, admin_id, members, raffle_status, raffle_date, draw_id, created_at
             FROM groups WHERE id = ?",
        )?;

        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            let members_json: String = row.get(3)?;
            let members: Vec<String> = serde_json::from_str(&members_json).unwrap_or_default();

            Ok(Some(Group {
                id: row.get(0)?,
                name: row.get(1)?,
                admin_id: row.get(2)?,
                members,
                raffle_status: row.get(4)?,
                raffle_date: row.get(5)?,
                draw_id: row.get(6)?,
                created_at: row.get(7)?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn insert(&self, group: &Group) -> Result<()> {
        let conn = lock(&self.conn)?;

        let members_json = members_json(&group.members)?;

        conn.execute(
            "INSERT INTO groups
             (id, name, admin_id, members, raffle_status, raffle_date, draw_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                group.id,
                group.name,
                group.admin_id,
                members_json,
                group.raffle_status,
                group.raffle_date,
                group.draw_id,
                group.created_at,
            ],
        )?;

        Ok(())
    }

    async fn update(&self, group: &Group) -> Result<bool> {
        let conn = lock(&self.conn)?;

        let members_json = members_json(&group.members)?;

        let changed = conn.execute(
            "UPDATE groups SET name = ?, admin_id = ?, members = ?
             WHERE id = ? AND raffle_status = ?",
            params![
                group.name,
                group.admin_id,
                members_json,
                group.id,
                RaffleStatus::Pending,
            ],
        )?;

        if changed == 0 && !exists(&conn, &group.id)? {
            return Err(DomainError::NotFound(format!("group {}", group.id)));
        }

        Ok(changed == 1)
    }

    async fn complete_raffle(
        &self,
        group_id: &str,
        draw_id: &str,
        members: &[String],
        raffle_date: DateTime<Utc>,
    ) -> Result<bool> {
        let conn = lock(&self.conn)?;

        // Members are always written by `members_json`, so equal lists
        // serialize to equal text
        let changed = conn.execute(
            "UPDATE groups SET raffle_status = ?, raffle_date = ?, draw_id = ?
             WHERE id = ? AND raffle_status = ? AND members = ?",
            params![
                RaffleStatus::Completed,
                raffle_date,
                draw_id,
                group_id,
                RaffleStatus::Pending,
                members_json(members)?,
            ],
        )?;

        if changed == 0 && !exists(&conn, group_id)? {
            return Err(DomainError::NotFound(format!("group {}", group_id)));
        }

        Ok(changed == 1)
    }

    async fn reset_raffle(&self, group_id: &str) -> Result<bool> {
        let conn = lock(&self.conn)?;

        let changed = conn.execute(
            "UPDATE groups SET raffle_status = ?, raffle_date = NULL, draw_id = NULL
             WHERE id = ? AND raffle_status = ?",
            params![RaffleStatus::Pending, group_id, RaffleStatus::Completed],
        )?;

        if changed == 0 && !exists(&conn, group_id)? {
            return Err(DomainError::NotFound(format!("group {}", group_id)));
        }

        Ok(changed == 1)
    }
}
