//! Batch CRUD for [`Message`] rows.
//!
//! Only user ids are stored with a message; rows come back with stub users
//! (`User::new(id)`) that the message repository hydrates from the user
//! table.

use parley_shared::SyncStatus;
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::codec::{
    extra_data_from_sql, extra_data_to_sql, json_list_from_sql, json_to_sql,
    sync_status_from_sql, ts_from_sql, ts_to_sql,
};
use crate::database::{placeholders, Database, MAX_BATCH_KEYS};
use crate::error::Result;
use crate::models::{Message, User};

const MESSAGE_COLUMNS: &str = "id, cid, user_id, text, attachments, mentioned_user_ids, \
                               created_at, created_locally_at, updated_at, updated_locally_at, \
                               deleted_at, extra_data, sync_status, sync_description";

impl Database {
    /// Insert or replace a batch of messages in one transaction.
    pub fn upsert_messages(&self, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT OR REPLACE INTO messages ({MESSAGE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ))?;
            for message in messages {
                let mentioned: Vec<&str> =
                    message.mentioned_users.iter().map(|u| u.id.as_str()).collect();
                stmt.execute(params![
                    message.id,
                    message.cid,
                    message.user.id,
                    message.text,
                    json_to_sql(&message.attachments)?,
                    json_to_sql(&mentioned)?,
                    ts_to_sql(&message.created_at),
                    ts_to_sql(&message.created_locally_at),
                    ts_to_sql(&message.updated_at),
                    ts_to_sql(&message.updated_locally_at),
                    ts_to_sql(&message.deleted_at),
                    extra_data_to_sql(&message.extra_data)?,
                    message.sync_status.code(),
                    message.sync_description,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_message(&self, id: &str) -> Result<Option<Message>> {
        let message = self
            .conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    pub fn get_messages(&self, ids: &[String]) -> Result<Vec<Message>> {
        let mut messages = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH_KEYS) {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_message)?;
            for row in rows {
                messages.push(row?);
            }
        }
        Ok(messages)
    }

    /// Newest `limit` messages of a channel, newest first.  Messages not yet
    /// acknowledged by the server sort by their local creation time.
    pub fn get_messages_for_channel(&self, cid: &str, limit: usize) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE cid = ?1
             ORDER BY COALESCE(created_at, created_locally_at) DESC, id DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![cid, limit as i64], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Up to `limit` messages in `status`, ordered by id, starting strictly
    /// after the id `after` when given.
    pub fn get_messages_by_sync_status(
        &self,
        status: SyncStatus,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE sync_status = ?1 AND (?2 IS NULL OR id > ?2)
             ORDER BY id ASC
             LIMIT ?3"
        ))?;
        let rows = stmt.query_map(
            params![status.code(), after, limit as i64],
            row_to_message,
        )?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn delete_all_messages(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM messages", [])?)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let user_id: String = row.get(2)?;
    let mentioned_ids: Vec<String> = json_list_from_sql(5, row.get(5)?)?;

    Ok(Message {
        id: row.get(0)?,
        cid: row.get(1)?,
        user: User::new(user_id),
        text: row.get(3)?,
        attachments: json_list_from_sql(4, row.get(4)?)?,
        mentioned_users: mentioned_ids.into_iter().map(User::new).collect(),
        created_at: ts_from_sql(6, row.get(6)?)?,
        created_locally_at: ts_from_sql(7, row.get(7)?)?,
        updated_at: ts_from_sql(8, row.get(8)?)?,
        updated_locally_at: ts_from_sql(9, row.get(9)?)?,
        deleted_at: ts_from_sql(10, row.get(10)?)?,
        extra_data: extra_data_from_sql(11, row.get(11)?)?,
        sync_status: sync_status_from_sql(12, row.get(12)?)?,
        sync_description: row.get(13)?,
    })
}
