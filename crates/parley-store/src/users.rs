//! Batch CRUD for [`User`] rows.

use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::codec::{
    extra_data_from_sql, extra_data_to_sql, json_list_from_sql, json_to_sql, ts_from_sql,
    ts_to_sql,
};
use crate::database::{placeholders, Database, MAX_BATCH_KEYS};
use crate::error::Result;
use crate::models::{User, UserRecord};

const USER_COLUMNS: &str = "id, original_id, role, name, image, created_at, updated_at, \
                            last_active, invisible, banned, mutes, extra_data";

impl Database {
    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Insert or replace a batch of users in one transaction.
    pub fn upsert_users(&self, users: &[User]) -> Result<()> {
        let records: Vec<UserRecord> = users
            .iter()
            .map(|user| UserRecord {
                user: user.clone(),
                original_id: None,
            })
            .collect();
        self.upsert_user_records(&records)
    }

    /// Insert or replace raw rows, including the `original_id` column.
    pub fn upsert_user_records(&self, records: &[UserRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT OR REPLACE INTO users ({USER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ))?;
            for record in records {
                let user = &record.user;
                stmt.execute(params![
                    user.id,
                    record.original_id,
                    user.role,
                    user.name,
                    user.image,
                    ts_to_sql(&user.created_at),
                    ts_to_sql(&user.updated_at),
                    ts_to_sql(&user.last_active),
                    user.invisible,
                    user.banned,
                    json_to_sql(&user.mutes)?,
                    extra_data_to_sql(&user.extra_data)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_user_record(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Fetch every user whose id is in `ids`. Unknown ids are skipped; the
    /// result order is unspecified.
    pub fn get_users(&self, ids: &[String]) -> Result<Vec<User>> {
        let mut users = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH_KEYS) {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_user_record)?;
            for row in rows {
                users.push(row?.user);
            }
        }
        Ok(users)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn delete_all_users(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM users", [])?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_user_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let user = User {
        id: row.get(0)?,
        role: row.get(2)?,
        name: row.get(3)?,
        image: row.get(4)?,
        created_at: ts_from_sql(5, row.get(5)?)?,
        updated_at: ts_from_sql(6, row.get(6)?)?,
        last_active: ts_from_sql(7, row.get(7)?)?,
        invisible: row.get(8)?,
        banned: row.get(9)?,
        mutes: json_list_from_sql(10, row.get(10)?)?,
        extra_data: extra_data_from_sql(11, row.get(11)?)?,
    };
    Ok(UserRecord {
        user,
        original_id: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn alice() -> User {
        let mut user = User::new("alice");
        user.name = Some("Alice".into());
        user.created_at = Some(Utc::now());
        user.mutes = vec!["mallory".into()];
        user.extra_data.insert("city".into(), json!("Lyon"));
        user
    }

    #[test]
    fn upsert_then_read_back() {
        let db = Database::open_in_memory().unwrap();
        let alice = alice();
        db.upsert_users(&[alice.clone(), User::new("bob")]).unwrap();

        let record = db.get_user_record("alice").unwrap().unwrap();
        assert_eq!(record.user, alice);
        assert_eq!(record.original_id, None);
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_users(&[alice()]).unwrap();

        let mut renamed = alice();
        renamed.name = Some("Alicia".into());
        db.upsert_users(&[renamed.clone()]).unwrap();

        assert_eq!(db.get_users(&["alice".into()]).unwrap(), vec![renamed]);
    }

    #[test]
    fn batch_read_skips_unknown_ids() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_users(&[alice(), User::new("bob")]).unwrap();

        let mut ids: Vec<_> = db
            .get_users(&["bob".into(), "ghost".into(), "alice".into()])
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["alice", "bob"]);
    }

    #[test]
    fn batch_read_spans_chunks() {
        let db = Database::open_in_memory().unwrap();
        let users: Vec<User> = (0..MAX_BATCH_KEYS + 20)
            .map(|i| User::new(format!("u{i}")))
            .collect();
        db.upsert_users(&users).unwrap();

        let ids: Vec<String> = users.iter().map(|u| u.id.clone()).collect();
        assert_eq!(db.get_users(&ids).unwrap().len(), users.len());
    }

    #[test]
    fn missing_user_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_user_record("nobody").unwrap().is_none());
    }
}
