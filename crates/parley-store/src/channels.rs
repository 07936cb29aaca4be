//! Batch CRUD for [`Channel`] rows, plus the sync-status queries the retry
//! loop pages through.

use parley_shared::SyncStatus;
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::codec::{extra_data_from_sql, extra_data_to_sql, sync_status_from_sql, ts_from_sql, ts_to_sql};
use crate::database::{placeholders, Database, MAX_BATCH_KEYS};
use crate::error::Result;
use crate::models::Channel;

const CHANNEL_COLUMNS: &str = "cid, type, channel_id, cooldown, frozen, hidden, \
                               created_by_user_id, member_count, last_message_id, \
                               last_message_at, created_at, updated_at, deleted_at, team, \
                               extra_data, sync_status";

impl Database {
    // ------------------------------------------------------------------
    // Write
    // ------------------------------------------------------------------

    /// Insert or replace a batch of channels in one transaction.
    pub fn upsert_channels(&self, channels: &[Channel]) -> Result<()> {
        if channels.is_empty() {
            return Ok(());
        }
        let tx = self.conn().unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT OR REPLACE INTO channels ({CHANNEL_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ))?;
            for channel in channels {
                stmt.execute(params![
                    channel.cid,
                    channel.channel_type,
                    channel.channel_id,
                    channel.cooldown,
                    channel.frozen,
                    channel.hidden,
                    channel.created_by_user_id,
                    channel.member_count,
                    channel.last_message_id,
                    ts_to_sql(&channel.last_message_at),
                    ts_to_sql(&channel.created_at),
                    ts_to_sql(&channel.updated_at),
                    ts_to_sql(&channel.deleted_at),
                    channel.team,
                    extra_data_to_sql(&channel.extra_data)?,
                    channel.sync_status.code(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_channel(&self, cid: &str) -> Result<Option<Channel>> {
        let channel = self
            .conn()
            .query_row(
                &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE cid = ?1"),
                params![cid],
                row_to_channel,
            )
            .optional()?;
        Ok(channel)
    }

    /// Fetch every channel whose cid is in `cids`. Result order is unspecified.
    pub fn get_channels(&self, cids: &[String]) -> Result<Vec<Channel>> {
        let mut channels = Vec::with_capacity(cids.len());
        for chunk in cids.chunks(MAX_BATCH_KEYS) {
            let mut stmt = self.conn().prepare(&format!(
                "SELECT {CHANNEL_COLUMNS} FROM channels WHERE cid IN ({})",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), row_to_channel)?;
            for row in rows {
                channels.push(row?);
            }
        }
        Ok(channels)
    }

    /// Up to `limit` channels in `status`, ordered by cid, starting strictly
    /// after the cid `after` when given.
    pub fn get_channels_by_sync_status(
        &self,
        status: SyncStatus,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Channel>> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels
             WHERE sync_status = ?1 AND (?2 IS NULL OR cid > ?2)
             ORDER BY cid ASC
             LIMIT ?3"
        ))?;
        let rows = stmt.query_map(
            params![status.code(), after, limit as i64],
            row_to_channel,
        )?;

        let mut channels = Vec::new();
        for row in rows {
            channels.push(row?);
        }
        Ok(channels)
    }

    /// Cids of every channel in `status`, ordered by cid.
    pub fn get_channel_cids_by_sync_status(&self, status: SyncStatus) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT cid FROM channels WHERE sync_status = ?1 ORDER BY cid ASC",
        )?;
        let rows = stmt.query_map(params![status.code()], |row| row.get(0))?;

        let mut cids = Vec::new();
        for row in rows {
            cids.push(row?);
        }
        Ok(cids)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn delete_all_channels(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM channels", [])?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Channel`].
fn row_to_channel(row: &rusqlite::Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        cid: row.get(0)?,
        channel_type: row.get(1)?,
        channel_id: row.get(2)?,
        cooldown: row.get(3)?,
        frozen: row.get(4)?,
        hidden: row.get(5)?,
        created_by_user_id: row.get(6)?,
        member_count: row.get(7)?,
        last_message_id: row.get(8)?,
        last_message_at: ts_from_sql(9, row.get(9)?)?,
        created_at: ts_from_sql(10, row.get(10)?)?,
        updated_at: ts_from_sql(11, row.get(11)?)?,
        deleted_at: ts_from_sql(12, row.get(12)?)?,
        team: row.get(13)?,
        extra_data: extra_data_from_sql(14, row.get(14)?)?,
        sync_status: sync_status_from_sql(15, row.get(15)?)?,
    })
}
