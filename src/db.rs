use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::feedback::{
    FeedbackPatch, FeedbackRecord, FeedbackStatus, NewFeedback, StatusCounts, VoteCounts,
};


const COLUMNS: &str = "id, feedback_id, name, contact, dining_time, rating, content, \
                       status, response, likes, dislikes, created_at, updated_at";

/// Optional row filters; `None` means "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackFilter {
    pub rating: Option<u8>,
    pub status: Option<FeedbackStatus>,
}

#[derive(Debug, Clone, Copy)]
enum Vote {
    Like,
    Dislike,
}

// Handle on the feedback table. Cheap to clone; every clone shares one connection.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    // Open (or create) the database file. ":memory:" gives a private in-memory store.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        info!("Database connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Create the database schema
    pub async fn create_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;

        // AUTOINCREMENT keeps internal ids from ever being reused
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                feedback_id TEXT NOT NULL UNIQUE,
                name TEXT,
                contact TEXT,
                dining_time TEXT,
                rating INTEGER NOT NULL DEFAULT 1 CHECK (rating BETWEEN 1 AND 5),
                content TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'unprocessed'
                    CHECK (status IN ('unprocessed', 'processing', 'processed')),
                response TEXT,
                likes INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
                dislikes INTEGER NOT NULL DEFAULT 0 CHECK (dislikes >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_feedback_created_at ON feedback (created_at);
            CREATE INDEX IF NOT EXISTS idx_feedback_rating ON feedback (rating);
            CREATE INDEX IF NOT EXISTS idx_feedback_status ON feedback (status);",
        )
        .map_err(|e| {
            log::error!("Failed creating feedback table: {}", e);
            e
        })?;

        conn.execute_batch(
            "CREATE TRIGGER IF NOT EXISTS feedback_identity_immutable
             BEFORE UPDATE OF feedback_id, created_at ON feedback
             WHEN NEW.feedback_id IS NOT OLD.feedback_id
               OR NEW.created_at IS NOT OLD.created_at
             BEGIN
                 SELECT RAISE(ABORT, 'feedback_id and created_at are immutable');
             END;",
        )
        .map_err(|e| {
            log::error!("Failed creating feedback triggers: {}", e);
            e
        })?;
        Ok(())
    }

    // Insert a new record; the store assigns id, created_at and updated_at
    pub async fn create(&self, feedback: &NewFeedback) -> Result<FeedbackRecord, StoreError> {
        let now = Utc::now();
        let conn = self.conn.lock().await;
        let record = conn.query_row(
            &format!(
                "INSERT INTO feedback
                    (feedback_id, name, contact, dining_time, rating, content,
                     status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 RETURNING {COLUMNS}"
            ),
            params![
                &feedback.feedback_id,
                &feedback.name,
                &feedback.contact,
                &feedback.dining_time,
                feedback.rating,
                &feedback.content,
                FeedbackStatus::Unprocessed,
                now,
            ],
            row_to_record,
        )?;
        info!("[DB] Feedback created: id={} feedback_id={}", record.id, record.feedback_id);
        Ok(record)
    }

    pub async fn find_by_feedback_id(
        &self,
        feedback_id: &str,
    ) -> Result<Option<FeedbackRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM feedback WHERE feedback_id = ?1"),
                [feedback_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM feedback WHERE id = ?1"),
                [id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    // One page of matching rows, newest first, plus the total number of matches.
    // Both queries run under the same lock so the count matches the page.
    pub async fn find_many(
        &self,
        filter: &FeedbackFilter,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<FeedbackRecord>, u64), StoreError> {
        let conn = self.conn.lock().await;
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM feedback
             WHERE (?1 IS NULL OR rating = ?1)
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
            .query_map(
                params![filter.rating, filter.status, i64::from(limit), offset],
                row_to_record,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM feedback
             WHERE (?1 IS NULL OR rating = ?1)
               AND (?2 IS NULL OR status = ?2)",
            params![filter.rating, filter.status],
            |row| row.get(0),
        )?;

        debug!(
            "[DB] find_many {:?} offset={} limit={} -> {} of {}",
            filter,
            offset,
            limit,
            rows.len(),
            total
        );
        Ok((rows, total as u64))
    }

    // Every record, newest first, optionally narrowed to one status
    pub async fn list_all(
        &self,
        status: Option<FeedbackStatus>,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM feedback
             WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([status], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("[DB] list_all status={:?} -> {} rows", status, rows.len());
        Ok(rows)
    }

    pub async fn count_by_status(&self) -> Result<StatusCounts, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT status, COUNT(*) FROM feedback GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, FeedbackStatus>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            let count = count as u64;
            counts.all += count;
            match status {
                FeedbackStatus::Unprocessed => counts.unprocessed = count,
                FeedbackStatus::Processing => counts.processing = count,
                FeedbackStatus::Processed => counts.processed = count,
            }
        }
        Ok(counts)
    }

    // Apply a moderation update in a single statement. None when the id is unknown.
    pub async fn update(
        &self,
        id: i64,
        patch: &FeedbackPatch,
    ) -> Result<Option<FeedbackRecord>, StoreError> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                &format!(
                    "UPDATE feedback
                     SET status = ?1, response = ?2, updated_at = ?3
                     WHERE id = ?4
                     RETURNING {COLUMNS}"
                ),
                params![patch.status, &patch.response, Utc::now(), id],
                row_to_record,
            )
            .optional()?;

        match &record {
            Some(_) => info!("[DB] Feedback {} set to {}", id, patch.status),
            None => warn!("[DB] Update for unknown feedback id {}", id),
        }
        Ok(record)
    }

    pub async fn increment_likes(&self, feedback_id: &str) -> Result<Option<VoteCounts>, StoreError> {
        self.increment(feedback_id, Vote::Like).await
    }

    pub async fn increment_dislikes(
        &self,
        feedback_id: &str,
    ) -> Result<Option<VoteCounts>, StoreError> {
        self.increment(feedback_id, Vote::Dislike).await
    }

    // The increment happens inside SQLite, never as read-modify-write here
    async fn increment(&self, feedback_id: &str, vote: Vote) -> Result<Option<VoteCounts>, StoreError> {
        let sql = match vote {
            Vote::Like => {
                "UPDATE feedback SET likes = likes + 1 WHERE feedback_id = ?1
                 RETURNING likes, dislikes"
            }
            Vote::Dislike => {
                "UPDATE feedback SET dislikes = dislikes + 1 WHERE feedback_id = ?1
                 RETURNING likes, dislikes"
            }
        };

        let conn = self.conn.lock().await;
        let counts = conn
            .query_row(sql, [feedback_id], |row| {
                Ok(VoteCounts {
                    likes: row.get(0)?,
                    dislikes: row.get(1)?,
                })
            })
            .optional()?;
        debug!("[DB] {:?} on {} -> {:?}", vote, feedback_id, counts);
        Ok(counts)
    }

    // Close the connection. If other handles are still alive the connection
    // is released when the last of them drops.
    pub fn close(self) -> Result<(), StoreError> {
        match Arc::try_unwrap(self.conn) {
            Ok(conn) => {
                conn.into_inner().close().map_err(|(_, e)| StoreError::from(e))?;
                info!("Database connection closed");
                Ok(())
            }
            Err(_) => {
                warn!("Database still shared at shutdown; closing with the last handle");
                Ok(())
            }
        }
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<FeedbackRecord> {
    Ok(FeedbackRecord {
        id: row.get(0)?,
        feedback_id: row.get(1)?,
        name: row.get(2)?,
        contact: row.get(3)?,
        dining_time: row.get(4)?,
        rating: row.get(5)?,
        content: row.get(6)?,
        status: row.get(7)?,
        response: row.get(8)?,
        likes: row.get(9)?,
        dislikes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
