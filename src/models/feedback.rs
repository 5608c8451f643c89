// src/models/feedback.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Moderation state of a feedback record.
///
/// Any state can be set from any other by staff; there is no terminal state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Unprocessed,
    Processing,
    Processed,
}

impl FeedbackStatus {
    pub const ALL: [FeedbackStatus; 3] = [
        FeedbackStatus::Unprocessed,
        FeedbackStatus::Processing,
        FeedbackStatus::Processed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Unprocessed => "unprocessed",
            FeedbackStatus::Processing => "processing",
            FeedbackStatus::Processed => "processed",
        }
    }
}

impl fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown feedback status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for FeedbackStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl ToSql for FeedbackStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for FeedbackStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// A full feedback row, as staff see it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: i64,                              // Internal identity, admin routes only
    pub feedback_id: String,                  // Opaque id handed to the submitter
    pub name: Option<String>,
    pub contact: Option<String>,              // Email or phone, checked at submission only
    pub dining_time: Option<DateTime<Utc>>,   // When the visit happened
    pub rating: u8,                           // 1..=5
    pub content: String,
    pub status: FeedbackStatus,
    pub response: Option<String>,             // Staff reply
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written by the submission path. The store assigns `id` and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub feedback_id: String,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub dining_time: Option<DateTime<Utc>>,
    pub rating: u8,
    pub content: String,
}

/// What a moderation update writes. `response: None` clears any prior reply.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackPatch {
    pub status: FeedbackStatus,
    pub response: Option<String>,
}

/// Projection served to anonymous readers. Never carries contact, status or the internal id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicFeedback {
    pub feedback_id: String,
    pub name: Option<String>,
    pub rating: u8,
    pub content: String,
    pub dining_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
}

impl From<FeedbackRecord> for PublicFeedback {
    fn from(record: FeedbackRecord) -> Self {
        PublicFeedback {
            feedback_id: record.feedback_id,
            name: record.name,
            rating: record.rating,
            content: record.content,
            dining_time: record.dining_time,
            created_at: record.created_at,
            likes: record.likes,
            dislikes: record.dislikes,
        }
    }
}

/// Projection returned to a submitter looking up their own feedback by id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetail {
    pub feedback_id: String,
    pub name: Option<String>,
    pub rating: u8,
    pub content: String,
    pub status: FeedbackStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FeedbackRecord> for FeedbackDetail {
    fn from(record: FeedbackRecord) -> Self {
        FeedbackDetail {
            feedback_id: record.feedback_id,
            name: record.name,
            rating: record.rating,
            content: record.content,
            status: record.status,
            response: record.response,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCounts {
    pub likes: i64,
    pub dislikes: i64,
}

/// Per-status totals for the dashboard tabs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: u64,
    pub unprocessed: u64,
    pub processing: u64,
    pub processed: u64,
}

/// Raw submission body. Everything is optional here so that validation can
/// report every missing field at once.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub dining_time: Option<String>,
    pub rating: Option<i64>,
    pub content: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub success: bool,
    pub feedback_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateFeedbackRequest {
    pub status: Option<String>,
    pub response: Option<String>,
}
