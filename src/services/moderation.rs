use log::{info, warn};

use crate::db::Database;
use crate::error::AppError;
use crate::models::feedback::{
    FeedbackPatch, FeedbackRecord, FeedbackStatus, StatusCounts, UpdateFeedbackRequest,
};

const INVALID_STATUS: &str = "Invalid status. Must be one of: unprocessed, processing, processed";

fn require(authorized: bool) -> Result<(), AppError> {
    if authorized {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Parse the optional `status` filter used by the dashboard tabs.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<FeedbackStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| AppError::bad_request(INVALID_STATUS)),
    }
}

/// Every record with the full projection, newest first.
pub async fn list_all(
    db: &Database,
    authorized: bool,
    status: Option<FeedbackStatus>,
) -> Result<Vec<FeedbackRecord>, AppError> {
    require(authorized)?;
    Ok(db.list_all(status).await?)
}

pub async fn status_counts(db: &Database, authorized: bool) -> Result<StatusCounts, AppError> {
    require(authorized)?;
    Ok(db.count_by_status().await?)
}

/// Set the status and staff reply of one record. `raw_id` is the internal
/// numeric id; an omitted or blank reply clears the previous one.
pub async fn update_status_and_response(
    db: &Database,
    authorized: bool,
    raw_id: &str,
    request: Option<UpdateFeedbackRequest>,
) -> Result<FeedbackRecord, AppError> {
    require(authorized)?;

    let id: i64 = raw_id
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request("Invalid feedback ID"))?;
    let request = request.ok_or_else(|| AppError::bad_request("Invalid request body"))?;

    let status = request
        .status
        .as_deref()
        .and_then(|s| s.parse::<FeedbackStatus>().ok())
        .ok_or_else(|| {
            warn!("[ADMIN] Rejected status {:?} for feedback {}", request.status, id);
            AppError::bad_request(INVALID_STATUS)
        })?;
    let response = request
        .response
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let updated = db
        .update(id, &FeedbackPatch { status, response })
        .await?
        .ok_or_else(|| AppError::not_found("Feedback not found"))?;
    info!("[ADMIN] Feedback {} is now {}", updated.id, updated.status);
    Ok(updated)
}
