use log::{debug, info};
use uuid::Uuid;

use crate::db::Database;
use crate::error::AppError;
use crate::models::feedback::{NewFeedback, SubmissionReceipt, SubmissionRequest};
use crate::validation::validate_submission;

/// Validate and store a new feedback entry, returning the id the submitter
/// can use to look it up later.
pub async fn submit(db: &Database, input: &SubmissionRequest) -> Result<SubmissionReceipt, AppError> {
    let valid = validate_submission(input).map_err(|errors| {
        debug!("[SUBMIT] Rejected submission: {}", errors);
        AppError::Validation(errors)
    })?;

    let record = db
        .create(&NewFeedback {
            feedback_id: new_feedback_id(),
            name: valid.name,
            contact: valid.contact,
            dining_time: valid.dining_time,
            rating: valid.rating,
            content: valid.content,
        })
        .await?;
    info!("[SUBMIT] Stored feedback {} ({} stars)", record.feedback_id, record.rating);

    Ok(SubmissionReceipt {
        success: true,
        feedback_id: record.feedback_id,
    })
}

// Random v4 UUID, so ids cannot be enumerated
fn new_feedback_id() -> String {
    Uuid::new_v4().to_string()
}
