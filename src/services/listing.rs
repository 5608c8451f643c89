use log::debug;

use crate::db::{Database, FeedbackFilter};
use crate::error::AppError;
use crate::models::feedback::{FeedbackDetail, PublicFeedback, VoteCounts};
use crate::models::pagination::{Page, PageRequest, PaginationMeta, RatingFilter};

/// One page of public feedback, newest first.
pub async fn list_public(
    db: &Database,
    page: PageRequest,
    rating: RatingFilter,
) -> Result<Page<PublicFeedback>, AppError> {
    let filter = FeedbackFilter {
        rating: rating.rating(),
        ..Default::default()
    };
    let (records, total) = db.find_many(&filter, page.offset(), page.limit).await?;
    debug!(
        "[LISTING] page {} ({:?}) -> {} of {}",
        page.page,
        rating,
        records.len(),
        total
    );

    Ok(Page {
        feedback: records.into_iter().map(PublicFeedback::from).collect(),
        pagination: PaginationMeta::new(page, total),
    })
}

pub async fn get_public(db: &Database, feedback_id: &str) -> Result<PublicFeedback, AppError> {
    db.find_by_feedback_id(feedback_id)
        .await?
        .map(PublicFeedback::from)
        .ok_or_else(feedback_not_found)
}

/// The submitter's own view, which includes the moderation status and reply.
pub async fn get_detail(db: &Database, feedback_id: &str) -> Result<FeedbackDetail, AppError> {
    db.find_by_feedback_id(feedback_id)
        .await?
        .map(FeedbackDetail::from)
        .ok_or_else(feedback_not_found)
}

// Votes are not deduplicated: the same visitor may like an entry repeatedly.
pub async fn like(db: &Database, feedback_id: &str) -> Result<VoteCounts, AppError> {
    db.increment_likes(feedback_id)
        .await?
        .ok_or_else(feedback_not_found)
}

pub async fn dislike(db: &Database, feedback_id: &str) -> Result<VoteCounts, AppError> {
    db.increment_dislikes(feedback_id)
        .await?
        .ok_or_else(feedback_not_found)
}

fn feedback_not_found() -> AppError {
    AppError::not_found("Feedback not found")
}
