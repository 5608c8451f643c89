//! Feedback operations, independent of HTTP. Each takes the store handle
//! explicitly; the admin ones also take the caller's authorization fact.

pub mod listing;
pub mod moderation;
pub mod submission;
