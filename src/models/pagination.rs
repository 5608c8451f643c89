// src/models/pagination.rs
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Page number and size, both already checked to be at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Build from raw query values. A missing page means page 1, a missing
    /// limit means `default_limit`, and limits above `max_limit` are capped.
    pub fn from_query(
        page: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::bad_request("Page must be 1 or greater"));
        }
        let limit = limit.unwrap_or(i64::from(default_limit));
        if limit < 1 {
            return Err(AppError::bad_request("Limit must be 1 or greater"));
        }

        Ok(PageRequest {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            limit: limit.min(i64::from(max_limit.max(1))) as u32,
        })
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(request.limit));
        PaginationMeta {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
            has_next: u64::from(request.page) < total_pages,
            has_prev: request.page > 1,
        }
    }
}

/// One page of public feedback plus the metadata the pager needs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub feedback: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Star filter for the public listing: `all` or a single rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingFilter {
    #[default]
    All,
    Only(u8),
}

impl RatingFilter {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        let raw = match raw.map(str::trim) {
            None | Some("") | Some("all") => return Ok(RatingFilter::All),
            Some(raw) => raw,
        };
        match raw.parse::<u8>() {
            Ok(stars @ 1..=5) => Ok(RatingFilter::Only(stars)),
            _ => Err(AppError::bad_request(
                "Rating filter must be 'all' or a number from 1 to 5",
            )),
        }
    }

    pub fn rating(&self) -> Option<u8> {
        match self {
            RatingFilter::All => None,
            RatingFilter::Only(stars) => Some(*stars),
        }
    }
}
