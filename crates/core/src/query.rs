//! Read-side query parameters (date filtering + pagination).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Inclusive creation-date range. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }
}

impl ValueObject for DateRange {}

/// 1-based page request.
///
/// Pagination only applies when `limit` is present; a missing `page` then means the
/// first page. A `page` without `limit` is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: Option<u32>,
    limit: Option<u32>,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> DomainResult<Self> {
        if page == Some(0) {
            return Err(DomainError::validation("page must be >= 1"));
        }
        if limit == Some(0) {
            return Err(DomainError::validation("limit must be >= 1"));
        }
        Ok(Self { page, limit })
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// `(offset, limit)` to apply, or `None` when no pagination was requested.
    pub fn window(&self) -> Option<(u64, u64)> {
        let limit = u64::from(self.limit?);
        let page = u64::from(self.page.unwrap_or(1));
        Some(((page - 1) * limit, limit))
    }
}

impl ValueObject for PageRequest {}
