//! Query parameter types shared by handlers

use serde::Deserialize;

use super::AppResult;
use super::time::date_bounds;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&limit=`, 1-based
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

/// `?startDate=&endDate=` (`YYYY-MM-DD`, inclusive)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeParams {
    /// Millisecond bounds, `None` for an open side
    pub fn bounds(&self) -> AppResult<(Option<i64>, Option<i64>)> {
        date_bounds(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

/// `?status=active|inactive|all`
pub fn parse_status(status: Option<&str>) -> AppResult<Option<bool>> {
    match status.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some("active") => Ok(Some(true)),
        Some("inactive") => Ok(Some(false)),
        Some(other) => Err(super::AppError::validation(format!(
            "Invalid status: {other}, expected active, inactive or all"
        ))),
    }
}
