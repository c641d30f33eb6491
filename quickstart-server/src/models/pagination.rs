//! Offset pagination for user listings

use serde::Deserialize;

/// Default rows per listing
const DEFAULT_LIMIT: u32 = 100;

/// Offset/limit window over an id-ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Rows to skip
    pub skip: u32,
    /// Rows to return; zero yields an empty page
    pub limit: u32,
}

impl Range {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.skip)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Query parameters for `GET /user`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl From<RangeParams> for Range {
    fn from(params: RangeParams) -> Self {
        Self::new(
            params.skip.unwrap_or(0),
            params.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}
