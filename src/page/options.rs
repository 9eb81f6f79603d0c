use crate::config::PaginationConfig;
use crate::error::{Error, Result};

/// Listing parameters accepted by the page and bookmark queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Match the path prefix literally rather than as a pattern.
    pub is_reg_exp_escaped_from_path: bool,
    /// Keep pages under `/trash` in the results.
    pub include_trashed: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: None,
            offset: None,
            is_reg_exp_escaped_from_path: true,
            include_trashed: false,
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from raw query-string values.
    pub fn parse(limit: Option<&str>, offset: Option<&str>) -> Result<Self> {
        Ok(Self {
            limit: parse_count("limit", limit)?,
            offset: parse_count("offset", offset)?,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn unescaped(mut self) -> Self {
        self.is_reg_exp_escaped_from_path = false;
        self
    }

    #[must_use]
    pub fn including_trashed(mut self) -> Self {
        self.include_trashed = true;
        self
    }

    /// Effective `(limit, offset)` after defaults and clamping.
    pub fn resolve(&self, config: &PaginationConfig) -> (u32, u32) {
        let limit = match self.limit {
            None | Some(0) => config.default_limit,
            Some(limit) => limit.min(config.max_limit),
        };
        (limit, self.offset.unwrap_or(0))
    }
}

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<u32>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| Error::InvalidPagination(format!("{name} must be a non-negative integer: '{raw}'")))
}
