//! Mountain conditions reports

mod entity;
mod format;
mod recency;

pub use entity::{FormattedReport, RawNode, RawReport, RawUser, ReportUser, SENTINEL_OWNER_ID};
pub use format::{format_report, parse_date};
pub use recency::{days_since_first_date, is_recent, Clock, SystemClock};

#[cfg(test)]
pub use recency::MockClock;

use crate::domain::cache::CacheKey;
use crate::domain::DomainError;

const NAMESPACE: &str = "mcr";

/// Outcome of fetching one list entry that is not an error
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    Available(T),
    Unavailable(SkipReason),
}

/// Why a list entry was left out without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Owned by the sentinel user
    SentinelOwner,
    /// Report lacks the fields needed to show it
    Unformattable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::SentinelOwner => write!(f, "sentinel_owner"),
            SkipReason::Unformattable => write!(f, "unformattable"),
        }
    }
}

pub mod keys {
    use super::*;

    pub fn node_list() -> CacheKey {
        CacheKey::builder(NAMESPACE).segment("node_list").build()
    }

    pub fn format_list() -> CacheKey {
        CacheKey::builder(NAMESPACE).segment("format_list").build()
    }

    pub fn report(id: &str) -> CacheKey {
        CacheKey::builder(NAMESPACE).segment("report").segment(id).build()
    }

    pub fn user(id: &str) -> CacheKey {
        CacheKey::builder(NAMESPACE).segment("user").segment(id).build()
    }

    pub fn report_full(id: &str) -> CacheKey {
        CacheKey::builder(NAMESPACE)
            .segment("report_full")
            .segment(id)
            .build()
    }

    /// Glob matching every report-scoped key for `id`
    pub fn report_pattern(id: &str) -> String {
        let key = report(id);
        let escaped_id = key.as_str().rsplit('/').next().unwrap_or_default();

        format!("{}/report*/{}", NAMESPACE, escaped_id)
    }
}

/// Parses a report id the lenient way: leading digits, anything after ignored
pub fn parse_report_id(raw: &str) -> Result<u64, DomainError> {
    let trimmed = raw.trim_start();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();

    digits
        .parse::<u64>()
        .map_err(|_| DomainError::validation(format!("Invalid report id '{}'", raw)))
}
