// src/access/mod.rs

//! Start-date access policy.
//!
//! The start-date transformer decides *which* date applies to a block; this
//! module decides whether a given viewer may see a block with that date.

pub mod start_date;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::types::{CourseKey, UserId};

pub use start_date::{AccessOptions, CourseAccessPolicy, adjust_start_date};

/// Access check consulted by the start-date filter for every block.
///
/// Errors are propagated to the caller of the filtering pass unchanged.
pub trait AccessPolicy {
    fn check_start_date(
        &self,
        user: &UserId,
        days_early_for_beta: Option<i64>,
        start: DateTime<Utc>,
        course: &CourseKey,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}
