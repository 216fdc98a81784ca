// src/access/start_date.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

use crate::access::AccessPolicy;
use crate::config::model::CourseFile;
use crate::errors::{BlockdatesError, Result};
use crate::types::{CourseKey, UserId};

/// Switches that change how start dates are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessOptions {
    /// Grant access regardless of start dates.
    pub disable_start_dates: bool,
}

/// Default [`AccessPolicy`]: release dates with per-course beta cohorts.
///
/// Beta testers of a course see a block `days_early_for_beta` days before
/// its start date; everyone else sees it once the start date has passed.
#[derive(Debug, Clone, Default)]
pub struct CourseAccessPolicy {
    beta_testers: HashMap<CourseKey, HashSet<UserId>>,
    options: AccessOptions,
}

impl CourseAccessPolicy {
    pub fn new(options: AccessOptions) -> Self {
        Self {
            beta_testers: HashMap::new(),
            options,
        }
    }

    /// Policy for a single course outline, using its `[beta]` cohort and
    /// `disable_start_dates` setting.
    pub fn from_course(cfg: &CourseFile) -> Self {
        let mut policy = Self::new(AccessOptions {
            disable_start_dates: cfg.course.disable_start_dates,
        });
        let course = cfg.course_key();
        for user in cfg.beta_testers() {
            policy.add_beta_tester(course.clone(), user);
        }
        policy
    }

    pub fn add_beta_tester(&mut self, course: CourseKey, user: UserId) {
        self.beta_testers.entry(course).or_default().insert(user);
    }

    pub fn is_beta_tester(&self, user: &UserId, course: &CourseKey) -> bool {
        self.beta_testers
            .get(course)
            .is_some_and(|users| users.contains(user))
    }

    pub fn options(&self) -> AccessOptions {
        self.options
    }
}

impl AccessPolicy for CourseAccessPolicy {
    fn check_start_date(
        &self,
        user: &UserId,
        days_early_for_beta: Option<i64>,
        start: DateTime<Utc>,
        course: &CourseKey,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if self.options.disable_start_dates {
            return Ok(true);
        }

        let days = if self.is_beta_tester(user, course) {
            days_early_for_beta
        } else {
            None
        };
        let effective_start = adjust_start_date(start, days)?;
        let granted = now > effective_start;

        trace!(
            user = %user,
            %start,
            %effective_start,
            granted,
            "checked start date"
        );
        Ok(granted)
    }
}

/// Shift `start` earlier by `days_early` days, if given.
pub fn adjust_start_date(start: DateTime<Utc>, days_early: Option<i64>) -> Result<DateTime<Utc>> {
    let Some(days) = days_early else {
        return Ok(start);
    };
    TimeDelta::try_days(days)
        .and_then(|delta| start.checked_sub_signed(delta))
        .ok_or_else(|| {
            BlockdatesError::AccessCheck(format!(
                "days_early_for_beta {days} moves start date {start} out of range"
            ))
        })
}
