// src/config/model.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::blocks::FieldSource;
use crate::types::{BlockKey, CourseKey, FieldValue, UserId};

/// Start date assumed for blocks that do not declare one.
pub const DEFAULT_START_DATE: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Course outline as read from a TOML file, before validation.
///
/// ```toml
/// [course]
/// key = "course-v1:edX+DemoX+2024"
///
/// [beta]
/// testers = ["beta_user"]
///
/// [block.course]
/// kind = "course"
/// start = "2024-01-01T00:00:00Z"
///
/// [block.week1]
/// kind = "chapter"
/// parents = ["course"]
/// days_early_for_beta = 3
/// ```
///
/// Dates are RFC 3339 strings and must be quoted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCourseFile {
    /// Course-wide settings from `[course]`.
    pub course: CourseSection,

    /// Beta-test cohort from `[beta]`.
    #[serde(default)]
    pub beta: BetaSection,

    /// All blocks from `[block.<key>]`, keyed by block key.
    #[serde(default)]
    pub block: BTreeMap<String, BlockConfig>,
}

/// Validated course outline.
///
/// Only constructed through `TryFrom<RawCourseFile>`, so every parent
/// reference resolves and the parent graph is acyclic.
#[derive(Debug, Clone)]
pub struct CourseFile {
    pub course: CourseSection,
    pub beta: BetaSection,
    pub block: BTreeMap<String, BlockConfig>,
}

impl CourseFile {
    pub(crate) fn new_unchecked(
        course: CourseSection,
        beta: BetaSection,
        block: BTreeMap<String, BlockConfig>,
    ) -> Self {
        Self { course, beta, block }
    }

    pub fn course_key(&self) -> CourseKey {
        CourseKey::new(self.course.key.clone())
    }

    pub fn beta_testers(&self) -> impl Iterator<Item = UserId> + '_ {
        self.beta.testers.iter().map(|t| UserId::new(t.clone()))
    }
}

impl FieldSource for CourseFile {
    fn field(&self, key: &BlockKey, name: &str) -> Option<FieldValue> {
        let block = self.block.get(key.as_str())?;
        match name {
            "start" => block.start.map(FieldValue::Date),
            "days_early_for_beta" => block.days_early_for_beta.map(FieldValue::Int),
            "display_name" => block.display_name.clone().map(FieldValue::Text),
            _ => None,
        }
    }
}

/// `[course]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseSection {
    /// Course run identifier.
    pub key: String,

    /// Overrides [`DEFAULT_START_DATE`] for blocks without a `start`.
    #[serde(default)]
    pub default_start_date: Option<DateTime<Utc>>,

    /// When true, start dates are not enforced for anyone.
    #[serde(default)]
    pub disable_start_dates: bool,
}

impl CourseSection {
    pub fn effective_default_start(&self) -> DateTime<Utc> {
        self.default_start_date.unwrap_or(DEFAULT_START_DATE)
    }
}

/// `[beta]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BetaSection {
    #[serde(default)]
    pub testers: Vec<String>,
}

/// `[block.<key>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockConfig {
    /// Block type, e.g. `course`, `chapter`, `sequential`, `vertical`.
    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Keys of the blocks this block is placed under.
    #[serde(default)]
    pub parents: Vec<String>,

    /// Declared release date of this block.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    /// How many days before `start` beta testers may see this block.
    #[serde(default)]
    pub days_early_for_beta: Option<i64>,
}

fn default_kind() -> String {
    "vertical".to_string()
}
