#![allow(dead_code)]

use std::collections::BTreeMap;

use blockdates::config::{BetaSection, BlockConfig, CourseFile, CourseSection, RawCourseFile};
use chrono::{DateTime, Utc};

/// Builder for `CourseFile` to simplify test setup.
pub struct CourseFileBuilder {
    config: RawCourseFile,
}

impl CourseFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawCourseFile {
                course: CourseSection {
                    key: "course-v1:TestX+T101+2024".to_string(),
                    default_start_date: None,
                    disable_start_dates: false,
                },
                beta: BetaSection::default(),
                block: BTreeMap::new(),
            },
        }
    }

    pub fn course_key(mut self, key: &str) -> Self {
        self.config.course.key = key.to_string();
        self
    }

    pub fn default_start_date(mut self, date: DateTime<Utc>) -> Self {
        self.config.course.default_start_date = Some(date);
        self
    }

    pub fn disable_start_dates(mut self, val: bool) -> Self {
        self.config.course.disable_start_dates = val;
        self
    }

    pub fn beta_tester(mut self, user: &str) -> Self {
        self.config.beta.testers.push(user.to_string());
        self
    }

    pub fn with_block(mut self, key: &str, block: BlockConfig) -> Self {
        self.config.block.insert(key.to_string(), block);
        self
    }

    /// Raw, unvalidated outline; for exercising validation errors.
    pub fn build_raw(self) -> RawCourseFile {
        self.config
    }

    pub fn build(self) -> CourseFile {
        CourseFile::try_from(self.config).expect("Failed to build valid course from builder")
    }
}

impl Default for CourseFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `BlockConfig`.
pub struct BlockConfigBuilder {
    block: BlockConfig,
}

impl BlockConfigBuilder {
    pub fn new(kind: &str) -> Self {
        Self {
            block: BlockConfig {
                kind: kind.to_string(),
                display_name: None,
                parents: vec![],
                start: None,
                days_early_for_beta: None,
            },
        }
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.block.parents.push(parent.to_string());
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.block.start = Some(start);
        self
    }

    pub fn days_early_for_beta(mut self, days: i64) -> Self {
        self.block.days_early_for_beta = Some(days);
        self
    }

    pub fn display_name(mut self, name: &str) -> Self {
        self.block.display_name = Some(name.to_string());
        self
    }

    pub fn build(self) -> BlockConfig {
        self.block
    }
}
