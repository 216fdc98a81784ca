// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{CourseFile, RawCourseFile};
use crate::errors::Result;

/// Load a course outline from a given path and return the raw `RawCourseFile`.
///
/// This only performs TOML deserialization; it does **not** check parent
/// references or acyclicity. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawCourseFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Parse a course outline from TOML text without validating it.
pub fn parse_str(contents: &str) -> Result<RawCourseFile> {
    let raw: RawCourseFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a course outline from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` attributes).
/// - Checks for:
///   - unknown `parents` references,
///   - cycles in the outline,
///   - course-level sanity (non-empty key, non-negative beta offsets).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<CourseFile> {
    let raw = load_from_path(&path)?;
    CourseFile::try_from(raw)
}

/// Default outline path: `Course.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Course.toml")
}
