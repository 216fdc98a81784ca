// src/config/mod.rs

//! Course outline loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an outline from disk (`loader.rs`).
//! - Validate parent references and acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    BetaSection, BlockConfig, CourseFile, CourseSection, DEFAULT_START_DATE, RawCourseFile,
};
