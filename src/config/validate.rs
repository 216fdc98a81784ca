// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{CourseFile, RawCourseFile};
use crate::errors::{BlockdatesError, Result};

impl TryFrom<RawCourseFile> for CourseFile {
    type Error = crate::errors::BlockdatesError;

    fn try_from(raw: RawCourseFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_course(&raw)?;
        Ok(CourseFile::new_unchecked(raw.course, raw.beta, raw.block))
    }
}

fn validate_raw_course(cfg: &RawCourseFile) -> Result<()> {
    ensure_has_blocks(cfg)?;
    validate_course_section(cfg)?;
    validate_block_fields(cfg)?;
    validate_parents(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_blocks(cfg: &RawCourseFile) -> Result<()> {
    if cfg.block.is_empty() {
        return Err(BlockdatesError::ConfigError(
            "course must contain at least one [block.<key>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_course_section(cfg: &RawCourseFile) -> Result<()> {
    if cfg.course.key.trim().is_empty() {
        return Err(BlockdatesError::ConfigError(
            "[course].key must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_block_fields(cfg: &RawCourseFile) -> Result<()> {
    for (key, block) in cfg.block.iter() {
        if let Some(days) = block.days_early_for_beta {
            if days < 0 {
                return Err(BlockdatesError::ConfigError(format!(
                    "block '{}' has negative days_early_for_beta ({})",
                    key, days
                )));
            }
        }
    }
    Ok(())
}

fn validate_parents(cfg: &RawCourseFile) -> Result<()> {
    for (key, block) in cfg.block.iter() {
        for parent in block.parents.iter() {
            if !cfg.block.contains_key(parent) {
                return Err(BlockdatesError::ConfigError(format!(
                    "block '{}' has unknown parent '{}'",
                    key, parent
                )));
            }
            if parent == key {
                return Err(BlockdatesError::ConfigError(format!(
                    "block '{}' cannot be its own parent",
                    key
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawCourseFile) -> Result<()> {
    // Edge direction: parent -> child.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for key in cfg.block.keys() {
        graph.add_node(key.as_str());
    }

    for (key, block) in cfg.block.iter() {
        for parent in block.parents.iter() {
            graph.add_edge(parent.as_str(), key.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(BlockdatesError::DagCycle(format!(
                "cycle detected in course outline involving block '{}'",
                node
            )))
        }
    }
}
