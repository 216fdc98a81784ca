// src/lib.rs

pub mod access;
pub mod blocks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod transformers;
pub mod types;

use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::access::CourseAccessPolicy;
use crate::blocks::BlockGraph;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::CourseFile;
use crate::engine::TransformerPipeline;
use crate::transformers::{StartDateFieldTransformer, StartDateTransformer, UsageInfo};
use crate::types::{BlockKey, FieldValue, UserId};

/// What to do with the collected outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineMode {
    /// Drop blocks the viewer may not see yet.
    Filter,
    /// Keep every block and publish its effective start date.
    Fields,
}

/// One line of the outline report.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineRow {
    pub key: BlockKey,
    pub kind: String,
    /// The block's own `start`, if it declares one.
    pub own_start: Option<DateTime<Utc>>,
    /// Start date after merging in the parents' dates.
    pub effective_start: Option<DateTime<Utc>>,
}

/// High-level entry point used by `main.rs`.
///
/// Loads the outline, runs the start-date transformers for the viewer
/// described by `args` and prints one line per remaining block.
pub fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let mut usage = UsageInfo::new(UserId::new(args.user.clone()), cfg.course_key());
    usage.has_staff_access = args.staff;
    usage.allow_start_dates_in_future = args.allow_future;

    let mode = if args.fields {
        OutlineMode::Fields
    } else {
        OutlineMode::Filter
    };

    let rows = evaluate_outline(&cfg, &usage, mode, args.now)?;
    info!(rows = rows.len(), ?mode, "outline evaluated");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &rows)?;
    Ok(())
}

/// Build the pipeline for `mode` from the outline's settings.
pub fn build_pipeline(
    cfg: &CourseFile,
    mode: OutlineMode,
    now: Option<DateTime<Utc>>,
) -> TransformerPipeline {
    let default_start = cfg.course.effective_default_start();
    let pipeline = match mode {
        OutlineMode::Filter => TransformerPipeline::new().with_transformer(
            StartDateTransformer::new(Box::new(CourseAccessPolicy::from_course(cfg)))
                .with_default_start(default_start),
        ),
        OutlineMode::Fields => TransformerPipeline::new()
            .with_transformer(StartDateFieldTransformer::new().with_default_start(default_start)),
    };
    match now {
        Some(now) => pipeline.with_now(now),
        None => pipeline,
    }
}

/// Collect and transform `cfg` for one viewer.
///
/// Rows are returned in topological order.
pub fn evaluate_outline(
    cfg: &CourseFile,
    usage: &UsageInfo,
    mode: OutlineMode,
    now: Option<DateTime<Utc>>,
) -> errors::Result<Vec<OutlineRow>> {
    let pipeline = build_pipeline(cfg, mode, now);
    let mut graph = BlockGraph::from_course(cfg)?;

    pipeline.collect(&mut graph, cfg)?;
    pipeline.transform(&mut graph, usage)?;

    let mut rows = Vec::with_capacity(graph.len());
    for key in graph.topological_order()? {
        let effective_start = match mode {
            OutlineMode::Filter => StartDateTransformer::merged_start_date(&graph, &key),
            OutlineMode::Fields => StartDateFieldTransformer::start(&graph, &key),
        };
        let own_start = graph.get_field(&key, "start").and_then(FieldValue::as_date);
        let kind = graph
            .block(&key)
            .map(|b| b.kind().to_string())
            .unwrap_or_default();
        rows.push(OutlineRow {
            key,
            kind,
            own_start,
            effective_start,
        });
    }
    Ok(rows)
}

/// Write `rows` as `key kind own=<date|-> effective=<date|->` lines.
pub fn write_report(out: &mut impl Write, rows: &[OutlineRow]) -> io::Result<()> {
    for row in rows {
        writeln!(
            out,
            "{} {} own={} effective={}",
            row.key,
            row.kind,
            fmt_date(row.own_start),
            fmt_date(row.effective_start)
        )?;
    }
    Ok(())
}

fn fmt_date(d: Option<DateTime<Utc>>) -> String {
    d.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".to_string())
}

/// Simple dry-run output: print blocks, parents and declared dates.
fn print_dry_run(cfg: &CourseFile) {
    println!("blockdates dry-run");
    println!("  course.key = {}", cfg.course.key);
    println!(
        "  course.default_start_date = {}",
        cfg.course.effective_default_start().to_rfc3339()
    );
    if cfg.course.disable_start_dates {
        println!("  course.disable_start_dates = true");
    }
    if !cfg.beta.testers.is_empty() {
        println!("  beta.testers = {:?}", cfg.beta.testers);
    }
    println!();

    println!("blocks ({}):", cfg.block.len());
    for (key, block) in cfg.block.iter() {
        println!("  - {key} ({})", block.kind);
        if let Some(ref name) = block.display_name {
            println!("      display_name: {name}");
        }
        if !block.parents.is_empty() {
            println!("      parents: {:?}", block.parents);
        }
        if let Some(start) = block.start {
            println!("      start: {}", start.to_rfc3339());
        }
        if let Some(days) = block.days_early_for_beta {
            println!("      days_early_for_beta: {days}");
        }
    }

    debug!("dry-run complete (no transformers run)");
}
