use std::collections::HashSet;

use blockdates::access::CourseAccessPolicy;
use blockdates::blocks::BlockGraph;
use blockdates::config::{CourseFile, DEFAULT_START_DATE};
use blockdates::engine::TransformerPipeline;
use blockdates::transformers::{StartDateTransformer, UsageInfo};
use blockdates::types::{BlockKey, FieldValue, UserId};
use blockdates_test_utils::builders::{BlockConfigBuilder, CourseFileBuilder};
use blockdates_test_utils::ts;
use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;

const NOW: &str = "2024-07-01T00:00:00Z";

fn day(offset: i64) -> DateTime<Utc> {
    ts("2024-01-01T00:00:00Z") + TimeDelta::days(offset)
}

// Roughly 1940 to 2025, so generated starts fall on both sides of the
// default start sentinel.
const OFFSETS: std::ops::Range<i64> = -30_000..365;

// Acyclic by construction: block N may only be placed under blocks 0..N-1.
fn outline_strategy(max_blocks: usize) -> impl Strategy<Value = CourseFile> {
    (1..=max_blocks).prop_flat_map(|num_blocks| {
        let parents_strat = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..3),
            num_blocks,
        );
        let starts_strat =
            proptest::collection::vec(proptest::option::of(OFFSETS), num_blocks);

        (parents_strat, starts_strat).prop_map(move |(raw_parents, starts)| {
            let mut builder = CourseFileBuilder::new();
            for (i, (potential_parents, start)) in
                raw_parents.into_iter().zip(starts).enumerate()
            {
                let mut block = BlockConfigBuilder::new("vertical");

                let mut parents = HashSet::new();
                for p in potential_parents {
                    if i > 0 {
                        parents.insert(p % i);
                    }
                }
                for p in parents {
                    block = block.parent(&format!("b{}", p));
                }
                if let Some(offset) = start {
                    block = block.start(day(offset));
                }
                builder = builder.with_block(&format!("b{}", i), block.build());
            }
            builder.build()
        })
    })
}

fn pipeline(cfg: &CourseFile) -> TransformerPipeline {
    TransformerPipeline::new()
        .with_transformer(StartDateTransformer::new(Box::new(
            CourseAccessPolicy::from_course(cfg),
        )))
        .with_now(ts(NOW))
}

fn collected(cfg: &CourseFile) -> BlockGraph {
    let mut graph = BlockGraph::from_course(cfg).unwrap();
    pipeline(cfg).collect(&mut graph, cfg).unwrap();
    graph
}

fn own_start(graph: &BlockGraph, key: &BlockKey) -> Option<DateTime<Utc>> {
    graph.get_field(key, "start").and_then(FieldValue::as_date)
}

fn merged(graph: &BlockGraph, key: &BlockKey) -> DateTime<Utc> {
    StartDateTransformer::merged_start_date(graph, key).unwrap()
}

proptest! {
    #[test]
    fn merged_start_never_precedes_own_start(cfg in outline_strategy(12)) {
        let graph = collected(&cfg);
        for key in graph.topological_order().unwrap() {
            if let Some(own) = own_start(&graph, &key) {
                prop_assert!(merged(&graph, &key) >= own);
            }
        }
    }

    #[test]
    fn merged_start_combines_own_and_earliest_parent(cfg in outline_strategy(12)) {
        let graph = collected(&cfg);
        for key in graph.topological_order().unwrap() {
            let inherited = graph
                .parents_of(&key)
                .iter()
                .map(|p| merged(&graph, p))
                .min();
            let expected = match (own_start(&graph, &key), inherited) {
                (Some(own), Some(inherited)) => own.max(inherited),
                (Some(own), None) => own,
                (None, Some(inherited)) => inherited,
                (None, None) => DEFAULT_START_DATE,
            };
            prop_assert_eq!(merged(&graph, &key), expected);
        }
    }

    #[test]
    fn collect_twice_yields_identical_dates(cfg in outline_strategy(12)) {
        let mut graph = collected(&cfg);
        let first: Vec<_> = graph
            .topological_order()
            .unwrap()
            .into_iter()
            .map(|k| { let d = merged(&graph, &k); (k, d) })
            .collect();

        pipeline(&cfg).collect(&mut graph, &cfg).unwrap();
        for (k, d) in first {
            prop_assert_eq!(merged(&graph, &k), d);
        }
    }

    #[test]
    fn bypass_flags_never_remove_blocks(
        cfg in outline_strategy(12),
        staff in any::<bool>(),
    ) {
        let mut usage = UsageInfo::new(UserId::new("viewer"), cfg.course_key());
        usage.has_staff_access = staff;
        usage.allow_start_dates_in_future = !staff;

        let mut graph = collected(&cfg);
        let before = graph.len();
        pipeline(&cfg).transform(&mut graph, &usage).unwrap();
        prop_assert_eq!(graph.len(), before);
    }

    #[test]
    fn student_view_keeps_exactly_the_released_reachable_blocks(cfg in outline_strategy(12)) {
        let usage = UsageInfo::new(UserId::new("student"), cfg.course_key());
        let full = collected(&cfg);
        let mut graph = full.clone();
        pipeline(&cfg).transform(&mut graph, &usage).unwrap();

        let now = ts(NOW);
        let mut expected: HashSet<BlockKey> = HashSet::new();
        for key in full.topological_order().unwrap() {
            let parents = full.parents_of(&key);
            let reachable = parents.is_empty() || parents.iter().any(|p| expected.contains(p));
            if reachable && now > merged(&full, &key) {
                expected.insert(key);
            }
        }

        prop_assert_eq!(graph.len(), expected.len());
        for key in expected {
            prop_assert!(graph.contains(&key));
        }
    }
}
