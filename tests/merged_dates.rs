use blockdates::access::CourseAccessPolicy;
use blockdates::blocks::BlockGraph;
use blockdates::config::{CourseFile, DEFAULT_START_DATE};
use blockdates::engine::TransformerPipeline;
use blockdates::transformers::start_date::MERGED_START_DATE;
use blockdates::transformers::{
    DateMerge, MergedDateField, StartDateFieldTransformer, StartDateTransformer, UsageInfo,
    collect_merged_date_field,
};
use blockdates::types::{BlockKey, FieldValue, UserId};
use blockdates_test_utils::builders::{BlockConfigBuilder, CourseFileBuilder};
use blockdates_test_utils::{init_tracing, ts};

fn key(s: &str) -> BlockKey {
    BlockKey::from(s)
}

fn collected(cfg: &CourseFile) -> BlockGraph {
    let pipeline = TransformerPipeline::new().with_transformer(StartDateTransformer::new(
        Box::new(CourseAccessPolicy::from_course(cfg)),
    ));
    let mut graph = BlockGraph::from_course(cfg).unwrap();
    pipeline.collect(&mut graph, cfg).unwrap();
    graph
}

fn merged(graph: &BlockGraph, k: &str) -> chrono::DateTime<chrono::Utc> {
    StartDateTransformer::merged_start_date(graph, &key(k)).expect("merged date collected")
}

/// course -> week1 -> {seq_a, seq_b}; seq_a and seq_b share `video`.
fn diamond_course() -> CourseFile {
    CourseFileBuilder::new()
        .with_block("course", BlockConfigBuilder::new("course").build())
        .with_block(
            "week1",
            BlockConfigBuilder::new("chapter")
                .parent("course")
                .start(ts("2024-02-01T00:00:00Z"))
                .build(),
        )
        .with_block(
            "seq_a",
            BlockConfigBuilder::new("sequential")
                .parent("week1")
                .start(ts("2024-03-01T00:00:00Z"))
                .build(),
        )
        .with_block(
            "seq_b",
            BlockConfigBuilder::new("sequential")
                .parent("week1")
                .start(ts("2024-05-01T00:00:00Z"))
                .build(),
        )
        .with_block(
            "video",
            BlockConfigBuilder::new("video")
                .parent("seq_a")
                .parent("seq_b")
                .build(),
        )
        .build()
}

#[test]
fn test_root_without_start_gets_default() {
    init_tracing();
    let graph = collected(&diamond_course());
    assert_eq!(merged(&graph, "course"), DEFAULT_START_DATE);
}

#[test]
fn test_child_inherits_later_parent_date() {
    init_tracing();
    let cfg = CourseFileBuilder::new()
        .with_block(
            "week1",
            BlockConfigBuilder::new("chapter")
                .start(ts("2024-05-01T00:00:00Z"))
                .build(),
        )
        .with_block(
            "seq",
            BlockConfigBuilder::new("sequential")
                .parent("week1")
                .start(ts("2024-01-01T00:00:00Z"))
                .build(),
        )
        .with_block("unit", BlockConfigBuilder::new("vertical").parent("seq").build())
        .build();

    let graph = collected(&cfg);
    assert_eq!(merged(&graph, "seq"), ts("2024-05-01T00:00:00Z"));
    assert_eq!(merged(&graph, "unit"), ts("2024-05-01T00:00:00Z"));
}

#[test]
fn test_multi_parent_takes_earliest_placement() {
    init_tracing();
    let graph = collected(&diamond_course());
    assert_eq!(merged(&graph, "seq_a"), ts("2024-03-01T00:00:00Z"));
    assert_eq!(merged(&graph, "seq_b"), ts("2024-05-01T00:00:00Z"));
    assert_eq!(merged(&graph, "video"), ts("2024-03-01T00:00:00Z"));
}

#[test]
fn test_collect_is_idempotent() {
    init_tracing();
    let cfg = diamond_course();
    let pipeline = TransformerPipeline::new().with_transformer(StartDateTransformer::new(
        Box::new(CourseAccessPolicy::from_course(&cfg)),
    ));
    let mut graph = BlockGraph::from_course(&cfg).unwrap();
    pipeline.collect(&mut graph, &cfg).unwrap();
    let first: Vec<_> = graph
        .topological_order()
        .unwrap()
        .into_iter()
        .map(|k| (k.clone(), StartDateTransformer::merged_start_date(&graph, &k)))
        .collect();

    pipeline.collect(&mut graph, &cfg).unwrap();
    for (k, date) in first {
        assert_eq!(StartDateTransformer::merged_start_date(&graph, &k), date, "block {k}");
    }
}

#[test]
fn test_course_default_start_date_override() {
    init_tracing();
    let cfg = CourseFileBuilder::new()
        .default_start_date(ts("2030-01-01T00:00:00Z"))
        .with_block("course", BlockConfigBuilder::new("course").build())
        .build();

    let rows = blockdates::evaluate_outline(
        &cfg,
        &UsageInfo::new(UserId::new("student"), cfg.course_key()),
        blockdates::OutlineMode::Fields,
        Some(ts("2024-06-01T00:00:00Z")),
    )
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].effective_start, Some(ts("2030-01-01T00:00:00Z")));
    assert_eq!(rows[0].own_start, None);
}

/// A late course default must not push back blocks that declare their own
/// start, nor the blocks that inherit from them.
fn late_default_course() -> CourseFile {
    CourseFileBuilder::new()
        .default_start_date(ts("2030-01-01T00:00:00Z"))
        .with_block(
            "course",
            BlockConfigBuilder::new("course")
                .start(ts("2024-01-01T00:00:00Z"))
                .build(),
        )
        .with_block("unit", BlockConfigBuilder::new("vertical").parent("course").build())
        .build()
}

#[test]
fn test_root_start_wins_over_later_course_default() {
    init_tracing();
    let cfg = late_default_course();
    let usage = UsageInfo::new(UserId::new("student"), cfg.course_key());

    let rows = blockdates::evaluate_outline(
        &cfg,
        &usage,
        blockdates::OutlineMode::Fields,
        Some(ts("2024-06-01T00:00:00Z")),
    )
    .unwrap();

    let course = rows.iter().find(|r| r.key.as_str() == "course").unwrap();
    assert_eq!(course.effective_start, Some(ts("2024-01-01T00:00:00Z")));
}

#[test]
fn test_child_without_start_inherits_root_under_later_course_default() {
    init_tracing();
    let cfg = late_default_course();
    let usage = UsageInfo::new(UserId::new("student"), cfg.course_key());

    let rows = blockdates::evaluate_outline(
        &cfg,
        &usage,
        blockdates::OutlineMode::Filter,
        Some(ts("2024-06-01T00:00:00Z")),
    )
    .unwrap();

    let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["course", "unit"]);
    assert_eq!(rows[1].effective_start, Some(ts("2024-01-01T00:00:00Z")));
}

#[test]
fn test_pre_epoch_dates_are_not_clamped_to_default() {
    init_tracing();
    let cfg = CourseFileBuilder::new()
        .with_block(
            "archive",
            BlockConfigBuilder::new("course")
                .start(ts("1965-09-01T00:00:00Z"))
                .build(),
        )
        .with_block(
            "lecture",
            BlockConfigBuilder::new("vertical").parent("archive").build(),
        )
        .build();

    let graph = collected(&cfg);
    assert_eq!(merged(&graph, "archive"), ts("1965-09-01T00:00:00Z"));
    assert_eq!(merged(&graph, "lecture"), ts("1965-09-01T00:00:00Z"));
}

#[test]
fn test_field_transformer_publishes_start_without_filtering() {
    init_tracing();
    let cfg = diamond_course();
    let pipeline = TransformerPipeline::new()
        .with_transformer(StartDateFieldTransformer::new())
        .with_now(ts("2024-01-15T00:00:00Z"));
    let mut graph = BlockGraph::from_course(&cfg).unwrap();
    pipeline.collect(&mut graph, &cfg).unwrap();

    assert_eq!(StartDateFieldTransformer::start(&graph, &key("video")), None);

    let usage = UsageInfo::new(UserId::new("student"), cfg.course_key());
    pipeline.transform(&mut graph, &usage).unwrap();

    assert_eq!(graph.len(), 5);
    assert_eq!(
        StartDateFieldTransformer::start(&graph, &key("video")),
        Some(ts("2024-03-01T00:00:00Z"))
    );
    assert_eq!(
        StartDateFieldTransformer::start(&graph, &key("course")),
        Some(DEFAULT_START_DATE)
    );
    // The content field itself is untouched.
    assert_eq!(graph.get_field(&key("video"), "start"), None);
}

#[test]
fn test_transformer_fields_are_namespaced() {
    init_tracing();
    let cfg = diamond_course();
    let mut graph = BlockGraph::from_course(&cfg).unwrap();
    graph.request_field("start");
    graph.load_requested_fields(&cfg);

    let late = MergedDateField {
        owner: "late_dates",
        field_name: "start",
        merged_field_name: MERGED_START_DATE,
        default_date: DEFAULT_START_DATE,
        merge_parents: DateMerge::Max,
        merge_ancestors: DateMerge::Max,
    };
    let early = MergedDateField {
        owner: "early_dates",
        merge_parents: DateMerge::Min,
        ..late
    };
    collect_merged_date_field(&mut graph, &late).unwrap();
    collect_merged_date_field(&mut graph, &early).unwrap();

    let video = key("video");
    assert_eq!(
        graph.get_transformer_field(&video, "late_dates", MERGED_START_DATE),
        Some(&FieldValue::Date(ts("2024-05-01T00:00:00Z")))
    );
    assert_eq!(
        graph.get_transformer_field(&video, "early_dates", MERGED_START_DATE),
        Some(&FieldValue::Date(ts("2024-03-01T00:00:00Z")))
    );
    assert_eq!(
        graph.get_transformer_field(&video, StartDateTransformer::NAME, MERGED_START_DATE),
        None
    );
}
