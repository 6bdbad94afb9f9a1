use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

use race_tally::{CollectingSink, RaceIndex, TallyConfig, TallyError, summarize_race};

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn leg(participant: &str, distance: f64, speed: f64, transport: Value) -> Value {
    json!({
        "participant": participant,
        "distance": distance,
        "speed": speed,
        "transport": transport
    })
}

fn race_dir() -> TempDir {
    let temp = tempdir().unwrap();
    let days = [
        vec![
            leg("Alice", 10.0, 50.0, json!("car")),
            leg("Bob", 4.0, 8.0, json!("bike")),
        ],
        vec![
            leg("Alice", 20.0, 100.0, json!("bike")),
            leg("Bob", 6.0, 12.0, json!(["walk", "bike"])),
        ],
        vec![leg("Carol", 3.0, 6.0, json!("walk"))],
        vec![
            leg("Alice", 5.0, 25.0, json!("ferry")),
            leg("Carol", 12.0, 24.0, json!("bus")),
        ],
    ];
    let mut files = Vec::new();
    for (position, legs) in days.iter().enumerate() {
        let name = format!("day_{:04}.json", position + 1);
        let distance: f64 = legs
            .iter()
            .map(|leg| leg["distance"].as_f64().unwrap())
            .sum();
        write_json(&temp.path().join(&name), &json!(legs));
        files.push(json!([name, distance, legs.len()]));
    }
    write_json(
        &temp.path().join("index.json"),
        &json!({ "friends": ["Alice", "Bob", "Carol"], "files": files }),
    );
    temp
}

fn config(workers: usize) -> TallyConfig {
    TallyConfig {
        workers,
        ..TallyConfig::default()
    }
}

#[test]
fn summaries_from_disk_agree_across_worker_counts() {
    let temp = race_dir();
    let mut results = Vec::new();
    for workers in [1, 2, 4] {
        let sink = Arc::new(CollectingSink::new());
        let index = RaceIndex::load(temp.path()).unwrap();
        let summary = summarize_race(temp.path(), index, &config(workers), sink.clone()).unwrap();

        let events = sink.events();
        let last = events.last().unwrap();
        assert!(last.forced);
        assert_eq!(last.percent_by_legs, 100);
        assert_eq!(events.iter().filter(|event| event.forced).count(), 1);
        assert_eq!(summary.report.final_progress.processed_legs, 7);
        assert_eq!(summary.report.batches.len(), workers);

        results.push(summary.report.summaries);
    }

    for summaries in &results {
        let alice = &summaries["Alice"];
        assert!((alice.distance - 35.0).abs() < 1e-9);
        assert!((alice.speed - 35.0 / 0.6).abs() < 1e-9);
        let bob = &summaries["Bob"];
        assert!((bob.distance - 10.0).abs() < 1e-9);
        assert!((bob.speed - 10.0).abs() < 1e-9);
        assert_eq!(bob.transport_tags(), vec!["bike", "walk"]);
        let carol = &summaries["Carol"];
        assert!((carol.speed - 15.0 / 1.0).abs() < 1e-9);
        assert_eq!(
            format!("{:.4}", alice.speed),
            format!("{:.4}", results[0]["Alice"].speed)
        );
    }
    assert_eq!(
        results[0]["Alice"].transport_tags(),
        vec!["car", "bike", "ferry"]
    );
}

#[test]
fn malformed_record_fails_its_batch() {
    let temp = race_dir();
    write_json(
        &temp.path().join("day_0003.json"),
        &json!([
            leg("Carol", 3.0, 6.0, json!("walk")),
            {"participant": "Carol", "distance": "far", "speed": 6, "transport": "walk"}
        ]),
    );
    let index = RaceIndex::load(temp.path()).unwrap();
    let sink = Arc::new(CollectingSink::new());
    let err = summarize_race(temp.path(), index, &config(4), sink.clone()).unwrap_err();

    assert_eq!(err.batch(), Some(2));
    match err.root_cause() {
        TallyError::MalformedRecord { unit, leg, .. } => {
            assert_eq!(unit, "day_0003.json");
            assert_eq!(*leg, 1);
        }
        other => panic!("expected malformed record, got {other:?}"),
    }
    assert!(sink.events().iter().all(|event| !event.forced));
}

#[test]
fn non_positive_speed_on_disk_is_rejected() {
    let temp = race_dir();
    write_json(
        &temp.path().join("day_0001.json"),
        &json!([leg("Alice", 10.0, -5.0, json!("car"))]),
    );
    let index = RaceIndex::load(temp.path()).unwrap();
    let err = summarize_race(temp.path(), index, &config(2), Arc::new(CollectingSink::new()))
        .unwrap_err();
    assert_eq!(err.batch(), Some(0));
    assert!(matches!(
        err.root_cause(),
        TallyError::ZeroOrNegativeSpeed { .. }
    ));
}

#[test]
fn empty_index_fails_before_any_worker_starts() {
    let temp = tempdir().unwrap();
    write_json(
        &temp.path().join("index.json"),
        &json!({ "friends": [], "files": [] }),
    );
    let index = RaceIndex::load(temp.path()).unwrap();
    let sink = Arc::new(CollectingSink::new());
    let err = summarize_race(temp.path(), index, &config(4), sink.clone()).unwrap_err();
    assert!(matches!(
        err,
        TallyError::InvalidTotals { total_legs: 0, .. }
    ));
    assert!(sink.events().is_empty());
}

#[test]
fn scanned_directory_matches_indexed_run() {
    let temp = race_dir();
    let loaded = RaceIndex::load(temp.path()).unwrap();
    let scanned = RaceIndex::scan(temp.path()).unwrap();
    assert_eq!(scanned.unit_ids(), loaded.unit_ids());
    assert_eq!(scanned.friends, loaded.friends);
    assert_eq!(scanned.total_legs(), loaded.total_legs());

    let summary = summarize_race(
        temp.path(),
        scanned,
        &config(3),
        Arc::new(CollectingSink::new()),
    )
    .unwrap();
    assert_eq!(
        summary.report.summaries.keys().collect::<Vec<_>>(),
        ["Alice", "Bob", "Carol"]
    );
}

#[test]
fn invalid_configuration_is_reported() {
    let temp = race_dir();
    let index = RaceIndex::load(temp.path()).unwrap();
    let err = summarize_race(
        temp.path(),
        index,
        &TallyConfig {
            workers: 0,
            ..TallyConfig::default()
        },
        Arc::new(CollectingSink::new()),
    )
    .unwrap_err();
    assert!(matches!(err, TallyError::Configuration(_)));
}
