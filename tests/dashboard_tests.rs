/// Dashboard controller tests driven through the public sources.
use insightboard::chart::{ChartType, Marks};
use insightboard::config::schema::ChartConfig;
use insightboard::dashboard::{DashboardController, FetchOutcome, PREVIEW_LEN};
use insightboard::filter::FilterCriteria;
use insightboard::model::Record;
use insightboard::source::{DataSource, FileSource, StaticSource};

fn insight(title: &str, region: &str, intensity: i64) -> Record {
    Record {
        region: Some(region.to_string()),
        intensity: Some(intensity),
        topic: vec!["oil".to_string()],
        ..Record::titled(title)
    }
}

fn loaded() -> DashboardController {
    let mut board = DashboardController::default();
    let records = vec![
        insight("Asia 1", "Asia", 3),
        insight("Europe 1", "Europe", 5),
        insight("Asia 2", "Asia", 7),
        insight("Africa 1", "Africa", 2),
        insight("Asia 3", "Asia", 1),
        insight("Europe 2", "Europe", 4),
    ];
    let outcome = board.refresh(&StaticSource::new(records));
    assert!(outcome.is_loaded());
    board
}

#[test]
fn initial_state_is_empty_bar_chart() {
    let board = DashboardController::default();
    assert!(board.records().is_empty());
    assert!(board.criteria().is_empty());
    assert_eq!(board.chart_type(), ChartType::Bar);
    assert!(board.chart().is_empty());
}

#[test]
fn load_derives_facets_filtered_and_chart() {
    let board = loaded();
    assert_eq!(board.records().len(), 6);
    assert_eq!(board.filtered().len(), 6);
    assert_eq!(board.facets().regions, vec!["Asia", "Europe", "Africa"]);
    assert_eq!(board.chart().mark_count(), 6);
    assert_eq!(board.preview(PREVIEW_LEN).len(), PREVIEW_LEN);
}

#[test]
fn criteria_change_refilters_but_keeps_facets() {
    let mut board = loaded();
    board.update_criteria(|c| c.region = "Asia".to_string());
    assert_eq!(board.filtered().len(), 3);
    assert_eq!(board.chart().mark_count(), 3);
    assert_eq!(board.facets().regions.len(), 3);

    board.clear_filters();
    assert!(board.criteria().is_empty());
    assert_eq!(board.filtered().len(), 6);
}

#[test]
fn chart_type_switch_rebuilds_spec() {
    let mut board = loaded();
    board.set_criteria(FilterCriteria {
        region: "Europe".to_string(),
        ..FilterCriteria::default()
    });
    board.set_chart_type(ChartType::Pie);
    let Marks::Pie { arcs, .. } = &board.chart().marks else {
        panic!("expected pie");
    };
    assert_eq!(arcs.len(), 1);
    assert_eq!(arcs[0].count, 2);
}

#[test]
fn failed_refresh_keeps_previous_data() {
    let mut board = loaded();
    board.set_chart_type(ChartType::Line);
    let before = board.chart().clone();

    let outcome = board.refresh(&StaticSource::failing("connection refused"));
    match outcome {
        FetchOutcome::Failed { error, .. } => assert!(error.contains("connection refused")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(board.records().len(), 6);
    assert_eq!(board.chart(), &before);
}

#[test]
fn stale_response_is_discarded() {
    let mut board = DashboardController::default();
    let slow = board.begin_fetch();
    let fast = board.begin_fetch();

    assert!(board.receive_data(fast, vec![insight("new", "Asia", 1)]));
    assert!(!board.receive_data(slow, vec![insight("old", "Asia", 1)]));
    assert_eq!(board.records()[0].title, "new");
}

#[test]
fn chart_config_sets_default_type_and_layout() {
    let config = ChartConfig {
        default_type: ChartType::Timeline,
        width: 800.0,
        ..ChartConfig::default()
    };
    let board = DashboardController::new(config);
    assert_eq!(board.chart_type(), ChartType::Timeline);
    assert_eq!(board.chart().layout.width, 800.0);
}

#[test]
fn file_source_feeds_the_dashboard() {
    let path = std::env::temp_dir().join(format!(
        "insightboard-dashboard-{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"[{"title": "From file", "intensity": 4}, "not a record", {"title": "Second"}]"#,
    )
    .unwrap();

    let source = FileSource::new(&path);
    assert!(source.describe().contains("insightboard-dashboard"));

    let mut board = DashboardController::default();
    let outcome = board.refresh(&source);
    let _ = std::fs::remove_file(&path);

    match outcome {
        FetchOutcome::Loaded {
            records, skipped, ..
        } => {
            assert_eq!(records, 2);
            assert_eq!(skipped, 1);
        }
        other => panic!("expected load, got {other:?}"),
    }
    assert_eq!(board.chart().mark_count(), 1);
}
