/// Filter and facet tests over decoded API payloads.
///
/// Records are built from JSON text the way the data API delivers them,
/// so these also cover the lenient decoding in `model`.
use insightboard::chart::{self, ChartType, Marks};
use insightboard::facets;
use insightboard::filter::{self, FilterCriteria};
use insightboard::model::{self, Record};

fn payload() -> Vec<Record> {
    let raw = r#"[
        {"title": "Oil demand rises", "topic": ["oil", "market"], "sector": "Energy",
         "region": "Northern America", "country": "United States of America",
         "pestle": "Economic", "swot": "Opportunities", "source": "EIA",
         "intensity": 6, "relevance": 2, "likelihood": 3, "end_year": 2030,
         "published": "January, 09 2017 00:00:00"},
        {"title": "Gas prices fall", "topic": "gas", "sector": "Energy",
         "region": "Europe", "country": "", "pestle": "Economic",
         "source": "Reuters", "intensity": "", "end_year": "",
         "published": "March, 02 2018 00:00:00"},
        {"title": "Robots in retail", "topic": ["robot"], "sector": "Retail",
         "region": "Asia", "pestle": "Technological", "swot": "Strengths",
         "source": "EIA Outlook", "intensity": 4, "end_year": 2025,
         "published": ""},
        {"title": "Water scarcity", "topic": ["water", "market"], "sector": "Environment",
         "region": "Africa", "city": "Nairobi", "pestle": "Social", "swot": "Threats",
         "intensity": 9, "end_year": 2030, "published": "June, 30 2020 00:00:00"}
    ]"#;
    let batch = model::parse_records(raw).unwrap();
    assert_eq!(batch.skipped, 0);
    batch.records
}

fn titles(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.title.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Core properties
// ---------------------------------------------------------------------------

#[test]
fn empty_criteria_is_identity() {
    let records = payload();
    assert_eq!(filter::apply(&records, &FilterCriteria::default()), records);
}

#[test]
fn result_is_ordered_subset() {
    let records = payload();
    let criteria = FilterCriteria {
        sector: "Energy".to_string(),
        ..FilterCriteria::default()
    };
    let out = filter::apply(&records, &criteria);
    assert_eq!(titles(&out), vec!["Oil demand rises", "Gas prices fall"]);
    assert!(out.iter().all(|r| records.contains(r)));
}

#[test]
fn filtering_is_idempotent() {
    let records = payload();
    let criteria = FilterCriteria {
        topics: vec!["market".to_string()],
        end_year: "2030".to_string(),
        ..FilterCriteria::default()
    };
    let once = filter::apply(&records, &criteria);
    let twice = filter::apply(&once, &criteria);
    assert_eq!(once, twice);
    assert_eq!(titles(&once), vec!["Oil demand rises", "Water scarcity"]);
}

#[test]
fn topics_match_any_selected() {
    let records = payload();
    let criteria = FilterCriteria {
        topics: vec!["gas".to_string(), "robot".to_string()],
        ..FilterCriteria::default()
    };
    let out = filter::apply(&records, &criteria);
    assert_eq!(titles(&out), vec!["Gas prices fall", "Robots in retail"]);
}

#[test]
fn criteria_combine_with_and() {
    let records = payload();
    let criteria = FilterCriteria {
        pest: "Economic".to_string(),
        source: "eia".to_string(),
        ..FilterCriteria::default()
    };
    assert_eq!(
        titles(&filter::apply(&records, &criteria)),
        vec!["Oil demand rises"]
    );
}

#[test]
fn source_filter_is_substring_match() {
    let records = payload();
    let criteria = FilterCriteria {
        source: "EIA".to_string(),
        ..FilterCriteria::default()
    };
    assert_eq!(
        titles(&filter::apply(&records, &criteria)),
        vec!["Oil demand rises", "Robots in retail"]
    );
}

#[test]
fn empty_string_fields_decode_as_absent() {
    let records = payload();
    let gas = &records[1];
    assert_eq!(gas.topic, vec!["gas"]);
    assert_eq!(gas.country, None);
    assert_eq!(gas.intensity, None);
    assert_eq!(gas.end_year, None);

    let criteria = FilterCriteria {
        end_year: "2030".to_string(),
        ..FilterCriteria::default()
    };
    assert!(!filter::matches(gas, &criteria));
}

#[test]
fn date_range_excludes_missing_published() {
    let records = payload();
    let criteria = FilterCriteria {
        date_from: "2017-01-01".to_string(),
        date_to: "2020-12-31".to_string(),
        ..FilterCriteria::default()
    };
    let out = filter::apply(&records, &criteria);
    assert_eq!(
        titles(&out),
        vec!["Oil demand rises", "Gas prices fall", "Water scarcity"]
    );
}

#[test]
fn unparseable_end_year_matches_nothing() {
    let records = payload();
    let criteria = FilterCriteria {
        end_year: "soon".to_string(),
        ..FilterCriteria::default()
    };
    assert!(filter::apply(&records, &criteria).is_empty());
}

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

#[test]
fn facets_come_from_all_records() {
    let records = payload();
    let f = facets::extract(&records);
    assert_eq!(f.topics, vec!["oil", "market", "gas", "robot", "water"]);
    assert_eq!(f.sectors, vec!["Energy", "Retail", "Environment"]);
    assert_eq!(f.countries, vec!["United States of America"]);
    assert_eq!(f.cities, vec!["Nairobi"]);
    assert_eq!(f.end_years, vec![2025, 2030]);
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn date_from_keeps_later_record_and_charts_it() {
    let raw = r#"[
        {"title": "A", "published": "2020-01-01", "intensity": 5, "topic": ["x"]},
        {"title": "B", "published": "2021-01-01", "intensity": 8, "topic": ["y"]}
    ]"#;
    let records = model::parse_records(raw).unwrap().records;
    let criteria = FilterCriteria {
        date_from: "2020-06-01".to_string(),
        ..FilterCriteria::default()
    };

    let filtered = filter::apply(&records, &criteria);
    assert_eq!(titles(&filtered), vec!["B"]);

    let spec = chart::build(&filtered, ChartType::Bar);
    let Marks::Bars { bars, y, .. } = &spec.marks else {
        panic!("expected bars, got {:?}", spec.marks);
    };
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].value, 8);
    assert_eq!(y.domain, (0.0, 8.0));
    assert!((bars[0].height - spec.layout.inner_height()).abs() < 1e-9);
}
