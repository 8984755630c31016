//! Full session runs over on-disk fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;
use twmap_core::{
    ColorKey, Dimension, FilterSelection, JsonSink, PipelineConfig, PipelineError, Session,
    SourceReport,
};

/// Three counties, one ring each. Names use the `台` variant glyph.
const TOPOLOGY: &str = r#"{
    "type": "Topology",
    "arcs": [
        [[121.5, 25.0], [121.6, 25.0], [121.6, 25.1], [121.5, 25.0]],
        [[120.6, 24.1], [120.7, 24.1], [120.7, 24.2], [120.6, 24.1]],
        [[119.9, 26.1], [120.0, 26.1], [120.0, 26.2], [119.9, 26.1]]
    ],
    "objects": { "layer1": { "type": "GeometryCollection", "geometries": [
        { "type": "Polygon", "arcs": [[0]], "properties": { "COUNTYNAME": "台北市" } },
        { "type": "Polygon", "arcs": [[1]], "properties": { "COUNTYNAME": "台中市" } },
        { "type": "Polygon", "arcs": [[2]], "properties": { "COUNTYNAME": "連江縣" } }
    ] } }
}"#;

/// Drug-case records with the descriptive label row under the header.
const DRUG_CASES: &str = "\
oc_addr,kind
發生地點,毒品品項
台北市中正區,大麻
臺北市大安區,安非他命
台中市西屯區,大麻
,大麻
";

const SMOKING: &str = "\
縣市,94年男性吸菸率,94年女性吸菸率,96年男性吸菸率,96年女性吸菸率,98年男性吸菸率,98年女性吸菸率
成人,,,,,,
總計,40.1%,4.5%,38.0%,4.1%,35.4%,4.0%
台北市,30.1%,4.2%,28.0%,3.9%,25.5%,3.1%
台中市,40.0%,8.0%,-,-,35.2%,6.6%
";

const DRUG_CONFIG: &str = r#"
[normalize]
granularity = { chars = 3 }

[geometry]
location = "taiwan.json"
object = "layer1"
name = { property = "COUNTYNAME" }

[aggregate]
reducer = "count"

[[sources]]
name = "drug_data{n}"
location = "drug_data{n}.csv"
count = 4
[sources.shape]
kind = "long"
region = ["oc_addr", "發生地點"]
dimensions = { kind = ["kind", "毒品品項"] }
rollup = { dimension = "kind", label = "全部" }
[[sources.rules]]
kind = "header_echo"
column = "oc_addr"
token = "發生地點"
"#;

const SMOKING_CONFIG: &str = r#"
[normalize]
granularity = { chars = 3 }

[geometry]
location = "taiwan.json"

[aggregate]
reducer = "mean"
calibration_free = ["year"]

[color]
scale = { thresholds = [10, 20, 30] }

[[sources]]
name = "smoking"
location = "smoking.csv"
section_dimension = "segment"
[sources.shape]
kind = "wide"
region = "縣市"
measure = "吸菸率"
strata = [{ token = "男", gender = "male" }, { token = "女", gender = "female" }]
[[sources.rules]]
kind = "aggregate"
column = "縣市"
values = ["總計"]
[[sources.rules]]
kind = "section"
column = "縣市"
values = ["成人"]
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Drug family of `members` files with the third member missing.
fn drug_family(members: usize) -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "taiwan.json", TOPOLOGY);
    for n in (1..=members).filter(|&n| n != 3) {
        write(dir.path(), &format!("drug_data{n}.csv"), DRUG_CASES);
    }
    let contents = DRUG_CONFIG.replace("count = 4", &format!("count = {members}"));
    let config = write(dir.path(), "twmap.toml", &contents);
    let config = PipelineConfig::from_path(&config).unwrap();
    (dir, config)
}

fn drug_fixture() -> (TempDir, PipelineConfig) {
    drug_family(4)
}

fn all_kinds() -> FilterSelection {
    FilterSelection::default().with(Dimension::Kind, "全部")
}

#[tokio::test]
async fn test_missing_source_still_reaches_ready() {
    let (_dir, config) = drug_family(16);
    let mut session = Session::new(config).unwrap();
    let settled = AtomicUsize::new(0);

    session
        .load_with_progress(&|_: &SourceReport| {
            settled.fetch_add(1, Ordering::Relaxed);
        })
        .await
        .unwrap();

    assert!(session.state().is_ready());
    assert_eq!(settled.load(Ordering::Relaxed), 16);
    let dataset = session.dataset().unwrap();
    let failed: Vec<&str> = dataset
        .sources
        .iter()
        .filter(|s| !s.is_loaded())
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(failed, vec!["drug_data3"]);

    let loaded: Vec<_> = dataset.sources.iter().filter(|s| s.is_loaded()).collect();
    assert_eq!(loaded.len(), 15);
    // three records per file, each with its roll-up
    assert!(loaded.iter().all(|s| s.observations == 3 * 2 && s.skipped == 1));
    assert_eq!(dataset.observations.len(), 15 * 3 * 2);

    let frame = session.on_filter_changed(&all_kinds()).unwrap();
    let values: Vec<Option<f64>> = frame.features.iter().map(|f| f.value).collect();
    assert_eq!(values, vec![Some(30.0), Some(15.0), None]);
}

#[tokio::test]
async fn test_render_frame_snapshot() {
    let (_dir, config) = drug_fixture();
    let mut session = Session::new(config).unwrap();
    session.load().await.unwrap();

    assert_eq!(session.default_selection().unwrap(), Some(all_kinds()));
    let frame = session.on_filter_changed(&all_kinds()).unwrap();
    insta::assert_snapshot!(serde_json::to_string_pretty(&frame).unwrap(), @r#"
    {
      "selection": {
        "kind": "全部"
      },
      "domain": {
        "min": 0.0,
        "max": 6.0
      },
      "summary": {
        "regions": 2,
        "total": 9.0,
        "mean": 4.5,
        "max": 6.0
      },
      "features": [
        {
          "index": 0,
          "name": "台北市",
          "region": "臺北市",
          "value": 6.0,
          "color": {
            "type": "ramp",
            "value": 1.0
          }
        },
        {
          "index": 1,
          "name": "台中市",
          "region": "臺中市",
          "value": 3.0,
          "color": {
            "type": "ramp",
            "value": 0.5
          }
        },
        {
          "index": 2,
          "name": "連江縣",
          "region": "連江縣",
          "value": null,
          "color": {
            "type": "no_data"
          }
        }
      ]
    }
    "#);
}

#[tokio::test]
async fn test_repeated_filter_changes_are_stable() {
    let (_dir, config) = drug_fixture();
    let mut session = Session::new(config).unwrap();
    session.load().await.unwrap();

    let cannabis = FilterSelection::default().with(Dimension::Kind, "大麻");
    let first = serde_json::to_value(session.on_filter_changed(&cannabis).unwrap()).unwrap();
    session.on_filter_changed(&all_kinds()).unwrap();
    let again = serde_json::to_value(session.on_filter_changed(&cannabis).unwrap()).unwrap();
    assert_eq!(first, again);
    assert_eq!(first["features"][0]["value"], 3.0);
}

#[tokio::test]
async fn test_render_into_json_sink() {
    let (_dir, config) = drug_fixture();
    let mut session = Session::new(config).unwrap();
    session.load().await.unwrap();

    let mut sink = JsonSink::new(Vec::new());
    session.render_into(&all_kinds(), &mut sink).unwrap();
    let cannabis = FilterSelection::default().with(Dimension::Kind, "大麻");
    session.render_into(&cannabis, &mut sink).unwrap();
    let heroin = FilterSelection::default().with(Dimension::Kind, "海洛因");
    assert!(matches!(
        session.render_into(&heroin, &mut sink),
        Err(PipelineError::UnrecognizedFilterCombination { .. })
    ));

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let frames: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["features"][0]["value"], 6.0);
    assert_eq!(frames[1]["selection"]["kind"], "大麻");
    assert_eq!(frames[1]["features"][0]["value"], 3.0);
}

#[tokio::test]
async fn test_unrecognized_selection_is_rejected() {
    let (_dir, config) = drug_fixture();
    let mut session = Session::new(config).unwrap();
    session.load().await.unwrap();

    let heroin = FilterSelection::default().with(Dimension::Kind, "海洛因");
    let err = session.on_filter_changed(&heroin).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::UnrecognizedFilterCombination { ref selection } if *selection == heroin
    ));
    assert!(session.state().is_ready());
}

#[tokio::test]
async fn test_geometry_failure_is_fatal() {
    let (dir, config) = drug_fixture();
    write(dir.path(), "taiwan.json", "<html>Service Unavailable</html>");
    let mut session = Session::new(config).unwrap();

    let err = session.load().await.unwrap_err();
    assert!(matches!(err, PipelineError::MalformedGeometryPayload(_)));
    assert_eq!(session.state().name(), "uninitialized");
    assert!(matches!(
        session.on_filter_changed(&all_kinds()),
        Err(PipelineError::NotReady { .. })
    ));
}

#[tokio::test]
async fn test_pivot_summary() {
    let (dir, config) = drug_fixture();
    let mut session = Session::new(config).unwrap();
    session.load().await.unwrap();

    let pivot = session
        .pivot(&FilterSelection::default(), Dimension::Kind)
        .unwrap();
    assert_eq!(pivot.options, vec!["全部", "大麻", "安非他命"]);

    let output = dir.path().join("drug_stats.json");
    pivot.write_json(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["data"]["臺北市"]["全部"], 6);
    assert_eq!(json["data"]["臺北市"]["安非他命"], 3);
    assert_eq!(json["data"]["臺中市"]["大麻"], 3);
}

#[tokio::test]
async fn test_mean_over_wide_source_holds_domain_across_years() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "taiwan.json", TOPOLOGY);
    write(dir.path(), "smoking.csv", SMOKING);
    let config = write(dir.path(), "twmap.toml", SMOKING_CONFIG);
    let mut session = Session::new(PipelineConfig::from_path(&config).unwrap()).unwrap();
    session.load().await.unwrap();

    let male = |year: &str| {
        FilterSelection::default()
            .with(Dimension::Segment, "成人")
            .with(Dimension::Year, year)
            .with(Dimension::Gender, "male")
    };
    let frame_96 = session.on_filter_changed(&male("96")).unwrap();
    let frame_98 = session.on_filter_changed(&male("98")).unwrap();

    assert_eq!(frame_96.domain, frame_98.domain);
    assert!((frame_96.domain.max - (40.0 + 28.0 + 35.2) / 3.0).abs() < 1e-9);
    assert_eq!(frame_96.features[0].value, Some(28.0));
    assert_eq!(frame_96.features[0].color, ColorKey::Class(2));
    assert_eq!(frame_96.features[1].value, None);
    assert_eq!(frame_96.features[1].color, ColorKey::NoData);
    assert_eq!(frame_98.features[1].value, Some(35.2));
    assert_eq!(frame_98.features[1].color, ColorKey::Class(3));

    let catalog = session.catalog().unwrap();
    assert_eq!(catalog.values(Dimension::Year), ["98", "96", "94"]);
}
