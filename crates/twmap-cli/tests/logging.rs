//! Subscriber setup writing JSON lines to a log file.

use tracing::level_filters::LevelFilter;
use twmap_cli::logging::{LogConfig, LogFormat, init_logging};

#[test]
fn test_json_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twmap.log");
    let config = LogConfig {
        level_filter: LevelFilter::INFO,
        use_env_filter: false,
        format: LogFormat::Json,
        log_file: Some(path.clone()),
        ..LogConfig::default()
    };
    init_logging(&config).unwrap();

    tracing::info!(target: "twmap_core", observations = 18, "load complete");
    tracing::debug!(target: "twmap_core", "filtered out");
    tracing::info!(target: "hyper", "filtered out");

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["fields"]["message"], "load complete");
    assert_eq!(lines[0]["fields"]["observations"], 18);

    // a second subscriber is refused rather than panicking
    assert!(init_logging(&LogConfig::default()).is_err());
}
