//! Loading geometry from local files.

use std::fs;

use tempfile::TempDir;
use twmap_geo::{GeometryError, GeometryResolver, GeometrySource, NameField};
use twmap_ingest::{Fetcher, SourceLocation};

const COUNTIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        { "type": "Feature", "properties": { "name": "台南市" },
          "geometry": { "type": "Polygon", "coordinates": [[[120.1, 23.0], [120.3, 23.0], [120.3, 23.2]]] } },
        { "type": "Feature", "properties": { "name": "嘉義縣" },
          "geometry": { "type": "Polygon", "coordinates": [[[120.3, 23.4], [120.6, 23.4], [120.6, 23.6]]] } }
    ]
}"#;

fn source(dir: &TempDir, file: &str) -> GeometrySource {
    GeometrySource::new(SourceLocation::Path(dir.path().join(file)))
        .with_name(NameField::Property("name".to_string()))
}

#[tokio::test]
async fn test_load_feature_collection() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("counties.geojson"), COUNTIES).unwrap();

    let mut resolver = GeometryResolver::new(Fetcher::new().unwrap());
    let geometries = resolver
        .load_geometry(&source(&dir, "counties.geojson"))
        .await
        .unwrap();

    assert_eq!(geometries.len(), 2);
    let adapter = NameField::Property("name".to_string()).adapter();
    assert_eq!(adapter.display_name(&geometries[0]).as_deref(), Some("台南市"));
}

#[tokio::test]
async fn test_error_page_fails_fast() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("taiwan.json"),
        "<html><head><title>502 Bad Gateway</title></head></html>",
    )
    .unwrap();

    let mut resolver = GeometryResolver::new(Fetcher::new().unwrap());
    let result = resolver.load_geometry(&source(&dir, "taiwan.json")).await;
    assert!(matches!(result, Err(GeometryError::NotJson { .. })));
    assert_eq!(resolver.cached(), 0);
}

#[tokio::test]
async fn test_missing_file_is_transport_failure() {
    let dir = TempDir::new().unwrap();
    let mut resolver = GeometryResolver::new(Fetcher::new().unwrap());
    let error = resolver
        .load_geometry(&source(&dir, "absent.json"))
        .await
        .unwrap_err();
    assert!(error.is_transport());
}

#[tokio::test]
async fn test_text_file_rejected_by_content_type() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("taiwan.csv"), "縣市,值\n").unwrap();

    let mut resolver = GeometryResolver::new(Fetcher::new().unwrap());
    let result = resolver.load_geometry(&source(&dir, "taiwan.csv")).await;
    assert!(matches!(result, Err(GeometryError::ContentType { .. })));
}
