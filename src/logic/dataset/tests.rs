use super::loader::{DatasetLoader, LoaderConfig, TextEncoding};
use super::dates::parse_timestamp;
use crate::logic::error::PipelineError;
use std::fs;
use tempfile::tempdir;

const HEADER: &str = "Fecha;presion caldera;temp vapor;total energia generada;caudal";

fn csv_of(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

#[test]
fn test_load_excludes_timestamp_and_target() {
    let data = csv_of(&[
        "01-ene-23 00:00:00;10,5;200;1500,2;3",
        "01-ene-23 00:10:00;11,0;210;1510,0;4",
    ]);

    let loaded = DatasetLoader::default().load_reader(data.as_bytes()).unwrap();

    assert_eq!(loaded.layout.names(), &["presion caldera", "temp vapor", "caudal"]);
    assert_eq!(loaded.readings.len(), 2);
    assert_eq!(loaded.readings[0].raw_features, vec![10.5, 200.0, 3.0]);
    assert_eq!(loaded.readings[1].raw_features, vec![11.0, 210.0, 4.0]);
    assert_eq!(loaded.report.rows_dropped, 0);
    assert_eq!(loaded.report.feature_count, 3);
}

#[test]
fn test_row_with_invalid_cell_is_dropped() {
    let rows = [
        "01-feb-23 00:00:00;10,5;200;1500;3",
        "01-feb-23 00:10:00;abc;210;1510;4",
        "01-feb-23 00:20:00;12,25;220;1520;5",
    ];
    let reference = DatasetLoader::default()
        .load_reader(csv_of(&[rows[0], rows[2]]).as_bytes())
        .unwrap();
    let loaded = DatasetLoader::default()
        .load_reader(csv_of(&rows).as_bytes())
        .unwrap();

    assert_eq!(loaded.readings.len(), rows.len() - 1);
    assert_eq!(loaded.report.rows_read, 3);
    assert_eq!(loaded.report.rows_dropped, 1);
    assert_eq!(loaded.report.rows_kept(), 2);
    assert_eq!(loaded.readings, reference.readings);
    assert_eq!(
        loaded.readings[1].timestamp,
        parse_timestamp("01-feb-23 00:20:00").unwrap()
    );
}

#[test]
fn test_invalid_target_also_drops_row() {
    let data = csv_of(&[
        "01-mar-23 00:00:00;1;2;n/d;3",
        "01-mar-23 00:10:00;1;2;5,5;3",
    ]);

    let loaded = DatasetLoader::default().load_reader(data.as_bytes()).unwrap();
    assert_eq!(loaded.readings.len(), 1);
    assert_eq!(loaded.report.rows_dropped, 1);
}

#[test]
fn test_bad_timestamp_aborts_load() {
    let data = csv_of(&[
        "01-abr-23 00:00:00;1;2;3;4",
        "32-xyz-23 00:00:00;1;2;3;4",
    ]);

    let err = DatasetLoader::default().load_reader(data.as_bytes()).unwrap_err();
    match err {
        PipelineError::Parse { row, value } => {
            assert_eq!(row, 2);
            assert_eq!(value, "32-xyz-23 00:00:00");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_bad_timestamp_is_fatal_even_when_row_would_be_dropped() {
    let data = csv_of(&["99-may-23 00:00:00;abc;2;3;4"]);
    let err = DatasetLoader::default().load_reader(data.as_bytes()).unwrap_err();
    assert!(err.is_malformed());
}

#[test]
fn test_empty_timestamp_counts_as_missing() {
    let data = csv_of(&[
        ";1;2;3;4",
        "01-jun-23 00:00:00;1;2;3;4",
    ]);

    let loaded = DatasetLoader::default().load_reader(data.as_bytes()).unwrap();
    assert_eq!(loaded.readings.len(), 1);
    assert_eq!(loaded.report.rows_dropped, 1);
}

#[test]
fn test_all_rows_dropped_is_empty_not_error() {
    let data = csv_of(&["01-jul-23 00:00:00;x;2;3;4"]);
    let loaded = DatasetLoader::default().load_reader(data.as_bytes()).unwrap();
    assert!(loaded.readings.is_empty());
    assert_eq!(loaded.layout.len(), 3);
}

#[test]
fn test_missing_columns() {
    let data = "Fecha;a;b\n01-ago-23 00:00:00;1;2\n";
    let err = DatasetLoader::default().load_reader(data.as_bytes()).unwrap_err();
    assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "total energia generada"));
}

#[test]
fn test_short_row_is_dropped() {
    let data = csv_of(&[
        "01-sep-23 00:00:00;1;2;3;4",
        "01-sep-23 00:10:00;1;2;3",
        "01-sep-23 00:20:00;5;6;7;8",
    ]);

    let loaded = DatasetLoader::default().load_reader(data.as_bytes()).unwrap();
    assert_eq!(loaded.readings.len(), 2);
    assert_eq!(loaded.report.rows_read, 3);
    assert_eq!(loaded.report.rows_dropped, 1);
    assert_eq!(loaded.readings[1].raw_features, vec![5.0, 6.0, 8.0]);
}

#[test]
fn test_short_row_without_timestamp_cell_is_dropped() {
    let data = "a;total energia generada;Fecha\n\
        1;2;01-sep-23 00:00:00\n\
        1;2\n\
        3;4;01-sep-23 00:20:00\n";

    let loaded = DatasetLoader::default().load_reader(data.as_bytes()).unwrap();
    assert_eq!(loaded.readings.len(), 2);
    assert_eq!(loaded.report.rows_dropped, 1);
}

#[test]
fn test_latin1_header_is_decoded() {
    // "presión" in ISO-8859-1: 0xF3 for 'ó'
    let mut bytes = b"Fecha;presi\xf3n;total energia generada\n".to_vec();
    bytes.extend_from_slice(b"01-oct-23 00:00:00;1,5;2\n");

    let loaded = DatasetLoader::default().load_reader(bytes.as_slice()).unwrap();
    assert_eq!(loaded.layout.names(), &["presión"]);
    assert_eq!(loaded.readings[0].raw_features, vec![1.5]);
}

#[test]
fn test_utf8_encoding_option() {
    let config = LoaderConfig {
        encoding: TextEncoding::Utf8,
        ..Default::default()
    };
    let data = "Fecha;presión;total energia generada\n01-nov-23 00:00:00;1;2\n";

    let loaded = DatasetLoader::new(config).load_reader(data.as_bytes()).unwrap();
    assert_eq!(loaded.layout.names(), &["presión"]);
}

#[test]
fn test_missing_file_is_configuration_error() {
    let dir = tempdir().unwrap();
    let err = DatasetLoader::default()
        .load_path(&dir.path().join("nope.csv"))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Configuration(_)));
    assert!(err.is_missing_file());
}

#[test]
fn test_load_path_reads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.csv");
    fs::write(&path, csv_of(&["15-dic-23 08:30:00;1;2;3;4"])).unwrap();

    let loaded = DatasetLoader::default().load_path(&path).unwrap();
    assert_eq!(loaded.readings.len(), 1);
}

#[test]
fn test_encoding_names() {
    assert_eq!(TextEncoding::from_name("Latin-1"), Some(TextEncoding::Latin1));
    assert_eq!(TextEncoding::from_name("utf8"), Some(TextEncoding::Utf8));
    assert_eq!(TextEncoding::from_name("cp1252"), None);
}
