//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change a default path or threshold, only edit this file.

/// Default dataset location, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "data/datos_generacion.csv";

/// Default reconstruction model (ONNX export of the autoencoder)
pub const DEFAULT_MODEL_PATH: &str = "docs/autoencoder_modelo.onnx";

/// Dataset delimiter
pub const DEFAULT_DELIMITER: u8 = b';';

/// Timestamp column name
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "Fecha";

/// Target column, excluded from features
pub const DEFAULT_TARGET_COLUMN: &str = "total energia generada";

/// Binary anomaly threshold (error > threshold => anomaly)
pub const DEFAULT_BINARY_THRESHOLD: f64 = 0.0211;

/// Severity scale: error < low => Normal
pub const DEFAULT_SEVERITY_LOW: f64 = 0.015;

/// Severity scale: error >= high => Anomaly
pub const DEFAULT_SEVERITY_HIGH: f64 = 0.025;

/// Pause between readings (milliseconds)
pub const DEFAULT_PACING_MS: u64 = 300;

/// Decimal places used by the anomalies table
pub const ANOMALY_TABLE_DECIMALS: i32 = 5;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Steam Monitor";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Get dataset path from environment or use default
pub fn get_data_path() -> String {
    env_or("STEAM_DATA_PATH", DEFAULT_DATA_PATH)
}

/// Get model path from environment or use default
pub fn get_model_path() -> String {
    env_or("STEAM_MODEL_PATH", DEFAULT_MODEL_PATH)
}

/// Get history directory from environment, if set
pub fn get_history_dir() -> Option<String> {
    std::env::var("STEAM_HISTORY_DIR").ok()
}

pub fn get_binary_threshold() -> f64 {
    env_parse("STEAM_BINARY_THRESHOLD", DEFAULT_BINARY_THRESHOLD)
}

pub fn get_severity_low() -> f64 {
    env_parse("STEAM_SEVERITY_LOW", DEFAULT_SEVERITY_LOW)
}

pub fn get_severity_high() -> f64 {
    env_parse("STEAM_SEVERITY_HIGH", DEFAULT_SEVERITY_HIGH)
}

/// Get pacing interval (ms) from environment or use default
pub fn get_pacing_ms() -> u64 {
    env_parse("STEAM_PACING_MS", DEFAULT_PACING_MS)
}

/// Get dataset text encoding name (`latin1` or `utf8`)
pub fn get_encoding() -> String {
    env_or("STEAM_ENCODING", "latin1")
}
