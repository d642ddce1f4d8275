//! Dataset Module - Sensor Log Ingestion
//!
//! Turns the locale-specific generation log (Spanish month tokens, decimal
//! commas, Latin-1 text) into ordered `Reading`s plus a feature layout.

pub mod dates;
pub mod numeric;
pub mod record;
pub mod loader;

#[cfg(test)]
mod tests;

pub use loader::{DatasetLoader, LoadedDataset, LoaderConfig, TextEncoding};
pub use numeric::parse_or_invalid;
pub use record::{LoadReport, Reading};
