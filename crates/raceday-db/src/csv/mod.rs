//! CSV exchange with spreadsheet tools.
//!
//! - [`import`]: payment-status updates for registrations or shop orders
//! - [`export`]: one event's registrations
//! - [`dialect`]: the `csv` reader and writer settings both sides share

pub mod dialect;
pub mod export;
pub mod import;

pub use dialect::split_line;
pub use export::{CSV_CONTENT_TYPE, export_filename};
pub use import::{HeaderLayout, ImportTarget, detect_layout};
