//! Single-page PDF report builder for AI-assisted cancer screening.
//!
//! Consumes an already-fetched clinical/AI result record plus two remote
//! image URLs and produces the finished report bytes, degrading gracefully
//! when an image cannot be fetched or decoded. See [`report::ReportBuilder`].

pub mod embed;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod models;
pub mod report;
pub mod sanitize;

pub use error::ReportError;
pub use models::ReportRequest;
pub use report::{export_report_to_file, ReportBuilder};
