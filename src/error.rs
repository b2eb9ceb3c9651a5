//! Report-level error taxonomy.
//!
//! `ReportError` is the closed set a caller of [`crate::report::ReportBuilder`]
//! can observe. Per-image failures ([`crate::fetch::FetchError`],
//! [`crate::embed::EmbedError`]) are absorbed inside the builder and never
//! surface here; a degraded report with placeholder lines is preferred over
//! a failed report.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    /// The PDF document or its builtin fonts could not be initialised.
    /// Fatal; no partial output.
    #[error("Failed to initialise report document: {0}")]
    DocumentCreation(String),

    /// Drawing non-image content failed. Header and section structure are
    /// mandatory, so this aborts the build.
    #[error("Failed to render report content: {0}")]
    ContentRender(String),

    /// The finished in-memory document could not be encoded to bytes.
    #[error("Failed to serialise report document: {0}")]
    Serialization(String),

    /// Catch-all wrapper so callers always see one of a small closed set.
    #[error("Report generation failed: {0}")]
    Unexpected(String),
}
