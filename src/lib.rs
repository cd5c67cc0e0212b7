//! Chunked cleaning and validation of user record exports.
//!
//! A delimited export is read in bounded chunks, normalized onto a fixed
//! eight-field schema, filtered and validated, and split into clean, garbage
//! and duplicate outputs. See [`pipeline::RecordValidationPipeline`].

pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod split;
pub mod types;
pub mod validators;

// Re-export commonly used types
pub use config::{CleanerConfig, InvalidEmailPolicy};
pub use error::{CleanerError, Result};
pub use pipeline::{RecordValidationPipeline, RunSummary};
pub use types::{CanonicalField, FieldValue, NormalizedRecord, RecordClass, ValidationFlags};
