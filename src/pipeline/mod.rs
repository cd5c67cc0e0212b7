// Record cleaning pipeline: chunked reading, normalization, classification, output

pub mod accumulator;
pub mod chunk_reader;
pub mod duplicates;
pub mod normalize;
pub mod runner;
pub mod transform;
pub mod writer;

// Re-export the entry points
pub use accumulator::ResultSets;
pub use runner::{ChunkFailure, OutputPaths, RecordValidationPipeline, RunSummary};
pub use transform::{ChunkOutcome, RecordCleaner, RowOutcome};
