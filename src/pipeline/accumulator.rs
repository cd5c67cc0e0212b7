use crate::pipeline::duplicates::{find_duplicates, DuplicateReport};
use crate::pipeline::transform::ChunkOutcome;
use crate::types::NormalizedRecord;

/// Clean and garbage rows gathered across chunks.
///
/// Append-only: a run owns one of these and only grows it chunk by chunk,
/// so chunk order and in-chunk row order are preserved.
#[derive(Debug, Default)]
pub struct ResultSets {
    clean: Vec<NormalizedRecord>,
    garbage: Vec<NormalizedRecord>,
}

impl ResultSets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk's partitions
    pub fn absorb(&mut self, outcome: ChunkOutcome) {
        self.clean.extend(outcome.clean);
        self.garbage.extend(outcome.garbage);
    }

    pub fn clean(&self) -> &[NormalizedRecord] {
        &self.clean
    }

    pub fn garbage(&self) -> &[NormalizedRecord] {
        &self.garbage
    }

    /// Rows of the clean set that have at least one identical sibling
    pub fn duplicates(&self) -> DuplicateReport<'_> {
        find_duplicates(&self.clean)
    }
}
