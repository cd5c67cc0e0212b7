//! Group-based duplicate detection.
//!
//! Every member of a group of identical records is reported, not just the
//! second and later occurrences. Records are keyed by a SHA-256 fingerprint
//! of their eight fields so large clean sets do not need a second copy of
//! every row in the index.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use crate::types::NormalizedRecord;

/// Identical records found in a set.
#[derive(Debug)]
pub struct DuplicateReport<'a> {
    /// Duplicated records in their original order
    pub records: Vec<&'a NormalizedRecord>,
    /// Hex fingerprint and size of each duplicated group, in order of first
    /// occurrence
    pub groups: Vec<(String, usize)>,
}

impl DuplicateReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// SHA-256 over every field's kind and identity text.
fn digest(record: &NormalizedRecord) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for value in record.values() {
        let text = value.identity_text();
        hasher.update([value.kind_tag()]);
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    hasher.finalize().into()
}

pub fn find_duplicates(records: &[NormalizedRecord]) -> DuplicateReport<'_> {
    let digests: Vec<[u8; 32]> = records.iter().map(digest).collect();

    let mut counts: HashMap<[u8; 32], usize> = HashMap::with_capacity(digests.len());
    for d in &digests {
        *counts.entry(*d).or_insert(0) += 1;
    }

    let mut records_out = Vec::new();
    let mut groups = Vec::new();
    let mut seen: HashSet<[u8; 32]> = HashSet::new();
    for (record, d) in records.iter().zip(&digests) {
        let count = counts.get(d).copied().unwrap_or(0);
        if count > 1 {
            records_out.push(record);
            if seen.insert(*d) {
                groups.push((hex::encode(d), count));
            }
        }
    }

    DuplicateReport {
        records: records_out,
        groups,
    }
}
