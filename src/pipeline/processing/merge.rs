//! Merge engine: fold per-source records into one canonical profile per
//! identifier.
//!
//! Each source writes only its own fields, so the result does not depend on
//! the order sources are merged in. Profiles are kept in discovery order.

use std::collections::HashMap;
use tracing::debug;

use crate::domain::CanonicalUserProfile;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::SourceRecords;

/// Accumulates profiles while sources are merged in.
#[derive(Debug, Default)]
pub struct ProfileMerger {
    profiles: Vec<CanonicalUserProfile>,
    /// Lookup index from identifier to position in `profiles`
    index: HashMap<String, usize>,
}

impl ProfileMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one source's records. The first mention of an identifier creates
    /// its profile; later mentions only set the contributing source's fields.
    pub fn merge_source(&mut self, records: &SourceRecords) {
        let before = self.profiles.len();

        for (identifier, record) in records.iter() {
            let position = match self.index.get(identifier) {
                Some(&position) => position,
                None => {
                    self.profiles.push(CanonicalUserProfile::new(identifier));
                    self.index.insert(identifier.to_string(), self.profiles.len() - 1);
                    self.profiles.len() - 1
                }
            };
            self.profiles[position].apply(record);
        }

        let created = self.profiles.len() - before;
        metrics::merge::profiles_created(created);
        debug!(
            source = %records.source(),
            records = records.len(),
            created,
            "Merged source into profiles"
        );
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Finish merging. The returned profiles are not modified afterwards.
    pub fn finish(self) -> Vec<CanonicalUserProfile> {
        self.profiles
    }
}

/// Merge sources in the order given and return profiles in discovery order.
pub fn merge_sources<'a, I>(sources: I) -> Vec<CanonicalUserProfile>
where
    I: IntoIterator<Item = &'a SourceRecords>,
{
    let mut merger = ProfileMerger::new();
    for records in sources {
        merger.merge_source(records);
    }
    merger.finish()
}
