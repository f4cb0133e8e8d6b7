//! Registration store: the concurrent map behind every container.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{DiError, DiResult};
use crate::registration::ConstructionRecord;
use crate::{ServiceKey, TypeToken};

/// Duplicate-rejecting map from service key to record.
///
/// Guards are never held past a single call, so user code (factories,
/// disposers) never runs while a shard is locked.
pub(crate) struct RegistrationStore {
    records: DashMap<ServiceKey, Arc<ConstructionRecord>, ahash::RandomState>,
    sequence: AtomicU64,
}

impl RegistrationStore {
    pub(crate) fn new() -> Self {
        Self {
            records: DashMap::with_hasher(ahash::RandomState::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Registration order stamp for the next record.
    pub(crate) fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Inserts `record`, failing if its key is taken.
    pub(crate) fn insert(&self, record: Arc<ConstructionRecord>) -> DiResult<Arc<ConstructionRecord>> {
        match self.records.entry(record.service.clone()) {
            Entry::Occupied(occupied) => Err(DiError::DuplicateRegistration(occupied.key().to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
                Ok(record)
            }
        }
    }

    /// Inserts `record` unless its key is taken; returns the stored record
    /// and whether it is the one passed in.
    pub(crate) fn insert_or_get(&self, record: Arc<ConstructionRecord>) -> (Arc<ConstructionRecord>, bool) {
        match self.records.entry(record.service.clone()) {
            Entry::Occupied(occupied) => (occupied.get().clone(), false),
            Entry::Vacant(vacant) => {
                vacant.insert(record.clone());
                (record, true)
            }
        }
    }

    pub(crate) fn get(&self, service: &ServiceKey) -> Option<Arc<ConstructionRecord>> {
        self.records.get(service).map(|entry| entry.value().clone())
    }

    pub(crate) fn contains(&self, service: &ServiceKey) -> bool {
        self.records.contains_key(service)
    }

    pub(crate) fn remove(&self, service: &ServiceKey) -> DiResult<Arc<ConstructionRecord>> {
        self.records
            .remove(service)
            .map(|(_, record)| record)
            .ok_or_else(|| DiError::NotFound(service.to_string()))
    }

    /// Removes every record and returns them in registration order.
    pub(crate) fn remove_all(&self) -> Vec<Arc<ConstructionRecord>> {
        let keys: Vec<ServiceKey> = self.records.iter().map(|entry| entry.key().clone()).collect();
        let mut removed: Vec<Arc<ConstructionRecord>> = keys
            .iter()
            .filter_map(|key| self.records.remove(key).map(|(_, record)| record))
            .collect();
        removed.sort_by_key(|record| record.sequence);
        removed
    }

    /// All records in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<ConstructionRecord>> {
        let mut records: Vec<Arc<ConstructionRecord>> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    /// Records of `identity` under any key, in registration order.
    pub(crate) fn records_for(&self, identity: &TypeToken) -> Vec<Arc<ConstructionRecord>> {
        let mut records: Vec<Arc<ConstructionRecord>> = self
            .records
            .iter()
            .filter(|entry| entry.key().identity() == identity)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|record| record.sequence);
        records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}
