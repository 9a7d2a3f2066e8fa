//! Metadata Store - Record Attributes and Lifecycle
//!
//! `TigerStyle`: The trait is the contract; the in-memory impl is the
//! always-available reference used by tests and development.
//!
//! Namespace isolation is exact-match: queries scoped to `user/alice` never
//! observe `user/alice/work` records.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::error::{StorageError, StorageResult};
use super::filter::SearchFilter;
use super::record::{MemoryRecord, MemoryType};
use crate::dst::FaultInjector;
use crate::namespace::Namespace;

// =============================================================================
// MetadataStore Trait
// =============================================================================

/// Persistence contract for memory record attributes.
///
/// `save` is an upsert keyed by record id. Batch forms are all-or-nothing
/// per call for the in-memory impl; production backends may weaken that to
/// per-item, but must never partially apply a single record.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert or replace one record.
    async fn save(&self, record: &MemoryRecord) -> StorageResult<()>;

    /// Insert or replace many records.
    async fn save_all(&self, records: &[MemoryRecord]) -> StorageResult<()>;

    /// Fetch one record by id.
    async fn find_by_id(&self, id: &str) -> StorageResult<Option<MemoryRecord>>;

    /// Fetch many records by id. Unknown ids are skipped, order follows `ids`.
    async fn find_by_ids(&self, ids: &[String]) -> StorageResult<Vec<MemoryRecord>>;

    /// All records in exactly this namespace.
    async fn find_by_namespace(&self, namespace: &Namespace) -> StorageResult<Vec<MemoryRecord>>;

    /// Records in exactly this namespace that satisfy the filter.
    async fn find_by_namespace_with_filter(
        &self,
        namespace: &Namespace,
        filter: &SearchFilter,
    ) -> StorageResult<Vec<MemoryRecord>>;

    /// Delete one record. Returns whether it existed.
    async fn delete(&self, id: &str) -> StorageResult<bool>;

    /// Delete every record in exactly this namespace. Returns the count.
    async fn delete_by_namespace(&self, namespace: &Namespace) -> StorageResult<usize>;

    /// Records in this namespace whose decay factor is below the threshold.
    async fn find_decayed(
        &self,
        namespace: &Namespace,
        threshold: f64,
    ) -> StorageResult<Vec<MemoryRecord>>;

    /// Bump access count and refresh the access timestamp for each id.
    /// Unknown ids are ignored.
    async fn record_access(&self, ids: &[String]) -> StorageResult<()>;

    /// Set the stored decay factor for one record. Idempotent.
    async fn update_decay_factor(&self, id: &str, decay_factor: f64) -> StorageResult<()>;

    /// Batch form of [`Self::update_decay_factor`]; `ids` and `factors`
    /// correspond positionally.
    async fn update_decay_factors(&self, ids: &[String], factors: &[f64]) -> StorageResult<()>;

    /// Number of records in exactly this namespace.
    async fn count(&self, namespace: &Namespace) -> StorageResult<usize>;

    /// Number of records of the given type in exactly this namespace.
    async fn count_by_type(
        &self,
        namespace: &Namespace,
        memory_type: MemoryType,
    ) -> StorageResult<usize>;
}

// =============================================================================
// InMemoryMetadataStore
// =============================================================================

/// In-process reference implementation over a `RwLock`ed map.
///
/// Fault-injectable for DST; without an injector every operation succeeds.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<String, MemoryRecord>>,
    faults: Option<Arc<FaultInjector>>,
}

impl InMemoryMetadataStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with fault injection.
    #[must_use]
    pub fn with_faults(faults: Arc<FaultInjector>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            faults: Some(faults),
        }
    }

    fn check_fault(&self, operation: &str) -> StorageResult<()> {
        if let Some(faults) = &self.faults {
            if let Some(fault) = faults.should_inject(operation) {
                return Err(StorageError::simulated_fault(fault.as_str()));
            }
        }
        Ok(())
    }

    fn read_guard(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .read()
            .map_err(|_| StorageError::internal("metadata lock poisoned"))
    }

    fn write_guard(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, HashMap<String, MemoryRecord>>> {
        self.records
            .write()
            .map_err(|_| StorageError::internal("metadata lock poisoned"))
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn save(&self, record: &MemoryRecord) -> StorageResult<()> {
        self.check_fault("metadata_save")?;
        self.write_guard()?
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn save_all(&self, records: &[MemoryRecord]) -> StorageResult<()> {
        self.check_fault("metadata_save_all")?;
        let mut guard = self.write_guard()?;
        for record in records {
            guard.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> StorageResult<Option<MemoryRecord>> {
        self.check_fault("metadata_find_by_id")?;
        Ok(self.read_guard()?.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> StorageResult<Vec<MemoryRecord>> {
        self.check_fault("metadata_find_by_ids")?;
        let guard = self.read_guard()?;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn find_by_namespace(&self, namespace: &Namespace) -> StorageResult<Vec<MemoryRecord>> {
        self.check_fault("metadata_find_by_namespace")?;
        Ok(self
            .read_guard()?
            .values()
            .filter(|r| r.namespace == *namespace)
            .cloned()
            .collect())
    }

    async fn find_by_namespace_with_filter(
        &self,
        namespace: &Namespace,
        filter: &SearchFilter,
    ) -> StorageResult<Vec<MemoryRecord>> {
        self.check_fault("metadata_find_by_namespace")?;
        Ok(self
            .read_guard()?
            .values()
            .filter(|r| r.namespace == *namespace && filter.matches(r))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> StorageResult<bool> {
        self.check_fault("metadata_delete")?;
        Ok(self.write_guard()?.remove(id).is_some())
    }

    async fn delete_by_namespace(&self, namespace: &Namespace) -> StorageResult<usize> {
        self.check_fault("metadata_delete_by_namespace")?;
        let mut guard = self.write_guard()?;
        let before = guard.len();
        guard.retain(|_, r| r.namespace != *namespace);
        Ok(before - guard.len())
    }

    async fn find_decayed(
        &self,
        namespace: &Namespace,
        threshold: f64,
    ) -> StorageResult<Vec<MemoryRecord>> {
        // Precondition
        assert!((0.0..=1.0).contains(&threshold), "threshold must be in [0, 1]");

        self.check_fault("metadata_find_decayed")?;
        Ok(self
            .read_guard()?
            .values()
            .filter(|r| r.namespace == *namespace && r.decay_factor < threshold)
            .cloned()
            .collect())
    }

    async fn record_access(&self, ids: &[String]) -> StorageResult<()> {
        self.check_fault("metadata_record_access")?;
        let mut guard = self.write_guard()?;
        for id in ids {
            if let Some(record) = guard.get_mut(id) {
                record.record_access();
            }
        }
        Ok(())
    }

    async fn update_decay_factor(&self, id: &str, decay_factor: f64) -> StorageResult<()> {
        // Precondition
        assert!(
            (0.0..=1.0).contains(&decay_factor),
            "decay_factor must be in [0, 1]"
        );

        self.check_fault("metadata_update_decay")?;
        let mut guard = self.write_guard()?;
        match guard.get_mut(id) {
            Some(record) => {
                record.decay_factor = decay_factor;
                Ok(())
            }
            None => Err(StorageError::not_found(id)),
        }
    }

    async fn update_decay_factors(&self, ids: &[String], factors: &[f64]) -> StorageResult<()> {
        // Precondition
        assert_eq!(ids.len(), factors.len(), "ids and factors must correspond");

        self.check_fault("metadata_update_decay")?;
        let mut guard = self.write_guard()?;
        for (id, factor) in ids.iter().zip(factors) {
            assert!((0.0..=1.0).contains(factor), "decay_factor must be in [0, 1]");
            if let Some(record) = guard.get_mut(id) {
                record.decay_factor = *factor;
            }
        }
        Ok(())
    }

    async fn count(&self, namespace: &Namespace) -> StorageResult<usize> {
        self.check_fault("metadata_count")?;
        Ok(self
            .read_guard()?
            .values()
            .filter(|r| r.namespace == *namespace)
            .count())
    }

    async fn count_by_type(
        &self,
        namespace: &Namespace,
        memory_type: MemoryType,
    ) -> StorageResult<usize> {
        self.check_fault("metadata_count")?;
        Ok(self
            .read_guard()?
            .values()
            .filter(|r| r.namespace == *namespace && r.memory_type == memory_type)
            .count())
    }
}

// =============================================================================
// Tests
// =============================================================================
