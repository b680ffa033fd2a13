/// In-memory mock backend
///
/// Volatile, single-process collection guarded by a `parking_lot::RwLock`.
/// Each operation first sleeps for the configured latency (suspending the
/// caller), then runs its read or write inside one critical section.
use crate::error::{StoreError, StoreResult};
use crate::latency::LatencyConfig;
use crate::store::{InsertOutcome, Predicate, Record, RecordStore, UpdateFn, Updater};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

struct Inner<T> {
    records: BTreeMap<u64, T>,
    next_id: u64,
}

pub struct InMemoryStore<T: Record> {
    name: &'static str,
    latency: LatencyConfig,
    inner: RwLock<Inner<T>>,
    /// Number of upcoming operations that will fail with `Unavailable`
    pending_faults: AtomicUsize,
}

impl<T: Record> InMemoryStore<T> {
    pub fn new(latency: LatencyConfig) -> Self {
        Self::named("records", latency)
    }

    pub fn named(name: &'static str, latency: LatencyConfig) -> Self {
        Self {
            name,
            latency,
            inner: RwLock::new(Inner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
            pending_faults: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` operations fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, count: usize) {
        self.pending_faults.fetch_add(count, Ordering::SeqCst);
    }

    /// Drop any fault budget that hasn't been consumed yet.
    pub fn clear_faults(&self) {
        self.pending_faults.store(0, Ordering::SeqCst);
    }

    /// Insert without latency or fault injection. Used to seed fixtures.
    pub fn insert_now(&self, record: T) -> T {
        self.inner.write().push(record)
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_fault(&self) -> StoreResult<()> {
        let consumed = self
            .pending_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            warn!(collection = self.name, "injected backend fault");
            return Err(StoreError::Unavailable(format!(
                "{} backend rejected the request",
                self.name
            )));
        }
        Ok(())
    }

    fn not_found(&self, id: u64) -> StoreError {
        StoreError::NotFound {
            collection: self.name,
            id,
        }
    }
}

impl<T: Record> Inner<T> {
    fn push(&mut self, mut record: T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        record.assign_id(id);
        self.records.insert(id, record.clone());
        record
    }
}

#[async_trait::async_trait]
impl<T: Record> RecordStore<T> for InMemoryStore<T> {
    fn collection(&self) -> &'static str {
        self.name
    }

    async fn get_all(&self) -> StoreResult<Vec<T>> {
        self.latency.before_read().await;
        self.check_fault()?;
        Ok(self.inner.read().records.values().cloned().collect())
    }

    async fn get_by_id(&self, id: u64) -> StoreResult<T> {
        self.latency.before_read().await;
        self.check_fault()?;
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| self.not_found(id))
    }

    async fn find(&self, predicate: Predicate<'_, T>) -> StoreResult<Vec<T>> {
        self.latency.before_read().await;
        self.check_fault()?;
        Ok(self
            .inner
            .read()
            .records
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    async fn insert(&self, record: T) -> StoreResult<T> {
        self.latency.before_write().await;
        self.check_fault()?;
        let stored = self.inner.write().push(record);
        debug!(collection = self.name, id = stored.id(), "record inserted");
        Ok(stored)
    }

    async fn insert_unless(
        &self,
        record: T,
        existing: Predicate<'_, T>,
    ) -> StoreResult<InsertOutcome<T>> {
        self.latency.before_write().await;
        self.check_fault()?;
        let mut inner = self.inner.write();
        if let Some(found) = inner.records.values().find(|r| existing(r)) {
            return Ok(InsertOutcome::Existing(found.clone()));
        }
        let stored = inner.push(record);
        debug!(collection = self.name, id = stored.id(), "record inserted");
        Ok(InsertOutcome::Inserted(stored))
    }

    async fn update(&self, id: u64, update: Updater<T>) -> StoreResult<T> {
        self.latency.before_write().await;
        self.check_fault()?;
        let mut inner = self.inner.write();
        let record = inner.records.get_mut(&id).ok_or_else(|| self.not_found(id))?;
        update(record);
        Ok(record.clone())
    }

    async fn update_where(
        &self,
        predicate: Predicate<'_, T>,
        update: UpdateFn<'_, T>,
    ) -> StoreResult<usize> {
        self.latency.before_write().await;
        self.check_fault()?;
        let mut inner = self.inner.write();
        let mut touched = 0;
        for record in inner.records.values_mut().filter(|r| predicate(r)) {
            update(record);
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete(&self, id: u64) -> StoreResult<()> {
        self.latency.before_write().await;
        self.check_fault()?;
        self.inner
            .write()
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| self.not_found(id))
    }

    async fn delete_where(&self, predicate: Predicate<'_, T>) -> StoreResult<usize> {
        self.latency.before_write().await;
        self.check_fault()?;
        let mut inner = self.inner.write();
        let before = inner.records.len();
        inner.records.retain(|_, r| !predicate(r));
        Ok(before - inner.records.len())
    }
}
