use crate::error::StoreResult;

/// A record addressable by a backend-assigned positive integer id.
pub trait Record: Clone + Send + Sync + 'static {
    /// Current id (0 before insertion)
    fn id(&self) -> u64;

    /// Called once by the store when the record is inserted
    fn assign_id(&mut self, id: u64);
}

/// Predicate used for filtered reads and uniqueness checks
pub type Predicate<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// In-place mutation applied atomically to a single record
pub type Updater<T> = Box<dyn FnOnce(&mut T) + Send>;

/// In-place mutation applied to every record a bulk update matches
pub type UpdateFn<'a, T> = &'a (dyn Fn(&mut T) + Send + Sync);

/// Outcome of a conditional insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
    /// The record was new and has been stored with a fresh id
    Inserted(T),
    /// A record matching the uniqueness predicate already existed; nothing was written
    Existing(T),
}

impl<T> InsertOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            InsertOutcome::Inserted(record) | InsertOutcome::Existing(record) => record,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// Trait defining the interface for a single entity collection.
/// Every write is atomic with respect to one record; no lock is held across an await.
#[async_trait::async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Collection name used in errors and logs
    fn collection(&self) -> &'static str;

    /// All records, ordered by id ascending
    async fn get_all(&self) -> StoreResult<Vec<T>>;

    /// Single record; `StoreError::NotFound` if absent
    async fn get_by_id(&self, id: u64) -> StoreResult<T>;

    /// Records matching the predicate, ordered by id ascending
    async fn find(&self, predicate: Predicate<'_, T>) -> StoreResult<Vec<T>>;

    /// Insert a record, assigning the next id (ids are never reused)
    async fn insert(&self, record: T) -> StoreResult<T>;

    /// Insert unless a record matching `existing` is already stored.
    /// The check and the write happen under the same critical section.
    async fn insert_unless(
        &self,
        record: T,
        existing: Predicate<'_, T>,
    ) -> StoreResult<InsertOutcome<T>>;

    /// Apply `update` to one record and return the stored result
    async fn update(&self, id: u64, update: Updater<T>) -> StoreResult<T>;

    /// Apply `update` to every record matching the predicate; returns how many were touched
    async fn update_where(
        &self,
        predicate: Predicate<'_, T>,
        update: UpdateFn<'_, T>,
    ) -> StoreResult<usize>;

    /// Delete one record; `StoreError::NotFound` if absent
    async fn delete(&self, id: u64) -> StoreResult<()>;

    /// Delete every record matching the predicate; returns how many were removed
    async fn delete_where(&self, predicate: Predicate<'_, T>) -> StoreResult<usize>;
}
