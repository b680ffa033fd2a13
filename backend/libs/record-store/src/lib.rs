/// Record store abstraction for volatile, single-process backends
///
/// This library provides the persistence seam the sync engine talks to:
/// - **RecordStore**: async, key-addressable CRUD per entity type with atomic per-record writes
/// - **InMemoryStore**: a mock backend with artificial latency and fault injection
/// - **LatencyConfig**: read/write delays applied before each operation
///
/// Callers depend on `Arc<dyn RecordStore<T>>` only, so a real database can be
/// substituted without touching coordination logic.
///
/// # Example
///
/// ```rust,no_run
/// use record_store::{InMemoryStore, LatencyConfig, Record, RecordStore};
///
/// #[derive(Clone)]
/// struct Note {
///     id: u64,
///     body: String,
/// }
///
/// impl Record for Note {
///     fn id(&self) -> u64 {
///         self.id
///     }
///     fn assign_id(&mut self, id: u64) {
///         self.id = id;
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::<Note>::new(LatencyConfig::none());
///     let note = store
///         .insert(Note { id: 0, body: "hello".into() })
///         .await
///         .unwrap();
///     assert_eq!(note.id, 1);
/// }
/// ```

pub mod error;
pub mod latency;
pub mod memory;
pub mod store;

// Re-export main types for convenience
pub use error::{StoreError, StoreResult};
pub use latency::LatencyConfig;
pub use memory::InMemoryStore;
pub use store::{InsertOutcome, Predicate, Record, RecordStore, UpdateFn, Updater};
