//! Coordination components sitting between the gateways and presentation
pub mod conversation_sync;
pub mod notifications;
pub mod optimistic;
pub mod search;
pub mod subscription;

pub use conversation_sync::{ConversationSyncPoller, MergeOutcome, SyncPhase};
pub use notifications::NotificationReconciler;
pub use optimistic::{LikeState, OptimisticActionCoordinator, ToggleOutcome};
pub use search::{SearchAggregator, SearchHit, SearchView};
pub use subscription::{MessageFeed, SubscriptionRegistry};
