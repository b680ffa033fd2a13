/// Error types for sync-service
use record_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Entity types addressed by gateway errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Post,
    Follow,
    Conversation,
    Message,
    Notification,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Post => "post",
            EntityKind::Follow => "follow",
            EntityKind::Conversation => "conversation",
            EntityKind::Message => "message",
            EntityKind::Notification => "notification",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable error kind surfaced to presentation code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Transient,
    LikeUpdateFailed,
    FollowUpdateFailed,
    InvalidFollowTarget,
    NotificationNotFound,
    Cancelled,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Transient => "transient_failure",
            ErrorKind::LikeUpdateFailed => "like_update_failed",
            ErrorKind::FollowUpdateFailed => "follow_update_failed",
            ErrorKind::InvalidFollowTarget => "invalid_follow_target",
            ErrorKind::NotificationNotFound => "notification_not_found",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config_error",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: u64 },

    #[error("{entity} {key} not found")]
    NotFoundByKey { entity: EntityKind, key: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient backend failure: {0}")]
    Transient(String),

    #[error("Like update for post {post_id} failed: {source}")]
    LikeUpdateFailed {
        post_id: u64,
        #[source]
        source: Box<SyncError>,
    },

    #[error("Follow update {follower_id} -> {target_id} failed: {source}")]
    FollowUpdateFailed {
        follower_id: u64,
        target_id: u64,
        #[source]
        source: Box<SyncError>,
    },

    #[error("User {0} cannot follow themselves")]
    InvalidFollowTarget(u64),

    #[error("Notification {0} not found")]
    NotificationNotFound(u64),

    #[error("Conversation {0} is no longer selected")]
    Cancelled(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn not_found(entity: EntityKind, id: u64) -> Self {
        SyncError::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::NotFound { .. } | SyncError::NotFoundByKey { .. } => ErrorKind::NotFound,
            SyncError::Validation(_) => ErrorKind::Validation,
            SyncError::Conflict(_) => ErrorKind::Conflict,
            SyncError::Transient(_) => ErrorKind::Transient,
            SyncError::LikeUpdateFailed { .. } => ErrorKind::LikeUpdateFailed,
            SyncError::FollowUpdateFailed { .. } => ErrorKind::FollowUpdateFailed,
            SyncError::InvalidFollowTarget(_) => ErrorKind::InvalidFollowTarget,
            SyncError::NotificationNotFound(_) => ErrorKind::NotificationNotFound,
            SyncError::Cancelled(_) => ErrorKind::Cancelled,
            SyncError::Config(_) => ErrorKind::Config,
        }
    }

    /// Id of the entity the error is about, when there is one
    pub fn entity_id(&self) -> Option<u64> {
        match self {
            SyncError::NotFound { id, .. } => Some(*id),
            SyncError::LikeUpdateFailed { post_id, .. } => Some(*post_id),
            SyncError::FollowUpdateFailed { target_id, .. } => Some(*target_id),
            SyncError::InvalidFollowTarget(id)
            | SyncError::NotificationNotFound(id)
            | SyncError::Cancelled(id) => Some(*id),
            _ => None,
        }
    }

    /// Gateway failures are never retried automatically; this only reports
    /// whether a manual retry by the user could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transient(_) => true,
            SyncError::LikeUpdateFailed { source, .. }
            | SyncError::FollowUpdateFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Map a store error onto the gateway taxonomy, naming the entity involved
pub fn store_error(entity: EntityKind) -> impl Fn(StoreError) -> SyncError {
    move |err| match err {
        StoreError::NotFound { id, .. } => SyncError::NotFound { entity, id },
        StoreError::Unavailable(msg) => SyncError::Transient(msg),
    }
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
