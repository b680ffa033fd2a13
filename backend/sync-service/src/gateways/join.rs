//! Cross-entity joins shared by the gateways
use crate::domain::models::{User, UserId};
use crate::error::{store_error, EntityKind, SyncResult};
use record_store::{RecordStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;

/// All users keyed by id, for joining many rows at once
pub(crate) async fn author_index(
    users: &Arc<dyn RecordStore<User>>,
) -> SyncResult<HashMap<UserId, User>> {
    let all = users
        .get_all()
        .await
        .map_err(store_error(EntityKind::User))?;
    Ok(all.into_iter().map(|u| (u.id, u)).collect())
}

/// A single joined user; a dangling reference yields `None` rather than an error
pub(crate) async fn lookup_user(
    users: &Arc<dyn RecordStore<User>>,
    id: UserId,
) -> SyncResult<Option<User>> {
    match users.get_by_id(id).await {
        Ok(user) => Ok(Some(user)),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(e) => Err(store_error(EntityKind::User)(e)),
    }
}
