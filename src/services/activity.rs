//! Activity log service (audit trail)

use crate::{
    error::AppResult,
    models::activity::{ActivityLog, ActivityQuery, NewActivity},
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivityService {
    repository: Repository,
}

impl ActivityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record one audit entry for a core mutation. Fire-and-forget: a failure
    /// here must never roll back or fail the mutation it describes, so it is
    /// logged and swallowed.
    pub async fn record(&self, entry: NewActivity) {
        if let Err(e) = self.repository.activity.insert(&entry).await {
            tracing::warn!(
                "Failed to record activity for {} {}: {}",
                entry.entity_type,
                entry.entity_id,
                e
            );
        }
    }

    /// List audit records for back-office display
    pub async fn list(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivityLog>, i64)> {
        self.repository.activity.list(query).await
    }
}
