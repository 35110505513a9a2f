use std::sync::Arc;

use storage::{
    Database,
    clock::SystemClock,
    dto::waitlist::{ExpirySweepResponse, WaitlistEntryResponse},
    error::WaitlistError,
    models::WaitlistEntry,
    repository::{InMemoryWaitlistStore, WaitlistRepository, WaitlistStore},
    services::WaitlistCoordinator,
};
use uuid::Uuid;

type Result<T> = std::result::Result<T, WaitlistError>;

/// Build the coordinator over Postgres, or over process memory when no database is configured
pub fn build_coordinator(db: Option<&Database>) -> WaitlistCoordinator {
    let store: Arc<dyn WaitlistStore> = match db {
        Some(db) => Arc::new(WaitlistRepository::new(db.pool().clone())),
        None => Arc::new(InMemoryWaitlistStore::new()),
    };

    WaitlistCoordinator::new(store, Arc::new(SystemClock))
}

/// List an event's waitlist with overdue offers expired
pub async fn list_entries(
    waitlist: &WaitlistCoordinator,
    event_id: Uuid,
) -> Result<Vec<WaitlistEntryResponse>> {
    let entries = waitlist.list(event_id).await?;

    Ok(entries
        .into_iter()
        .map(WaitlistEntryResponse::from)
        .collect())
}

/// Offer the next spot, falling back to the configured window
pub async fn offer_next_spot(
    waitlist: &WaitlistCoordinator,
    event_id: Uuid,
    expires_in_hours: Option<u32>,
    default_hours: u32,
) -> Result<WaitlistEntry> {
    waitlist
        .offer_spot(event_id, expires_in_hours.unwrap_or(default_hours))
        .await
}

/// Expire overdue offers across all events
pub async fn expire_overdue(waitlist: &WaitlistCoordinator) -> Result<ExpirySweepResponse> {
    let expired_count = waitlist.sweep_expired().await?;

    Ok(ExpirySweepResponse {
        expired_count,
        message: format!("Expired {} overdue offers", expired_count),
    })
}
