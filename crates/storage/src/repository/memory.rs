use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::WaitlistEntry;

use super::{WaitlistStore, WaitlistTransaction};

type EventEntries = HashMap<Uuid, WaitlistEntry>;
type Events = HashMap<Uuid, EventEntries>;

/// Process-local waitlist store.
///
/// A single lock covers every event, so transactions are fully serialized.
/// Writes go to a working copy of the locked event's entries that replaces
/// them on commit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWaitlistStore {
    events: Arc<Mutex<Events>>,
}

impl InMemoryWaitlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.values().map(HashMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl WaitlistStore for InMemoryWaitlistStore {
    async fn find_by_id(&self, entry_id: Uuid) -> Result<Option<WaitlistEntry>> {
        Ok(self
            .events
            .lock()
            .await
            .values()
            .find_map(|entries| entries.get(&entry_id))
            .cloned())
    }

    async fn events_with_overdue_offers(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let events = self.events.lock().await;
        let mut overdue: Vec<Uuid> = events
            .iter()
            .filter(|(_, entries)| entries.values().any(|entry| entry.is_overdue(now)))
            .map(|(event_id, _)| *event_id)
            .collect();
        overdue.sort();

        Ok(overdue)
    }

    async fn begin(&self, event_id: Uuid) -> Result<Box<dyn WaitlistTransaction>> {
        let guard = Arc::clone(&self.events).lock_owned().await;
        let working = guard.get(&event_id).cloned().unwrap_or_default();

        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            event_id,
        }))
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Events>,
    working: EventEntries,
    event_id: Uuid,
}

#[async_trait]
impl WaitlistTransaction for InMemoryTransaction {
    async fn entries(&mut self) -> Result<Vec<WaitlistEntry>> {
        Ok(self.working.values().cloned().collect())
    }

    async fn insert(&mut self, entry: &WaitlistEntry) -> Result<()> {
        if entry.event_id != self.event_id {
            return Err(StorageError::ConstraintViolation(
                "Entry belongs to another event".to_string(),
            ));
        }

        let duplicate_active = entry.status.is_active()
            && self.working.values().any(|existing| {
                existing.user_id == entry.user_id && existing.status.is_active()
            });

        if duplicate_active || self.working.contains_key(&entry.id) {
            return Err(StorageError::ConstraintViolation(
                "Active waitlist entry already exists".to_string(),
            ));
        }

        self.working.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update(&mut self, entry: &WaitlistEntry) -> Result<()> {
        let stored = self
            .working
            .get_mut(&entry.id)
            .ok_or(StorageError::NotFound)?;
        *stored = entry.clone();
        Ok(())
    }

    async fn delete(&mut self, entry_id: Uuid) -> Result<()> {
        self.working
            .remove(&entry_id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction {
            mut guard,
            working,
            event_id,
        } = *self;

        if working.is_empty() {
            guard.remove(&event_id);
        } else {
            guard.insert(event_id, working);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn entry(event_id: Uuid, user_id: Uuid, position: i32) -> WaitlistEntry {
        let joined_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        WaitlistEntry::new_waiting(event_id, user_id, position, joined_at, None)
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = InMemoryWaitlistStore::new();
        let event_id = Uuid::new_v4();

        let mut tx = store.begin(event_id).await.unwrap();
        tx.insert(&entry(event_id, Uuid::new_v4(), 1)).await.unwrap();
        drop(tx);

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryWaitlistStore::new();
        let event_id = Uuid::new_v4();
        let created = entry(event_id, Uuid::new_v4(), 1);

        let mut tx = store.begin(event_id).await.unwrap();
        tx.insert(&created).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.find_by_id(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_transaction_only_sees_its_event() {
        let store = InMemoryWaitlistStore::new();
        let event_a = Uuid::new_v4();
        let event_b = Uuid::new_v4();
        let other = entry(event_b, Uuid::new_v4(), 1);

        let mut tx = store.begin(event_b).await.unwrap();
        tx.insert(&other).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(event_a).await.unwrap();
        assert!(tx.entries().await.unwrap().is_empty());
        assert!(matches!(
            tx.delete(other.id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_rejects_second_active_entry_for_user() {
        let store = InMemoryWaitlistStore::new();
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let mut tx = store.begin(event_id).await.unwrap();
        tx.insert(&entry(event_id, user_id, 1)).await.unwrap();
        let err = tx.insert(&entry(event_id, user_id, 2)).await.unwrap_err();

        assert!(matches!(err, StorageError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_commit_leaves_other_events_alone() {
        let store = InMemoryWaitlistStore::new();
        let event_a = Uuid::new_v4();
        let event_b = Uuid::new_v4();
        let kept = entry(event_b, Uuid::new_v4(), 1);

        let mut tx = store.begin(event_b).await.unwrap();
        tx.insert(&kept).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(event_a).await.unwrap();
        tx.insert(&entry(event_a, Uuid::new_v4(), 1)).await.unwrap();
        let err = tx.insert(&entry(event_b, Uuid::new_v4(), 2)).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
        tx.commit().await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.find_by_id(kept.id).await.unwrap(), Some(kept));
    }
}
