use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::dto::waitlist::WaitlistSummary;
use crate::error::WaitlistError;
use crate::models::{WaitlistEntry, WaitlistStatus};
use crate::repository::{WaitlistStore, WaitlistTransaction};

pub type Result<T> = std::result::Result<T, WaitlistError>;

/// Who is acting on a waitlist entry, as resolved by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Attendee(Uuid),
    Organizer,
}

impl Actor {
    fn may_manage(self, entry: &WaitlistEntry) -> bool {
        match self {
            Self::Attendee(user_id) => user_id == entry.user_id,
            Self::Organizer => true,
        }
    }
}

/// Per-event waitlist: FIFO queue of waiting attendees plus timed offers.
///
/// Each operation runs in a single store transaction holding the event's
/// lock. Overdue offers are expired lazily whenever an event's entries are
/// loaded, so no background timer is needed.
#[derive(Clone)]
pub struct WaitlistCoordinator {
    store: Arc<dyn WaitlistStore>,
    clock: Arc<dyn Clock>,
}

impl WaitlistCoordinator {
    pub fn new(store: Arc<dyn WaitlistStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Add an attendee at the back of the queue
    pub async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        notes: Option<String>,
    ) -> Result<WaitlistEntry> {
        let now = self.clock.now();
        let (mut tx, entries) = self.lock_event(event_id, now).await?;

        if entries
            .iter()
            .any(|entry| entry.user_id == user_id && entry.status.is_active())
        {
            return Err(WaitlistError::AlreadyOnWaitlist);
        }

        let last_position = entries
            .iter()
            .filter(|entry| entry.status == WaitlistStatus::Waiting)
            .filter_map(|entry| entry.position)
            .max()
            .unwrap_or(0);

        let entry = WaitlistEntry::new_waiting(event_id, user_id, last_position + 1, now, notes);
        tx.insert(&entry).await?;
        tx.commit().await?;

        tracing::info!(
            "User {} joined waitlist of event {} at position {}",
            user_id,
            event_id,
            last_position + 1
        );

        Ok(entry)
    }

    /// Remove a waiting entry and close the gap it leaves
    pub async fn leave(&self, entry_id: Uuid, actor: Actor) -> Result<()> {
        let entry = self.find_manageable(entry_id, actor).await?;

        let now = self.clock.now();
        let (mut tx, mut entries) = self.lock_event(entry.event_id, now).await?;

        let index = entries
            .iter()
            .position(|e| e.id == entry_id)
            .ok_or(WaitlistError::NotFound)?;
        if entries[index].status != WaitlistStatus::Waiting {
            return Err(WaitlistError::NotWaiting);
        }

        let removed = entries.swap_remove(index);
        tx.delete(removed.id).await?;
        for shifted in renumber(&mut entries) {
            tx.update(&shifted).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Entry {} left waitlist of event {} from position {:?}",
            removed.id,
            removed.event_id,
            removed.position
        );

        Ok(())
    }

    /// Offer a vacated spot to whoever is first in line
    pub async fn offer_spot(&self, event_id: Uuid, expires_in_hours: u32) -> Result<WaitlistEntry> {
        let now = self.clock.now();
        let expires_at = offer_deadline(now, expires_in_hours)?;
        let (mut tx, mut entries) = self.lock_event(event_id, now).await?;

        let next = entries
            .iter_mut()
            .filter(|entry| entry.status == WaitlistStatus::Waiting)
            .min_by_key(|entry| queue_key(entry))
            .ok_or(WaitlistError::WaitlistEmpty)?;

        next.offer(now, expires_at);
        let offered = next.clone();

        tx.update(&offered).await?;
        for shifted in renumber(&mut entries) {
            tx.update(&shifted).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Offered spot for event {} to user {} until {:?}",
            event_id,
            offered.user_id,
            offered.expires_at
        );

        Ok(offered)
    }

    /// Accept or decline an open offer.
    ///
    /// Declining does not offer the spot to the next attendee; the organizer
    /// triggers that separately.
    pub async fn respond(&self, entry_id: Uuid, user_id: Uuid, accept: bool) -> Result<WaitlistEntry> {
        let entry = self.find_manageable(entry_id, Actor::Attendee(user_id)).await?;

        let now = self.clock.now();
        let (mut tx, mut entries) = self.lock_event(entry.event_id, now).await?;

        let current = entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(WaitlistError::NotFound)?;

        match current.status {
            WaitlistStatus::Offered => {}
            WaitlistStatus::Expired => {
                // Keep the expiry even though the caller gets an error
                tx.commit().await?;
                return Err(WaitlistError::OfferExpired);
            }
            _ => return Err(WaitlistError::NotOffered),
        }

        current.respond(now, accept);
        let updated = current.clone();
        tx.update(&updated).await?;
        tx.commit().await?;

        tracing::info!(
            "User {} {} offer for event {}",
            user_id,
            if accept { "accepted" } else { "declined" },
            updated.event_id
        );

        Ok(updated)
    }

    /// All entries of an event: waiting ones by position, then the rest by join time
    pub async fn list(&self, event_id: Uuid) -> Result<Vec<WaitlistEntry>> {
        let mut entries = self.read_event(event_id).await?;
        entries.sort_by_key(|entry| (entry.status != WaitlistStatus::Waiting, queue_key(entry)));
        Ok(entries)
    }

    /// Single entry, visible to its owner and organizers
    pub async fn get(&self, entry_id: Uuid, actor: Actor) -> Result<WaitlistEntry> {
        let entry = self.find_manageable(entry_id, actor).await?;

        self.read_event(entry.event_id)
            .await?
            .into_iter()
            .find(|e| e.id == entry_id)
            .ok_or(WaitlistError::NotFound)
    }

    /// The attendee's waiting or offered entry for an event
    pub async fn my_entry(&self, event_id: Uuid, user_id: Uuid) -> Result<WaitlistEntry> {
        self.read_event(event_id)
            .await?
            .into_iter()
            .find(|entry| entry.user_id == user_id && entry.status.is_active())
            .ok_or(WaitlistError::NotFound)
    }

    pub async fn summary(&self, event_id: Uuid) -> Result<WaitlistSummary> {
        let entries = self.read_event(event_id).await?;
        Ok(WaitlistSummary::from_entries(event_id, &entries))
    }

    /// Expire every overdue offer across all events
    pub async fn sweep_expired(&self) -> Result<u64> {
        let now = self.clock.now();
        let events = self.store.events_with_overdue_offers(now).await?;

        let mut expired = 0u64;
        for event_id in events {
            let (tx, _) = self.lock_event_counting(event_id, now, &mut expired).await?;
            tx.commit().await?;
        }

        tracing::info!("Expiry sweep expired {} offers", expired);

        Ok(expired)
    }

    async fn find_manageable(&self, entry_id: Uuid, actor: Actor) -> Result<WaitlistEntry> {
        let entry = self
            .store
            .find_by_id(entry_id)
            .await?
            .ok_or(WaitlistError::NotFound)?;

        if !actor.may_manage(&entry) {
            return Err(WaitlistError::Forbidden);
        }

        Ok(entry)
    }

    /// Load an event's entries with lazy expiry applied and persisted
    async fn read_event(&self, event_id: Uuid) -> Result<Vec<WaitlistEntry>> {
        let (tx, entries) = self.lock_event(event_id, self.clock.now()).await?;
        tx.commit().await?;
        Ok(entries)
    }

    async fn lock_event(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Box<dyn WaitlistTransaction>, Vec<WaitlistEntry>)> {
        let mut expired = 0;
        self.lock_event_counting(event_id, now, &mut expired).await
    }

    async fn lock_event_counting(
        &self,
        event_id: Uuid,
        now: DateTime<Utc>,
        expired: &mut u64,
    ) -> Result<(Box<dyn WaitlistTransaction>, Vec<WaitlistEntry>)> {
        let mut tx = self.store.begin(event_id).await?;
        let mut entries = tx.entries().await?;

        let mut count = 0u64;
        for entry in entries.iter_mut().filter(|entry| entry.is_overdue(now)) {
            entry.expire();
            tx.update(entry).await?;
            count += 1;
        }

        if count > 0 {
            tracing::info!("Expired {} overdue offers for event {}", count, event_id);
        }
        *expired += count;

        Ok((tx, entries))
    }
}

/// End of an offer window starting at `now`; zero-length or unrepresentable windows are rejected
fn offer_deadline(now: DateTime<Utc>, expires_in_hours: u32) -> Result<DateTime<Utc>> {
    if expires_in_hours == 0 {
        return Err(WaitlistError::InvalidOfferWindow(expires_in_hours));
    }

    Duration::try_hours(i64::from(expires_in_hours))
        .and_then(|window| now.checked_add_signed(window))
        .ok_or(WaitlistError::InvalidOfferWindow(expires_in_hours))
}

fn queue_key(entry: &WaitlistEntry) -> (Option<i32>, DateTime<Utc>, Uuid) {
    (entry.position, entry.joined_at, entry.id)
}

/// Give waiting entries positions 1..N in queue order.
///
/// Returns the entries whose position changed, ordered by new position.
/// Positions only ever move down, so writing them in this order never
/// collides with a row that has not been shifted yet.
fn renumber(entries: &mut [WaitlistEntry]) -> Vec<WaitlistEntry> {
    let mut waiting: Vec<&mut WaitlistEntry> = entries
        .iter_mut()
        .filter(|entry| entry.status == WaitlistStatus::Waiting)
        .collect();
    waiting.sort_by_key(|entry| queue_key(entry));

    let mut shifted = Vec::new();
    for (index, entry) in waiting.into_iter().enumerate() {
        let position = Some(index as i32 + 1);
        if entry.position != position {
            entry.position = position;
            shifted.push(entry.clone());
        }
    }

    shifted
}
