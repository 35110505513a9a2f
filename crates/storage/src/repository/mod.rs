pub mod memory;
pub mod waitlist;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::WaitlistEntry;

pub use memory::InMemoryWaitlistStore;
pub use waitlist::WaitlistRepository;

/// Durable record of waitlist entries.
///
/// Every mutation happens inside a [`WaitlistTransaction`] that holds the
/// event's lock until it is committed or dropped.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Unlocked point read, used to discover which event an entry belongs to.
    async fn find_by_id(&self, entry_id: Uuid) -> Result<Option<WaitlistEntry>>;

    /// Events that have at least one offer past its expiry at `now`.
    async fn events_with_overdue_offers(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>>;

    /// Opens a transaction serialized against every other transaction on `event_id`.
    async fn begin(&self, event_id: Uuid) -> Result<Box<dyn WaitlistTransaction>>;
}

/// One atomic unit of work on a single event's waitlist.
///
/// Dropping the transaction without calling [`commit`](Self::commit)
/// discards every write made through it.
#[async_trait]
pub trait WaitlistTransaction: Send {
    /// All entries of the locked event, in no particular order.
    async fn entries(&mut self) -> Result<Vec<WaitlistEntry>>;

    async fn insert(&mut self, entry: &WaitlistEntry) -> Result<()>;

    async fn update(&mut self, entry: &WaitlistEntry) -> Result<()>;

    async fn delete(&mut self, entry_id: Uuid) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
