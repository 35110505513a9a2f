use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "waitlist_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WaitlistStatus {
    Waiting,
    Offered,
    Accepted,
    Declined,
    Expired,
}

impl WaitlistStatus {
    /// Waiting and offered entries still hold the attendee's place.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Waiting | Self::Offered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WaitlistEntry {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub position: Option<i32>,
    pub status: WaitlistStatus,
    pub joined_at: DateTime<Utc>,
    pub offered_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl WaitlistEntry {
    pub fn new_waiting(
        event_id: Uuid,
        user_id: Uuid,
        position: i32,
        joined_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            position: Some(position),
            status: WaitlistStatus::Waiting,
            joined_at,
            offered_at: None,
            expires_at: None,
            responded_at: None,
            notes,
        }
    }

    /// An offer is overdue strictly after its expiry instant.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == WaitlistStatus::Offered
            && self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    pub(crate) fn offer(&mut self, now: DateTime<Utc>, expires_at: DateTime<Utc>) {
        self.status = WaitlistStatus::Offered;
        self.position = None;
        self.offered_at = Some(now);
        self.expires_at = Some(expires_at);
    }

    pub(crate) fn respond(&mut self, now: DateTime<Utc>, accept: bool) {
        self.status = if accept {
            WaitlistStatus::Accepted
        } else {
            WaitlistStatus::Declined
        };
        self.responded_at = Some(now);
    }

    pub(crate) fn expire(&mut self) {
        self.status = WaitlistStatus::Expired;
    }
}
