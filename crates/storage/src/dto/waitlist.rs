use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{WaitlistEntry, WaitlistStatus};

/// Request payload for joining an event's waitlist
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct JoinWaitlistRequest {
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Request payload for offering the next spot
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct OfferSpotRequest {
    /// Hours the attendee has to answer. Server default when omitted.
    #[validate(range(min = 1, max = 720, message = "Offer window must be between 1 and 720 hours"))]
    pub expires_in_hours: Option<u32>,
}

/// Request payload for answering an offer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RespondToOfferRequest {
    pub accept: bool,
}

/// Response containing a waitlist entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WaitlistEntryResponse {
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

/// Acknowledgement for leaving the waitlist
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveWaitlistResponse {
    pub success: bool,
}

/// Entry counts per status for one event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WaitlistSummary {
    pub event_id: Uuid,
    pub waiting: i64,
    pub offered: i64,
    pub accepted: i64,
    pub declined: i64,
    pub expired: i64,
}

impl WaitlistSummary {
    pub fn from_entries(event_id: Uuid, entries: &[WaitlistEntry]) -> Self {
        entries.iter().fold(
            Self {
                event_id,
                ..Self::default()
            },
            |mut summary, entry| {
                match entry.status {
                    WaitlistStatus::Waiting => summary.waiting += 1,
                    WaitlistStatus::Offered => summary.offered += 1,
                    WaitlistStatus::Accepted => summary.accepted += 1,
                    WaitlistStatus::Declined => summary.declined += 1,
                    WaitlistStatus::Expired => summary.expired += 1,
                }
                summary
            },
        )
    }
}

/// Result of an expiry sweep
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpirySweepResponse {
    pub expired_count: u64,
    pub message: String,
}

impl From<WaitlistEntry> for WaitlistEntryResponse {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            id: entry.id,
            event_id: entry.event_id,
            user_id: entry.user_id,
            position: entry.position,
            status: entry.status,
            joined_at: entry.joined_at,
            offered_at: entry.offered_at,
            expires_at: entry.expires_at,
            responded_at: entry.responded_at,
            notes: entry.notes,
        }
    }
}
