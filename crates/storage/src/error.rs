use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }
}

/// Failures of the waitlist workflow.
///
/// Every precondition violation has its own kind so callers can tell the
/// attendee exactly what happened. Store failures pass through untouched.
#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("Waitlist entry not found")]
    NotFound,

    #[error("Not allowed to act on this waitlist entry")]
    Forbidden,

    #[error("Already on the waitlist for this event")]
    AlreadyOnWaitlist,

    #[error("Nobody is waiting for this event")]
    WaitlistEmpty,

    #[error("The offer has expired")]
    OfferExpired,

    #[error("Entry is no longer waiting")]
    NotWaiting,

    #[error("Entry has no open offer")]
    NotOffered,

    #[error("Offer window of {0} hours is out of range")]
    InvalidOfferWindow(u32),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl WaitlistError {
    /// Stable machine-readable identifier, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::AlreadyOnWaitlist => "already_on_waitlist",
            Self::WaitlistEmpty => "waitlist_empty",
            Self::OfferExpired => "offer_expired",
            Self::NotWaiting => "not_waiting",
            Self::NotOffered => "not_offered",
            Self::InvalidOfferWindow(_) => "invalid_offer_window",
            Self::Storage(_) => "storage_error",
        }
    }
}
