use storage::services::WaitlistCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub waitlist: WaitlistCoordinator,
    /// Offer window used when the organizer does not pick one
    pub offer_hours: u32,
}
