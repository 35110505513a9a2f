pub mod waitlist;

pub use waitlist::{Actor, WaitlistCoordinator};
