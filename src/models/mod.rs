pub mod club;
pub mod event;
pub mod user;

pub use club::ClubMembership;
pub use event::{EventRecord, EventStatus, ParticipantStats};
pub use user::{ProfileHeader, UserProfile};
