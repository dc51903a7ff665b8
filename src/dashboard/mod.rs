//! Organizer dashboard view-model: filtering, counters and the render state tag.

pub mod aggregate;
pub mod filter;
pub mod state;
pub mod view;

pub use aggregate::{AggregateCounters, CounterScope};
pub use filter::FilterState;
pub use state::{LoadState, RenderState};
pub use view::{DashboardContext, DashboardView, EventCard};
