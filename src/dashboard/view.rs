use serde::Serialize;

use super::{AggregateCounters, CounterScope, FilterState, RenderState};
use crate::feed::FeedView;
use crate::identity::Identity;
use crate::models::{ClubMembership, EventRecord};

/// Explicit inputs a dashboard is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardContext {
    pub identity: Identity,
}

impl DashboardContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCard {
    #[serde(flatten)]
    pub event: EventRecord,
    pub initial: String,
    pub location_label: String,
    pub date_label: String,
}

impl From<&EventRecord> for EventCard {
    fn from(event: &EventRecord) -> Self {
        EventCard {
            initial: event.title.chars().next().map(String::from).unwrap_or_default(),
            location_label: event.location_label().to_string(),
            date_label: event.start_date.format("%b %-d, %Y").to_string(),
            event: event.clone(),
        }
    }
}

/// Everything the organizer dashboard needs to render one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    #[serde(flatten)]
    pub state: RenderState,
    pub events: Vec<EventCard>,
    pub counters: AggregateCounters,
    pub counter_scope: CounterScope,
    pub counter_label: &'static str,
    pub clubs: Vec<ClubMembership>,
    /// The organizer administers no club yet; a call to action, not an error.
    pub no_clubs: bool,
    pub filter: FilterState,
}

impl DashboardView {
    /// Pure derivation from the controller state and the current filter.
    ///
    /// A snapshot that belongs to another identity is never rendered; the view
    /// is then `Idle` with no events.
    pub fn build(context: &DashboardContext, feed: &FeedView, filter: &FilterState) -> Self {
        let ours = feed.identity.as_ref() == Some(&context.identity);
        let snapshot = feed.snapshot.as_deref().filter(|_| ours);

        let events: &[EventRecord] = snapshot.map(|s| s.events.as_slice()).unwrap_or_default();
        let visible = filter.apply(events);
        let counters = AggregateCounters::from_events(visible.iter().copied());

        let counter_scope = if filter.has_club() {
            CounterScope::SelectedClub
        } else {
            CounterScope::AllClubs
        };

        let state = if ours {
            RenderState::resolve(&feed.load, visible.len())
        } else {
            RenderState::Idle
        };

        DashboardView {
            state,
            events: visible.into_iter().map(EventCard::from).collect(),
            counters,
            counter_scope,
            counter_label: counter_scope.label(),
            clubs: snapshot.map(|s| s.user_clubs.clone()).unwrap_or_default(),
            no_clubs: snapshot.is_some_and(|s| s.user_clubs.is_empty()),
            filter: filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::{event, with_stats};
    use crate::dashboard::LoadState;
    use crate::feed::FeedSnapshot;
    use std::sync::Arc;

    fn feed(load: LoadState, events: Vec<EventRecord>, clubs: Vec<ClubMembership>) -> FeedView {
        FeedView {
            identity: Some(Identity::new("u1")),
            load,
            snapshot: Some(Arc::new(FeedSnapshot { events, user_clubs: clubs })),
        }
    }

    fn context() -> DashboardContext {
        DashboardContext::new(Identity::new("u1"))
    }

    fn club(id: &str) -> ClubMembership {
        ClubMembership { id: id.to_string(), name: format!("Club {}", id) }
    }

    fn sample_events() -> Vec<EventRecord> {
        vec![
            with_stats(event("e1", "AI Workshop", "c1"), 10, 7, 1, 2),
            with_stats(event("e2", "Cultural Fest", "c2"), 5, 5, 0, 0),
        ]
    }

    #[test]
    fn fest_search_scenario() {
        let feed = feed(LoadState::Ready, sample_events(), vec![club("c1"), club("c2")]);
        let view = DashboardView::build(&context(), &feed, &FilterState::new("fest", None));

        assert_eq!(view.state, RenderState::HasResults);
        assert_eq!(view.events.len(), 1);
        assert_eq!(view.events[0].event.title, "Cultural Fest");
        assert_eq!(
            view.counters,
            AggregateCounters {
                total_events: 1,
                total_participants: 5,
                total_registered: 5,
                total_attended: 0,
            }
        );
        assert_eq!(view.counter_scope, CounterScope::AllClubs);
        assert!(!view.no_clubs);
    }

    #[test]
    fn club_without_events_is_empty_not_failed() {
        let feed = feed(LoadState::Ready, sample_events(), vec![club("c1"), club("c3")]);
        let view = DashboardView::build(&context(), &feed, &FilterState::new("", Some("c3".to_string())));

        assert_eq!(view.state, RenderState::Empty);
        assert!(view.events.is_empty());
        assert_eq!(view.counters, AggregateCounters::default());
        assert_eq!(view.counter_scope, CounterScope::SelectedClub);
        assert_eq!(view.counter_label, "For selected club");
    }

    #[test]
    fn club_filter_does_not_touch_loading_or_failed() {
        let filter = FilterState::new("", Some("c3".to_string()));

        let loading = feed(LoadState::Loading, sample_events(), vec![club("c1")]);
        assert_eq!(DashboardView::build(&context(), &loading, &filter).state, RenderState::Loading);

        let failed = feed(
            LoadState::Failed { message: "offline".to_string() },
            sample_events(),
            vec![club("c1")],
        );
        assert_eq!(
            DashboardView::build(&context(), &failed, &filter).state,
            RenderState::Failed { message: "offline".to_string() }
        );
    }

    #[test]
    fn no_clubs_flag_needs_a_snapshot() {
        let with_snapshot = feed(LoadState::Ready, Vec::new(), Vec::new());
        assert!(DashboardView::build(&context(), &with_snapshot, &FilterState::default()).no_clubs);

        let loading = FeedView {
            identity: Some(Identity::new("u1")),
            load: LoadState::Loading,
            snapshot: None,
        };
        let view = DashboardView::build(&context(), &loading, &FilterState::default());
        assert!(!view.no_clubs);
        assert_eq!(view.counters, AggregateCounters::default());
    }

    #[test]
    fn foreign_snapshot_is_not_rendered() {
        let feed = feed(LoadState::Ready, sample_events(), vec![club("c1")]);
        let other = DashboardContext::new(Identity::new("u2"));
        let view = DashboardView::build(&other, &feed, &FilterState::default());

        assert_eq!(view.state, RenderState::Idle);
        assert!(view.events.is_empty());
        assert!(view.clubs.is_empty());
    }

    #[test]
    fn card_display_fields() {
        let mut record = event("e1", "hackathon", "c1");
        record.location = None;
        let card = EventCard::from(&record);
        assert_eq!(card.initial, "h");
        assert_eq!(card.location_label, "Location TBD");
        assert_eq!(card.date_label, "Dec 15, 2024");
    }

    #[test]
    fn view_serializes_state_inline() {
        let feed = feed(LoadState::Ready, sample_events(), vec![club("c1")]);
        let view = DashboardView::build(&context(), &feed, &FilterState::default());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["state"], "has_results");
        assert_eq!(json["counters"]["total_participants"], 15);
        assert_eq!(json["events"][0]["title"], "AI Workshop");
        assert_eq!(json["events"][0]["participant_stats"]["registered"], 7);
    }
}
