use serde::{Deserialize, Serialize};

use crate::models::EventRecord;

/// Transient search/club selection owned by one dashboard view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_term: String,
    pub selected_club_id: Option<String>,
}

impl FilterState {
    pub fn new(search_term: impl Into<String>, selected_club_id: Option<String>) -> Self {
        Self {
            search_term: search_term.into(),
            // empty club_id means "show all"
            selected_club_id: selected_club_id.filter(|id| !id.is_empty()),
        }
    }

    pub fn has_club(&self) -> bool {
        self.selected_club_id.is_some()
    }

    pub(crate) fn matcher(&self) -> EventMatcher<'_> {
        EventMatcher {
            needle: self.search_term.to_lowercase(),
            club_id: self.selected_club_id.as_deref(),
        }
    }

    /// Stable filter: keeps input order, never re-sorts.
    pub fn apply<'a>(&self, events: &'a [EventRecord]) -> Vec<&'a EventRecord> {
        let matcher = self.matcher();
        events.iter().filter(|event| matcher.matches(event)).collect()
    }
}

/// A [`FilterState`] with the search term lower-cased once.
#[derive(Debug, Clone)]
pub(crate) struct EventMatcher<'a> {
    needle: String,
    club_id: Option<&'a str>,
}

impl EventMatcher<'_> {
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.matches_text(event) && self.matches_club(event)
    }

    fn matches_text(&self, event: &EventRecord) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        event.title.to_lowercase().contains(&self.needle)
            || event
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&self.needle))
    }

    fn matches_club(&self, event: &EventRecord) -> bool {
        match self.club_id {
            None => true,
            Some(club_id) => event.club_id == club_id,
        }
    }
}
