//! dashboard.rs
//!
//! Organizer and student dashboard endpoints.
//!
//! - Organizer: events of the caller's clubs with filters and counters.
//! - Explicit feed refresh (retry after a failure).
//! - Student: profile header.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::dashboard::{DashboardContext, DashboardView, FilterState};
use crate::error::ApiError;
use crate::identity::Identity;
use crate::models::ProfileHeader;
use crate::profile::load_profile_or_default;
use crate::session::SessionKey;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/dashboard/organizer", get(organizer_dashboard))
        .route("/dashboard/organizer/refresh", post(refresh_organizer_dashboard))
        .route("/dashboard/session", delete(end_session))
        .route("/dashboard/student", get(student_dashboard))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DashboardQuery {
    pub search: Option<String>,
    #[validate(length(max = 64))]
    pub club_id: Option<String>,
}

impl DashboardQuery {
    fn into_filter(self, max_search_len: usize) -> Result<FilterState, ApiError> {
        self.validate()?;
        let search = self.search.unwrap_or_default();
        if search.chars().count() > max_search_len {
            return Err(ApiError::Validation(format!(
                "search must be at most {} characters",
                max_search_len
            )));
        }
        Ok(FilterState::new(search, self.club_id))
    }
}

#[derive(Debug, Serialize)]
pub struct OrganizerDashboardResponse {
    pub profile: ProfileHeader,
    pub dashboard: DashboardView,
}

#[derive(Debug, Serialize)]
pub struct StudentDashboardResponse {
    pub profile: ProfileHeader,
}

/// GET /api/dashboard/organizer
///
/// Loads the feed on the session's first request; a failure stays until an explicit refresh.
async fn organizer_dashboard(
    State(state): State<Arc<AppState>>,
    session: SessionKey,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<OrganizerDashboardResponse>, ApiError> {
    let filter = params.into_filter(state.config.dashboard.max_search_len)?;
    let controller = state.sessions.controller(&session);
    let identity = session.owner;

    let (feed, profile) = futures::join!(
        controller.ensure_loaded(identity.clone()),
        load_profile_or_default(state.profiles.as_ref(), &identity.user_id)
    );

    let context = DashboardContext::new(identity);
    Ok(Json(OrganizerDashboardResponse {
        profile: profile.header(),
        dashboard: DashboardView::build(&context, &feed, &filter),
    }))
}

/// POST /api/dashboard/organizer/refresh
async fn refresh_organizer_dashboard(
    State(state): State<Arc<AppState>>,
    session: SessionKey,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<OrganizerDashboardResponse>, ApiError> {
    let filter = params.into_filter(state.config.dashboard.max_search_len)?;
    let controller = state.sessions.controller(&session);
    let identity = session.owner;

    let (feed, profile) = futures::join!(
        controller.refresh(identity.clone()),
        load_profile_or_default(state.profiles.as_ref(), &identity.user_id)
    );

    tracing::info!("dashboard refreshed for {}: {:?}", identity, feed.load);

    let context = DashboardContext::new(identity);
    Ok(Json(OrganizerDashboardResponse {
        profile: profile.header(),
        dashboard: DashboardView::build(&context, &feed, &filter),
    }))
}

/// DELETE /api/dashboard/session
async fn end_session(
    State(state): State<Arc<AppState>>,
    session: SessionKey,
) -> StatusCode {
    if !state.sessions.end(&session) {
        tracing::debug!("end_session: no active session {}", session);
    }
    StatusCode::NO_CONTENT
}

/// GET /api/dashboard/student
async fn student_dashboard(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Json<StudentDashboardResponse> {
    let profile = load_profile_or_default(state.profiles.as_ref(), &identity.user_id).await;
    Json(StudentDashboardResponse {
        profile: profile.header(),
    })
}
