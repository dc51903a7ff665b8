use serde::Serialize;

/// Status of the event feed for one dashboard session.
///
/// A single tagged value replaces independent `loading`/`error` flags, so a
/// session can never be loading and failed at the same time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    /// No identity has been provided yet.
    Idle,
    Loading,
    Ready,
    /// Stays here until the user asks for a retry.
    Failed { message: String },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }
}

/// Tag handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RenderState {
    Idle,
    Loading,
    Failed { message: String },
    Empty,
    HasResults,
}

impl RenderState {
    pub fn resolve(load: &LoadState, visible_events: usize) -> Self {
        match load {
            LoadState::Idle => RenderState::Idle,
            LoadState::Loading => RenderState::Loading,
            LoadState::Failed { message } => RenderState::Failed { message: message.clone() },
            LoadState::Ready if visible_events == 0 => RenderState::Empty,
            LoadState::Ready => RenderState::HasResults,
        }
    }
}
