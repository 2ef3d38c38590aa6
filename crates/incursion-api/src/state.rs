//! Shared application state for the read API.

use std::sync::Arc;

use incursion_core::{HistoryReconstructor, TrackerContext};

/// State handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    ctx: Arc<TrackerContext>,
}

impl AppState {
    /// Wrap a tracker context.
    pub const fn new(ctx: Arc<TrackerContext>) -> Self {
        Self { ctx }
    }

    /// The shared tracker context.
    pub fn context(&self) -> &TrackerContext {
        &self.ctx
    }

    /// A reconstructor over the shared context.
    pub fn history(&self) -> HistoryReconstructor<'_> {
        HistoryReconstructor::new(&self.ctx)
    }
}
