//! Shared context for API handlers.

use std::sync::Arc;

use crate::core_state::CoreState;

/// State handed to every endpoint handler.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}
