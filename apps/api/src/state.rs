use std::sync::Arc;

use sqlx::PgPool;

use crate::interview::registry::SessionRegistry;
use crate::llm_client::TextModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The model behind the `TextModel` seam. Production: `LlmClient`.
    pub llm: Arc<dyn TextModel>,
    /// Live interview cycles, one lock per session.
    pub sessions: SessionRegistry,
}
