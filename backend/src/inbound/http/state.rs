//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{SessionRepository, SnippetRepository, UserRepository};
use crate::inbound::http::templates::TemplateCache;

/// Dependency bundle for HTTP handlers, immutable after startup.
#[derive(Clone)]
pub struct HttpState {
    /// Snippet storage.
    pub snippets: Arc<dyn SnippetRepository>,
    /// Account storage and authentication.
    pub users: Arc<dyn UserRepository>,
    /// Server-side session state.
    pub sessions: Arc<dyn SessionRepository>,
    /// Pre-parsed page templates.
    pub templates: Arc<TemplateCache>,
    /// Source of the current time for rendered pages.
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Bundle the ports and shared resources handlers need.
    #[must_use]
    pub fn new(
        snippets: Arc<dyn SnippetRepository>,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        templates: Arc<TemplateCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            snippets,
            users,
            sessions,
            templates,
            clock,
        }
    }
}
