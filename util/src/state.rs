//! Application state container shared across Axum route handlers.
//!
//! The state carries the persistence layer as an explicit capability rather
//! than a bare connection: when the database could not be reached at startup
//! the server still boots, guards fall back to the degraded-mode sentinel
//! token, and handlers decide per operation whether they can answer.

use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Availability of the persistence layer, resolved once at startup.
pub enum Persistence {
    Available(DatabaseConnection),
    Unavailable,
}

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    persistence: Arc<Persistence>,
}

impl AppState {
    pub fn new(persistence: Persistence) -> Self {
        Self {
            persistence: Arc::new(persistence),
        }
    }

    /// Convenience constructor for the common healthy case.
    pub fn with_db(db: DatabaseConnection) -> Self {
        Self::new(Persistence::Available(db))
    }

    /// State for a server whose database could not be reached.
    pub fn unavailable() -> Self {
        Self::new(Persistence::Unavailable)
    }

    /// Returns the database connection if the persistence layer is reachable.
    ///
    /// Handlers treat `None` as degraded mode: reads may serve the fixed
    /// mock dataset, writes answer 503.
    pub fn db(&self) -> Option<&DatabaseConnection> {
        match self.persistence.as_ref() {
            Persistence::Available(db) => Some(db),
            Persistence::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.persistence.as_ref(), Persistence::Available(_))
    }
}

#[cfg(test)]
mod tests {
    use super::AppState;

    #[test]
    fn unavailable_state_has_no_connection() {
        let state = AppState::unavailable();
        assert!(!state.is_available());
        assert!(state.db().is_none());
    }
}
