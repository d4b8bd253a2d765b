//! Fixture session resolver.

use std::collections::HashMap;

use async_trait::async_trait;
use lectern_core::session::{SessionContext, SessionError, SessionResolver};

/// Resolver answering from pre-built session contexts keyed by activity
/// id. Unknown activities resolve to the same error a real host raises.
#[derive(Default)]
pub struct StaticSessionResolver {
    sessions: HashMap<i64, SessionContext>,
}

impl StaticSessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the session context returned for its activity's id.
    pub fn add_session(&mut self, session: SessionContext) {
        self.sessions.insert(session.activity.id, session);
    }
}

#[async_trait]
impl SessionResolver for StaticSessionResolver {
    async fn resolve(&self, activity_id: i64) -> Result<SessionContext, SessionError> {
        self.sessions
            .get(&activity_id)
            .cloned()
            .ok_or(SessionError::UnknownActivity { id: activity_id })
    }
}
