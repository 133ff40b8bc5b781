//! Best-effort agent roster lookup.

use tracing::debug;

use crate::backend::RetrievalBackend;
use crate::model::AgentRoster;

/// Fetch the backend's agent roster. Any failure yields an empty
/// roster; the roster is informational and never blocks the session.
pub async fn fetch_roster<B: RetrievalBackend>(backend: &B) -> AgentRoster {
    match backend.agents().await {
        Ok(roster) => roster,
        Err(e) => {
            debug!(error = %e, "agent roster unavailable");
            AgentRoster::new()
        }
    }
}
