//! Session data model: transcript messages, staged files, and the
//! states the controller moves through.

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use neurofetch_core::models::user::UserProfile;
use serde::Serialize;

/// Authentication state of the session.
///
/// `Unauthenticated` is terminal for the controller: the consumer is
/// expected to send the user back to the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthState {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    /// The consumer should navigate away to the login screen.
    pub fn is_redirected(self) -> bool {
        self == AuthState::Unauthenticated
    }
}

/// Whether ingested documents can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    NotReady,
    Processing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Insertion order within the session, starting at 1.
    pub seq: u64,
    pub role: Role,
    pub content: String,
    pub agent_name: Option<String>,
    pub trace: Option<Vec<String>>,
    /// For replies to a query: `seq` of the user message answered.
    pub in_reply_to: Option<u64>,
    /// Set on the readiness confirmation; the UI shows agent health
    /// beneath it.
    pub agents_status: bool,
}

/// A document selected for ingestion.
#[derive(Clone)]
pub struct StagedFile {
    pub name: String,
    pub size: u64,
    pub data: Bytes,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Read a file from disk, named after its final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, data))
    }

    /// Identity used for duplicate suppression.
    pub fn key(&self) -> (&str, u64) {
        (&self.name, self.size)
    }
}

impl std::fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// A successful answer from the retrieval backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    pub content: String,
    pub agent: String,
    pub trace: Vec<String>,
}

/// Agent name → status, as reported by the backend.
pub type AgentRoster = BTreeMap<String, String>;

/// Point-in-time copy of everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub auth_state: AuthState,
    pub user: Option<UserProfile>,
    pub transcript: Vec<Message>,
    /// `(name, size)` of each staged file, in staging order.
    pub staged_files: Vec<(String, u64)>,
    pub readiness: Readiness,
    /// At least one query is awaiting the backend.
    pub thinking: bool,
    pub active_agent: Option<String>,
    pub roster: AgentRoster,
}
