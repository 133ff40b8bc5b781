//! The session state machine.
//!
//! Authentication moves `Unknown → Checking → {Authenticated,
//! Unauthenticated}`. Once authenticated, the document pipeline moves
//! `NotReady → Processing → Ready`, with `Ready → NotReady` on reopen
//! and a full reset on new chat.
//!
//! All state lives in one `SessionState` behind a mutex that is never
//! held across a network round-trip. Operations that suspend record the
//! session epoch before dispatch; `new_chat` and `logout` bump it, and a
//! response that resolves under an older epoch is dropped. Identity has
//! its own generation, bumped by `login` and `logout`, so a slow auth
//! check cannot undo a newer login.

use std::time::Duration;

use neurofetch_core::models::user::UserProfile;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::backend::{HttpRetrievalBackend, RetrievalBackend};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::gateway::{GatewayClient, HttpGatewayClient};
use crate::model::{
    AgentRoster, AuthState, Message, QueryAnswer, Readiness, Role, SessionSnapshot, StagedFile,
};
use crate::roster::fetch_roster;
use crate::token_store::{FileTokenStore, TokenStore};

pub const READY_TEXT: &str = "Documents processed successfully! You can now ask questions.";
pub const INGEST_REJECTED_TEXT: &str = "Failed to process documents. Please try again.";
pub const INGEST_UNREACHABLE_TEXT: &str = "Error processing documents. Please check your connection.";
pub const NOT_READY_TEXT: &str =
    "Please process your documents first using the sidebar before asking questions.";
pub const QUERY_UNREACHABLE_TEXT: &str = "Error: Could not reach backend.";
pub const QUERY_MALFORMED_TEXT: &str = "Error: The backend returned an unreadable response.";

/// How a `send_query` call ended. Backend failures are already
/// recorded in the transcript when this is returned.
#[derive(Debug)]
pub enum QueryOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// Documents were not ready; a system notice was appended and the
    /// backend was not contacted.
    NotReady,
    /// The assistant reply was appended with this `seq`.
    Answered { seq: u64 },
    /// The backend failed; a system message describing it was appended.
    Failed(SessionError),
    /// The session was reset while the query was in flight.
    Discarded,
}

/// The single mutable aggregate owned by a controller.
#[derive(Debug)]
pub(crate) struct SessionState {
    auth: AuthState,
    user: Option<UserProfile>,
    transcript: Vec<Message>,
    staged: Vec<StagedFile>,
    readiness: Readiness,
    /// Queries of the current epoch awaiting the backend.
    in_flight_queries: usize,
    active_agent: Option<String>,
    roster: AgentRoster,
    epoch: u64,
    /// Bumped whenever the persisted identity changes.
    auth_generation: u64,
    next_seq: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth: AuthState::Unknown,
            user: None,
            transcript: Vec::new(),
            staged: Vec::new(),
            readiness: Readiness::NotReady,
            in_flight_queries: 0,
            active_agent: None,
            roster: AgentRoster::new(),
            epoch: 0,
            auth_generation: 0,
            next_seq: 1,
        }
    }
}

impl SessionState {
    fn ensure_authenticated(&self) -> Result<(), SessionError> {
        match self.auth {
            AuthState::Authenticated => Ok(()),
            _ => Err(SessionError::Unauthenticated),
        }
    }

    /// `Ready → NotReady`, so more documents can be added.
    fn reopen(&mut self) -> Result<(), SessionError> {
        match self.readiness {
            Readiness::Processing => Err(SessionError::AlreadyProcessing),
            Readiness::Ready => {
                debug!("reopening document pipeline");
                self.readiness = Readiness::NotReady;
                Ok(())
            }
            Readiness::NotReady => Ok(()),
        }
    }

    fn append(&mut self, role: Role, content: impl Into<String>) -> &mut Message {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.transcript.push(Message {
            seq,
            role,
            content: content.into(),
            agent_name: None,
            trace: None,
            in_reply_to: None,
            agents_status: false,
        });
        // Just pushed.
        let last = self.transcript.len() - 1;
        &mut self.transcript[last]
    }

    fn append_answer(&mut self, asked: u64, answer: QueryAnswer) -> u64 {
        let message = self.append(Role::Assistant, answer.content);
        message.agent_name = Some(answer.agent);
        message.trace = Some(answer.trace);
        message.in_reply_to = Some(asked);
        message.seq
    }

    /// Drop the conversation and the document pipeline, invalidating
    /// anything still in flight.
    fn reset_conversation(&mut self) {
        self.transcript.clear();
        self.staged.clear();
        self.readiness = Readiness::NotReady;
        self.in_flight_queries = 0;
        self.active_agent = None;
        self.epoch += 1;
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            auth_state: self.auth,
            user: self.user.clone(),
            transcript: self.transcript.clone(),
            staged_files: self
                .staged
                .iter()
                .map(|f| (f.name.clone(), f.size))
                .collect(),
            readiness: self.readiness,
            thinking: self.in_flight_queries > 0,
            active_agent: self.active_agent.clone(),
            roster: self.roster.clone(),
        }
    }
}

/// Decrements the thinking counter however the query future ends.
struct ThinkingGuard<'a> {
    state: &'a Mutex<SessionState>,
    epoch: u64,
}

impl Drop for ThinkingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.epoch == self.epoch {
            state.in_flight_queries = state.in_flight_queries.saturating_sub(1);
        }
    }
}

/// Returns the pipeline to `NotReady` if an ingestion future is dropped
/// before its result is recorded.
struct IngestGuard<'a> {
    state: &'a Mutex<SessionState>,
    epoch: u64,
    armed: bool,
}

impl IngestGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for IngestGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if state.epoch == self.epoch && state.readiness == Readiness::Processing {
            state.readiness = Readiness::NotReady;
        }
    }
}

/// Client-held session over an authentication gateway, a retrieval
/// backend, and a persisted token.
pub struct SessionController<G, B, T> {
    gateway: G,
    backend: B,
    tokens: T,
    state: Mutex<SessionState>,
}

pub type HttpSessionController =
    SessionController<HttpGatewayClient, HttpRetrievalBackend, FileTokenStore>;

impl HttpSessionController {
    /// Wire the HTTP adapters and the file token store from config.
    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        let gateway = HttpGatewayClient::new(
            config.gateway_url.as_str(),
            Duration::from_secs(config.gateway_timeout_secs),
        )?;
        let backend = HttpRetrievalBackend::new(
            config.backend_url.as_str(),
            Duration::from_secs(config.backend_timeout_secs),
        )?;
        Ok(Self::new(gateway, backend, FileTokenStore::new(&config.token_dir)))
    }
}

impl<G, B, T> SessionController<G, B, T>
where
    G: GatewayClient,
    B: RetrievalBackend,
    T: TokenStore,
{
    pub fn new(gateway: G, backend: B, tokens: T) -> Self {
        Self {
            gateway,
            backend,
            tokens,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().snapshot()
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.lock().auth
    }

    pub fn readiness(&self) -> Readiness {
        self.state.lock().readiness
    }

    pub fn is_thinking(&self) -> bool {
        self.state.lock().in_flight_queries > 0
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.state.lock().transcript.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.lock().user.clone()
    }

    fn forget_token(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to clear persisted token");
        }
    }

    fn redirect(&self) -> AuthState {
        let mut state = self.state.lock();
        state.auth = AuthState::Unauthenticated;
        state.user = None;
        AuthState::Unauthenticated
    }

    /// Resolve the persisted token to an identity.
    ///
    /// With no token the session goes straight to `Unauthenticated`
    /// without a network call. Any verification failure clears the
    /// token.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> AuthState {
        let token = match self.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no persisted token");
                return self.redirect();
            }
            Err(e) => {
                warn!(error = %e, "failed to read persisted token");
                return self.redirect();
            }
        };

        let generation = {
            let mut state = self.state.lock();
            state.auth = AuthState::Checking;
            state.auth_generation
        };

        let verified = self.gateway.verify(&token).await;

        let mut state = self.state.lock();
        if state.auth_generation != generation {
            debug!("identity changed during auth check");
            return state.auth;
        }

        match verified {
            Ok(user) => {
                info!(user_id = %user.id, "session authenticated");
                state.auth = AuthState::Authenticated;
                state.user = Some(user);
            }
            Err(e) => {
                info!(error = %e, "persisted token rejected");
                // Under the lock so a concurrent login cannot save in between.
                self.forget_token();
                state.auth = AuthState::Unauthenticated;
                state.user = None;
            }
        }
        state.auth
    }

    /// Log in, persist the issued token, and mark the session
    /// authenticated.
    #[instrument(skip(self, secret))]
    pub async fn login(&self, email: &str, secret: &str) -> Result<UserProfile, SessionError> {
        let session = self.gateway.login(email, secret).await?;

        let mut state = self.state.lock();
        self.tokens.save(&session.token)?;
        state.auth_generation += 1;
        state.auth = AuthState::Authenticated;
        state.user = Some(session.user.clone());
        info!(user_id = %session.user.id, "logged in");
        Ok(session.user)
    }

    /// Register an account. Does not log in.
    #[instrument(skip(self, secret))]
    pub async fn signup(&self, email: &str, secret: &str) -> Result<String, SessionError> {
        self.gateway.signup(email, secret).await
    }

    /// Clear the token and end the session. Late responses are dropped.
    pub fn logout(&self) -> Result<(), SessionError> {
        let cleared = {
            let mut state = self.state.lock();
            let cleared = self.tokens.clear();
            state.reset_conversation();
            state.auth_generation += 1;
            state.auth = AuthState::Unauthenticated;
            state.user = None;
            state.roster.clear();
            cleared
        };
        info!("logged out");
        cleared
    }

    /// Stage a file for the next ingestion. Returns `false` if a file
    /// with the same name and size is already staged.
    pub fn stage_file(&self, file: StagedFile) -> Result<bool, SessionError> {
        let mut state = self.state.lock();
        state.ensure_authenticated()?;

        if state.staged.iter().any(|f| f.key() == file.key()) {
            debug!(name = %file.name, size = file.size, "file already staged");
            return Ok(false);
        }
        state.staged.push(file);
        Ok(true)
    }

    /// Remove the staged file at `index`, if there is one.
    pub fn unstage_file(&self, index: usize) -> Result<Option<StagedFile>, SessionError> {
        let mut state = self.state.lock();
        state.ensure_authenticated()?;

        if index < state.staged.len() {
            Ok(Some(state.staged.remove(index)))
        } else {
            Ok(None)
        }
    }

    /// Send every staged file to the backend as one batch.
    ///
    /// Backend failures are recorded in the transcript and leave the
    /// session `NotReady`; they are not returned as errors.
    #[instrument(skip(self))]
    pub async fn process_documents(&self) -> Result<Readiness, SessionError> {
        let (files, epoch) = {
            let mut state = self.state.lock();
            state.ensure_authenticated()?;
            if state.readiness == Readiness::Processing {
                return Err(SessionError::AlreadyProcessing);
            }
            if state.staged.is_empty() {
                return Err(SessionError::EmptySelection);
            }
            state.reopen()?;
            state.readiness = Readiness::Processing;
            (state.staged.clone(), state.epoch)
        };

        let guard = IngestGuard {
            state: &self.state,
            epoch,
            armed: true,
        };
        info!(files = files.len(), "processing documents");
        let result = self.backend.ingest(&files).await;
        guard.disarm();

        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!("discarding ingestion result from a previous session");
            return Ok(state.readiness);
        }

        match result {
            Ok(()) => {
                state.readiness = Readiness::Ready;
                state.append(Role::System, READY_TEXT).agents_status = true;
                info!("documents ready");
            }
            Err(e) => {
                warn!(error = %e, "document processing failed");
                state.readiness = Readiness::NotReady;
                let text = match e {
                    SessionError::BackendUnavailable(_) => INGEST_UNREACHABLE_TEXT,
                    _ => INGEST_REJECTED_TEXT,
                };
                state.append(Role::System, text);
            }
        }
        Ok(state.readiness)
    }

    /// Ask a question about the ingested documents.
    ///
    /// The user message is appended before dispatch. Replies are
    /// appended in completion order and carry `in_reply_to`.
    #[instrument(skip(self, text))]
    pub async fn send_query(&self, text: &str) -> Result<QueryOutcome, SessionError> {
        let question = text.trim();
        if question.is_empty() {
            return Ok(QueryOutcome::Ignored);
        }

        let (asked, epoch) = {
            let mut state = self.state.lock();
            state.ensure_authenticated()?;
            let asked = state.append(Role::User, question).seq;

            if state.readiness != Readiness::Ready {
                state.append(Role::System, NOT_READY_TEXT).in_reply_to = Some(asked);
                return Ok(QueryOutcome::NotReady);
            }

            state.active_agent = None;
            state.in_flight_queries += 1;
            (asked, state.epoch)
        };

        let thinking = ThinkingGuard {
            state: &self.state,
            epoch,
        };
        let result = self.backend.query(question).await;
        drop(thinking);

        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!(asked, "discarding answer from a previous session");
            return Ok(QueryOutcome::Discarded);
        }

        match result {
            Ok(answer) => {
                state.active_agent = Some(answer.agent.clone());
                let seq = state.append_answer(asked, answer);
                Ok(QueryOutcome::Answered { seq })
            }
            Err(e) => {
                warn!(error = %e, asked, "query failed");
                state.active_agent = None;
                let text = match &e {
                    SessionError::BackendRejected(reason) => format!("Error: {reason}"),
                    SessionError::MalformedResponse(_) => QUERY_MALFORMED_TEXT.to_string(),
                    _ => QUERY_UNREACHABLE_TEXT.to_string(),
                };
                state.append(Role::System, text).in_reply_to = Some(asked);
                Ok(QueryOutcome::Failed(e))
            }
        }
    }

    /// Clear the transcript and staged files and return to `NotReady`.
    pub fn new_chat(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.ensure_authenticated()?;
        state.reset_conversation();
        debug!("new chat");
        Ok(())
    }

    /// Leave `Ready` so more documents can be added.
    pub fn reopen(&self) -> Result<Readiness, SessionError> {
        let mut state = self.state.lock();
        state.ensure_authenticated()?;
        state.reopen()?;
        Ok(state.readiness)
    }

    /// Refresh the agent roster shown alongside the session. Never
    /// fails; an unreachable backend yields an empty roster. A roster
    /// fetched across a reset is returned but not kept.
    pub async fn refresh_roster(&self) -> AgentRoster {
        let epoch = self.state.lock().epoch;
        let roster = fetch_roster(&self.backend).await;

        let mut state = self.state.lock();
        if state.epoch == epoch {
            state.roster = roster.clone();
        } else {
            debug!("discarding roster from a previous session");
        }
        roster
    }
}
