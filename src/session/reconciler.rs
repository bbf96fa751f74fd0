//! The chat turn lifecycle.
//!
//! A turn moves through `Idle -> Validating -> Sending -> Streaming ->
//! Finalizing -> Idle`. Gating failures return to `Idle` before anything is
//! sent; an abort returns to `Idle` from `Streaming` or `Finalizing` without
//! persisting the turn.

use super::api::{AccountApi, ApiClient, ChatTransport, SessionStore, UsageMeter};
use super::compose::{AttachmentFile, compose_user_message, read_attachments, validate_attachments};
use super::message::{ChatMessage, Role, SessionRecord, UsageReport, UserProfile};
use crate::error::{Result, WorkbenchError};
use crate::options::ClientConfig;
use crate::workbench::WorkbenchSession;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Validating,
    Sending,
    Streaming,
    Finalizing,
}

/// User-facing notifications raised by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SignInRequired,
    QuotaExhausted,
    /// The chat request itself failed.
    RequestFailed(String),
    /// A usage report or persistence call failed after the turn completed.
    BackgroundFailure(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SignInRequired => write!(f, "Please sign in to continue"),
            Notice::QuotaExhausted => write!(
                f,
                "You've reached your free usage limit! Upgrade now to continue."
            ),
            Notice::RequestFailed(_) => write!(f, "There was an error processing your request"),
            Notice::BackgroundFailure(message) => write!(f, "{message}"),
        }
    }
}

/// Toast surface of the host UI.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, _notice: Notice) {
        #[cfg(feature = "logging")]
        tracing::warn!(notice = %_notice, "notice");
    }
}

/// Everything the session talks to, injected once.
#[derive(Clone)]
pub struct Collaborators {
    pub account: Arc<dyn AccountApi>,
    pub usage: Arc<dyn UsageMeter>,
    pub sessions: Arc<dyn SessionStore>,
    pub transport: Arc<dyn ChatTransport>,
    pub workbench: Arc<dyn WorkbenchSession>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Wires every API collaborator to one HTTP client.
    pub fn http(
        client: ApiClient,
        workbench: Arc<dyn WorkbenchSession>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let client = Arc::new(client);
        Self {
            account: client.clone(),
            usage: client.clone(),
            sessions: client.clone(),
            transport: client,
            workbench,
            notifier,
        }
    }
}

/// Result of a completed turn.
#[derive(Debug)]
pub struct TurnReport {
    pub duration_ms: i64,
    pub usage_reported: bool,
    pub session_id: Option<String>,
    /// The fire-and-forget persistence task, if one was started.
    pub persistence: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Empty input.
    Ignored,
    /// Another turn is in flight.
    Busy,
    SignInRequired,
    QuotaExhausted,
    Aborted,
    Completed(TurnReport),
}

/// Session id derived from the first artifact.
///
/// The parts are concatenated without a separator, which keeps ids
/// compatible with stored sessions but is ambiguous when part lengths vary.
pub fn derive_session_id(artifact_id: &str, user_id: i64, artifact_time: i64) -> String {
    format!("{artifact_id}{user_id}{artifact_time}")
}

struct Inner {
    state: TurnState,
    turn: u64,
    cancel: Option<CancellationToken>,
    token: Option<String>,
    messages: Arc<Vec<ChatMessage>>,
    session_id: Option<String>,
    description: Option<String>,
    pending_files: Vec<AttachmentFile>,
}

/// One chat conversation with the agent.
pub struct ChatSession {
    config: ClientConfig,
    collab: Collaborators,
    inner: Mutex<Inner>,
    messages_tx: watch::Sender<Arc<Vec<ChatMessage>>>,
}

impl ChatSession {
    pub fn new(config: ClientConfig, collab: Collaborators) -> Self {
        let messages = Arc::new(Vec::new());
        let (messages_tx, _rx) = watch::channel(messages.clone());
        Self {
            config,
            collab,
            inner: Mutex::new(Inner {
                state: TurnState::Idle,
                turn: 0,
                cancel: None,
                token: None,
                messages,
                session_id: None,
                description: None,
                pending_files: Vec::new(),
            }),
            messages_tx,
        }
    }

    /// Resumes a stored session; its url id becomes the session id.
    pub fn resume(config: ClientConfig, collab: Collaborators, record: SessionRecord) -> Self {
        let session = Self::new(config, collab);
        {
            let mut inner = session.lock();
            inner.session_id = Some(record.url_id);
            if !record.description.is_empty() {
                inner.description = Some(record.description);
            }
            inner.messages = Arc::new(record.messages);
            session.messages_tx.send_replace(inner.messages.clone());
        }
        session
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_token(&self, token: Option<String>) {
        self.lock().token = token;
    }

    pub fn state(&self) -> TurnState {
        self.lock().state
    }

    pub fn is_loading(&self) -> bool {
        self.state() != TurnState::Idle
    }

    pub fn session_id(&self) -> Option<String> {
        self.lock().session_id.clone()
    }

    pub fn description(&self) -> Option<String> {
        self.lock().description.clone()
    }

    /// The current transcript snapshot.
    pub fn messages(&self) -> Arc<Vec<ChatMessage>> {
        self.lock().messages.clone()
    }

    pub fn subscribe_messages(&self) -> watch::Receiver<Arc<Vec<ChatMessage>>> {
        self.messages_tx.subscribe()
    }

    /// Queues files for the next message. Unsupported types reject the whole batch.
    pub fn add_files(&self, files: Vec<AttachmentFile>) -> Result<()> {
        validate_attachments(&files)?;
        self.lock().pending_files.extend(files);
        Ok(())
    }

    pub fn remove_file(&self, index: usize) {
        let mut inner = self.lock();
        if index < inner.pending_files.len() {
            inner.pending_files.remove(index);
        }
    }

    pub fn pending_files(&self) -> Vec<AttachmentFile> {
        self.lock().pending_files.clone()
    }

    /// Stops the running turn and cancels its sandbox actions.
    ///
    /// A turn aborted while finalizing is not persisted.
    pub fn abort(&self) {
        {
            let mut inner = self.lock();
            if let Some(cancel) = inner.cancel.take() {
                cancel.cancel();
            }
            if inner.state != TurnState::Idle {
                // detaches the running turn from the session state
                inner.turn += 1;
                inner.state = TurnState::Idle;
            }
        }
        self.collab.workbench.abort_all_actions();

        #[cfg(feature = "logging")]
        tracing::debug!("chat turn aborted");
    }

    /// Runs one turn for `input`.
    pub async fn send(&self, input: &str) -> Result<SendOutcome> {
        if input.is_empty() {
            return Ok(SendOutcome::Ignored);
        }
        let turn = {
            let mut inner = self.lock();
            if inner.state != TurnState::Idle {
                return Ok(SendOutcome::Busy);
            }
            inner.state = TurnState::Validating;
            inner.turn += 1;
            inner.turn
        };
        let started = Utc::now();

        let result = self.run_turn(input, turn, started).await;

        let mut inner = self.lock();
        if inner.turn == turn {
            inner.state = TurnState::Idle;
            inner.cancel = None;
        }
        result
    }

    fn set_state(&self, turn: u64, state: TurnState) {
        let mut inner = self.lock();
        if inner.turn == turn {
            inner.state = state;
        }
    }

    async fn run_turn(&self, input: &str, turn: u64, started: DateTime<Utc>) -> Result<SendOutcome> {
        let Some(token) = self.lock().token.clone() else {
            self.collab.notifier.notify(Notice::SignInRequired);
            return Ok(SendOutcome::SignInRequired);
        };
        let profile = match self.collab.account.me(&token).await {
            Ok(profile) => profile,
            Err(WorkbenchError::AuthRequired) => {
                self.collab.notifier.notify(Notice::SignInRequired);
                return Ok(SendOutcome::SignInRequired);
            }
            Err(e) => return Err(e),
        };
        if profile.user_plan.is_exhausted() {
            self.collab.notifier.notify(Notice::QuotaExhausted);
            return Ok(SendOutcome::QuotaExhausted);
        }

        self.set_state(turn, TurnState::Sending);
        let workbench = &self.collab.workbench;
        workbench.save_all_files().await?;

        let modifications = workbench.file_modifications();
        let message = match &modifications {
            Some(modifications) => {
                compose_user_message(&self.config, input, Some(modifications), Vec::new())
            }
            None => {
                let files = self.pending_files();
                let attachments = read_attachments(&files).await?;
                compose_user_message(&self.config, input, None, attachments)
            }
        };

        let cancel = CancellationToken::new();
        {
            let mut inner = self.lock();
            if inner.turn != turn {
                return Ok(SendOutcome::Aborted);
            }
            inner.pending_files.clear();
            inner.cancel = Some(cancel.clone());
            inner.state = TurnState::Streaming;
        }
        let history = self.push_message(message);
        if modifications.is_some() {
            workbench.reset_file_modifications();
        }

        let stream = tokio::select! {
            _ = cancel.cancelled() => return Ok(SendOutcome::Aborted),
            stream = self.collab.transport.stream_chat(&token, &history) => stream,
        };
        let mut stream = match stream {
            Ok(stream) => stream,
            Err(e) => return Err(self.request_failed(e)),
        };

        let mut reply: Option<ChatMessage> = None;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(SendOutcome::Aborted),
                next = stream.next() => match next {
                    Some(Ok(delta)) => {
                        let first = reply.is_none();
                        let message = reply.get_or_insert_with(|| ChatMessage::assistant(""));
                        message.content.push_str(&delta);
                        self.publish_reply(message.clone(), first);
                    }
                    Some(Err(e)) => return Err(self.request_failed(e)),
                    None => break,
                },
            }
        }

        #[cfg(feature = "logging")]
        tracing::debug!("finished streaming");

        self.set_state(turn, TurnState::Finalizing);
        match self.finalize(turn, &cancel, &token, &profile, started).await {
            Some(report) => Ok(SendOutcome::Completed(report)),
            None => Ok(SendOutcome::Aborted),
        }
    }

    fn request_failed(&self, error: WorkbenchError) -> WorkbenchError {
        #[cfg(feature = "logging")]
        tracing::error!(error = %error, "chat request failed");
        self.collab
            .notifier
            .notify(Notice::RequestFailed(error.to_string()));
        error
    }

    /// Appends a message and returns the new transcript snapshot.
    fn push_message(&self, message: ChatMessage) -> Arc<Vec<ChatMessage>> {
        let mut inner = self.lock();
        let mut messages = (*inner.messages).clone();
        messages.push(message);
        inner.messages = Arc::new(messages);
        self.messages_tx.send_replace(inner.messages.clone());
        inner.messages.clone()
    }

    fn publish_reply(&self, reply: ChatMessage, first: bool) {
        if first {
            self.push_message(reply);
            return;
        }
        let mut inner = self.lock();
        let mut messages = (*inner.messages).clone();
        match messages.last_mut() {
            Some(last) if last.role == Role::Assistant => *last = reply,
            _ => messages.push(reply),
        }
        inner.messages = Arc::new(messages);
        self.messages_tx.send_replace(inner.messages.clone());
    }

    /// Reports usage and hands the turn to persistence.
    ///
    /// Returns `None` when the turn was aborted while finalizing; nothing is
    /// persisted in that case.
    async fn finalize(
        &self,
        turn: u64,
        cancel: &CancellationToken,
        token: &str,
        profile: &UserProfile,
        started: DateTime<Utc>,
    ) -> Option<TurnReport> {
        let finished = Utc::now();
        let duration_ms = (finished - started).num_milliseconds();

        let report = UsageReport {
            chat_duration: duration_ms,
        };
        let usage = tokio::select! {
            _ = cancel.cancelled() => return None,
            usage = self.collab.usage.report_usage(token, &report) => usage,
        };
        let usage_reported = match usage {
            Ok(()) => true,
            Err(_e) => {
                #[cfg(feature = "logging")]
                tracing::error!(error = %_e, "failed to report chat usage");
                self.collab.notifier.notify(Notice::BackgroundFailure(format!(
                    "Failed to report usage: {_e}"
                )));
                false
            }
        };

        let artifact = self
            .collab
            .workbench
            .first_artifact()
            .filter(|a| !a.id.is_empty() && !a.title.is_empty());

        let (session_id, description, messages) = {
            let mut inner = self.lock();
            if inner.turn != turn {
                return None;
            }
            if let Some(artifact) = artifact {
                if inner.session_id.is_none() {
                    let id = derive_session_id(&artifact.id, profile.user.id, artifact.time);

                    #[cfg(feature = "logging")]
                    tracing::info!(session_id = %id, "assigned session id");

                    inner.session_id = Some(id);
                }
                if inner.description.is_none() {
                    inner.description = Some(artifact.title);
                }
            }
            (
                inner.session_id.clone(),
                inner.description.clone(),
                persisted_tail(&inner.messages, finished),
            )
        };

        let persistence = match (&session_id, description) {
            (Some(url_id), Some(description)) => {
                let record = SessionRecord {
                    url_id: url_id.clone(),
                    description,
                    timestamp: finished,
                    messages,
                };
                Some(self.spawn_persist(token.to_string(), record))
            }
            _ => None,
        };

        Some(TurnReport {
            duration_ms,
            usage_reported,
            session_id,
            persistence,
        })
    }

    fn spawn_persist(&self, token: String, record: SessionRecord) -> JoinHandle<()> {
        let sessions = self.collab.sessions.clone();
        let notifier = self.collab.notifier.clone();
        tokio::spawn(async move {
            if let Err(_e) = sessions.create_session(&token, &record).await {
                #[cfg(feature = "logging")]
                tracing::error!(error = %_e, url_id = %record.url_id, "failed to persist session");
                notifier.notify(Notice::BackgroundFailure(format!(
                    "Failed to save chat: {_e}"
                )));
            }
        })
    }
}

/// The last user/assistant pair as persisted: the user message stamped with
/// `now`, the assistant message without attachment payloads.
fn persisted_tail(messages: &[ChatMessage], now: DateTime<Utc>) -> Vec<ChatMessage> {
    let start = messages.len().saturating_sub(2);
    messages[start..]
        .iter()
        .cloned()
        .map(|mut message| {
            match message.role {
                Role::User => message.created_at = Some(now),
                Role::Assistant => message.experimental_attachments.clear(),
            }
            message
        })
        .collect()
}
