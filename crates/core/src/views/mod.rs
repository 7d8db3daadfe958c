//! Per-tab presentation state.
//!
//! Every view follows the same machine: `Idle -> Loading -> Success | Failed`, re-entered from
//! `Failed` by an explicit retry and reset to `Idle` whenever the active session changes. Starting a
//! request hands out a [`Ticket`]; completing with a ticket issued before the last reset is a no-op.

pub mod chat;
pub mod document;
pub mod processor;
pub mod search;
pub mod sessions;
pub mod snippet;
pub mod transcript;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    api::VideoApi,
    controller::ControllerEvent,
    error::{ApiError, Result},
    types::{SessionId, UserId},
};

pub use chat::{ChatRequest, ChatResponse, ChatView};
pub use document::{DocumentRequest, DocumentView};
pub use processor::{ProcessRequest, ProcessorView};
pub use search::{SearchRequest, SearchView};
pub use sessions::{DeleteRequest, SessionListView, SessionRow};
pub use snippet::{SnippetMode, SnippetOutcome, SnippetRequest, SnippetView};
pub use transcript::{TranscriptRequest, TranscriptView};

/// Error as shown inline in a view
#[derive(Debug, Clone, PartialEq)]
pub struct ViewError {
    pub message: String,
    pub connectivity: bool,
}

impl From<&ApiError> for ViewError {
    fn from(err: &ApiError) -> Self {
        Self {
            message: err.to_string(),
            connectivity: err.is_connectivity(),
        }
    }
}

impl From<ApiError> for ViewError {
    fn from(err: ApiError) -> Self {
        Self::from(&err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T> {
    Idle,
    Loading,
    Success(T),
    Failed(ViewError),
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            RequestState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ViewError> {
        match self {
            RequestState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Identifies one started request: the session it was issued for and the slot generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub session: Option<SessionId>,
    generation: u64,
}

/// A started request, owned so it can be moved into a spawned future.
#[derive(Debug, Clone)]
pub struct Pending<R> {
    pub ticket: Ticket,
    pub request: R,
}

impl<R: ViewRequest> Pending<R> {
    pub async fn execute(self, api: &dyn VideoApi, user: &UserId) -> (Ticket, Result<R::Output>) {
        let result = self.request.execute(api, user).await;
        (self.ticket, result)
    }
}

/// Owned inputs for one backend call.
#[async_trait]
pub trait ViewRequest: Send + Sync {
    type Output: Send;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<Self::Output>;
}

/// Receives controller notifications; registered by the workspace for every view.
pub trait SessionObserver {
    fn on_event(&mut self, event: &ControllerEvent);
}

/// Holds one view's request state, bound to the session it renders.
#[derive(Debug)]
pub struct RequestSlot<T> {
    state: RequestState<T>,
    session: Option<SessionId>,
    generation: u64,
}

impl<T> Default for RequestSlot<T> {
    fn default() -> Self {
        Self {
            state: RequestState::Idle,
            session: None,
            generation: 0,
        }
    }
}

impl<T> RequestSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Rebinds to `session`; a different session resets to `Idle`.
    pub fn bind(&mut self, session: Option<SessionId>) -> bool {
        if self.session == session {
            return false;
        }
        self.session = session;
        self.reset();
        true
    }

    pub fn reset(&mut self) {
        self.state = RequestState::Idle;
        self.generation += 1;
    }

    /// Moves to `Loading`. Returns `None` while a request is already outstanding.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.is_loading() {
            return None;
        }
        self.state = RequestState::Loading;
        Some(Ticket {
            session: self.session.clone(),
            generation: self.generation,
        })
    }

    pub fn fail(&mut self, err: ViewError) {
        self.state = RequestState::Failed(err);
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation && ticket.session == self.session
    }

    /// Stores `result` unless the ticket is stale. Returns whether it was stored.
    pub fn finish(&mut self, ticket: &Ticket, result: Result<T>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket_session = ?ticket.session,
                current_session = ?self.session,
                "discarding stale response"
            );
            return false;
        }
        self.state = match result {
            Ok(value) => RequestState::Success(value),
            Err(err) => RequestState::Failed(ViewError::from(&err)),
        };
        true
    }
}
