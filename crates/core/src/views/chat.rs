//! Conversation with the active session.
//!
//! The message list is append-only while a conversation is open. It is rebuilt from the
//! backend history whenever the view is attached to a session and cleared when a new
//! conversation is started.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    api::{DEFAULT_HISTORY_LIMIT, VideoApi},
    controller::ControllerEvent,
    error::Result,
    identity::IdentityStore,
    storage::KeyValueStore,
    types::{ChatMessage, ConversationHistory, ConversationId, QueryReply, SessionId, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, Ticket, ViewRequest},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatRequest {
    History {
        conversation: ConversationId,
        limit: u32,
    },
    Send {
        session: SessionId,
        conversation: ConversationId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    History(ConversationHistory),
    Reply(QueryReply),
}

#[async_trait]
impl ViewRequest for ChatRequest {
    type Output = ChatResponse;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<ChatResponse> {
        match self {
            ChatRequest::History {
                conversation,
                limit,
            } => api
                .conversation_history(user, conversation, *limit)
                .await
                .map(ChatResponse::History),
            ChatRequest::Send {
                session,
                conversation,
                message,
            } => api
                .converse(user, session, conversation, message)
                .await
                .map(ChatResponse::Reply),
        }
    }
}

#[derive(Default)]
pub struct ChatView {
    pub input: String,
    conversation: Option<ConversationId>,
    messages: Vec<ChatMessage>,
    last_reply: Option<QueryReply>,
    last_sent: Option<String>,
    slot: RequestSlot<ChatResponse>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<ChatResponse> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Search hits and key points attached to the latest answer
    pub fn last_reply(&self) -> Option<&QueryReply> {
        self.last_reply.as_ref()
    }

    /// Derives the conversation for the bound session and starts loading its history.
    pub fn attach<S: KeyValueStore>(
        &mut self,
        identity: &IdentityStore<S>,
    ) -> Result<Option<Pending<ChatRequest>>> {
        let Some(session) = self.slot.session().cloned() else {
            self.conversation = None;
            return Ok(None);
        };

        let conversation = identity.conversation_id(&session)?;
        if self.conversation.as_ref() != Some(&conversation) {
            self.messages.clear();
            self.last_reply = None;
            self.last_sent = None;
        }
        self.conversation = Some(conversation.clone());
        self.slot.reset();

        let ticket = self.slot.begin();
        Ok(ticket.map(|ticket| Pending {
            ticket,
            request: ChatRequest::History {
                conversation,
                limit: DEFAULT_HISTORY_LIMIT,
            },
        }))
    }

    /// Issues a fresh conversation id for the bound session and clears the thread.
    pub fn start_new_conversation<S: KeyValueStore>(
        &mut self,
        identity: &IdentityStore<S>,
    ) -> Result<Option<ConversationId>> {
        let Some(session) = self.slot.session().cloned() else {
            return Ok(None);
        };
        let conversation = identity.new_conversation(&session)?;
        self.slot.reset();
        self.messages.clear();
        self.last_reply = None;
        self.last_sent = None;
        self.input.clear();
        self.conversation = Some(conversation.clone());
        Ok(Some(conversation))
    }

    /// Shows the user's message immediately and sends it.
    pub fn begin_send(&mut self) -> Option<Pending<ChatRequest>> {
        let message = self.input.trim().to_string();
        if message.is_empty() {
            return None;
        }
        let pending = self.send(message.clone())?;
        self.messages.push(ChatMessage::user(message.clone()));
        self.last_sent = Some(message);
        self.input.clear();
        Some(pending)
    }

    /// Resends the last message after a failure without appending it again.
    pub fn retry(&mut self) -> Option<Pending<ChatRequest>> {
        if self.slot.state().error().is_none() {
            return None;
        }
        match self.last_sent.clone() {
            Some(message) => self.send(message),
            None => self.reload_history(),
        }
    }

    fn send(&mut self, message: String) -> Option<Pending<ChatRequest>> {
        let session = self.slot.session()?.clone();
        let conversation = self.conversation.clone()?;
        let ticket = self.slot.begin()?;
        Some(Pending {
            ticket,
            request: ChatRequest::Send {
                session,
                conversation,
                message,
            },
        })
    }

    fn reload_history(&mut self) -> Option<Pending<ChatRequest>> {
        let conversation = self.conversation.clone()?;
        let ticket = self.slot.begin()?;
        Some(Pending {
            ticket,
            request: ChatRequest::History {
                conversation,
                limit: DEFAULT_HISTORY_LIMIT,
            },
        })
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<ChatResponse>) {
        if !self.slot.finish(ticket, result) {
            return;
        }
        match self.slot.state() {
            RequestState::Success(ChatResponse::History(history)) => {
                debug!(count = history.messages.len(), "restored conversation");
                self.messages = history.messages.clone();
            }
            RequestState::Success(ChatResponse::Reply(reply)) => {
                self.messages.push(ChatMessage::assistant(reply.response.clone()));
                self.last_reply = Some(reply.clone());
                self.last_sent = None;
            }
            _ => {}
        }
    }
}

impl SessionObserver for ChatView {
    fn on_event(&mut self, event: &ControllerEvent) {
        if let ControllerEvent::ActiveSessionChanged { current, .. } = event {
            if self.slot.bind(current.clone()) {
                self.conversation = None;
                self.messages.clear();
                self.last_reply = None;
                self.last_sent = None;
                self.input.clear();
            }
        }
    }
}
