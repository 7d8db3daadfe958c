//! Root controller plus every feature view, wired together.
//!
//! Views never hold a reference to the controller. After each controller mutation the workspace
//! drains the controller's events into every view, then re-derives the chat conversation for the
//! newly active session.

use tracing::info;

use crate::{
    api::VideoApi,
    controller::{ControllerEvent, RootController, Tab},
    error::Result,
    identity::IdentityStore,
    storage::KeyValueStore,
    types::{ConversationId, SessionId, SessionSummary, UserId},
    views::{
        ChatRequest, ChatView, DocumentView, Pending, ProcessorView, SearchView, SessionListView,
        SessionObserver, SnippetView, TranscriptView, ViewRequest,
    },
};

pub struct Workspace<S> {
    identity: IdentityStore<S>,
    user: UserId,
    pub controller: RootController,
    pub processor: ProcessorView,
    pub sessions: SessionListView,
    pub chat: ChatView,
    pub search: SearchView,
    pub document: DocumentView,
    pub transcript: TranscriptView,
    pub snippets: SnippetView,
}

impl<S: KeyValueStore> Workspace<S> {
    pub fn new(identity: IdentityStore<S>) -> Result<Self> {
        let user = identity.user_id()?;
        Ok(Self {
            controller: RootController::new(user.clone()),
            identity,
            user,
            processor: ProcessorView::new(),
            sessions: SessionListView::new(),
            chat: ChatView::new(),
            search: SearchView::new(),
            document: DocumentView::new(),
            transcript: TranscriptView::new(),
            snippets: SnippetView::new(),
        })
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn identity(&self) -> &IdentityStore<S> {
        &self.identity
    }

    /// Forwards pending controller events to the views. Returns the chat history request when
    /// the active session changed.
    pub fn dispatch(&mut self) -> Result<Option<Pending<ChatRequest>>> {
        let events = self.controller.take_events();
        let mut session_changed = false;
        for event in &events {
            session_changed |= matches!(event, ControllerEvent::ActiveSessionChanged { .. });
            let observers: [&mut dyn SessionObserver; 7] = [
                &mut self.processor,
                &mut self.sessions,
                &mut self.chat,
                &mut self.search,
                &mut self.document,
                &mut self.transcript,
                &mut self.snippets,
            ];
            for observer in observers {
                observer.on_event(event);
            }
        }

        if session_changed {
            return self.chat.attach(&self.identity);
        }
        Ok(None)
    }

    async fn run<R: ViewRequest>(
        &self,
        api: &dyn VideoApi,
        pending: Pending<R>,
    ) -> (crate::views::Ticket, Result<R::Output>) {
        pending.execute(api, &self.user).await
    }

    async fn sync(&mut self, api: &dyn VideoApi) -> Result<()> {
        if let Some(pending) = self.dispatch()? {
            let (ticket, result) = self.run(api, pending).await;
            self.chat.complete(&ticket, result);
        }
        Ok(())
    }

    pub async fn mount(&mut self, api: &dyn VideoApi) -> Result<()> {
        self.controller.mount(api).await;
        self.sync(api).await
    }

    pub async fn refresh(&mut self, api: &dyn VideoApi) -> Result<()> {
        self.controller.refresh(api).await;
        self.sync(api).await
    }

    pub async fn select_session(&mut self, api: &dyn VideoApi, session: &SessionId) -> Result<bool> {
        let selected = self.controller.select_session(session);
        self.sync(api).await?;
        Ok(selected)
    }

    /// Opens `tab`, loading the document or transcript on first display.
    pub async fn open_tab(&mut self, api: &dyn VideoApi, tab: Tab) -> Result<()> {
        self.controller.set_tab(tab);
        self.sync(api).await?;
        match tab {
            Tab::Document => self.load_document(api).await,
            Tab::Transcript => {
                if let Some(pending) = self.transcript.begin_if_idle() {
                    let (ticket, result) = self.run(api, pending).await;
                    self.transcript.complete(&ticket, result);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Submits the processor's URL; a created session is selected and chat opened.
    pub async fn submit_url(&mut self, api: &dyn VideoApi) -> Result<Option<SessionSummary>> {
        let Some(pending) = self.processor.begin_url() else {
            return Ok(None);
        };
        let (ticket, result) = self.run(api, pending).await;
        self.finish_processing(api, &ticket, result).await
    }

    pub async fn submit_upload(&mut self, api: &dyn VideoApi) -> Result<Option<SessionSummary>> {
        let Some(pending) = self.processor.begin_upload() else {
            return Ok(None);
        };
        let (ticket, result) = self.run(api, pending).await;
        self.finish_processing(api, &ticket, result).await
    }

    async fn finish_processing(
        &mut self,
        api: &dyn VideoApi,
        ticket: &crate::views::Ticket,
        result: Result<SessionSummary>,
    ) -> Result<Option<SessionSummary>> {
        let Some(created) = self.processor.complete(ticket, result) else {
            return Ok(None);
        };
        info!(session_id = %created.session_id, title = %created.title, "session created");
        self.controller.session_created(created.clone());
        self.sync(api).await?;
        Ok(Some(created))
    }

    pub async fn delete_session(&mut self, api: &dyn VideoApi, session: &SessionId) -> Result<bool> {
        let Some(pending) = self.sessions.begin_delete(session) else {
            return Ok(false);
        };
        let (ticket, result) = self.run(api, pending).await;
        let Some(removed) = self.sessions.complete(&ticket, result) else {
            return Ok(false);
        };
        self.controller.session_deleted(&removed);
        self.sync(api).await?;
        Ok(true)
    }

    pub async fn search(&mut self, api: &dyn VideoApi) {
        if let Some(pending) = self.search.begin() {
            let (ticket, result) = self.run(api, pending).await;
            self.search.complete(&ticket, result);
        }
    }

    /// Loads the document if nothing is shown yet; a failure is retried by calling again.
    pub async fn load_document(&mut self, api: &dyn VideoApi) {
        let pending = match self.document.state().error() {
            Some(_) => self.document.begin(),
            None => self.document.begin_if_idle(),
        };
        if let Some(pending) = pending {
            let (ticket, result) = self.run(api, pending).await;
            self.document.complete(&ticket, result);
        }
    }

    pub async fn toggle_transcript_timestamps(&mut self, api: &dyn VideoApi) {
        if let Some(pending) = self.transcript.toggle_timestamps() {
            let (ticket, result) = self.run(api, pending).await;
            self.transcript.complete(&ticket, result);
        }
    }

    pub async fn create_snippet(&mut self, api: &dyn VideoApi) {
        if let Some(pending) = self.snippets.begin() {
            let (ticket, result) = self.run(api, pending).await;
            self.snippets.complete(&ticket, result);
        }
    }

    pub async fn send_chat(&mut self, api: &dyn VideoApi) {
        if let Some(pending) = self.chat.begin_send() {
            let (ticket, result) = self.run(api, pending).await;
            self.chat.complete(&ticket, result);
        }
    }

    pub async fn retry_chat(&mut self, api: &dyn VideoApi) {
        if let Some(pending) = self.chat.retry() {
            let (ticket, result) = self.run(api, pending).await;
            self.chat.complete(&ticket, result);
        }
    }

    pub fn new_conversation(&mut self) -> Result<Option<ConversationId>> {
        self.chat.start_new_conversation(&self.identity)
    }
}
