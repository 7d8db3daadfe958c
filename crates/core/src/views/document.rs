use async_trait::async_trait;

use crate::{
    api::VideoApi,
    controller::ControllerEvent,
    error::Result,
    format::format_document_readable,
    types::{HelperDocument, SessionId, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, Ticket, ViewRequest},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub session: SessionId,
}

#[async_trait]
impl ViewRequest for DocumentRequest {
    type Output = HelperDocument;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<HelperDocument> {
        api.helper_document(&self.session, user).await
    }
}

#[derive(Default)]
pub struct DocumentView {
    slot: RequestSlot<HelperDocument>,
}

impl DocumentView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<HelperDocument> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    /// Also serves as retry after a failure.
    pub fn begin(&mut self) -> Option<Pending<DocumentRequest>> {
        let session = self.slot.session()?.clone();
        let ticket = self.slot.begin()?;
        Some(Pending {
            ticket,
            request: DocumentRequest { session },
        })
    }

    /// Loads on first display; a stored document or failure is left alone.
    pub fn begin_if_idle(&mut self) -> Option<Pending<DocumentRequest>> {
        match self.slot.state() {
            RequestState::Idle => self.begin(),
            _ => None,
        }
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<HelperDocument>) {
        self.slot.finish(ticket, result);
    }

    /// The server-rendered markdown when present, otherwise a local rendering.
    pub fn markdown(&self) -> Option<String> {
        let doc = self.slot.state().value()?;
        if doc.markdown.trim().is_empty() {
            Some(format_document_readable(doc))
        } else {
            Some(doc.markdown.clone())
        }
    }
}

impl SessionObserver for DocumentView {
    fn on_event(&mut self, event: &ControllerEvent) {
        if let ControllerEvent::ActiveSessionChanged { current, .. } = event {
            self.slot.bind(current.clone());
        }
    }
}
