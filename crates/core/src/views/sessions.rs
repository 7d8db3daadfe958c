use async_trait::async_trait;

use crate::{
    api::VideoApi,
    controller::{ControllerEvent, RootController},
    error::Result,
    format::format_duration,
    types::{DeleteAck, SessionId, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, Ticket, ViewRequest},
};

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    pub session: SessionId,
}

#[async_trait]
impl ViewRequest for DeleteRequest {
    type Output = DeleteAck;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<DeleteAck> {
        api.delete_session(&self.session, user).await
    }
}

/// One rendered line in the session sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub session_id: SessionId,
    pub title: String,
    pub detail: String,
    pub active: bool,
}

#[derive(Default)]
pub struct SessionListView {
    slot: RequestSlot<DeleteAck>,
    deleting: Option<SessionId>,
}

impl SessionListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<DeleteAck> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    pub fn deleting(&self) -> Option<&SessionId> {
        self.deleting.as_ref()
    }

    pub fn rows(&self, controller: &RootController) -> Vec<SessionRow> {
        let active = controller.active_session_id();
        controller
            .sessions()
            .iter()
            .map(|s| SessionRow {
                session_id: s.session_id.clone(),
                title: s.title.clone(),
                detail: format!("{} · {}", s.source.label(), format_duration(s.duration)),
                active: active == Some(&s.session_id),
            })
            .collect()
    }

    pub fn begin_delete(&mut self, session: &SessionId) -> Option<Pending<DeleteRequest>> {
        let ticket = self.slot.begin()?;
        self.deleting = Some(session.clone());
        Some(Pending {
            ticket,
            request: DeleteRequest {
                session: session.clone(),
            },
        })
    }

    /// Returns the removed id on success; the caller forwards it to the controller.
    pub fn complete(&mut self, ticket: &Ticket, result: Result<DeleteAck>) -> Option<SessionId> {
        if !self.slot.finish(ticket, result) {
            return None;
        }
        let deleted = self.deleting.take();
        self.slot.state().value().and(deleted)
    }
}

impl SessionObserver for SessionListView {
    fn on_event(&mut self, event: &ControllerEvent) {
        if let ControllerEvent::ActiveSessionChanged { current, .. } = event {
            if !self.is_busy() {
                self.slot.bind(current.clone());
            }
        }
    }
}
