use async_trait::async_trait;

use crate::{
    api::VideoApi,
    controller::ControllerEvent,
    error::Result,
    format::format_transcript_segment,
    types::{SessionId, TranscriptPayload, TranscriptSegment, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, Ticket, ViewRequest},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRequest {
    pub session: SessionId,
    pub with_timestamps: bool,
}

#[async_trait]
impl ViewRequest for TranscriptRequest {
    type Output = TranscriptPayload;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<TranscriptPayload> {
        api.transcript(&self.session, user, self.with_timestamps)
            .await
    }
}

pub struct TranscriptView {
    pub with_timestamps: bool,
    pub filter: String,
    slot: RequestSlot<TranscriptPayload>,
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self {
            with_timestamps: true,
            filter: String::new(),
            slot: RequestSlot::new(),
        }
    }
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<TranscriptPayload> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    pub fn begin(&mut self) -> Option<Pending<TranscriptRequest>> {
        let session = self.slot.session()?.clone();
        let ticket = self.slot.begin()?;
        Some(Pending {
            ticket,
            request: TranscriptRequest {
                session,
                with_timestamps: self.with_timestamps,
            },
        })
    }

    pub fn begin_if_idle(&mut self) -> Option<Pending<TranscriptRequest>> {
        match self.slot.state() {
            RequestState::Idle => self.begin(),
            _ => None,
        }
    }

    /// Switching format drops the loaded payload and fetches again. Ignored while loading.
    pub fn toggle_timestamps(&mut self) -> Option<Pending<TranscriptRequest>> {
        if self.is_busy() {
            return None;
        }
        self.with_timestamps = !self.with_timestamps;
        self.slot.reset();
        self.begin()
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<TranscriptPayload>) {
        self.slot.finish(ticket, result);
    }

    /// Timed segments matching the filter, case-insensitively.
    pub fn visible_segments(&self) -> Vec<&TranscriptSegment> {
        let Some(TranscriptPayload::Timed(transcript)) = self.slot.state().value() else {
            return Vec::new();
        };
        let needle = self.filter.trim().to_lowercase();
        transcript
            .segments
            .iter()
            .filter(|seg| needle.is_empty() || seg.text.to_lowercase().contains(&needle))
            .collect()
    }

    /// Filtered segments as `[MM:SS] text` lines.
    pub fn lines(&self) -> Vec<String> {
        self.visible_segments()
            .into_iter()
            .map(format_transcript_segment)
            .collect()
    }

    pub fn plain_text(&self) -> Option<&str> {
        match self.slot.state().value()? {
            TranscriptPayload::Plain(text) => Some(&text.text),
            TranscriptPayload::Timed(_) => None,
        }
    }
}

impl SessionObserver for TranscriptView {
    fn on_event(&mut self, event: &ControllerEvent) {
        if let ControllerEvent::ActiveSessionChanged { current, .. } = event {
            if self.slot.bind(current.clone()) {
                self.filter.clear();
            }
        }
    }
}
