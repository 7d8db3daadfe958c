use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    api::{DEFAULT_LANGUAGE, VideoApi, VideoUpload},
    controller::ControllerEvent,
    error::{ApiError, Result},
    types::{SessionSummary, SourceKind, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, ViewError, ViewRequest},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessRequest {
    Url {
        url: String,
        language: String,
    },
    Upload {
        path: PathBuf,
        language: Option<String>,
    },
}

#[async_trait]
impl ViewRequest for ProcessRequest {
    type Output = SessionSummary;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<SessionSummary> {
        match self {
            ProcessRequest::Url { url, language } => {
                let descriptor = api.process_url(user, url, language).await?;
                Ok(SessionSummary::from_descriptor(descriptor, SourceKind::Youtube))
            }
            ProcessRequest::Upload { path, language } => {
                let upload = VideoUpload::from_path(path).await?;
                let descriptor = api
                    .process_upload(user, upload, language.as_deref())
                    .await?;
                Ok(SessionSummary::from_descriptor(descriptor, SourceKind::Local))
            }
        }
    }
}

/// URL submission and local upload form
pub struct ProcessorView {
    pub url: String,
    pub language: String,
    pub upload_path: String,
    slot: RequestSlot<SessionSummary>,
}

impl Default for ProcessorView {
    fn default() -> Self {
        Self {
            url: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            upload_path: String::new(),
            slot: RequestSlot::new(),
        }
    }
}

impl ProcessorView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<SessionSummary> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    pub fn begin_url(&mut self) -> Option<Pending<ProcessRequest>> {
        let url = self.url.trim().to_string();
        if self.is_busy() {
            return None;
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            self.slot.fail(ViewError::from(ApiError::InvalidInput {
                reason: "Enter a video URL starting with http:// or https://".to_string(),
            }));
            return None;
        }

        let language = match self.language.trim() {
            "" => DEFAULT_LANGUAGE.to_string(),
            lang => lang.to_string(),
        };
        let ticket = self.slot.begin()?;
        Some(Pending {
            ticket,
            request: ProcessRequest::Url { url, language },
        })
    }

    pub fn begin_upload(&mut self) -> Option<Pending<ProcessRequest>> {
        let path = self.upload_path.trim();
        if self.is_busy() {
            return None;
        }
        if path.is_empty() {
            self.slot.fail(ViewError::from(ApiError::InvalidInput {
                reason: "Choose a video file to upload".to_string(),
            }));
            return None;
        }

        let request = ProcessRequest::Upload {
            path: PathBuf::from(path),
            language: Some(self.language.trim().to_string()).filter(|l| !l.is_empty()),
        };
        let ticket = self.slot.begin()?;
        Some(Pending { ticket, request })
    }

    /// Returns the new session on success so the caller can hand it to the controller.
    pub fn complete(
        &mut self,
        ticket: &super::Ticket,
        result: Result<SessionSummary>,
    ) -> Option<SessionSummary> {
        if !self.slot.finish(ticket, result) {
            return None;
        }
        let created = self.slot.state().value().cloned();
        if created.is_some() {
            self.url.clear();
            self.upload_path.clear();
        }
        created
    }
}

impl SessionObserver for ProcessorView {
    /// A session switch clears the last outcome. An outstanding job is left to land.
    fn on_event(&mut self, event: &ControllerEvent) {
        if self.is_busy() {
            return;
        }
        match event {
            ControllerEvent::ActiveSessionChanged { .. } => self.slot.reset(),
            ControllerEvent::SessionCreated(_) => self.language = DEFAULT_LANGUAGE.to_string(),
            _ => {}
        }
    }
}
