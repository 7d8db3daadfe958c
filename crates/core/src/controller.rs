//! Session list, active selection and tab routing.
//!
//! The controller never talks to views directly: every state change is emitted as a
//! [`ControllerEvent`] to registered listeners and queued for [`RootController::take_events`].

use std::fmt;

use tracing::{info, warn};

use crate::{
    api::VideoApi,
    error::Result,
    format::format_duration,
    types::{Health, SessionId, SessionList, SessionSummary, UserId},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Process,
    Chat,
    Search,
    Document,
    Transcript,
    Snippets,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Process,
        Tab::Chat,
        Tab::Search,
        Tab::Document,
        Tab::Transcript,
        Tab::Snippets,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Process => "Process",
            Tab::Chat => "Chat",
            Tab::Search => "Search",
            Tab::Document => "Document",
            Tab::Transcript => "Transcript",
            Tab::Snippets => "Snippets",
        }
    }

    /// Every tab except the processor renders the active session.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Tab::Process)
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    SessionsLoaded { count: usize },
    ActiveSessionChanged {
        previous: Option<SessionId>,
        current: Option<SessionId>,
    },
    SessionCreated(SessionId),
    SessionRemoved(SessionId),
    TabChanged(Tab),
    BannerChanged(Option<String>),
}

type Listener = Box<dyn FnMut(&ControllerEvent) + Send>;

pub struct RootController {
    user: UserId,
    sessions: Vec<SessionSummary>,
    active: Option<SessionId>,
    tab: Tab,
    banner: Option<String>,
    listeners: Vec<Listener>,
    outbox: Vec<ControllerEvent>,
}

impl RootController {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            sessions: Vec::new(),
            active: None,
            tab: Tab::default(),
            banner: None,
            listeners: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Newest first.
    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active_session(&self) -> Option<&SessionSummary> {
        let active = self.active.as_ref()?;
        self.sessions.iter().find(|s| &s.session_id == active)
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Persistent warning shown while the backend looks unhealthy
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Title and formatted duration of the active session
    pub fn header(&self) -> Option<String> {
        self.active_session()
            .map(|s| format!("{} · {}", s.title, format_duration(s.duration)))
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ControllerEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn take_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.outbox)
    }

    fn emit(&mut self, event: ControllerEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.outbox.push(event);
    }

    /// Health probe and initial session fetch, issued independently.
    pub async fn mount(&mut self, api: &dyn VideoApi) {
        let (health, sessions) = tokio::join!(api.health(), api.list_sessions(&self.user));
        self.apply_health(health);
        self.apply_session_list(sessions);
    }

    pub fn apply_health(&mut self, health: Result<Health>) {
        let banner = match health {
            Ok(health) if !health.is_healthy() => Some(format!(
                "Backend reports status \"{}\". Some features may not work.",
                health.status
            )),
            Ok(health) if !health.api_key_set => Some(
                "Backend is running without an OpenAI API key. Processing and chat will fail."
                    .to_string(),
            ),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "health probe failed");
                Some(format!("Cannot reach the backend: {}", err))
            }
        };

        if banner != self.banner {
            self.banner = banner.clone();
            self.emit(ControllerEvent::BannerChanged(banner));
        }
    }

    /// A failed fetch is logged and leaves the list empty.
    pub fn apply_session_list(&mut self, sessions: Result<SessionList>) {
        match sessions {
            Ok(list) => {
                info!(count = list.sessions.len(), "loaded sessions");
                self.sessions = list.sessions;
            }
            Err(err) => {
                warn!(error = %err, "failed to load sessions");
                self.sessions.clear();
            }
        }

        if self
            .active
            .as_ref()
            .is_some_and(|active| !self.contains(active))
        {
            self.set_active(None);
        }
        let count = self.sessions.len();
        self.emit(ControllerEvent::SessionsLoaded { count });
    }

    fn contains(&self, session: &SessionId) -> bool {
        self.sessions.iter().any(|s| &s.session_id == session)
    }

    fn set_active(&mut self, current: Option<SessionId>) {
        if self.active == current {
            return;
        }
        let previous = std::mem::replace(&mut self.active, current.clone());
        self.emit(ControllerEvent::ActiveSessionChanged { previous, current });
    }

    /// Selects a listed session. Unknown ids are ignored.
    pub fn select_session(&mut self, session: &SessionId) -> bool {
        if !self.contains(session) {
            warn!(session_id = %session, "cannot select unknown session");
            return false;
        }
        self.set_active(Some(session.clone()));
        true
    }

    pub fn clear_selection(&mut self) {
        self.set_active(None);
    }

    pub fn set_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.emit(ControllerEvent::TabChanged(tab));
        }
    }

    /// Inserts at the front, selects it and switches to chat.
    pub fn session_created(&mut self, summary: SessionSummary) {
        let id = summary.session_id.clone();
        self.sessions.retain(|s| s.session_id != id);
        self.sessions.insert(0, summary);
        self.emit(ControllerEvent::SessionCreated(id.clone()));
        self.set_active(Some(id));
        self.set_tab(Tab::Chat);
    }

    /// Drops the entry; clears the selection only when it was the active one.
    pub fn session_deleted(&mut self, session: &SessionId) {
        let before = self.sessions.len();
        self.sessions.retain(|s| &s.session_id != session);
        if self.sessions.len() != before {
            self.emit(ControllerEvent::SessionRemoved(session.clone()));
        }
        if self.active.as_ref() == Some(session) {
            self.set_active(None);
        }
    }

    pub async fn delete_session(&mut self, api: &dyn VideoApi, session: &SessionId) -> Result<()> {
        api.delete_session(session, &self.user).await?;
        self.session_deleted(session);
        Ok(())
    }

    pub async fn refresh(&mut self, api: &dyn VideoApi) {
        let sessions = api.list_sessions(&self.user).await;
        self.apply_session_list(sessions);
    }
}
