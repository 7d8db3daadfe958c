use std::sync::Arc;

use iced::{Element, Task};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use vidlens_core::{
    ApiClient, ClientConfig, FileStore, IdentityStore, KeyValueStore, MemoryStore, Result,
    SessionId, Tab, VideoApi, Workspace,
    types::{
        DeleteAck, Health, HelperDocument, SearchResponse, SessionList, SessionSummary,
        TranscriptPayload,
    },
    views::{ChatResponse, Pending, SnippetMode, SnippetOutcome, Ticket, ViewRequest},
};

mod ui;

type SharedStore = Arc<dyn KeyValueStore>;

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vidlens=info")))
        .init();

    iced::application(App::boot, App::update, App::view)
        .title("vidlens")
        .window_size((1100.0, 720.0))
        .run()
}

#[derive(Debug, Clone)]
pub enum Message {
    HealthChecked(Result<Health>),
    SessionsLoaded(Result<SessionList>),
    RefreshSessions,
    SelectSession(SessionId),
    DeleteSession(SessionId),
    SessionDeleted((Ticket, Result<DeleteAck>)),
    TabSelected(Tab),

    UrlChanged(String),
    LanguageChanged(String),
    UploadPathChanged(String),
    ProcessUrl,
    ProcessUpload,
    Processed((Ticket, Result<SessionSummary>)),

    ChatInputChanged(String),
    SendChat,
    RetryChat,
    NewConversation,
    Chat((Ticket, Result<ChatResponse>)),

    SearchQueryChanged(String),
    RunSearch,
    Searched((Ticket, Result<SearchResponse>)),

    ReloadDocument,
    DocumentLoaded((Ticket, Result<HelperDocument>)),

    ToggleTimestamps,
    TranscriptFilterChanged(String),
    ReloadTranscript,
    TranscriptLoaded((Ticket, Result<TranscriptPayload>)),

    SnippetModeSelected(SnippetMode),
    SnippetQueryChanged(String),
    SnippetStartChanged(String),
    SnippetEndChanged(String),
    CreateSnippet,
    SnippetCreated((Ticket, Result<SnippetOutcome>)),
}

pub enum App {
    Ready(Box<Ui>),
    Failed(String),
}

pub struct Ui {
    api: Arc<ApiClient>,
    pub workspace: Workspace<SharedStore>,
    /// Local problem (storage), shown next to the backend banner
    pub notice: Option<String>,
}

/// Falls back to an in-memory store when the state file cannot be used.
fn open_store(config: &ClientConfig) -> (SharedStore, Option<String>) {
    let path = config.storage_path();
    match FileStore::open(&path) {
        Ok(store) => (Arc::new(store), None),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "using in-memory identity store");
            (
                Arc::new(MemoryStore::new()),
                Some(format!("Identity is not persisted: {err}")),
            )
        }
    }
}

impl App {
    fn boot() -> (Self, Task<Message>) {
        let config = ClientConfig::from_env();
        let api = match ApiClient::new(&config) {
            Ok(api) => Arc::new(api),
            Err(err) => return (App::Failed(err.to_string()), Task::none()),
        };
        let (store, notice) = open_store(&config);
        let workspace = match Workspace::new(IdentityStore::new(store)) {
            Ok(workspace) => workspace,
            Err(err) => return (App::Failed(err.to_string()), Task::none()),
        };

        let ui = Ui {
            api,
            workspace,
            notice,
        };
        let mount = ui.mount();
        (App::Ready(Box::new(ui)), mount)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match self {
            App::Ready(ui) => ui.update(message),
            App::Failed(_) => Task::none(),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        match self {
            App::Ready(ui) => ui::view(ui),
            App::Failed(reason) => ui::failed(reason),
        }
    }
}

impl Ui {
    /// Health probe and session fetch, issued independently.
    fn mount(&self) -> Task<Message> {
        let api = Arc::clone(&self.api);
        let health = Task::perform(async move { api.health().await }, Message::HealthChecked);
        Task::batch([health, self.load_sessions()])
    }

    fn load_sessions(&self) -> Task<Message> {
        let api = Arc::clone(&self.api);
        let user = self.workspace.user().clone();
        Task::perform(
            async move { api.list_sessions(&user).await },
            Message::SessionsLoaded,
        )
    }

    fn perform<R>(
        &self,
        pending: Option<Pending<R>>,
        done: fn((Ticket, Result<R::Output>)) -> Message,
    ) -> Task<Message>
    where
        R: ViewRequest + 'static,
        R::Output: 'static,
    {
        let Some(pending) = pending else {
            return Task::none();
        };
        let api = Arc::clone(&self.api);
        let user = self.workspace.user().clone();
        Task::perform(
            async move { pending.execute(api.as_ref(), &user).await },
            done,
        )
    }

    /// Delivers controller events to the views and reloads chat history on a session switch.
    fn sync(&mut self) -> Task<Message> {
        match self.workspace.dispatch() {
            Ok(history) => self.perform(history, Message::Chat),
            Err(err) => {
                self.notice = Some(err.to_string());
                Task::none()
            }
        }
    }

    fn open_tab(&mut self, tab: Tab) -> Task<Message> {
        self.workspace.controller.set_tab(tab);
        let sync = self.sync();
        let load = match tab {
            Tab::Document => {
                let pending = self.workspace.document.begin_if_idle();
                self.perform(pending, Message::DocumentLoaded)
            }
            Tab::Transcript => {
                let pending = self.workspace.transcript.begin_if_idle();
                self.perform(pending, Message::TranscriptLoaded)
            }
            _ => Task::none(),
        };
        Task::batch([sync, load])
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        let ws = &mut self.workspace;
        match message {
            Message::HealthChecked(health) => {
                ws.controller.apply_health(health);
                self.sync()
            }
            Message::SessionsLoaded(sessions) => {
                ws.controller.apply_session_list(sessions);
                self.sync()
            }
            Message::RefreshSessions => self.load_sessions(),
            Message::SelectSession(id) => {
                ws.controller.select_session(&id);
                let tab = ws.controller.tab();
                self.open_tab(tab)
            }
            Message::DeleteSession(id) => {
                let pending = ws.sessions.begin_delete(&id);
                self.perform(pending, Message::SessionDeleted)
            }
            Message::SessionDeleted((ticket, result)) => {
                if let Some(removed) = ws.sessions.complete(&ticket, result) {
                    ws.controller.session_deleted(&removed);
                }
                self.sync()
            }
            Message::TabSelected(tab) => self.open_tab(tab),

            Message::UrlChanged(url) => {
                ws.processor.url = url;
                Task::none()
            }
            Message::LanguageChanged(language) => {
                ws.processor.language = language;
                Task::none()
            }
            Message::UploadPathChanged(path) => {
                ws.processor.upload_path = path;
                Task::none()
            }
            Message::ProcessUrl => {
                let pending = ws.processor.begin_url();
                self.perform(pending, Message::Processed)
            }
            Message::ProcessUpload => {
                let pending = ws.processor.begin_upload();
                self.perform(pending, Message::Processed)
            }
            Message::Processed((ticket, result)) => {
                if let Some(created) = ws.processor.complete(&ticket, result) {
                    ws.controller.session_created(created);
                }
                self.sync()
            }

            Message::ChatInputChanged(input) => {
                ws.chat.input = input;
                Task::none()
            }
            Message::SendChat => {
                let pending = ws.chat.begin_send();
                self.perform(pending, Message::Chat)
            }
            Message::RetryChat => {
                let pending = ws.chat.retry();
                self.perform(pending, Message::Chat)
            }
            Message::NewConversation => {
                if let Err(err) = ws.new_conversation() {
                    self.notice = Some(err.to_string());
                }
                Task::none()
            }
            Message::Chat((ticket, result)) => {
                ws.chat.complete(&ticket, result);
                Task::none()
            }

            Message::SearchQueryChanged(query) => {
                ws.search.query = query;
                Task::none()
            }
            Message::RunSearch => {
                let pending = ws.search.begin();
                self.perform(pending, Message::Searched)
            }
            Message::Searched((ticket, result)) => {
                ws.search.complete(&ticket, result);
                Task::none()
            }

            Message::ReloadDocument => {
                let pending = ws.document.begin();
                self.perform(pending, Message::DocumentLoaded)
            }
            Message::DocumentLoaded((ticket, result)) => {
                ws.document.complete(&ticket, result);
                Task::none()
            }

            Message::ToggleTimestamps => {
                let pending = ws.transcript.toggle_timestamps();
                self.perform(pending, Message::TranscriptLoaded)
            }
            Message::TranscriptFilterChanged(filter) => {
                ws.transcript.filter = filter;
                Task::none()
            }
            Message::ReloadTranscript => {
                let pending = ws.transcript.begin();
                self.perform(pending, Message::TranscriptLoaded)
            }
            Message::TranscriptLoaded((ticket, result)) => {
                ws.transcript.complete(&ticket, result);
                Task::none()
            }

            Message::SnippetModeSelected(mode) => {
                ws.snippets.set_mode(mode);
                Task::none()
            }
            Message::SnippetQueryChanged(query) => {
                ws.snippets.query = query;
                Task::none()
            }
            Message::SnippetStartChanged(start) => {
                ws.snippets.start = start;
                Task::none()
            }
            Message::SnippetEndChanged(end) => {
                ws.snippets.end = end;
                Task::none()
            }
            Message::CreateSnippet => {
                let pending = ws.snippets.begin();
                self.perform(pending, Message::SnippetCreated)
            }
            Message::SnippetCreated((ticket, result)) => {
                ws.snippets.complete(&ticket, result);
                Task::none()
            }
        }
    }
}
