use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result, anyhow, bail};
use console::style;
use tokio::fs;
use tracing::debug;
use vidlens_core::{
    ApiClient, ClientConfig, FileStore, IdentityStore, SessionId, Tab, VideoApi, Workspace,
    format::{format_duration, format_search_results, format_timestamp},
    types::{Role, TranscriptPayload},
    views::{RequestState, SnippetMode},
};

use crate::{
    Command,
    output::{create_spinner, fail, finish, header, rule, success, warning},
};

pub struct App {
    api: ApiClient,
    workspace: Workspace<FileStore>,
    storage_path: PathBuf,
}

/// Turns a finished view state into a result for printing.
fn settled<T>(state: &RequestState<T>) -> Result<&T> {
    match state {
        RequestState::Success(value) => Ok(value),
        RequestState::Failed(err) if err.connectivity => {
            Err(anyhow!("{} (is the backend running?)", err.message))
        }
        RequestState::Failed(err) => Err(anyhow!("{}", err.message)),
        RequestState::Idle | RequestState::Loading => bail!("request was not sent"),
    }
}

impl App {
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let api = ApiClient::new(config)?;
        let storage_path = config.storage_path();
        let store = FileStore::open(&storage_path)
            .with_context(|| format!("opening {}", storage_path.display()))?;
        let workspace = Workspace::new(IdentityStore::new(store))?;
        debug!(api_url = api.base_url(), user_id = %workspace.user(), "cli ready");
        Ok(Self {
            api,
            workspace,
            storage_path,
        })
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Health => self.health().await,
            Command::Sessions => self.sessions().await,
            Command::Whoami => {
                println!("{}", self.workspace.user());
                println!("{}", style(self.storage_path.display()).dim());
                Ok(())
            }
            Command::Process { url, language } => self.process(url, language).await,
            Command::Upload { path, language } => self.upload(path, language).await,
            Command::Delete { session } => self.delete(&session).await,
            Command::Document {
                session,
                markdown,
                output,
            } => self.document(&session, markdown, output).await,
            Command::Search {
                session,
                query,
                limit,
            } => self.search(&session, query, limit).await,
            Command::Chat {
                session,
                message,
                new,
            } => self.chat(&session, message, new).await,
            Command::Transcript {
                session,
                plain,
                filter,
            } => self.transcript(&session, plain, filter).await,
            Command::Snippet {
                session,
                query,
                start,
                end,
            } => self.snippet(&session, query, start, end).await,
            Command::DownloadSnippet { path, output } => self.download_snippet(&path, output).await,
        }
    }

    /// Health probe and session list; surfaces the banner as a warning.
    async fn mount(&mut self) -> Result<()> {
        self.workspace.mount(&self.api).await?;
        if let Some(banner) = self.workspace.controller.banner() {
            warning(banner);
        }
        Ok(())
    }

    async fn open_session(&mut self, session: &str) -> Result<()> {
        self.mount().await?;
        let id = SessionId::from(session);
        if !self.workspace.select_session(&self.api, &id).await? {
            bail!("unknown session {session}; run `vidlens sessions` to list them");
        }
        if let Some(title) = self.workspace.controller.header() {
            header(&title, session);
        }
        Ok(())
    }

    async fn health(&mut self) -> Result<()> {
        let health = self.api.health().await?;
        if health.is_healthy() {
            success(&format!("Backend {} at {}", health.status, self.api.base_url()));
        } else {
            warning(&format!("Backend reports status \"{}\"", health.status));
        }
        if !health.api_key_set {
            warning("OpenAI API key is not configured on the backend");
        }
        Ok(())
    }

    async fn sessions(&mut self) -> Result<()> {
        self.mount().await?;
        let sessions = self.workspace.controller.sessions();
        if sessions.is_empty() {
            println!("{}", style("No sessions yet. Try `vidlens process <url>`.").dim());
            return Ok(());
        }
        for s in sessions {
            println!(
                "{}  {}  {} {}",
                style(&s.session_id).cyan(),
                s.title,
                style(format_duration(s.duration)).dim(),
                style(s.source.label()).dim()
            );
        }
        Ok(())
    }

    async fn process(&mut self, url: String, language: String) -> Result<()> {
        self.mount().await?;
        self.workspace.processor.url = url;
        self.workspace.processor.language = language;

        let started = Instant::now();
        let spinner = create_spinner("Processing video...");
        let created = self.workspace.submit_url(&self.api).await?;
        self.report_processing(spinner, created, started)
    }

    async fn upload(&mut self, path: PathBuf, language: Option<String>) -> Result<()> {
        self.mount().await?;
        self.workspace.processor.upload_path = path.display().to_string();
        if let Some(language) = language {
            self.workspace.processor.language = language;
        }

        let started = Instant::now();
        let spinner = create_spinner(&format!("Uploading {}...", path.display()));
        let created = self.workspace.submit_upload(&self.api).await?;
        self.report_processing(spinner, created, started)
    }

    fn report_processing(
        &self,
        spinner: indicatif::ProgressBar,
        created: Option<vidlens_core::SessionSummary>,
        started: Instant,
    ) -> Result<()> {
        let Some(created) = created else {
            fail(spinner, "Processing failed");
            return settled(self.workspace.processor.state()).map(|_| ());
        };
        finish(
            spinner,
            &format!(
                "{} {}",
                created.title,
                style(format_duration(created.duration)).dim()
            ),
            started,
        );
        println!("{} {}", style("Session:").dim(), style(&created.session_id).cyan().bold());
        if let Some(message) = &created.message {
            println!("{}", style(message).dim());
        }
        Ok(())
    }

    async fn delete(&mut self, session: &str) -> Result<()> {
        self.mount().await?;
        let id = SessionId::from(session);
        if self.workspace.delete_session(&self.api, &id).await? {
            success(&format!("Deleted {session}"));
            return Ok(());
        }
        settled(self.workspace.sessions.state()).map(|_| ())
    }

    async fn document(
        &mut self,
        session: &str,
        markdown: bool,
        output: Option<PathBuf>,
    ) -> Result<()> {
        self.open_session(session).await?;
        let spinner = create_spinner("Loading document...");
        let started = Instant::now();

        let text = if markdown {
            let id = SessionId::from(session);
            self.api
                .helper_document_markdown(&id, self.workspace.user())
                .await
                .map_err(anyhow::Error::from)
        } else {
            self.workspace.open_tab(&self.api, Tab::Document).await?;
            settled(self.workspace.document.state())
                .map(|_| self.workspace.document.markdown().unwrap_or_default())
        };
        let text = match text {
            Ok(text) => text,
            Err(e) => {
                fail(spinner, "Document unavailable");
                return Err(e);
            }
        };
        finish(spinner, "Document loaded", started);

        write_or_print(&text, output.as_deref()).await
    }

    async fn search(&mut self, session: &str, query: String, limit: u32) -> Result<()> {
        self.open_session(session).await?;
        self.workspace.search.query = query;
        self.workspace.search.limit = limit;
        self.workspace.open_tab(&self.api, Tab::Search).await?;
        self.workspace.search(&self.api).await;

        settled(self.workspace.search.state())?;
        for line in self.workspace.search.lines() {
            println!("{line}");
        }
        Ok(())
    }

    async fn chat(&mut self, session: &str, message: Option<String>, new: bool) -> Result<()> {
        self.open_session(session).await?;
        self.workspace.open_tab(&self.api, Tab::Chat).await?;
        if new {
            if let Some(conversation) = self.workspace.new_conversation()? {
                success(&format!("Started conversation {conversation}"));
            }
        }

        let Some(message) = message else {
            if !new {
                settled(self.workspace.chat.state())?;
            }
            if self.workspace.chat.messages().is_empty() {
                println!("{}", style("No messages yet.").dim());
            }
            for m in self.workspace.chat.messages() {
                let who = match m.role {
                    Role::User => style("you").green().bold(),
                    Role::Assistant => style("assistant").cyan().bold(),
                };
                println!("{who}: {}", m.content);
            }
            return Ok(());
        };

        self.workspace.chat.input = message;
        let started = Instant::now();
        let spinner = create_spinner("Thinking...");
        self.workspace.send_chat(&self.api).await;
        if let Err(e) = settled(self.workspace.chat.state()) {
            fail(spinner, "No reply");
            return Err(e);
        }
        finish(spinner, "Reply", started);
        rule();

        if let Some(reply) = self.workspace.chat.last_reply() {
            println!("{}", reply.response);
            if !reply.results.is_empty() {
                println!();
                for line in format_search_results(&reply.query, &reply.results) {
                    println!("  {}", style(line).dim());
                }
            }
            for point in &reply.key_points {
                println!("  {} {}", style("•").cyan(), point.title);
            }
            if let Some(range) = reply.timestamps {
                println!(
                    "  {} {}–{}",
                    style("at").dim(),
                    format_timestamp(range.start),
                    format_timestamp(range.end)
                );
            }
        }
        Ok(())
    }

    async fn transcript(
        &mut self,
        session: &str,
        plain: bool,
        filter: Option<String>,
    ) -> Result<()> {
        self.open_session(session).await?;
        self.workspace.transcript.with_timestamps = !plain;
        self.workspace.open_tab(&self.api, Tab::Transcript).await?;

        let payload = settled(self.workspace.transcript.state())?;
        println!(
            "{} {} {}",
            style("Language:").dim(),
            style(payload.language()).yellow(),
            style(format_duration(payload.duration())).dim()
        );
        rule();

        if let TranscriptPayload::Plain(_) = payload {
            println!("{}", self.workspace.transcript.plain_text().unwrap_or_default());
            return Ok(());
        }
        if let Some(filter) = filter {
            self.workspace.transcript.filter = filter;
        }
        for line in self.workspace.transcript.lines() {
            println!("{line}");
        }
        Ok(())
    }

    async fn snippet(
        &mut self,
        session: &str,
        query: Option<String>,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<()> {
        self.open_session(session).await?;
        self.workspace.open_tab(&self.api, Tab::Snippets).await?;
        let snippets = &mut self.workspace.snippets;
        match (query, start, end) {
            (Some(query), _, _) => {
                snippets.set_mode(SnippetMode::ByQuery);
                snippets.query = query;
            }
            (None, Some(start), Some(end)) => {
                snippets.set_mode(SnippetMode::ByRange);
                snippets.start = start;
                snippets.end = end;
            }
            _ => bail!("pass --query, or both --start and --end"),
        }

        let started = Instant::now();
        let spinner = create_spinner("Creating snippet...");
        self.workspace.create_snippet(&self.api).await;
        let outcome = match settled(self.workspace.snippets.state()) {
            Ok(outcome) => outcome,
            Err(e) => {
                fail(spinner, "No snippet created");
                return Err(e);
            }
        };
        finish(spinner, "Snippet ready", started);

        for line in outcome.lines() {
            println!("{line}");
        }
        for file in outcome.files() {
            println!(
                "{} {}",
                style("download:").dim(),
                self.api.snippet_download_url(self.workspace.user(), &file)
            );
        }
        Ok(())
    }

    async fn download_snippet(&mut self, path: &str, output: Option<PathBuf>) -> Result<()> {
        let filename = path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("{path} does not name a file"))?;

        let started = Instant::now();
        let spinner = create_spinner(&format!("Downloading {filename}..."));
        let bytes = match self.api.download_snippet(self.workspace.user(), filename).await {
            Ok(bytes) => bytes,
            Err(e) => {
                fail(spinner, "Download failed");
                return Err(e.into());
            }
        };

        let target = output.unwrap_or_else(|| PathBuf::from(filename));
        fs::write(&target, &bytes)
            .await
            .with_context(|| format!("writing {}", target.display()))?;
        finish(
            spinner,
            &format!(
                "Saved {} {}",
                style(target.display()).cyan(),
                style(format!("({} KB)", bytes.len() / 1024)).dim()
            ),
            started,
        );
        Ok(())
    }
}

async fn write_or_print(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            success(&format!("Saved {}", style(path.display()).cyan()));
        }
        None => println!("{text}"),
    }
    Ok(())
}
