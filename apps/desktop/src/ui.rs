use iced::{
    Color, Element, Length, Theme,
    widget::{Column, button, column, container, row, scrollable, text, text_input},
};
use vidlens_core::{
    Tab,
    format::format_timestamp,
    types::Role,
    views::{RequestState, SnippetMode, ViewError},
};

use crate::{Message, Ui};

const WARNING: Color = rgb(0.85, 0.55, 0.1);
const ERROR: Color = rgb(0.8, 0.2, 0.2);
const MUTED: Color = rgb(0.5, 0.5, 0.5);

const fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color { r, g, b, a: 1.0 }
}

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

pub fn failed(reason: &str) -> Element<'_, Message> {
    column![
        text("vidlens").size(24),
        text(format!("Cannot start: {reason}")).color(ERROR),
    ]
    .padding(20)
    .spacing(10)
    .into()
}

pub fn view(ui: &Ui) -> Element<'_, Message> {
    let controller = &ui.workspace.controller;

    let title = controller
        .header()
        .unwrap_or_else(|| "No session selected".to_string());
    let mut page = column![row![text("vidlens").size(24), text(title).size(18).color(MUTED)].spacing(16)]
        .padding(16)
        .spacing(12);

    if let Some(banner) = controller.banner() {
        page = page.push(container(text(banner).color(WARNING)).padding(8));
    }
    if let Some(notice) = &ui.notice {
        page = page.push(text(notice.as_str()).color(WARNING));
    }

    let body = row![
        container(sidebar(ui)).width(Length::Fixed(260.0)),
        column![tabs(ui), content(ui)].spacing(12).width(Length::Fill),
    ]
    .spacing(16);

    page.push(body).into()
}

fn sidebar(ui: &Ui) -> Element<'_, Message> {
    let sessions = &ui.workspace.sessions;
    let busy = sessions.is_busy();

    let mut list = Column::new().spacing(6);
    for row_data in sessions.rows(&ui.workspace.controller) {
        let style: ButtonStyle = if row_data.active {
            button::primary
        } else {
            button::text
        };
        let id = row_data.session_id.clone();
        let deleting = sessions.deleting() == Some(&row_data.session_id);
        list = list.push(
            column![
                row![
                    button(text(row_data.title))
                        .style(style)
                        .width(Length::Fill)
                        .on_press(Message::SelectSession(id.clone())),
                    button(text(if deleting { "…" } else { "✕" }))
                        .style(button::danger)
                        .on_press_maybe((!busy).then_some(Message::DeleteSession(id))),
                ]
                .spacing(4),
                text(row_data.detail).size(12).color(MUTED),
            ]
            .spacing(2),
        );
    }

    let mut side = column![
        row![
            text("Sessions").size(18).width(Length::Fill),
            button("Refresh").on_press(Message::RefreshSessions),
        ],
        scrollable(list),
    ]
    .spacing(10);
    if let Some(err) = sessions.state().error() {
        side = side.push(error_text(err));
    }
    side.into()
}

fn tabs(ui: &Ui) -> Element<'_, Message> {
    let controller = &ui.workspace.controller;
    let has_session = controller.active_session_id().is_some();

    let mut bar = row![].spacing(6);
    for tab in Tab::ALL {
        let style: ButtonStyle = if controller.tab() == tab {
            button::primary
        } else {
            button::secondary
        };
        let enabled = has_session || !tab.needs_session();
        bar = bar.push(
            button(text(tab.title()))
                .style(style)
                .on_press_maybe(enabled.then_some(Message::TabSelected(tab))),
        );
    }
    bar.into()
}

fn content(ui: &Ui) -> Element<'_, Message> {
    let controller = &ui.workspace.controller;
    let tab = controller.tab();
    if tab.needs_session() && controller.active_session_id().is_none() {
        return text("Select a session or process a new video.")
            .color(MUTED)
            .into();
    }

    match tab {
        Tab::Process => process_tab(ui),
        Tab::Chat => chat_tab(ui),
        Tab::Search => search_tab(ui),
        Tab::Document => document_tab(ui),
        Tab::Transcript => transcript_tab(ui),
        Tab::Snippets => snippet_tab(ui),
    }
}

fn error_text(err: &ViewError) -> Element<'_, Message> {
    let message = if err.connectivity {
        format!("{} (is the backend running?)", err.message)
    } else {
        err.message.clone()
    };
    text(message).color(ERROR).into()
}

/// Input that is read-only while its view has a request outstanding.
fn input<'a>(
    placeholder: &'a str,
    value: &'a str,
    busy: bool,
    on_input: fn(String) -> Message,
    on_submit: Option<Message>,
) -> Element<'a, Message> {
    let mut field = text_input(placeholder, value).padding(8);
    if !busy {
        field = field.on_input(on_input);
        if let Some(submit) = on_submit {
            field = field.on_submit(submit);
        }
    }
    field.into()
}

fn process_tab(ui: &Ui) -> Element<'_, Message> {
    let view = &ui.workspace.processor;
    let busy = view.is_busy();

    let mut col = column![
        text("Process a YouTube video").size(18),
        row![
            input(
                "https://youtube.com/watch?v=...",
                &view.url,
                busy,
                Message::UrlChanged,
                Some(Message::ProcessUrl),
            ),
            container(input("en", &view.language, busy, Message::LanguageChanged, None))
                .width(Length::Fixed(80.0)),
            button("Process").on_press_maybe((!busy).then_some(Message::ProcessUrl)),
        ]
        .spacing(8),
        text("Or upload a local file").size(18),
        row![
            input(
                "/path/to/video.mp4",
                &view.upload_path,
                busy,
                Message::UploadPathChanged,
                Some(Message::ProcessUpload),
            ),
            button("Upload").on_press_maybe((!busy).then_some(Message::ProcessUpload)),
        ]
        .spacing(8),
    ]
    .spacing(10);

    match view.state() {
        RequestState::Loading => {
            col = col.push(text("Processing... long videos can take several minutes.").color(MUTED));
        }
        RequestState::Failed(err) => col = col.push(error_text(err)),
        RequestState::Success(created) => {
            col = col.push(text(format!("Created \"{}\"", created.title)).color(MUTED));
        }
        RequestState::Idle => {}
    }
    col.into()
}

fn chat_tab(ui: &Ui) -> Element<'_, Message> {
    let view = &ui.workspace.chat;
    let busy = view.is_busy();

    let mut thread = Column::new().spacing(8);
    for message in view.messages() {
        let (who, color) = match message.role {
            Role::User => ("You", rgb(0.2, 0.5, 0.3)),
            Role::Assistant => ("Assistant", rgb(0.2, 0.4, 0.7)),
        };
        thread = thread.push(column![text(who).size(12).color(color), text(message.content.as_str())]);
    }
    if let Some(reply) = view.last_reply() {
        for point in &reply.key_points {
            thread = thread.push(text(format!("• {}", point.title)).size(13).color(MUTED));
        }
    }

    let mut col = column![
        row![
            text(
                view.conversation()
                    .map(|c| format!("Conversation {c}"))
                    .unwrap_or_default()
            )
            .size(12)
            .color(MUTED)
            .width(Length::Fill),
            button("New conversation").on_press_maybe((!busy).then_some(Message::NewConversation)),
        ],
        scrollable(thread).height(Length::Fill),
    ]
    .spacing(10);

    match view.state() {
        RequestState::Loading => col = col.push(text("Thinking...").color(MUTED)),
        RequestState::Failed(err) => {
            col = col.push(
                row![error_text(err), button("Retry").on_press(Message::RetryChat)].spacing(8),
            );
        }
        _ => {}
    }

    col.push(
        row![
            input(
                "Ask about the video...",
                &view.input,
                busy,
                Message::ChatInputChanged,
                Some(Message::SendChat),
            ),
            button("Send").on_press_maybe((!busy).then_some(Message::SendChat)),
        ]
        .spacing(8),
    )
    .into()
}

fn search_tab(ui: &Ui) -> Element<'_, Message> {
    let view = &ui.workspace.search;
    let busy = view.is_busy();

    let mut col = column![
        row![
            input(
                "Search the transcript...",
                &view.query,
                busy,
                Message::SearchQueryChanged,
                Some(Message::RunSearch),
            ),
            button("Search").on_press_maybe((!busy).then_some(Message::RunSearch)),
        ]
        .spacing(8)
    ]
    .spacing(10);

    match view.state() {
        RequestState::Loading => col = col.push(text("Searching...").color(MUTED)),
        RequestState::Failed(err) => {
            col = col.push(row![error_text(err), button("Retry").on_press(Message::RunSearch)].spacing(8));
        }
        _ => {
            let results = view
                .lines()
                .into_iter()
                .fold(Column::new().spacing(6), |c, line| c.push(text(line)));
            col = col.push(scrollable(results));
        }
    }
    col.into()
}

fn document_tab(ui: &Ui) -> Element<'_, Message> {
    let view = &ui.workspace.document;
    match view.state() {
        RequestState::Idle | RequestState::Loading => {
            text("Loading document...").color(MUTED).into()
        }
        RequestState::Failed(err) => column![
            error_text(err),
            button("Retry").on_press(Message::ReloadDocument),
        ]
        .spacing(8)
        .into(),
        RequestState::Success(_) => {
            scrollable(text(view.markdown().unwrap_or_default())).height(Length::Fill).into()
        }
    }
}

fn transcript_tab(ui: &Ui) -> Element<'_, Message> {
    let view = &ui.workspace.transcript;
    let busy = view.is_busy();

    let toggle_label = if view.with_timestamps {
        "Hide timestamps"
    } else {
        "Show timestamps"
    };
    let mut col = column![
        row![
            input(
                "Filter segments...",
                &view.filter,
                busy || !view.with_timestamps,
                Message::TranscriptFilterChanged,
                None,
            ),
            button(toggle_label).on_press_maybe((!busy).then_some(Message::ToggleTimestamps)),
        ]
        .spacing(8)
    ]
    .spacing(10);

    match view.state() {
        RequestState::Idle | RequestState::Loading => {
            col = col.push(text("Loading transcript...").color(MUTED));
        }
        RequestState::Failed(err) => {
            col = col.push(
                row![error_text(err), button("Retry").on_press(Message::ReloadTranscript)].spacing(8),
            );
        }
        RequestState::Success(payload) => {
            col = col.push(
                text(format!("Language: {}", payload.language()))
                    .size(12)
                    .color(MUTED),
            );
            let body: Element<'_, Message> = match view.plain_text() {
                Some(plain) => text(plain).into(),
                None => view
                    .visible_segments()
                    .into_iter()
                    .fold(Column::new().spacing(4), |c, seg| {
                        c.push(row![
                            text(format_timestamp(seg.start)).color(MUTED).width(Length::Fixed(70.0)),
                            text(seg.text.trim()),
                        ])
                    })
                    .into(),
            };
            col = col.push(scrollable(body).height(Length::Fill));
        }
    }
    col.into()
}

fn snippet_tab(ui: &Ui) -> Element<'_, Message> {
    let view = &ui.workspace.snippets;
    let busy = view.is_busy();

    let mode_button = |label: &'static str, mode: SnippetMode| {
        let style: ButtonStyle = if view.mode == mode {
            button::primary
        } else {
            button::secondary
        };
        button(text(label))
            .style(style)
            .on_press_maybe((!busy).then_some(Message::SnippetModeSelected(mode)))
    };

    let form: Element<'_, Message> = match view.mode {
        SnippetMode::ByQuery => input(
            "Topic, e.g. \"the part about lifetimes\"",
            &view.query,
            busy,
            Message::SnippetQueryChanged,
            Some(Message::CreateSnippet),
        ),
        SnippetMode::ByRange => row![
            input("Start (MM:SS)", &view.start, busy, Message::SnippetStartChanged, None),
            input(
                "End (MM:SS)",
                &view.end,
                busy,
                Message::SnippetEndChanged,
                Some(Message::CreateSnippet),
            ),
        ]
        .spacing(8)
        .into(),
    };

    let mut col = column![
        row![
            mode_button("By topic", SnippetMode::ByQuery),
            mode_button("By time range", SnippetMode::ByRange),
        ]
        .spacing(6),
        row![
            form,
            button("Create").on_press_maybe((!busy).then_some(Message::CreateSnippet)),
        ]
        .spacing(8),
    ]
    .spacing(10);

    match view.state() {
        RequestState::Loading => col = col.push(text("Rendering clip...").color(MUTED)),
        RequestState::Failed(err) => col = col.push(error_text(err)),
        RequestState::Success(outcome) => {
            let lines = outcome
                .lines()
                .into_iter()
                .fold(Column::new().spacing(8), |c, line| c.push(text(line)));
            col = col.push(scrollable(lines));
        }
        RequestState::Idle => {}
    }
    col.into()
}
