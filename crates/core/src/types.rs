use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Per-installation identity scoping every session server-side
    UserId
);
opaque_id!(
    /// One processed video
    SessionId
);
opaque_id!(
    /// Chat thread scoped to a (user, session) pair
    ConversationId
);

/// Checks a decoded payload before it leaves the client boundary.
pub trait Schema {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Youtube,
    Local,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Youtube => "YouTube",
            SourceKind::Local => "Upload",
            SourceKind::Unknown => "Video",
        }
    }
}

/// Result of processing a URL or an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub session_id: SessionId,
    pub title: String,
    pub duration: f64,
    #[serde(default)]
    pub message: String,
}

impl Schema for SessionDescriptor {
    fn validate(&self) -> Result<(), String> {
        if self.session_id.as_str().is_empty() {
            return Err("empty session_id".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub title: String,
    pub duration: f64,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SessionSummary {
    pub fn from_descriptor(descriptor: SessionDescriptor, source: SourceKind) -> Self {
        Self {
            session_id: descriptor.session_id,
            title: descriptor.title,
            duration: descriptor.duration,
            source,
            created_at: None,
            message: Some(descriptor.message).filter(|m| !m.is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionList {
    pub sessions: Vec<SessionSummary>,
    #[serde(default)]
    pub total: usize,
}

impl Schema for SessionList {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteAck {
    #[serde(default)]
    pub message: String,
    pub session_id: SessionId,
}

impl Schema for DeleteAck {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Importance::High => "high",
            Importance::Medium => "medium",
            Importance::Low => "low",
            Importance::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub title: String,
    pub summary: String,
    pub timestamp_start: f64,
    pub timestamp_end: f64,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub screenshot_url: Option<String>,
}

/// Backend-generated overview, key points and action items for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperDocument {
    pub session_id: SessionId,
    pub title: String,
    pub overview: String,
    pub key_points: Vec<KeyPoint>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub markdown: String,
}

impl Schema for HelperDocument {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub count: usize,
}

impl Schema for SearchResponse {
    fn validate(&self) -> Result<(), String> {
        validate_results(&self.results)
    }
}

fn validate_results(results: &[SearchResult]) -> Result<(), String> {
    match results.iter().find(|r| !r.relevance.is_finite()) {
        Some(r) => Err(format!("non-finite relevance for segment at {}", r.start)),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Search,
    Question,
    Snippet,
    Summary,
    Keypoints,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickKeyPoint {
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Assistant answer to a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReply {
    #[serde(default)]
    pub intent: Intent,
    #[serde(default)]
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub key_points: Vec<QuickKeyPoint>,
    #[serde(default)]
    pub timestamps: Option<TimeRange>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub snippet_path: Option<String>,
}

impl Schema for QueryReply {
    fn validate(&self) -> Result<(), String> {
        validate_results(&self.results)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub count: usize,
}

impl Schema for ConversationHistory {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeLinks {
    pub watch_url: String,
    pub short_url: String,
    pub embed_url: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub timestamp_display: String,
}

/// Where a produced clip lives: a shareable link or a rendered file on the backend
#[derive(Debug, Clone, PartialEq)]
pub enum ClipLocation<'a> {
    Link(&'a YoutubeLinks),
    File { path: &'a str, start: f64, end: f64 },
}

fn clip_location<'a>(
    links: &'a Option<YoutubeLinks>,
    snippet_path: &'a Option<String>,
    start_time: Option<f64>,
    end_time: Option<f64>,
) -> Option<ClipLocation<'a>> {
    if let Some(links) = links {
        return Some(ClipLocation::Link(links));
    }
    snippet_path.as_deref().map(|path| ClipLocation::File {
        path,
        start: start_time.unwrap_or(0.0),
        end: end_time.unwrap_or(0.0),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub index: u32,
    pub relevance: f64,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub links: Option<YoutubeLinks>,
    #[serde(default)]
    pub snippet_path: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl Snippet {
    pub fn location(&self) -> Option<ClipLocation<'_>> {
        clip_location(
            &self.links,
            &self.snippet_path,
            self.start_time,
            self.end_time,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetBatch {
    pub source: SourceKind,
    pub query: String,
    #[serde(default)]
    pub total_snippets: usize,
    pub snippets: Vec<Snippet>,
}

impl Schema for SnippetBatch {
    fn validate(&self) -> Result<(), String> {
        match self.snippets.iter().find(|s| s.location().is_none()) {
            Some(s) => Err(format!("snippet {} has neither links nor a file", s.index)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampSnippet {
    pub source: SourceKind,
    #[serde(default)]
    pub links: Option<YoutubeLinks>,
    #[serde(default)]
    pub snippet_path: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl TimestampSnippet {
    pub fn location(&self) -> Option<ClipLocation<'_>> {
        clip_location(
            &self.links,
            &self.snippet_path,
            self.start_time,
            self.end_time,
        )
    }
}

impl Schema for TimestampSnippet {
    fn validate(&self) -> Result<(), String> {
        match self.location() {
            Some(_) => Ok(()),
            None => Err("snippet has neither links nor a file".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    pub duration: f64,
    pub language: String,
}

impl Schema for Transcript {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptText {
    pub text: String,
    pub duration: f64,
    pub language: String,
}

impl Schema for TranscriptText {}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptPayload {
    Timed(Transcript),
    Plain(TranscriptText),
}

impl TranscriptPayload {
    pub fn language(&self) -> &str {
        match self {
            TranscriptPayload::Timed(t) => &t.language,
            TranscriptPayload::Plain(t) => &t.language,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            TranscriptPayload::Timed(t) => t.duration,
            TranscriptPayload::Plain(t) => t.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub api_key_set: bool,
}

impl Health {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" || self.status == "ok"
    }
}

impl Schema for Health {}
