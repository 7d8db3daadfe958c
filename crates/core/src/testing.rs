use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    api::{SnippetQuery, VideoApi, VideoUpload},
    error::{ApiError, Result},
    types::{
        ChatMessage, ConversationHistory, ConversationId, DeleteAck, Health, HelperDocument,
        QueryReply, SearchResponse, SearchResult, SessionDescriptor, SessionId, SessionList,
        SessionSummary, SnippetBatch, SourceKind, TimestampSnippet, Transcript, TranscriptPayload,
        TranscriptSegment, TranscriptText, UserId,
    },
};

pub fn summary(id: &str, title: &str) -> SessionSummary {
    SessionSummary {
        session_id: SessionId::from(id),
        title: title.to_string(),
        duration: 60.0,
        source: SourceKind::Youtube,
        created_at: None,
        message: None,
    }
}

pub fn result(text: &str, start: f64, relevance: f64) -> SearchResult {
    SearchResult {
        text: text.to_string(),
        start,
        end: start + 5.0,
        relevance,
    }
}

/// In-memory backend: keeps conversations per id and echoes chat messages.
pub struct FakeApi {
    pub health: Mutex<Result<Health>>,
    pub sessions: Mutex<Vec<SessionSummary>>,
    pub list_error: Mutex<Option<ApiError>>,
    pub deleted: Mutex<Vec<SessionId>>,
    pub process: Mutex<Result<SessionDescriptor>>,
    pub search_results: Mutex<Vec<SearchResult>>,
    pub converse_error: Mutex<Option<ApiError>>,
    pub conversations: Mutex<HashMap<ConversationId, Vec<ChatMessage>>>,
    pub snippet_batch: Mutex<Result<SnippetBatch>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            health: Mutex::new(Ok(Health {
                status: "healthy".to_string(),
                api_key_set: true,
            })),
            sessions: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
            deleted: Mutex::new(Vec::new()),
            process: Mutex::new(Ok(SessionDescriptor {
                session_id: SessionId::from("s1"),
                title: "Demo".to_string(),
                duration: 125.0,
                message: "ready".to_string(),
            })),
            search_results: Mutex::new(Vec::new()),
            converse_error: Mutex::new(None),
            conversations: Mutex::new(HashMap::new()),
            snippet_batch: Mutex::new(Err(ApiError::Backend {
                status: 404,
                detail: "No relevant content found".to_string(),
            })),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn process_url(
        &self,
        _user: &UserId,
        video_url: &str,
        language: &str,
    ) -> Result<SessionDescriptor> {
        self.record(format!("process_url {video_url} {language}"));
        self.process.lock().unwrap().clone()
    }

    async fn process_upload(
        &self,
        _user: &UserId,
        upload: VideoUpload,
        _language: Option<&str>,
    ) -> Result<SessionDescriptor> {
        self.record(format!("process_upload {}", upload.file_name));
        self.process.lock().unwrap().clone()
    }

    async fn list_sessions(&self, _user: &UserId) -> Result<SessionList> {
        self.record("list_sessions".to_string());
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        let sessions = self.sessions.lock().unwrap().clone();
        Ok(SessionList {
            total: sessions.len(),
            sessions,
        })
    }

    async fn delete_session(&self, session: &SessionId, _user: &UserId) -> Result<DeleteAck> {
        self.record(format!("delete_session {session}"));
        self.deleted.lock().unwrap().push(session.clone());
        self.sessions
            .lock()
            .unwrap()
            .retain(|s| &s.session_id != session);
        Ok(DeleteAck {
            message: "deleted".to_string(),
            session_id: session.clone(),
        })
    }

    async fn helper_document(&self, session: &SessionId, _user: &UserId) -> Result<HelperDocument> {
        self.record(format!("helper_document {session}"));
        Ok(HelperDocument {
            session_id: session.clone(),
            title: "Demo".to_string(),
            overview: "Overview".to_string(),
            key_points: Vec::new(),
            action_items: vec!["Watch again".to_string()],
            markdown: "# Demo".to_string(),
        })
    }

    async fn helper_document_markdown(
        &self,
        session: &SessionId,
        _user: &UserId,
    ) -> Result<String> {
        self.record(format!("helper_document_markdown {session}"));
        Ok("# Demo".to_string())
    }

    async fn search(
        &self,
        _user: &UserId,
        session: &SessionId,
        query: &str,
        n_results: u32,
    ) -> Result<SearchResponse> {
        self.record(format!("search {session} {query} {n_results}"));
        let results: Vec<SearchResult> = self
            .search_results
            .lock()
            .unwrap()
            .iter()
            .take(n_results as usize)
            .cloned()
            .collect();
        Ok(SearchResponse {
            query: query.to_string(),
            count: results.len(),
            results,
        })
    }

    async fn converse(
        &self,
        _user: &UserId,
        session: &SessionId,
        conversation: &ConversationId,
        message: &str,
    ) -> Result<QueryReply> {
        self.record(format!("converse {session} {conversation} {message}"));
        if let Some(err) = self.converse_error.lock().unwrap().clone() {
            return Err(err);
        }
        let response = format!("echo: {message}");
        let mut conversations = self.conversations.lock().unwrap();
        let thread = conversations.entry(conversation.clone()).or_default();
        thread.push(ChatMessage::user(message));
        thread.push(ChatMessage::assistant(response.clone()));
        Ok(QueryReply {
            intent: Default::default(),
            query: message.to_string(),
            response,
            results: Vec::new(),
            key_points: Vec::new(),
            timestamps: None,
            context: None,
            snippet_path: None,
        })
    }

    async fn conversation_history(
        &self,
        _user: &UserId,
        conversation: &ConversationId,
        limit: u32,
    ) -> Result<ConversationHistory> {
        self.record(format!("conversation_history {conversation} {limit}"));
        let messages: Vec<ChatMessage> = self
            .conversations
            .lock()
            .unwrap()
            .get(conversation)
            .map(|m| m.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default();
        Ok(ConversationHistory {
            conversation_id: Some(conversation.clone()),
            count: messages.len(),
            messages,
        })
    }

    async fn snippet_by_query(
        &self,
        _user: &UserId,
        session: &SessionId,
        request: &SnippetQuery,
    ) -> Result<SnippetBatch> {
        self.record(format!("snippet_by_query {session} {}", request.query));
        self.snippet_batch.lock().unwrap().clone()
    }

    async fn snippet_by_range(
        &self,
        _user: &UserId,
        session: &SessionId,
        start: f64,
        end: f64,
    ) -> Result<TimestampSnippet> {
        self.record(format!("snippet_by_range {session} {start} {end}"));
        Ok(TimestampSnippet {
            source: SourceKind::Local,
            links: None,
            snippet_path: Some(format!("/snippets/snippet_{}-{}.mp4", start as u64, end as u64)),
            start_time: Some(start),
            end_time: Some(end),
        })
    }

    async fn download_snippet(&self, _user: &UserId, filename: &str) -> Result<Vec<u8>> {
        self.record(format!("download_snippet {filename}"));
        Ok(b"mp4".to_vec())
    }

    async fn transcript(
        &self,
        session: &SessionId,
        _user: &UserId,
        with_timestamps: bool,
    ) -> Result<TranscriptPayload> {
        self.record(format!("transcript {session} {with_timestamps}"));
        if with_timestamps {
            Ok(TranscriptPayload::Timed(Transcript {
                segments: vec![
                    TranscriptSegment {
                        start: 0.0,
                        end: 4.0,
                        text: "Hello and welcome".to_string(),
                    },
                    TranscriptSegment {
                        start: 4.0,
                        end: 9.0,
                        text: "Today we talk about Rust".to_string(),
                    },
                ],
                duration: 9.0,
                language: "en".to_string(),
            }))
        } else {
            Ok(TranscriptPayload::Plain(TranscriptText {
                text: "Hello and welcome Today we talk about Rust".to_string(),
                duration: 9.0,
                language: "en".to_string(),
            }))
        }
    }

    async fn health(&self) -> Result<Health> {
        self.record("health".to_string());
        self.health.lock().unwrap().clone()
    }
}
