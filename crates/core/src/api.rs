//! HTTP client for the video intelligence backend.
//!
//! Every call maps to exactly one backend route under the configured `/api` base. Errors from the
//! backend are surfaced with their `detail` message untouched; nothing here retries.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, multipart};
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::{
    config::ClientConfig,
    error::{ApiError, Result},
    types::{
        ConversationHistory, ConversationId, DeleteAck, Health, HelperDocument, QueryReply, Schema,
        SearchResponse, SessionDescriptor, SessionId, SessionList, SnippetBatch, TimestampSnippet,
        Transcript, TranscriptPayload, TranscriptText, UserId,
    },
};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_SEARCH_RESULTS: u32 = 5;
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const DEFAULT_SNIPPET_MAX_DURATION: f64 = 60.0;
pub const DEFAULT_SNIPPET_RESULTS: u32 = 5;

/// A local video read into memory for multipart upload
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl VideoUpload {
    pub async fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| ApiError::InvalidInput {
                reason: format!("{} is not a file", path.display()),
            })?;
        let bytes = fs::read(path).await?;
        Ok(Self { file_name, bytes })
    }
}

/// Topic-driven clip request
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetQuery {
    pub query: String,
    pub max_duration: f64,
    pub n_results: u32,
}

impl SnippetQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_duration: DEFAULT_SNIPPET_MAX_DURATION,
            n_results: DEFAULT_SNIPPET_RESULTS,
        }
    }
}

/// Operations offered by the backend, one method per route.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn process_url(
        &self,
        user: &UserId,
        video_url: &str,
        language: &str,
    ) -> Result<SessionDescriptor>;

    async fn process_upload(
        &self,
        user: &UserId,
        upload: VideoUpload,
        language: Option<&str>,
    ) -> Result<SessionDescriptor>;

    async fn list_sessions(&self, user: &UserId) -> Result<SessionList>;

    async fn delete_session(&self, session: &SessionId, user: &UserId) -> Result<DeleteAck>;

    async fn helper_document(&self, session: &SessionId, user: &UserId) -> Result<HelperDocument>;

    async fn helper_document_markdown(&self, session: &SessionId, user: &UserId)
    -> Result<String>;

    async fn search(
        &self,
        user: &UserId,
        session: &SessionId,
        query: &str,
        n_results: u32,
    ) -> Result<SearchResponse>;

    async fn converse(
        &self,
        user: &UserId,
        session: &SessionId,
        conversation: &ConversationId,
        message: &str,
    ) -> Result<QueryReply>;

    async fn conversation_history(
        &self,
        user: &UserId,
        conversation: &ConversationId,
        limit: u32,
    ) -> Result<ConversationHistory>;

    async fn snippet_by_query(
        &self,
        user: &UserId,
        session: &SessionId,
        request: &SnippetQuery,
    ) -> Result<SnippetBatch>;

    async fn snippet_by_range(
        &self,
        user: &UserId,
        session: &SessionId,
        start: f64,
        end: f64,
    ) -> Result<TimestampSnippet>;

    async fn download_snippet(&self, user: &UserId, filename: &str) -> Result<Vec<u8>>;

    async fn transcript(
        &self,
        session: &SessionId,
        user: &UserId,
        with_timestamps: bool,
    ) -> Result<TranscriptPayload>;

    async fn health(&self) -> Result<Health>;
}

#[derive(Serialize)]
struct ProcessUrlBody<'a> {
    user_id: &'a str,
    video_url: &'a str,
    language: &'a str,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    user_id: &'a str,
    session_id: &'a str,
    query: &'a str,
    n_results: u32,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    user_id: &'a str,
    session_id: &'a str,
    conversation_id: &'a str,
    query: &'a str,
}

#[derive(Serialize)]
struct SnippetQueryBody<'a> {
    user_id: &'a str,
    session_id: &'a str,
    query: &'a str,
    max_duration: f64,
    n_results: u32,
}

#[derive(Serialize)]
struct SnippetRangeBody<'a> {
    user_id: &'a str,
    session_id: &'a str,
    start_time: f64,
    end_time: f64,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Public link to a rendered clip; the CLI prints it next to the local path.
    pub fn snippet_download_url(&self, user: &UserId, filename: &str) -> String {
        self.url(&format!(
            "/snippet/download/{}/{}",
            encode(user.as_str()),
            encode(filename)
        ))
    }

    async fn fetch(&self, endpoint: &str, request: RequestBuilder) -> Result<Response> {
        debug!(endpoint, "sending request");
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(endpoint, status = status.as_u16(), "backend returned an error");
        Err(ApiError::Backend {
            status: status.as_u16(),
            detail: extract_detail(&body, status.canonical_reason()),
        })
    }

    async fn send<T: DeserializeOwned + Schema>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T> {
        let body = self.fetch(endpoint, request).await?.text().await?;
        decode(endpoint, &body)
    }
}

#[async_trait]
impl VideoApi for ApiClient {
    async fn process_url(
        &self,
        user: &UserId,
        video_url: &str,
        language: &str,
    ) -> Result<SessionDescriptor> {
        let body = ProcessUrlBody {
            user_id: user.as_str(),
            video_url,
            language,
        };
        self.send(
            "POST /process/url",
            self.http.post(self.url("/process/url")).json(&body),
        )
        .await
    }

    async fn process_upload(
        &self,
        user: &UserId,
        upload: VideoUpload,
        language: Option<&str>,
    ) -> Result<SessionDescriptor> {
        let part = multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = multipart::Form::new().part("file", part);

        let mut query = vec![("user_id", user.as_str())];
        if let Some(language) = language {
            query.push(("language", language));
        }

        self.send(
            "POST /process/upload",
            self.http
                .post(self.url("/process/upload"))
                .query(&query)
                .multipart(form),
        )
        .await
    }

    async fn list_sessions(&self, user: &UserId) -> Result<SessionList> {
        self.send(
            "GET /sessions",
            self.http
                .get(self.url("/sessions"))
                .query(&[("user_id", user.as_str())]),
        )
        .await
    }

    async fn delete_session(&self, session: &SessionId, user: &UserId) -> Result<DeleteAck> {
        let path = format!("/sessions/{}", encode(session.as_str()));
        self.send(
            "DELETE /sessions/{id}",
            self.http
                .delete(self.url(&path))
                .query(&[("user_id", user.as_str())]),
        )
        .await
    }

    async fn helper_document(&self, session: &SessionId, user: &UserId) -> Result<HelperDocument> {
        let path = format!("/document/{}", encode(session.as_str()));
        self.send(
            "GET /document/{id}",
            self.http
                .get(self.url(&path))
                .query(&[("user_id", user.as_str())]),
        )
        .await
    }

    async fn helper_document_markdown(
        &self,
        session: &SessionId,
        user: &UserId,
    ) -> Result<String> {
        let path = format!("/document/{}/download", encode(session.as_str()));
        let response = self
            .fetch(
                "GET /document/{id}/download",
                self.http
                    .get(self.url(&path))
                    .query(&[("user_id", user.as_str())]),
            )
            .await?;
        Ok(response.text().await?)
    }

    async fn search(
        &self,
        user: &UserId,
        session: &SessionId,
        query: &str,
        n_results: u32,
    ) -> Result<SearchResponse> {
        let body = SearchBody {
            user_id: user.as_str(),
            session_id: session.as_str(),
            query,
            n_results,
        };
        self.send("POST /search", self.http.post(self.url("/search")).json(&body))
            .await
    }

    async fn converse(
        &self,
        user: &UserId,
        session: &SessionId,
        conversation: &ConversationId,
        message: &str,
    ) -> Result<QueryReply> {
        let body = QueryBody {
            user_id: user.as_str(),
            session_id: session.as_str(),
            conversation_id: conversation.as_str(),
            query: message,
        };
        self.send("POST /query", self.http.post(self.url("/query")).json(&body))
            .await
    }

    async fn conversation_history(
        &self,
        user: &UserId,
        conversation: &ConversationId,
        limit: u32,
    ) -> Result<ConversationHistory> {
        let path = format!(
            "/conversation/{}/messages",
            encode(conversation.as_str())
        );
        self.send(
            "GET /conversation/{id}/messages",
            self.http
                .get(self.url(&path))
                .query(&[("user_id", user.to_string()), ("limit", limit.to_string())]),
        )
        .await
    }

    async fn snippet_by_query(
        &self,
        user: &UserId,
        session: &SessionId,
        request: &SnippetQuery,
    ) -> Result<SnippetBatch> {
        let body = SnippetQueryBody {
            user_id: user.as_str(),
            session_id: session.as_str(),
            query: &request.query,
            max_duration: request.max_duration,
            n_results: request.n_results,
        };
        self.send(
            "POST /snippet/query",
            self.http.post(self.url("/snippet/query")).json(&body),
        )
        .await
    }

    async fn snippet_by_range(
        &self,
        user: &UserId,
        session: &SessionId,
        start: f64,
        end: f64,
    ) -> Result<TimestampSnippet> {
        let body = SnippetRangeBody {
            user_id: user.as_str(),
            session_id: session.as_str(),
            start_time: start,
            end_time: end,
        };
        self.send(
            "POST /snippet/timestamp",
            self.http.post(self.url("/snippet/timestamp")).json(&body),
        )
        .await
    }

    async fn download_snippet(&self, user: &UserId, filename: &str) -> Result<Vec<u8>> {
        let response = self
            .fetch(
                "GET /snippet/download/{user}/{file}",
                self.http.get(self.snippet_download_url(user, filename)),
            )
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn transcript(
        &self,
        session: &SessionId,
        user: &UserId,
        with_timestamps: bool,
    ) -> Result<TranscriptPayload> {
        let endpoint = "GET /transcript/{id}";
        let path = format!("/transcript/{}", encode(session.as_str()));
        let request = self.http.get(self.url(&path)).query(&[
            ("user_id", user.to_string()),
            ("with_timestamps", with_timestamps.to_string()),
        ]);
        let body = self.fetch(endpoint, request).await?.text().await?;

        if with_timestamps {
            decode::<Transcript>(endpoint, &body).map(TranscriptPayload::Timed)
        } else {
            decode::<TranscriptText>(endpoint, &body).map(TranscriptPayload::Plain)
        }
    }

    async fn health(&self) -> Result<Health> {
        self.send("GET /health", self.http.get(self.url("/health")))
            .await
    }
}

/// Decodes and validates a response body against its schema.
pub fn decode<T: DeserializeOwned + Schema>(endpoint: &str, body: &str) -> Result<T> {
    let value: T = serde_json::from_str(body).map_err(|e| ApiError::UnexpectedResponse {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    value
        .validate()
        .map_err(|reason| ApiError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            reason,
        })?;
    Ok(value)
}

/// Pulls the human-readable `detail` out of an error body.
fn extract_detail(body: &str, reason: Option<&str>) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(other) => return other.to_string(),
            None => {}
        },
        _ => {}
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    reason.unwrap_or("Request failed").to_string()
}
