use serde_json::json;
use vidlens_core::{
    ApiClient, ApiError, ClientConfig, ConversationId, SessionId, SnippetQuery, UserId, VideoApi,
    VideoUpload, types::TranscriptPayload,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header_exists, method, path, query_param},
};

fn client_for(server: &MockServer) -> ApiClient {
    let config = ClientConfig::default().with_api_url(&format!("{}/api", server.uri()));
    ApiClient::new(&config).unwrap()
}

fn user() -> UserId {
    UserId::from("user_1")
}

#[tokio::test]
async fn process_url_posts_json_and_decodes_descriptor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process/url"))
        .and(body_json(json!({
            "user_id": "user_1",
            "video_url": "https://youtube.com/watch?v=abc",
            "language": "en"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s1",
            "title": "Demo",
            "duration": 125,
            "message": "ready"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor = client_for(&server)
        .process_url(&user(), "https://youtube.com/watch?v=abc", "en")
        .await
        .unwrap();

    assert_eq!(descriptor.session_id.as_str(), "s1");
    assert_eq!(descriptor.duration, 125.0);
    assert_eq!(descriptor.message, "ready");
}

#[tokio::test]
async fn upload_sends_multipart_with_user_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/process/upload"))
        .and(query_param("user_id", "user_1"))
        .and(query_param("language", "de"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s2",
            "title": "clip.mp4",
            "duration": 10.5,
            "message": "processed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let upload = VideoUpload {
        file_name: "clip.mp4".to_string(),
        bytes: b"not really a video".to_vec(),
    };
    let descriptor = client_for(&server)
        .process_upload(&user(), upload, Some("de"))
        .await
        .unwrap();

    assert_eq!(descriptor.session_id.as_str(), "s2");
}

#[tokio::test]
async fn sessions_are_listed_for_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(query_param("user_id", "user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [
                {"session_id": "s2", "title": "Newer", "duration": 30, "source": "local",
                 "created_at": "2025-01-02T00:00:00"},
                {"session_id": "s1", "title": "Older", "duration": 60, "source": "youtube"}
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    let list = client_for(&server).list_sessions(&user()).await.unwrap();

    assert_eq!(list.total, 2);
    assert_eq!(list.sessions[0].title, "Newer");
    assert_eq!(list.sessions[1].source.label(), "YouTube");
}

#[tokio::test]
async fn delete_targets_session_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/sessions/s1"))
        .and(query_param("user_id", "user_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Session deleted",
            "session_id": "s1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client_for(&server)
        .delete_session(&SessionId::from("s1"), &user())
        .await
        .unwrap();
    assert_eq!(ack.session_id.as_str(), "s1");
}

#[tokio::test]
async fn search_posts_query_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .and(body_json(json!({
            "user_id": "user_1",
            "session_id": "s1",
            "query": "rust",
            "n_results": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "rust",
            "results": [{"text": "we talk about Rust", "start": 4.0, "end": 9.0, "relevance": 0.82}],
            "count": 1
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .search(&user(), &SessionId::from("s1"), "rust", 5)
        .await
        .unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].relevance, 0.82);
}

#[tokio::test]
async fn converse_and_history_share_conversation_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/query"))
        .and(body_json(json!({
            "user_id": "user_1",
            "session_id": "s1",
            "conversation_id": "conv_1",
            "query": "summarize"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "intent": "summary",
            "query": "summarize",
            "response": "It is about Rust.",
            "key_points": [{"title": "Ownership", "summary": "Moves and borrows"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversation/conv_1/messages"))
        .and(query_param("user_id", "user_1"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv_1",
            "messages": [
                {"role": "user", "content": "summarize"},
                {"role": "assistant", "content": "It is about Rust."}
            ],
            "count": 2
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let conversation = ConversationId::from("conv_1");
    let reply = client
        .converse(&user(), &SessionId::from("s1"), &conversation, "summarize")
        .await
        .unwrap();
    let history = client
        .conversation_history(&user(), &conversation, 50)
        .await
        .unwrap();

    assert_eq!(reply.key_points[0].title, "Ownership");
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[1].content, reply.response);
}

#[tokio::test]
async fn snippet_by_query_sends_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/snippet/query"))
        .and(body_json(json!({
            "user_id": "user_1",
            "session_id": "s1",
            "query": "intro",
            "max_duration": 60.0,
            "n_results": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "youtube",
            "query": "intro",
            "total_snippets": 1,
            "snippets": [{
                "index": 1,
                "relevance": 0.9,
                "context": "Hello and welcome",
                "links": {
                    "watch_url": "https://www.youtube.com/watch?v=abc&t=0s",
                    "short_url": "https://youtu.be/abc?t=0",
                    "embed_url": "https://www.youtube.com/embed/abc?start=0&end=4",
                    "start_time": 0.0,
                    "end_time": 4.0,
                    "duration": 4.0,
                    "timestamp_display": "0:00 - 0:04"
                }
            }]
        })))
        .mount(&server)
        .await;

    let batch = client_for(&server)
        .snippet_by_query(&user(), &SessionId::from("s1"), &SnippetQuery::new("intro"))
        .await
        .unwrap();
    assert_eq!(batch.snippets.len(), 1);
    assert!(batch.snippets[0].links.is_some());
}

#[tokio::test]
async fn snippet_by_range_and_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/snippet/timestamp"))
        .and(body_json(json!({
            "user_id": "user_1",
            "session_id": "s1",
            "start_time": 10.0,
            "end_time": 20.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "source": "local",
            "snippet_path": "/data/user_1/snippets/snippet_10-20.mp4",
            "start_time": 10.0,
            "end_time": 20.0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/snippet/download/user_1/snippet_10-20.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let snippet = client
        .snippet_by_range(&user(), &SessionId::from("s1"), 10.0, 20.0)
        .await
        .unwrap();
    let bytes = client
        .download_snippet(&user(), "snippet_10-20.mp4")
        .await
        .unwrap();

    assert!(snippet.location().is_some());
    assert_eq!(bytes, b"mp4-bytes");
}

#[tokio::test]
async fn transcript_variants_follow_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transcript/s1"))
        .and(query_param("with_timestamps", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segments": [{"start": 0.0, "end": 4.0, "text": "Hello"}],
            "duration": 4.0,
            "language": "en"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/transcript/s1"))
        .and(query_param("with_timestamps", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Hello",
            "duration": 4.0,
            "language": "en"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = SessionId::from("s1");
    let timed = client.transcript(&session, &user(), true).await.unwrap();
    let plain = client.transcript(&session, &user(), false).await.unwrap();

    assert!(matches!(timed, TranscriptPayload::Timed(ref t) if t.segments.len() == 1));
    assert!(matches!(plain, TranscriptPayload::Plain(ref t) if t.text == "Hello"));
}

#[tokio::test]
async fn document_and_markdown_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/document/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s1",
            "title": "Demo",
            "overview": "About Rust.",
            "key_points": [{
                "title": "Ownership",
                "summary": "Every value has one owner.",
                "timestamp_start": 5.0,
                "timestamp_end": 30.0,
                "importance": "high"
            }],
            "action_items": ["Read the book"],
            "markdown": "# Demo"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/document/s1/download"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Demo\n\nAbout Rust."))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let session = SessionId::from("s1");
    let doc = client.helper_document(&session, &user()).await.unwrap();
    let markdown = client
        .helper_document_markdown(&session, &user())
        .await
        .unwrap();

    assert_eq!(doc.key_points.len(), 1);
    assert!(markdown.starts_with("# Demo"));
}

#[tokio::test]
async fn health_reports_api_key_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "api_key_set": false
        })))
        .mount(&server)
        .await;

    let health = client_for(&server).health().await.unwrap();
    assert!(health.is_healthy());
    assert!(!health.api_key_set);
}

#[tokio::test]
async fn error_detail_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/document/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Session not found"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .helper_document(&SessionId::from("missing"), &user())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Session not found");
    assert!(!err.is_connectivity());
}

#[tokio::test]
async fn malformed_body_is_unexpected_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_sessions(&user()).await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let err = client.health().await.unwrap_err();
    assert!(err.is_connectivity(), "got {err:?}");
}
