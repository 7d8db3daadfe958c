use async_trait::async_trait;

use crate::{
    api::{SnippetQuery, VideoApi},
    controller::ControllerEvent,
    error::{ApiError, Result},
    format::{format_snippet, format_timestamp_snippet, parse_timestamp},
    types::{SessionId, SnippetBatch, TimestampSnippet, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, Ticket, ViewError, ViewRequest},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SnippetMode {
    #[default]
    ByQuery,
    ByRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnippetRequest {
    Query {
        session: SessionId,
        query: SnippetQuery,
    },
    Range {
        session: SessionId,
        start: f64,
        end: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnippetOutcome {
    Batch(SnippetBatch),
    Single(TimestampSnippet),
}

impl SnippetOutcome {
    pub fn lines(&self) -> Vec<String> {
        match self {
            SnippetOutcome::Batch(batch) => batch.snippets.iter().map(format_snippet).collect(),
            SnippetOutcome::Single(snippet) => vec![format_timestamp_snippet(snippet)],
        }
    }

    /// Backend file names of rendered clips, for download.
    pub fn files(&self) -> Vec<String> {
        let paths: Vec<&str> = match self {
            SnippetOutcome::Batch(batch) => batch
                .snippets
                .iter()
                .filter_map(|s| s.snippet_path.as_deref())
                .collect(),
            SnippetOutcome::Single(snippet) => snippet.snippet_path.as_deref().into_iter().collect(),
        };
        paths
            .into_iter()
            .filter_map(|p| p.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl ViewRequest for SnippetRequest {
    type Output = SnippetOutcome;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<SnippetOutcome> {
        match self {
            SnippetRequest::Query { session, query } => api
                .snippet_by_query(user, session, query)
                .await
                .map(SnippetOutcome::Batch),
            SnippetRequest::Range {
                session,
                start,
                end,
            } => api
                .snippet_by_range(user, session, *start, *end)
                .await
                .map(SnippetOutcome::Single),
        }
    }
}

/// Clip creation, either by topic or by explicit time range
#[derive(Default)]
pub struct SnippetView {
    pub mode: SnippetMode,
    pub query: String,
    pub start: String,
    pub end: String,
    slot: RequestSlot<SnippetOutcome>,
}

impl SnippetView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<SnippetOutcome> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    pub fn set_mode(&mut self, mode: SnippetMode) {
        if self.mode != mode && !self.is_busy() {
            self.mode = mode;
            self.slot.reset();
        }
    }

    pub fn begin(&mut self) -> Option<Pending<SnippetRequest>> {
        let session = self.slot.session()?.clone();
        if self.is_busy() {
            return None;
        }

        let request = match self.mode {
            SnippetMode::ByQuery => {
                let query = self.query.trim();
                if query.is_empty() {
                    return None;
                }
                SnippetRequest::Query {
                    session,
                    query: SnippetQuery::new(query),
                }
            }
            SnippetMode::ByRange => match validate_range(&self.start, &self.end) {
                Ok((start, end)) => SnippetRequest::Range {
                    session,
                    start,
                    end,
                },
                Err(err) => {
                    self.slot.fail(ViewError::from(err));
                    return None;
                }
            },
        };

        let ticket = self.slot.begin()?;
        Some(Pending { ticket, request })
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<SnippetOutcome>) {
        self.slot.finish(ticket, result);
    }
}

/// Start must be non-negative and strictly before end.
pub fn validate_range(start: &str, end: &str) -> Result<(f64, f64)> {
    let invalid = |reason: &str| ApiError::InvalidInput {
        reason: reason.to_string(),
    };
    let start = parse_timestamp(start).ok_or_else(|| invalid("Start time is not a valid time"))?;
    let end = parse_timestamp(end).ok_or_else(|| invalid("End time is not a valid time"))?;
    if start >= end {
        return Err(invalid("Start time must be before end time"));
    }
    Ok((start, end))
}

impl SessionObserver for SnippetView {
    fn on_event(&mut self, event: &ControllerEvent) {
        if let ControllerEvent::ActiveSessionChanged { current, .. } = event {
            self.slot.bind(current.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;

    fn bound_view(mode: SnippetMode) -> SnippetView {
        let mut view = SnippetView::new();
        view.on_event(&ControllerEvent::ActiveSessionChanged {
            previous: None,
            current: Some(SessionId::from("s1")),
        });
        view.set_mode(mode);
        view
    }

    #[test]
    fn range_requires_start_before_end() {
        assert_eq!(validate_range("0:10", "0:20").unwrap(), (10.0, 20.0));
        assert!(validate_range("20", "20").is_err());
        assert!(validate_range("30", "10").is_err());
        assert!(validate_range("-1", "10").is_err());
        assert!(validate_range("soon", "10").is_err());
    }

    #[test]
    fn invalid_range_fails_without_request() {
        let mut view = bound_view(SnippetMode::ByRange);
        view.start = "1:00".to_string();
        view.end = "0:30".to_string();

        assert!(view.begin().is_none());
        assert!(
            view.state()
                .error()
                .unwrap()
                .message
                .ends_with("Start time must be before end time")
        );
    }

    #[tokio::test]
    async fn range_snippet_points_at_rendered_file() {
        let api = FakeApi::new();
        let mut view = bound_view(SnippetMode::ByRange);
        view.start = "10".to_string();
        view.end = "20".to_string();

        let (ticket, outcome) = view
            .begin()
            .unwrap()
            .execute(&api, &UserId::from("u1"))
            .await;
        view.complete(&ticket, outcome);

        let outcome = view.state().value().unwrap();
        assert_eq!(outcome.files(), vec!["snippet_10-20.mp4"]);
        assert_eq!(outcome.lines(), vec!["[00:10–00:20] /snippets/snippet_10-20.mp4"]);
    }

    #[tokio::test]
    async fn no_relevant_content_is_shown_inline() {
        let api = FakeApi::new();
        let mut view = bound_view(SnippetMode::ByQuery);
        view.query = "quantum".to_string();

        let (ticket, outcome) = view
            .begin()
            .unwrap()
            .execute(&api, &UserId::from("u1"))
            .await;
        view.complete(&ticket, outcome);

        assert_eq!(
            view.state().error().unwrap().message,
            "No relevant content found"
        );
        assert_eq!(api.calls(), vec!["snippet_by_query s1 quantum"]);
    }
}
