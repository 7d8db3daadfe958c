use async_trait::async_trait;

use crate::{
    api::{DEFAULT_SEARCH_RESULTS, VideoApi},
    controller::ControllerEvent,
    error::Result,
    format::format_search_results,
    types::{SearchResponse, SessionId, UserId},
    views::{Pending, RequestSlot, RequestState, SessionObserver, Ticket, ViewRequest},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub session: SessionId,
    pub query: String,
    pub n_results: u32,
}

#[async_trait]
impl ViewRequest for SearchRequest {
    type Output = SearchResponse;

    async fn execute(&self, api: &dyn VideoApi, user: &UserId) -> Result<SearchResponse> {
        api.search(user, &self.session, &self.query, self.n_results)
            .await
    }
}

/// Semantic search over the active session's transcript
pub struct SearchView {
    pub query: String,
    pub limit: u32,
    submitted: Option<String>,
    slot: RequestSlot<SearchResponse>,
}

impl Default for SearchView {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: DEFAULT_SEARCH_RESULTS,
            submitted: None,
            slot: RequestSlot::new(),
        }
    }
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState<SearchResponse> {
        self.slot.state()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_loading()
    }

    /// Blank queries and a missing session are refused without a request.
    pub fn begin(&mut self) -> Option<Pending<SearchRequest>> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return None;
        }
        let session = self.slot.session()?.clone();
        let ticket = self.slot.begin()?;
        self.submitted = Some(query.clone());
        Some(Pending {
            ticket,
            request: SearchRequest {
                session,
                query,
                n_results: self.limit.max(1),
            },
        })
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<SearchResponse>) {
        self.slot.finish(ticket, result);
    }

    /// Rendered result lines, with the empty notice quoting the submitted query.
    pub fn lines(&self) -> Vec<String> {
        match (self.slot.state().value(), &self.submitted) {
            (Some(response), Some(query)) => format_search_results(query, &response.results),
            (Some(response), None) => format_search_results(&response.query, &response.results),
            _ => Vec::new(),
        }
    }
}

impl SessionObserver for SearchView {
    fn on_event(&mut self, event: &ControllerEvent) {
        if let ControllerEvent::ActiveSessionChanged { current, .. } = event {
            if self.slot.bind(current.clone()) {
                self.submitted = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, result};

    fn bound_view(session: &str) -> SearchView {
        let mut view = SearchView::new();
        view.on_event(&ControllerEvent::ActiveSessionChanged {
            previous: None,
            current: Some(SessionId::from(session)),
        });
        view
    }

    #[tokio::test]
    async fn renders_one_line_per_result() {
        let api = FakeApi::new();
        *api.search_results.lock().unwrap() = vec![
            result("intro", 0.0, 0.91),
            result("middle", 30.0, 0.5),
            result("outro", 60.0, 0.2),
        ];
        let mut view = bound_view("s1");
        view.query = "overview".to_string();
        view.limit = 2;

        let (ticket, outcome) = view
            .begin()
            .unwrap()
            .execute(&api, &UserId::from("u1"))
            .await;
        view.complete(&ticket, outcome);

        assert_eq!(view.lines().len(), 2);
        assert_eq!(api.calls(), vec!["search s1 overview 2"]);
    }

    #[tokio::test]
    async fn empty_results_show_notice() {
        let api = FakeApi::new();
        let mut view = bound_view("s1");
        view.query = "neural nets".to_string();

        let (ticket, outcome) = view
            .begin()
            .unwrap()
            .execute(&api, &UserId::from("u1"))
            .await;
        view.complete(&ticket, outcome);

        assert_eq!(view.lines(), vec!["No results found for \"neural nets\""]);
    }

    #[test]
    fn blank_query_or_no_session_is_refused() {
        let mut unbound = SearchView::new();
        unbound.query = "x".to_string();
        assert!(unbound.begin().is_none());

        let mut view = bound_view("s1");
        view.query = "   ".to_string();
        assert!(view.begin().is_none());
        assert_eq!(view.state(), &RequestState::Idle);
    }

    #[tokio::test]
    async fn late_results_for_previous_session_are_dropped() {
        let api = FakeApi::new();
        *api.search_results.lock().unwrap() = vec![result("intro", 0.0, 0.9)];
        let mut view = bound_view("a");
        view.query = "intro".to_string();
        let pending = view.begin().unwrap();

        view.on_event(&ControllerEvent::ActiveSessionChanged {
            previous: Some(SessionId::from("a")),
            current: Some(SessionId::from("b")),
        });
        let (ticket, outcome) = pending.execute(&api, &UserId::from("u1")).await;
        view.complete(&ticket, outcome);

        assert_eq!(view.state(), &RequestState::Idle);
        assert!(view.lines().is_empty());
    }
}
