pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod identity;
pub mod storage;
pub mod types;
pub mod views;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, SnippetQuery, VideoApi, VideoUpload};
pub use config::ClientConfig;
pub use controller::{ControllerEvent, RootController, Tab};
pub use error::{ApiError, Result};
pub use format::{
    format_duration, format_relevance, format_search_results, format_timestamp, parse_timestamp,
};
pub use identity::IdentityStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use types::{ConversationId, SessionId, SessionSummary, UserId};
pub use workspace::Workspace;
