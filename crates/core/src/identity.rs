use tracing::info;
use uuid::Uuid;

use crate::{
    error::Result,
    storage::KeyValueStore,
    types::{ConversationId, SessionId, UserId},
};

pub const USER_ID_KEY: &str = "vidlens.user_id";
const CONVERSATION_KEY_PREFIX: &str = "vidlens.conversation";

/// Stable user identity plus one resettable conversation id per (user, session).
pub struct IdentityStore<S> {
    store: S,
}

impl<S: KeyValueStore> IdentityStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read-or-create. The value is persisted before it is returned.
    pub fn user_id(&self) -> Result<UserId> {
        if let Some(existing) = self.store.get(USER_ID_KEY)? {
            return Ok(UserId::new(existing));
        }

        let user_id = UserId::new(format!("user_{}", short_token()));
        self.store.set(USER_ID_KEY, user_id.as_str())?;
        info!(user_id = %user_id, "created user identity");
        Ok(user_id)
    }

    /// Read-or-create, keyed by the current user and `session`.
    pub fn conversation_id(&self, session: &SessionId) -> Result<ConversationId> {
        let key = conversation_key(&self.user_id()?, session);
        if let Some(existing) = self.store.get(&key)? {
            return Ok(ConversationId::new(existing));
        }
        self.issue_conversation(&key)
    }

    /// Replaces the stored conversation for `session` with a fresh one.
    pub fn new_conversation(&self, session: &SessionId) -> Result<ConversationId> {
        let key = conversation_key(&self.user_id()?, session);
        self.issue_conversation(&key)
    }

    fn issue_conversation(&self, key: &str) -> Result<ConversationId> {
        let conversation = ConversationId::new(format!("conv_{}", short_token()));
        self.store.set(key, conversation.as_str())?;
        info!(key, conversation_id = %conversation, "issued conversation id");
        Ok(conversation)
    }
}

pub fn conversation_key(user: &UserId, session: &SessionId) -> String {
    format!("{CONVERSATION_KEY_PREFIX}.{user}.{session}")
}

fn short_token() -> String {
    Uuid::new_v4().simple().to_string()
}
