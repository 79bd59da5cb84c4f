//! Chat state repository
//!
//! Each chat owns its own lock. The map lock is only held long enough to
//! find or insert a chat's slot, so chats never wait on each other while a
//! transition runs.

use crate::state_machine::{ChatId, ChatState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State for chat {0} is poisoned")]
    Poisoned(ChatId),
    #[error("Chat index is poisoned")]
    IndexPoisoned,
}

/// Storage for per-chat state
pub trait ChatRepository: Send + Sync {
    /// Run `f` with exclusive access to the chat's state, creating it on first use
    fn mutate<T>(
        &self,
        chat_id: ChatId,
        f: impl FnOnce(&mut ChatState) -> T,
    ) -> Result<T, StoreError>;

    /// Copy of the chat's state, `None` if the chat has never been seen
    fn snapshot(&self, chat_id: ChatId) -> Result<Option<ChatState>, StoreError>;

    /// Number of chats seen so far
    #[allow(dead_code)] // API completeness
    fn chat_count(&self) -> Result<usize, StoreError>;
}

type ChatSlot = Arc<Mutex<ChatState>>;

/// In-memory repository, lives for the process lifetime
#[derive(Default)]
pub struct InMemoryChatStore {
    chats: RwLock<HashMap<ChatId, ChatSlot>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, chat_id: ChatId) -> Result<Option<ChatSlot>, StoreError> {
        let chats = self.chats.read().map_err(|_| StoreError::IndexPoisoned)?;
        Ok(chats.get(&chat_id).cloned())
    }

    fn get_or_create(&self, chat_id: ChatId) -> Result<ChatSlot, StoreError> {
        if let Some(slot) = self.existing(chat_id)? {
            return Ok(slot);
        }

        let mut chats = self.chats.write().map_err(|_| StoreError::IndexPoisoned)?;
        let slot = chats.entry(chat_id).or_insert_with(|| {
            tracing::debug!(chat_id = %chat_id, "Creating chat state");
            Arc::new(Mutex::new(ChatState::default()))
        });
        Ok(Arc::clone(slot))
    }
}

impl ChatRepository for InMemoryChatStore {
    fn mutate<T>(
        &self,
        chat_id: ChatId,
        f: impl FnOnce(&mut ChatState) -> T,
    ) -> Result<T, StoreError> {
        let slot = self.get_or_create(chat_id)?;
        let mut state = slot.lock().map_err(|_| StoreError::Poisoned(chat_id))?;
        Ok(f(&mut state))
    }

    fn snapshot(&self, chat_id: ChatId) -> Result<Option<ChatState>, StoreError> {
        let Some(slot) = self.existing(chat_id)? else {
            return Ok(None);
        };
        let state = slot.lock().map_err(|_| StoreError::Poisoned(chat_id))?;
        Ok(Some(state.clone()))
    }

    fn chat_count(&self) -> Result<usize, StoreError> {
        Ok(self
            .chats
            .read()
            .map_err(|_| StoreError::IndexPoisoned)?
            .len())
    }
}
