//! Conversation store: chatrooms, selection, messages and paging.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, info, warn};

use crate::conversation::history;
use crate::conversation::search::filter_chatrooms;
use crate::conversation::types::{Chatroom, ChatroomSummary, Message};
use crate::core::config::{ChatConfig, HistoryConfig};
use crate::core::errors::{ChatError, ChatResult};
use crate::core::ids::ChatroomId;
use crate::persistence::{self, CHAT_NAMESPACE, KeyValueStore};
use crate::reply::ReplySimulator;
use crate::transport::{Operation, Transport};

/// Random stream for synthetic history senders.
const HISTORY_STREAM: u64 = 2;
/// Random stream for generic replies.
const REPLY_STREAM: u64 = 3;

#[derive(Debug, Default)]
struct ChatState {
    chatrooms: Vec<Chatroom>,
    current: Option<ChatroomId>,
    search_query: String,
    in_flight: usize,
    composing: HashMap<ChatroomId, usize>,
    loading_older: HashSet<ChatroomId>,
}

impl ChatState {
    fn find(&self, id: ChatroomId) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|room| room.id == id)
    }

    fn find_mut(&mut self, id: ChatroomId) -> Option<&mut Chatroom> {
        self.chatrooms.iter_mut().find(|room| room.id == id)
    }

    fn current_chatroom(&self) -> Option<&Chatroom> {
        self.current.and_then(|id| self.find(id))
    }

    fn is_composing(&self, id: ChatroomId) -> bool {
        self.composing.get(&id).is_some_and(|n| *n > 0)
    }

    fn end_composing(&mut self, id: ChatroomId) {
        if let Some(count) = self.composing.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.composing.remove(&id);
            }
        }
    }
}

/// Persisted shape of the chat namespace.
#[derive(Deserialize)]
struct ChatBlob {
    chatrooms: Vec<Chatroom>,
    current_chatroom_id: Option<ChatroomId>,
}

#[derive(Serialize)]
struct ChatBlobRef<'a> {
    chatrooms: &'a [Chatroom],
    current_chatroom_id: Option<ChatroomId>,
}

/// Read-only view of the conversation state for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatView {
    /// Every chatroom, most recently created first.
    pub chatrooms: Vec<Chatroom>,
    /// Selected chatroom, if any.
    pub current: Option<Chatroom>,
    /// Assistant is composing a reply in the current chatroom.
    pub is_typing: bool,
    /// A create or delete is in flight.
    pub is_loading: bool,
    /// Stored search query.
    pub search_query: String,
    /// Chatrooms matching the search query.
    pub filtered: Vec<Chatroom>,
}

/// Owner of the chatroom collection.
pub struct ConversationStore {
    state: RwLock<ChatState>,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KeyValueStore>,
    replies: ReplySimulator,
    history_rng: Mutex<StdRng>,
    history: HistoryConfig,
    revision: watch::Sender<u64>,
    persist_lock: Mutex<()>,
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(
        config: &ChatConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(ChatState::default()),
            transport,
            storage,
            replies: ReplySimulator::new(config.rng(REPLY_STREAM)),
            history_rng: Mutex::new(config.rng(HISTORY_STREAM)),
            history: config.history.clone(),
            revision,
            persist_lock: Mutex::new(()),
        }
    }

    /// Load the persisted chatrooms and selection.
    ///
    /// A dangling selection is dropped. Returns the number of chatrooms loaded.
    ///
    /// # Errors
    /// Returns an error if the stored blob cannot be read or decoded.
    pub async fn restore(&self) -> ChatResult<usize> {
        let blob: Option<ChatBlob> =
            persistence::load_json(self.storage.as_ref(), CHAT_NAMESPACE).await?;
        let Some(blob) = blob else {
            return Ok(0);
        };

        let count = blob.chatrooms.len();
        {
            let current = blob
                .current_chatroom_id
                .filter(|id| blob.chatrooms.iter().any(|room| room.id == *id));
            let mut state = self.state.write().await;
            state.chatrooms = blob.chatrooms;
            state.current = current;
        }
        info!(count, "Restored chatrooms");
        self.notify();
        Ok(count)
    }

    /// Persist the chatroom collection and selection.
    ///
    /// # Errors
    /// Returns an error if serialization or the underlying store fails.
    pub async fn save(&self) -> ChatResult<()> {
        let _guard = self.persist_lock.lock().await;
        let json = {
            let state = self.state.read().await;
            persistence::encode_json(&ChatBlobRef {
                chatrooms: &state.chatrooms,
                current_chatroom_id: state.current,
            })?
        };
        self.storage.set(CHAT_NAMESPACE, json).await?;
        debug!("Persisted chatrooms");
        Ok(())
    }

    /// Create a chatroom at the head of the list and select it.
    ///
    /// # Errors
    /// Returns `ChatError::EmptyTitle` for a blank title, or
    /// `ChatError::TransportFailure` if the round-trip fails.
    pub async fn create_chatroom(&self, title: &str) -> ChatResult<Chatroom> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::EmptyTitle);
        }

        self.begin_operation().await;
        let outcome = self.transport.round_trip(Operation::CreateChatroom).await;
        self.end_operation(outcome).await?;

        let room = Chatroom::new(title);
        {
            let mut state = self.state.write().await;
            state.chatrooms.insert(0, room.clone());
            state.current = Some(room.id);
        }
        info!(chatroom_id = %room.id, title, "Created chatroom");
        self.commit().await;
        Ok(room)
    }

    /// Delete a chatroom, clearing the selection if it was current.
    ///
    /// # Errors
    /// Returns `ChatError::TransportFailure` if the round-trip fails.
    pub async fn delete_chatroom(&self, id: ChatroomId) -> ChatResult<bool> {
        self.begin_operation().await;
        let outcome = self.transport.round_trip(Operation::DeleteChatroom).await;
        self.end_operation(outcome).await?;

        let removed = {
            let mut state = self.state.write().await;
            let before = state.chatrooms.len();
            state.chatrooms.retain(|room| room.id != id);
            if state.current == Some(id) {
                state.current = None;
            }
            state.chatrooms.len() != before
        };

        if removed {
            info!(chatroom_id = %id, "Deleted chatroom");
            self.commit().await;
        } else {
            debug!(chatroom_id = %id, "Delete ignored for unknown chatroom");
        }
        Ok(removed)
    }

    /// Rename a chatroom in place.
    ///
    /// # Errors
    /// Returns `ChatError::EmptyTitle` for a blank title.
    pub async fn rename_chatroom(&self, id: ChatroomId, title: &str) -> ChatResult<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::EmptyTitle);
        }

        let renamed = {
            let mut state = self.state.write().await;
            state.find_mut(id).map(|room| room.title = title.to_string()).is_some()
        };
        if renamed {
            debug!(chatroom_id = %id, title, "Renamed chatroom");
            self.commit().await;
        }
        Ok(renamed)
    }

    /// Change the selection. `None` deselects.
    ///
    /// Returns `false` and keeps the selection for an unknown id.
    pub async fn select_chatroom(&self, id: Option<ChatroomId>) -> bool {
        {
            let mut state = self.state.write().await;
            if let Some(unknown) = id.filter(|id| state.find(*id).is_none()) {
                debug!(chatroom_id = %unknown, "Select ignored for unknown chatroom");
                return false;
            }
            state.current = id;
        }
        debug!(chatroom_id = ?id, "Selected chatroom");
        self.commit().await;
        true
    }

    /// Post a user message to the current chatroom and wait for the reply.
    ///
    /// The reply is appended to the chatroom that was current when the
    /// message was sent, whatever is selected by then. Returns `None` if
    /// that chatroom was deleted before the reply arrived.
    ///
    /// # Errors
    /// Returns `ChatError::NoCurrentChatroom` without a selection, or
    /// `ChatError::EmptyMessage` when there is neither text nor an image.
    pub async fn send_message(
        &self,
        content: &str,
        image_url: Option<String>,
    ) -> ChatResult<Option<Message>> {
        let content = content.trim();
        if content.is_empty() && image_url.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let target = {
            let mut state = self.state.write().await;
            let id = state.current_chatroom().map(|room| room.id);
            let Some(id) = id else {
                return Err(ChatError::NoCurrentChatroom);
            };
            if let Some(room) = state.find_mut(id) {
                let timestamp = room.next_timestamp(Utc::now());
                room.push(Message::user(content, image_url, timestamp));
            }
            *state.composing.entry(id).or_insert(0) += 1;
            id
        };
        debug!(chatroom_id = %target, "User message appended");
        self.commit().await;

        if let Err(err) = self.transport.round_trip(Operation::AssistantReply).await {
            warn!(%err, "Assistant delay reported a failure");
        }
        let text = self.replies.reply_to(content).await;

        let reply = {
            let mut state = self.state.write().await;
            state.end_composing(target);
            state.find_mut(target).map(|room| {
                let message = Message::assistant(text, room.next_timestamp(Utc::now()));
                room.push(message.clone());
                message
            })
        };

        if reply.is_none() {
            warn!(chatroom_id = %target, "Dropped reply for deleted chatroom");
            self.notify();
            return Ok(None);
        }
        self.commit().await;
        Ok(reply)
    }

    /// Prepend one page of synthetic older messages to a chatroom.
    ///
    /// Returns the page, oldest first. An unknown chatroom, or one already
    /// loading, yields an empty page.
    ///
    /// # Errors
    /// Returns `ChatError::TransportFailure` if the round-trip fails.
    pub async fn load_older_messages(&self, id: ChatroomId) -> ChatResult<Vec<Message>> {
        {
            let mut state = self.state.write().await;
            if state.find(id).is_none() || !state.loading_older.insert(id) {
                debug!(chatroom_id = %id, "Older messages not loaded");
                return Ok(Vec::new());
            }
        }
        let outcome = self.transport.round_trip(Operation::LoadOlder).await;

        let mut state = self.state.write().await;
        state.loading_older.remove(&id);
        if let Err(err) = outcome {
            drop(state);
            self.notify();
            return Err(err);
        }

        let before = state
            .find(id)
            .map(|room| room.earliest_timestamp().unwrap_or_else(Utc::now));
        let Some(before) = before else {
            drop(state);
            warn!(chatroom_id = %id, "Chatroom deleted while loading history");
            self.notify();
            return Ok(Vec::new());
        };
        let page = {
            let mut rng = self.history_rng.lock().await;
            history::generate_page(before, &self.history, &mut *rng)
        };
        if let Some(room) = state.find_mut(id) {
            room.prepend(page.clone());
        }
        drop(state);

        let (users, assistants) = history::sender_mix(&page);
        info!(chatroom_id = %id, count = page.len(), users, assistants, "Loaded older messages");
        self.commit().await;
        Ok(page)
    }

    /// Store the sidebar search query.
    pub async fn set_search_query(&self, query: &str) {
        self.state.write().await.search_query = query.to_string();
        self.notify();
    }

    /// Chatrooms matching the stored search query.
    pub async fn filtered_chatrooms(&self) -> Vec<Chatroom> {
        let state = self.state.read().await;
        filter_chatrooms(&state.chatrooms, &state.search_query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every chatroom, most recently created first.
    pub async fn chatrooms(&self) -> Vec<Chatroom> {
        self.state.read().await.chatrooms.clone()
    }

    /// Chatroom by id.
    pub async fn chatroom(&self, id: ChatroomId) -> Option<Chatroom> {
        self.state.read().await.find(id).cloned()
    }

    /// Selected chatroom, resolved against the current collection.
    pub async fn current_chatroom(&self) -> Option<Chatroom> {
        self.state.read().await.current_chatroom().cloned()
    }

    /// Sidebar summaries in list order.
    pub async fn summaries(&self) -> Vec<ChatroomSummary> {
        self.state
            .read()
            .await
            .chatrooms
            .iter()
            .map(Chatroom::summary)
            .collect()
    }

    /// Read-only view for rendering.
    pub async fn snapshot(&self) -> ChatView {
        let state = self.state.read().await;
        let current = state.current_chatroom().cloned();
        let is_typing = current.as_ref().is_some_and(|room| state.is_composing(room.id));
        ChatView {
            chatrooms: state.chatrooms.clone(),
            current,
            is_typing,
            is_loading: state.in_flight > 0,
            search_query: state.search_query.clone(),
            filtered: filter_chatrooms(&state.chatrooms, &state.search_query)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    /// Subscribe to change notifications. The value is a revision counter.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    async fn begin_operation(&self) {
        self.state.write().await.in_flight += 1;
        self.notify();
    }

    async fn end_operation(&self, outcome: ChatResult<()>) -> ChatResult<()> {
        {
            let mut state = self.state.write().await;
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        if let Err(err) = outcome {
            warn!(%err, "Chat operation failed");
            self.notify();
            return Err(err);
        }
        Ok(())
    }

    /// Persist, then bump the revision.
    async fn commit(&self) {
        if let Err(err) = self.save().await {
            warn!(?err, "Failed to persist chatrooms");
        }
        self.notify();
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
