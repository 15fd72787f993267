//! Owner-scoped conversation storage.
//!
//! One live conversation per owner: creating a new conversation for an
//! owner supersedes and deletes the prior one. Expiry is lazy (checked on
//! read) with a TTL driven by `updated_at`, and the total conversation
//! count is bounded; exceeding the bound evicts the least recently
//! updated conversations.
//!
//! Every mutating call persists the affected snapshots before returning,
//! so callers (and tests) can rely on the on-disk state deterministically.

use crate::conversation::Conversation;
use crate::error::StoreError;
use crate::message::Message;
use crate::snapshot::{self, OwnerEntry};
use chrono::{DateTime, Duration, Utc};
use megaphone_core::{ConversationId, UserId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Configuration for the conversation store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding conversation snapshots and the owner mapping.
    pub data_dir: PathBuf,
    /// Conversations idle longer than this are expired.
    pub ttl: Duration,
    /// Per-conversation message cap; oldest non-system messages are
    /// evicted past it.
    pub max_messages: usize,
    /// Global conversation cap; least recently updated conversations are
    /// evicted past it.
    pub max_conversations: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            ttl: Duration::days(7),
            max_messages: 50,
            max_conversations: 1000,
        }
    }
}

/// Per-conversation stats for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationStats {
    /// Conversation identifier.
    pub id: ConversationId,
    /// The owning user.
    pub owner_id: UserId,
    /// Number of stored messages.
    pub message_count: usize,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

/// Store-wide stats for the debug endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    /// Total live conversations.
    pub conversation_count: usize,
    /// Per-conversation breakdown.
    pub conversations: Vec<ConversationStats>,
}

#[derive(Debug, Default)]
struct State {
    conversations: HashMap<ConversationId, Conversation>,
    owners: HashMap<UserId, ConversationId>,
}

impl State {
    fn owner_entries(&self) -> Vec<OwnerEntry> {
        self.owners
            .iter()
            .map(|(&owner_id, &conversation_id)| OwnerEntry {
                owner_id,
                conversation_id,
            })
            .collect()
    }
}

/// Durable, owner-scoped chat session storage.
///
/// Constructed once at process start and shared by reference; there is no
/// per-conversation mutex, so serializing turns for one conversation is
/// the caller's responsibility.
#[derive(Debug)]
pub struct ConversationStore {
    config: StoreConfig,
    state: RwLock<State>,
}

impl ConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            state: RwLock::new(State::default()),
        }
    }

    /// Reconstructs state from on-disk snapshots.
    ///
    /// Expired conversations are discarded, and owners with more than one
    /// stored conversation keep only the most recently updated one. The
    /// owner mapping is rebuilt from the surviving conversations and
    /// rewritten.
    ///
    /// Returns the number of conversations loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot directory cannot be read.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let (loaded, stale_entries) = snapshot::load_all(&self.config.data_dir).await?;

        let mut latest_per_owner: HashMap<UserId, Conversation> = HashMap::new();
        let mut discarded: Vec<ConversationId> = Vec::new();

        for conversation in loaded {
            if conversation.is_expired(self.config.ttl) {
                tracing::debug!(conversation_id = %conversation.id, "discarding expired conversation on load");
                discarded.push(conversation.id);
                continue;
            }
            match latest_per_owner.entry(conversation.owner_id) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(conversation);
                }
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    if conversation.updated_at > entry.get().updated_at {
                        discarded.push(entry.get().id);
                        entry.insert(conversation);
                    } else {
                        discarded.push(conversation.id);
                    }
                }
            }
        }

        for entry in stale_entries {
            if !latest_per_owner.contains_key(&entry.owner_id) {
                tracing::debug!(
                    owner_id = %entry.owner_id,
                    conversation_id = %entry.conversation_id,
                    "dropping dangling owner mapping on load"
                );
            }
        }

        let mut state = self.state.write().await;
        state.conversations.clear();
        state.owners.clear();
        for (owner_id, conversation) in latest_per_owner {
            state.owners.insert(owner_id, conversation.id);
            state.conversations.insert(conversation.id, conversation);
        }
        let count = state.conversations.len();
        let entries = state.owner_entries();
        drop(state);

        for id in discarded {
            snapshot::remove_conversation(&self.config.data_dir, id).await?;
        }
        snapshot::save_owners(&self.config.data_dir, &entries).await?;

        tracing::info!(conversations = count, "conversation store loaded");
        Ok(count)
    }

    /// Creates a conversation for an owner, superseding any prior one.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot cannot be persisted.
    pub async fn create_conversation(
        &self,
        owner_id: UserId,
        system_prompt: &str,
    ) -> Result<Conversation, StoreError> {
        let mut state = self.state.write().await;

        let mut removed: Vec<ConversationId> = Vec::new();
        if let Some(prior) = state.owners.remove(&owner_id) {
            state.conversations.remove(&prior);
            removed.push(prior);
        }

        let conversation = Conversation::new(owner_id, system_prompt);
        state.owners.insert(owner_id, conversation.id);
        state
            .conversations
            .insert(conversation.id, conversation.clone());

        removed.extend(Self::evict_over_cap(
            &mut state,
            self.config.max_conversations,
        ));

        let entries = state.owner_entries();
        drop(state);

        for id in removed {
            snapshot::remove_conversation(&self.config.data_dir, id).await?;
        }
        snapshot::save_conversation(&self.config.data_dir, &conversation).await?;
        snapshot::save_owners(&self.config.data_dir, &entries).await?;

        tracing::info!(conversation_id = %conversation.id, owner_id = %owner_id, "conversation created");
        Ok(conversation)
    }

    /// Fetches a conversation, expiring it lazily if it has outlived the
    /// TTL (in which case the stored record is deleted and `None` is
    /// returned).
    ///
    /// # Errors
    ///
    /// Returns an error if an expired snapshot cannot be removed.
    pub async fn get_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let mut state = self.state.write().await;
        let Some(conversation) = state.conversations.get(&id) else {
            return Ok(None);
        };

        if !conversation.is_expired(self.config.ttl) {
            return Ok(Some(conversation.clone()));
        }

        tracing::debug!(conversation_id = %id, "expiring conversation on read");
        state.conversations.remove(&id);
        state.owners.retain(|_, &mut v| v != id);
        let entries = state.owner_entries();
        drop(state);

        snapshot::remove_conversation(&self.config.data_dir, id).await?;
        snapshot::save_owners(&self.config.data_dir, &entries).await?;
        Ok(None)
    }

    /// Returns the owner's live conversation, creating one if absent or
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot cannot be persisted.
    pub async fn get_or_create_for_owner(
        &self,
        owner_id: UserId,
        system_prompt: &str,
    ) -> Result<Conversation, StoreError> {
        let live = {
            let state = self.state.read().await;
            state.owners.get(&owner_id).copied()
        };

        if let Some(id) = live
            && let Some(conversation) = self.get_conversation(id).await?
        {
            return Ok(conversation);
        }

        self.create_conversation(owner_id, system_prompt).await
    }

    /// Appends a message, enforcing the per-conversation message cap.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an absent conversation, or a
    /// persistence error if the snapshot cannot be written.
    pub async fn add_message(
        &self,
        id: ConversationId,
        message: Message,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let conversation = state
            .conversations
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        conversation.push_message(message);
        conversation.enforce_cap(self.config.max_messages);
        let snapshot_copy = conversation.clone();
        drop(state);

        snapshot::save_conversation(&self.config.data_dir, &snapshot_copy).await
    }

    /// Deletes a conversation and its owner mapping. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be removed.
    pub async fn delete_conversation(&self, id: ConversationId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let existed = state.conversations.remove(&id).is_some();
        if !existed {
            return Ok(false);
        }
        state.owners.retain(|_, &mut v| v != id);
        let entries = state.owner_entries();
        drop(state);

        snapshot::remove_conversation(&self.config.data_dir, id).await?;
        snapshot::save_owners(&self.config.data_dir, &entries).await?;

        tracing::info!(conversation_id = %id, "conversation deleted");
        Ok(true)
    }

    /// Removes every expired conversation. Used by the periodic sweep;
    /// lazy read-side expiry remains authoritative.
    ///
    /// Returns the number of conversations removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot cannot be removed.
    pub async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let expired: Vec<ConversationId> = state
            .conversations
            .values()
            .filter(|c| c.is_expired(self.config.ttl))
            .map(|c| c.id)
            .collect();

        for &id in &expired {
            state.conversations.remove(&id);
            state.owners.retain(|_, &mut v| v != id);
        }
        let entries = state.owner_entries();
        drop(state);

        for &id in &expired {
            snapshot::remove_conversation(&self.config.data_dir, id).await?;
        }
        if !expired.is_empty() {
            snapshot::save_owners(&self.config.data_dir, &entries).await?;
        }
        Ok(expired.len())
    }

    /// Returns conversation counts and per-conversation metadata.
    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        let mut conversations: Vec<ConversationStats> = state
            .conversations
            .values()
            .map(|c| ConversationStats {
                id: c.id,
                owner_id: c.owner_id,
                message_count: c.message_count(),
                updated_at: c.updated_at,
            })
            .collect();
        conversations.sort_by_key(|c| std::cmp::Reverse(c.updated_at));

        StoreStats {
            conversation_count: conversations.len(),
            conversations,
        }
    }

    fn evict_over_cap(state: &mut State, max_conversations: usize) -> Vec<ConversationId> {
        let mut evicted = Vec::new();
        while state.conversations.len() > max_conversations {
            let Some(oldest) = state
                .conversations
                .values()
                .min_by_key(|c| c.updated_at)
                .map(|c| c.id)
            else {
                break;
            };
            tracing::warn!(conversation_id = %oldest, "evicting conversation over global cap");
            state.conversations.remove(&oldest);
            state.owners.retain(|_, &mut v| v != oldest);
            evicted.push(oldest);
        }
        evicted
    }
}
