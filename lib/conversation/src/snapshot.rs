//! Snapshot persistence for conversations.
//!
//! Layout under the data directory:
//! - `conversations/<id>.json` — one whole-file JSON snapshot per conversation
//! - `owners.json` — owner id to live conversation id mapping
//!
//! Snapshots are rewritten wholesale on each save; there is no append log
//! or partial-write protocol, so a crash mid-write can lose the latest save.

use crate::conversation::Conversation;
use crate::error::StoreError;
use megaphone_core::{ConversationId, UserId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of the owner → live conversation mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerEntry {
    /// The owning user.
    pub owner_id: UserId,
    /// The owner's live conversation.
    pub conversation_id: ConversationId,
}

fn conversations_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("conversations")
}

fn conversation_path(data_dir: &Path, id: ConversationId) -> PathBuf {
    conversations_dir(data_dir).join(format!("{id}.json"))
}

fn owners_path(data_dir: &Path) -> PathBuf {
    data_dir.join("owners.json")
}

fn io_err(e: std::io::Error) -> StoreError {
    StoreError::Io {
        reason: e.to_string(),
    }
}

fn serde_err(e: serde_json::Error) -> StoreError {
    StoreError::Serialize {
        reason: e.to_string(),
    }
}

/// Persists a conversation snapshot, creating the directory on first use.
pub async fn save_conversation(
    data_dir: &Path,
    conversation: &Conversation,
) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(conversations_dir(data_dir))
        .await
        .map_err(io_err)?;
    let json = serde_json::to_vec_pretty(conversation).map_err(serde_err)?;
    tokio::fs::write(conversation_path(data_dir, conversation.id), json)
        .await
        .map_err(io_err)
}

/// Removes a conversation snapshot. Missing files are not an error.
pub async fn remove_conversation(data_dir: &Path, id: ConversationId) -> Result<(), StoreError> {
    match tokio::fs::remove_file(conversation_path(data_dir, id)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(e)),
    }
}

/// Persists the owner mapping snapshot.
pub async fn save_owners(data_dir: &Path, entries: &[OwnerEntry]) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(data_dir).await.map_err(io_err)?;
    let json = serde_json::to_vec_pretty(entries).map_err(serde_err)?;
    tokio::fs::write(owners_path(data_dir), json)
        .await
        .map_err(io_err)
}

/// Loads all conversation snapshots and the owner mapping.
///
/// Unreadable or corrupt snapshot files are skipped with a warning rather
/// than failing the whole load.
pub async fn load_all(data_dir: &Path) -> Result<(Vec<Conversation>, Vec<OwnerEntry>), StoreError> {
    let mut conversations = Vec::new();

    let dir = conversations_dir(data_dir);
    if dir.is_dir() {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable conversation snapshot");
                    continue;
                }
            };
            match serde_json::from_slice::<Conversation>(&bytes) {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping corrupt conversation snapshot");
                }
            }
        }
    }

    let owners = match tokio::fs::read(owners_path(data_dir)).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(serde_err)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(io_err(e)),
    };

    Ok((conversations, owners))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut conversation = Conversation::new(UserId::new(), "system");
        conversation.push_message(Message::user("hello"));

        save_conversation(dir.path(), &conversation)
            .await
            .expect("save");
        save_owners(
            dir.path(),
            &[OwnerEntry {
                owner_id: conversation.owner_id,
                conversation_id: conversation.id,
            }],
        )
        .await
        .expect("save owners");

        let (loaded, owners) = load_all(dir.path()).await.expect("load");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, conversation.id);
        assert_eq!(loaded[0].message_count(), 2);
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].conversation_id, conversation.id);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conversation = Conversation::new(UserId::new(), "system");

        save_conversation(dir.path(), &conversation)
            .await
            .expect("save");
        remove_conversation(dir.path(), conversation.id)
            .await
            .expect("first remove");
        remove_conversation(dir.path(), conversation.id)
            .await
            .expect("second remove");
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conversation = Conversation::new(UserId::new(), "system");
        save_conversation(dir.path(), &conversation)
            .await
            .expect("save");

        let corrupt = conversations_dir(dir.path()).join("garbage.json");
        tokio::fs::write(&corrupt, b"{not json").await.expect("write");

        let (loaded, _) = load_all(dir.path()).await.expect("load");
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn load_from_empty_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (loaded, owners) = load_all(dir.path()).await.expect("load");
        assert!(loaded.is_empty());
        assert!(owners.is_empty());
    }
}
