//! Windowed conversation memory: the last 10 turns
//! (user+assistant pairs), stored opaquely in the key-value store under
//! `memory:<sessionId>` with TTL = idle-session timeout.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use support_agent_core::ports::KeyValueStore;
use support_agent_core::Result;

const WINDOW_TURNS: usize = 10;
const WINDOW_ENTRIES: usize = WINDOW_TURNS * 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub role: String,
    pub content: String,
}

pub fn memory_key(session_id: Uuid) -> String {
    format!("memory:{session_id}")
}

pub struct ConversationMemory {
    kv_store: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl ConversationMemory {
    pub fn new(kv_store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv_store, ttl }
    }

    pub async fn load(&self, session_id: Uuid) -> Result<Vec<MemoryEntry>> {
        match self.kv_store.get(&memory_key(session_id)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    /// Load -> mutate -> save, keeping only the most recent window.
    pub async fn append_turn(&self, session_id: Uuid, user_content: &str, assistant_content: &str) -> Result<()> {
        let mut entries = self.load(session_id).await?;
        entries.push(MemoryEntry { role: "user".to_string(), content: user_content.to_string() });
        entries.push(MemoryEntry { role: "assistant".to_string(), content: assistant_content.to_string() });
        if entries.len() > WINDOW_ENTRIES {
            let drop = entries.len() - WINDOW_ENTRIES;
            entries.drain(0..drop);
        }
        let bytes = serde_json::to_vec(&entries).unwrap_or_default();
        self.kv_store.set(&memory_key(session_id), bytes, self.ttl).await
    }

    pub async fn clear(&self, session_id: Uuid) -> Result<()> {
        self.kv_store.delete(&memory_key(session_id)).await
    }

    /// Renders the window as `Role: content` lines for prompt assembly.
    pub fn render(entries: &[MemoryEntry]) -> String {
        entries
            .iter()
            .map(|e| format!("{}: {}", capitalize(&e.role), e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockKv(Mutex<HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl KeyValueStore for MockKv {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<()> {
            self.0.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn delete(&self, key: &str) -> Result<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
        async fn incr_by(&self, _key: &str, _delta: i64) -> Result<i64> {
            Ok(0)
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn window_keeps_only_the_last_ten_turns() {
        let kv = Arc::new(MockKv(Mutex::new(HashMap::new())));
        let memory = ConversationMemory::new(kv, Duration::from_secs(60));
        let session_id = Uuid::new_v4();
        for i in 0..15 {
            memory.append_turn(session_id, &format!("u{i}"), &format!("a{i}")).await.unwrap();
        }
        let entries = memory.load(session_id).await.unwrap();
        assert_eq!(entries.len(), WINDOW_ENTRIES);
        assert_eq!(entries[0].content, "u5");
    }

    #[tokio::test]
    async fn clear_removes_the_key() {
        let kv = Arc::new(MockKv(Mutex::new(HashMap::new())));
        let memory = ConversationMemory::new(kv, Duration::from_secs(60));
        let session_id = Uuid::new_v4();
        memory.append_turn(session_id, "hi", "hello").await.unwrap();
        memory.clear(session_id).await.unwrap();
        assert!(memory.load(session_id).await.unwrap().is_empty());
    }
}
