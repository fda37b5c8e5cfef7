//! Per-session conversation history.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::message::ChatMessage;

/// Stores user/assistant turns keyed by session id.
///
/// Each call takes the lock for that one operation only; concurrent sends
/// on the same session may interleave their turns.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn history(&self, session_id: &str) -> Vec<ChatMessage>;

    /// Append messages, dropping the oldest beyond the store's limit.
    async fn append(&self, session_id: &str, messages: Vec<ChatMessage>);

    /// Keep only the newest `keep` messages.
    async fn trim(&self, session_id: &str, keep: usize);

    async fn clear(&self, session_id: &str);
}

/// Process-local store with a per-session message cap.
pub struct InMemorySessionStore {
    limit: usize,
    sessions: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl InMemorySessionStore {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn keep_newest(history: &mut Vec<ChatMessage>, keep: usize) {
    if history.len() > keep {
        history.drain(..history.len() - keep);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, messages: Vec<ChatMessage>) {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.extend(messages);
        keep_newest(history, self.limit);
    }

    async fn trim(&self, session_id: &str, keep: usize) {
        if let Some(history) = self.sessions.write().await.get_mut(session_id) {
            keep_newest(history, keep);
        }
    }

    async fn clear(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_append_truncates_oldest() {
        let store = InMemorySessionStore::new(4);
        for i in 0..3 {
            store
                .append(
                    "s",
                    vec![
                        ChatMessage::user(format!("q{}", i)),
                        ChatMessage::assistant(format!("a{}", i)),
                    ],
                )
                .await;
        }
        let history = store.history("s").await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content, "q1");
        assert_eq!(history[3].content, "a2");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new(20);
        store.append("a", vec![ChatMessage::user("hi")]).await;
        assert!(store.history("b").await.is_empty());
        store.clear("a").await;
        assert!(store.history("a").await.is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_trim_keeps_newest() {
        let store = InMemorySessionStore::new(20);
        let messages = (0..6).map(|i| ChatMessage::user(i.to_string())).collect();
        store.append("s", messages).await;
        store.trim("s", 2).await;
        let history = store.history("s").await;
        assert_eq!(
            history.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            vec!["4", "5"]
        );
    }

    proptest! {
        #[test]
        fn prop_history_never_exceeds_limit(batches in proptest::collection::vec(1usize..6, 1..20)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InMemorySessionStore::new(20);
                for size in batches {
                    let batch = (0..size).map(|i| ChatMessage::user(i.to_string())).collect();
                    store.append("s", batch).await;
                    assert!(store.history("s").await.len() <= 20);
                }
            });
        }
    }
}
