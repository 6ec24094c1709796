use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Where session ids are resolved to user ids.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `user_id` under `session_id`, overwriting any previous entry,
    /// until `expires_at`.
    async fn write(
        &self,
        session_id: &Uuid,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn read(&self, session_id: &Uuid) -> anyhow::Result<Option<String>>;

    /// Moves the expiry of a live session to `expires_at`. Never recreates a
    /// session; returns whether there was one to extend.
    async fn refresh(&self, session_id: &Uuid, expires_at: DateTime<Utc>) -> anyhow::Result<bool>;

    async fn remove(&self, session_id: &Uuid) -> anyhow::Result<()>;
}

/// In-process store, for tests and single-node embedding.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<Uuid, (String, DateTime<Utc>)>>,
}

impl MemorySessionStore {
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    pub async fn expires_at(&self, session_id: &Uuid) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .await
            .get(session_id)
            .map(|(_, expires_at)| *expires_at)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn write(
        &self,
        session_id: &Uuid,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.entries
            .write()
            .await
            .insert(*session_id, (user_id.to_owned(), expires_at));
        Ok(())
    }

    async fn read(&self, session_id: &Uuid) -> anyhow::Result<Option<String>> {
        let now = Utc::now();
        Ok(self
            .entries
            .read()
            .await
            .get(session_id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(user_id, _)| user_id.clone()))
    }

    async fn refresh(&self, session_id: &Uuid, expires_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        match entries.get_mut(session_id) {
            Some((_, expiry)) if *expiry > now => {
                *expiry = expires_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, session_id: &Uuid) -> anyhow::Result<()> {
        self.entries.write().await.remove(session_id);
        Ok(())
    }
}
