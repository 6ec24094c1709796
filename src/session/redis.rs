use super::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use uuid::Uuid;

const USER_FIELD: &str = "userID";

/// Sessions as Redis hashes: `session:<uuid>` holds the user id in `userID`
/// and expires through `EXPIREAT`.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(client: &redis::Client) -> anyhow::Result<Self> {
        let redis = client.get_multiplexed_tokio_connection().await?;
        Ok(Self { redis })
    }

    fn key(session_id: &Uuid) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn write(
        &self,
        session_id: &Uuid,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let key = Self::key(session_id);
        let mut con = self.redis.clone();

        redis::pipe()
            .atomic()
            .hset(&key, USER_FIELD, user_id)
            .ignore()
            .cmd("EXPIREAT")
            .arg(&key)
            .arg(expires_at.timestamp())
            .ignore()
            .query_async::<_, ()>(&mut con)
            .await?;

        Ok(())
    }

    async fn read(&self, session_id: &Uuid) -> anyhow::Result<Option<String>> {
        let mut con = self.redis.clone();
        let user_id: Option<String> = con.hget(Self::key(session_id), USER_FIELD).await?;
        Ok(user_id)
    }

    async fn refresh(&self, session_id: &Uuid, expires_at: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut con = self.redis.clone();
        // EXPIREAT leaves missing keys alone and answers 0 for them.
        let extended: bool = redis::cmd("EXPIREAT")
            .arg(Self::key(session_id))
            .arg(expires_at.timestamp())
            .query_async(&mut con)
            .await?;
        Ok(extended)
    }

    async fn remove(&self, session_id: &Uuid) -> anyhow::Result<()> {
        let mut con = self.redis.clone();
        let _: () = con.del(Self::key(session_id)).await?;
        Ok(())
    }
}
