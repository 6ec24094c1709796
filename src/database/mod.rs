mod memory;
mod mongo;

pub use memory::MemoryUserStore;
pub use mongo::{connect, require_unique_email, MongoUserStore, EMAIL_INDEX};

use crate::model::{Profile, User};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

pub const USERS: &str = "users";

/// Persistence for user accounts.
///
/// Reads that end up in front of callers return [`Profile`]s, which never
/// carry the password hash.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AuthError::EmailTaken` when the email is already in use.
    async fn insert(&self, user: &User) -> anyhow::Result<()>;

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn profile(&self, id: &ObjectId) -> anyhow::Result<Option<Profile>>;

    /// Every user except `id`.
    async fn profiles_except(&self, id: &ObjectId) -> anyhow::Result<Vec<Profile>>;

    /// Whether a user was deleted.
    async fn delete(&self, id: &ObjectId) -> anyhow::Result<bool>;
}
