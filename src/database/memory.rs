use super::UserStore;
use crate::{
    auth::AuthError,
    model::{Profile, User},
};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

/// In-process user store with the same email uniqueness as the real one.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(AuthError::EmailTaken.into());
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn profile(&self, id: &ObjectId) -> anyhow::Result<Option<Profile>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.id == *id)
            .map(Profile::from))
    }

    async fn profiles_except(&self, id: &ObjectId) -> anyhow::Result<Vec<Profile>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|user| user.id != *id)
            .map(Profile::from)
            .collect())
    }

    async fn delete(&self, id: &ObjectId) -> anyhow::Result<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|user| user.id != *id);
        Ok(users.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Redacted;

    fn user(email: &str) -> User {
        User {
            id: ObjectId::new(),
            email: email.into(),
            name: "Name".into(),
            user_name: "name".into(),
            password: Redacted::new("hash".into()),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUserStore::default();
        store.insert(&user("a@example.com")).await.expect("insert");

        let err = store
            .insert(&user("a@example.com"))
            .await
            .expect_err("duplicate");

        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn profiles_except_skips_the_given_user() {
        let store = MemoryUserStore::default();
        let me = user("me@example.com");
        let other = user("other@example.com");
        store.insert(&me).await.expect("insert");
        store.insert(&other).await.expect("insert");

        let profiles = store.profiles_except(&me.id).await.expect("profiles");

        assert_eq!(profiles, vec![Profile::from(&other)]);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_went() {
        let store = MemoryUserStore::default();
        let me = user("me@example.com");
        store.insert(&me).await.expect("insert");

        assert!(store.delete(&me.id).await.expect("delete"));
        assert!(!store.delete(&me.id).await.expect("delete"));
        assert_eq!(store.profile(&me.id).await.expect("profile"), None);
    }
}
