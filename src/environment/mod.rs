mod argon;

pub use argon::Argon;

use crate::{
    config::{Settings, MAX_SESSION_LIFETIME},
    database::{self, MongoUserStore, UserStore},
    keys::{self, rotation::RotationHandle, SharedKeyring},
    session::{RedisSessionStore, SessionStore},
};
use chrono::Duration;
use std::sync::Arc;

const DEFAULT_SESSION_LIFETIME: i64 = 24 * 60 * 60;

/// Handles shared by every request.
#[derive(Clone)]
pub struct Environment {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    keyring: SharedKeyring,
    argon: Argon,
    session_lifetime: Option<i64>,
    secure_cookies: bool,
}

impl Environment {
    /// Connects MongoDB and Redis and loads the key files.
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let Settings {
            mongo_url,
            mongo_database,
            redis_url,
            key_dir,
            session_lifetime,
            cookie_secure,
            ..
        } = settings;

        let db = database::connect(mongo_url, mongo_database).await?;
        let users = MongoUserStore::new(&db).await?;
        let redis = redis::Client::open(redis_url.as_str())?;
        let sessions = RedisSessionStore::connect(&redis).await?;
        let keyring = SharedKeyring::new(keys::load_or_roll(key_dir)?);

        Ok(Self::from_parts(
            Arc::new(users),
            Arc::new(sessions),
            keyring,
            Argon::new(settings),
        )
        .with_session_lifetime(*session_lifetime)?
        .with_secure_cookies(*cookie_secure))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        keyring: SharedKeyring,
        argon: Argon,
    ) -> Self {
        Self {
            users,
            sessions,
            keyring,
            argon,
            session_lifetime: None,
            secure_cookies: false,
        }
    }

    /// Fails unless `seconds` lies within `1..=MAX_SESSION_LIFETIME`.
    pub fn with_session_lifetime(mut self, seconds: Option<i64>) -> anyhow::Result<Self> {
        if let Some(seconds) = seconds {
            anyhow::ensure!(
                (1..=MAX_SESSION_LIFETIME).contains(&seconds),
                "session lifetime of {} seconds is outside 1..={}",
                seconds,
                MAX_SESSION_LIFETIME
            );
        }
        self.session_lifetime = seconds;
        Ok(self)
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    pub fn keyring(&self) -> &SharedKeyring {
        &self.keyring
    }

    pub fn argon(&self) -> &Argon {
        &self.argon
    }

    pub fn session_lifetime(&self) -> Duration {
        Duration::seconds(self.session_lifetime.unwrap_or(DEFAULT_SESSION_LIFETIME))
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Starts rolling the key files on the configured period.
    pub fn rotate_keys(&self, settings: &Settings) -> anyhow::Result<RotationHandle> {
        keys::rotation::spawn(
            settings.key_dir.clone(),
            self.keyring.clone(),
            std::time::Duration::from_secs(settings.key_rotation_secs),
        )
    }
}
