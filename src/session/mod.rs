//! Request-scoped authentication state.
//!
//! Every request gets its own [`Session`]. Account operations record a log-in
//! or log-out on it and the response finalizer turns that into Redis writes
//! and a `Set-Cookie` header. Nothing about the authenticated user outlives
//! the request.

mod redis;
mod store;

pub use self::redis::RedisSessionStore;
pub use store::{MemorySessionStore, SessionStore};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// No cookie came with the request.
    Anonymous,
    /// A cookie came with the request but did not lead to a live session.
    Rejected,
    Authenticated { session_id: Uuid, user_id: String },
    /// A user proved who they are during this request.
    LoggingIn {
        user_id: String,
        replaces: Option<Uuid>,
    },
    LoggingOut { session_id: Uuid },
}

#[derive(Clone, Debug)]
pub struct Session(Arc<Mutex<State>>);

impl Session {
    fn with_state(state: State) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub fn anonymous() -> Self {
        Self::with_state(State::Anonymous)
    }

    pub fn rejected() -> Self {
        Self::with_state(State::Rejected)
    }

    pub fn authenticated(session_id: Uuid, user_id: impl Into<String>) -> Self {
        Self::with_state(State::Authenticated {
            session_id,
            user_id: user_id.into(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> State {
        self.lock().clone()
    }

    /// The user the incoming cookie belongs to. A log-in recorded during this
    /// request only takes effect from the next request on; a recorded log-out
    /// takes effect at once.
    pub fn user_id(&self) -> Option<String> {
        match &*self.lock() {
            State::Authenticated { user_id, .. } => Some(user_id.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    pub fn log_in(&self, user_id: impl Into<String>) {
        let mut state = self.lock();
        let replaces = match &*state {
            State::Authenticated { session_id, .. } | State::LoggingOut { session_id } => {
                Some(*session_id)
            }
            State::LoggingIn { replaces, .. } => *replaces,
            State::Anonymous | State::Rejected => None,
        };
        *state = State::LoggingIn {
            user_id: user_id.into(),
            replaces,
        };
    }

    pub fn log_out(&self) {
        let mut state = self.lock();
        let next = match &*state {
            State::Authenticated { session_id, .. } => State::LoggingOut {
                session_id: *session_id,
            },
            State::LoggingIn {
                replaces: Some(session_id),
                ..
            } => State::LoggingOut {
                session_id: *session_id,
            },
            State::LoggingIn { replaces: None, .. } => State::Rejected,
            other => other.clone(),
        };
        *state = next;
    }
}
