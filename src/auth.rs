use crate::{
    cookie::{self, SESSION_COOKIE},
    environment::Environment,
    model::SessionCookie,
    problem,
    session::{Session, State},
};
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;
use warp::http::{header, HeaderValue};
use warp::{Filter, Rejection, Reply};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user is already logged in")]
    AlreadyLoggedIn,
    #[error("user is logged out")]
    NotLoggedIn,
    #[error("access denied")]
    AccessDenied,
    #[error("account deletion was not confirmed")]
    ConfirmationFailed,
    #[error("email is already registered")]
    EmailTaken,
    #[error("user not found")]
    UserNotFound,
    #[error("could not hash password")]
    ArgonError,
    #[error("session was not persisted")]
    SessionNotPersisted,
}

pub fn with_env(env: Environment) -> impl Filter<Extract = (Environment,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || env.clone())
}

/// Resolves the `sid` cookie of a request into its [`Session`].
///
/// Undecodable cookies and sessions Redis no longer knows about make for an
/// anonymous request whose cookie gets cleared on the way out.
pub fn session(env: Environment) -> impl Filter<Extract = (Session,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(with_env(env))
        .and_then(|value: Option<String>, env: Environment| async move {
            resolve(&env, value.as_deref())
                .await
                .map_err(problem::build)
        })
}

pub async fn resolve(env: &Environment, value: Option<&str>) -> anyhow::Result<Session> {
    let Some(value) = value else {
        return Ok(Session::anonymous());
    };

    let decoded = {
        let keyring = env.keyring().read();
        cookie::decode::<SessionCookie>(
            &keyring,
            SESSION_COOKIE,
            value,
            env.session_lifetime(),
            Utc::now(),
        )
    };
    let session_id = match decoded {
        Ok(cookie) => cookie.session_id,
        Err(err) => {
            tracing::warn!("rejecting session cookie: {}", err);
            return Ok(Session::rejected());
        }
    };

    match env.sessions().read(&session_id).await? {
        Some(user_id) => Ok(Session::authenticated(session_id, user_id)),
        None => {
            tracing::debug!(%session_id, "session is gone");
            Ok(Session::rejected())
        }
    }
}

/// Writes the outcome of `session` to Redis and to the `sid` cookie of
/// `reply`.
pub async fn finalize(
    env: &Environment,
    session: &Session,
    reply: impl Reply,
) -> anyhow::Result<warp::reply::Response> {
    let mut response = reply.into_response();
    let now = Utc::now();
    let expires = now + env.session_lifetime();

    let cookie = match session.state() {
        State::Anonymous => None,
        State::Rejected => Some(expired_cookie(env, now)),
        State::Authenticated {
            session_id,
            user_id,
        } => {
            if env.sessions().refresh(&session_id, expires).await? {
                tracing::debug!(%session_id, %user_id, "refreshed session");
                Some(issue(env, session_id, now)?)
            } else {
                tracing::debug!(%session_id, "session ended during the request");
                Some(expired_cookie(env, now))
            }
        }
        State::LoggingIn { user_id, replaces } => {
            if let Some(old) = replaces {
                env.sessions().remove(&old).await?;
            }
            let session_id = Uuid::new_v4();
            env.sessions().write(&session_id, &user_id, expires).await?;

            let persisted = env.sessions().read(&session_id).await?;
            if persisted.as_deref() != Some(user_id.as_str()) {
                return Err(AuthError::SessionNotPersisted.into());
            }
            tracing::debug!(%session_id, "issued session");
            Some(issue(env, session_id, now)?)
        }
        State::LoggingOut { session_id } => {
            env.sessions().remove(&session_id).await?;
            tracing::debug!(%session_id, "ended session");
            Some(expired_cookie(env, now))
        }
    };

    if let Some(cookie) = cookie {
        response
            .headers_mut()
            .append(header::SET_COOKIE, HeaderValue::from_str(&cookie)?);
    }
    Ok(response)
}

fn issue(env: &Environment, session_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<String> {
    let value = {
        let keyring = env.keyring().read();
        cookie::encode(
            &keyring,
            SESSION_COOKIE,
            &SessionCookie::new(session_id),
            now,
        )?
    };
    let lifetime = env.session_lifetime();
    Ok(set_cookie(
        &value,
        lifetime.num_seconds(),
        now + lifetime,
        env.secure_cookies(),
    ))
}

fn expired_cookie(env: &Environment, now: DateTime<Utc>) -> String {
    set_cookie("", 0, now - Duration::days(1), env.secure_cookies())
}

fn set_cookie(value: &str, max_age: i64, expires: DateTime<Utc>, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}; Expires={}",
        SESSION_COOKIE,
        value,
        max_age,
        expires.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
