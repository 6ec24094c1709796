//! Account operations. These are the only places a session changes hands.

use crate::{
    auth::AuthError,
    environment::Environment,
    model::{Credentials, NewUser, Profile, Redacted, User},
    session::Session,
};
use mongodb::bson::oid::ObjectId;

fn current_user(session: &Session) -> anyhow::Result<ObjectId> {
    let user_id = session.user_id().ok_or(AuthError::NotLoggedIn)?;
    Ok(ObjectId::parse_str(&user_id)?)
}

pub async fn sign_up(env: &Environment, session: &Session, input: NewUser) -> anyhow::Result<Profile> {
    if session.is_authenticated() {
        return Err(AuthError::AlreadyLoggedIn.into());
    }

    let NewUser {
        email,
        name,
        user_name,
        password,
    } = input;
    let password = env.argon().hash(&password)?;

    let user = User {
        id: ObjectId::new(),
        email,
        name,
        user_name,
        password: Redacted::new(password),
    };
    env.users().insert(&user).await?;

    tracing::info!(user = %user.id, "signed up");
    session.log_in(user.id.to_hex());
    Ok(Profile::from(&user))
}

pub async fn log_in(
    env: &Environment,
    session: &Session,
    credentials: Credentials,
) -> anyhow::Result<Profile> {
    if session.is_authenticated() {
        return Err(AuthError::AlreadyLoggedIn.into());
    }

    let Some(user) = env.users().find_by_email(&credentials.email).await? else {
        env.argon().decoy(&credentials.password)?;
        return Err(AuthError::InvalidCredentials.into());
    };

    if !env.argon().verify(&user.password, &credentials.password)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    session.log_in(user.id.to_hex());
    Ok(Profile::from(&user))
}

pub fn log_out(session: &Session) -> anyhow::Result<bool> {
    if !session.is_authenticated() {
        return Err(AuthError::NotLoggedIn.into());
    }
    session.log_out();
    Ok(true)
}

/// Only the logged in user can delete their own account, and only when
/// `confirm` is set.
pub async fn delete_account(
    env: &Environment,
    session: &Session,
    id: &str,
    confirm: bool,
) -> anyhow::Result<bool> {
    let me = current_user(session)?;
    if ObjectId::parse_str(id).ok() != Some(me) {
        return Err(AuthError::AccessDenied.into());
    }
    if !confirm {
        return Err(AuthError::ConfirmationFailed.into());
    }

    if !env.users().delete(&me).await? {
        return Err(AuthError::UserNotFound.into());
    }

    tracing::info!(user = %me, "deleted account");
    session.log_out();
    Ok(true)
}

pub async fn me(env: &Environment, session: &Session) -> anyhow::Result<Profile> {
    let me = current_user(session)?;
    Ok(env
        .users()
        .profile(&me)
        .await?
        .ok_or(AuthError::UserNotFound)?)
}

pub async fn users(env: &Environment, session: &Session) -> anyhow::Result<Vec<Profile>> {
    let me = current_user(session)?;
    env.users().profiles_except(&me).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Settings, database::MemoryUserStore, environment::Argon, keys::SharedKeyring,
        session::MemorySessionStore,
    };
    use clap::Parser;
    use std::sync::Arc;

    fn env(memory_size: &str) -> Environment {
        let settings = Settings::try_parse_from([
            "catalog-auth",
            "--argon-secret",
            "pepper",
            "--argon-memory-size",
            memory_size,
            "--argon-iterations",
            "1",
        ])
        .expect("parse");
        Environment::from_parts(
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemorySessionStore::default()),
            SharedKeyring::default(),
            Argon::new(&settings),
        )
    }

    fn credentials(email: &str) -> Credentials {
        Credentials {
            email: email.to_owned(),
            password: Redacted::new("correct horse".to_owned()),
        }
    }

    #[tokio::test]
    async fn unknown_email_is_invalid_credentials() {
        let session = Session::anonymous();

        let err = log_in(&env("8"), &session, credentials("nobody@example.com"))
            .await
            .expect_err("unknown");

        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::InvalidCredentials)
        ));
        assert_eq!(session.state(), crate::session::State::Anonymous);
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_hash() {
        // A hasher that cannot run shows whether log-in reached it.
        let err = log_in(&env("1"), &Session::anonymous(), credentials("nobody@example.com"))
            .await
            .expect_err("unknown");

        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::ArgonError)
        ));
    }
}
