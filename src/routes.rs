use crate::{
    accounts,
    auth::{self, with_env},
    environment::Environment,
    model::{Credentials, NewUser},
    problem,
    session::Session,
};
use serde::Deserialize;
use std::convert::Infallible;
use warp::{Filter, Rejection, Reply};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccount {
    id: String,
    #[serde(default)]
    confirm_delete: bool,
}

/// Turns the outcome of an account operation into a response and applies
/// the session to it. Failed operations still get their cookie refreshed or
/// cleared.
async fn respond<T: Reply>(
    env: Environment,
    session: Session,
    result: anyhow::Result<T>,
) -> Result<warp::reply::Response, Rejection> {
    let reply = match result {
        Ok(reply) => reply.into_response(),
        Err(err) => problem::reply(&problem::pack(err)),
    };
    auth::finalize(&env, &session, reply)
        .await
        .map_err(problem::build)
}

/// The account routes, each resolving the session on the way in and writing
/// it back on the way out.
pub fn api(env: Environment) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let ctx = with_env(env.clone()).and(auth::session(env));

    let sign_up = warp::path!("signup")
        .and(warp::post())
        .and(ctx.clone())
        .and(warp::body::json())
        .and_then(|env: Environment, session: Session, input: NewUser| async move {
            let result = accounts::sign_up(&env, &session, input).await;
            respond(env, session, result.map(|profile| warp::reply::json(&profile))).await
        });

    let log_in = warp::path!("login")
        .and(warp::post())
        .and(ctx.clone())
        .and(warp::body::json())
        .and_then(
            |env: Environment, session: Session, credentials: Credentials| async move {
                let result = accounts::log_in(&env, &session, credentials).await;
                respond(env, session, result.map(|profile| warp::reply::json(&profile))).await
            },
        );

    let log_out = warp::path!("logout")
        .and(warp::post())
        .and(ctx.clone())
        .and_then(|env: Environment, session: Session| async move {
            let result = accounts::log_out(&session);
            respond(env, session, result.map(|done| warp::reply::json(&done))).await
        });

    let delete_account = warp::path!("account" / "delete")
        .and(warp::post())
        .and(ctx.clone())
        .and(warp::body::json())
        .and_then(
            |env: Environment, session: Session, input: DeleteAccount| async move {
                let result =
                    accounts::delete_account(&env, &session, &input.id, input.confirm_delete)
                        .await;
                respond(env, session, result.map(|done| warp::reply::json(&done))).await
            },
        );

    let me = warp::path!("me")
        .and(warp::get())
        .and(ctx.clone())
        .and_then(|env: Environment, session: Session| async move {
            let result = accounts::me(&env, &session).await;
            respond(env, session, result.map(|profile| warp::reply::json(&profile))).await
        });

    let users = warp::path!("users")
        .and(warp::get())
        .and(ctx)
        .and_then(|env: Environment, session: Session| async move {
            let result = accounts::users(&env, &session).await;
            respond(env, session, result.map(|users| warp::reply::json(&users))).await
        });

    sign_up
        .or(log_in)
        .or(log_out)
        .or(delete_account)
        .or(me)
        .or(users)
        .recover(problem::unpack)
        .with(warp::log("catalog_auth::request"))
}
