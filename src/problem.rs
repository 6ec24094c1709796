use crate::auth::AuthError;
use http_api_problem::{HttpApiProblem as Problem, StatusCode as ProblemStatus};
use std::convert::Infallible;
use warp::http::{self, StatusCode};
use warp::{Rejection, Reply};

#[derive(Debug)]
struct Rejected(Problem);

impl warp::reject::Reject for Rejected {}

pub fn build<E: Into<anyhow::Error>>(err: E) -> Rejection {
    warp::reject::custom(Rejected(pack(err.into())))
}

pub fn pack(err: anyhow::Error) -> Problem {
    let err = match err.downcast::<Problem>() {
        Ok(problem) => return problem,
        Err(err) => err,
    };

    if let Some(err) = err.downcast_ref::<AuthError>() {
        let (status, detail) = match err {
            AuthError::InvalidCredentials => (
                ProblemStatus::UNAUTHORIZED,
                "Incorrect email or password.",
            ),
            AuthError::NotLoggedIn => (ProblemStatus::UNAUTHORIZED, "The user is logged out."),
            AuthError::AlreadyLoggedIn => (ProblemStatus::CONFLICT, "The user is already logged in."),
            AuthError::AccessDenied => (ProblemStatus::FORBIDDEN, "Access denied."),
            AuthError::ConfirmationFailed => (
                ProblemStatus::BAD_REQUEST,
                "Deleting an account has to be confirmed.",
            ),
            AuthError::EmailTaken => (
                ProblemStatus::CONFLICT,
                "An account with this email already exists.",
            ),
            AuthError::UserNotFound => (ProblemStatus::NOT_FOUND, "The user does not exist."),
            AuthError::ArgonError | AuthError::SessionNotPersisted => {
                tracing::error!("internal error occurred: {:#}", err);
                return Problem::with_title_and_type(ProblemStatus::INTERNAL_SERVER_ERROR);
            }
        };
        return Problem::with_title(status).detail(detail);
    }

    tracing::error!("internal error occurred: {:#}", err);
    Problem::with_title_and_type(ProblemStatus::INTERNAL_SERVER_ERROR)
}

fn status_of(problem: &Problem) -> StatusCode {
    problem
        .status
        .and_then(|status| StatusCode::from_u16(status.as_u16()).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn reply(problem: &Problem) -> warp::reply::Response {
    let reply = warp::reply::json(problem);
    let reply = warp::reply::with_status(reply, status_of(problem));
    warp::reply::with_header(
        reply,
        http::header::CONTENT_TYPE,
        http_api_problem::PROBLEM_JSON_MEDIA_TYPE,
    )
    .into_response()
}

pub async fn unpack(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let reply = if rejection.is_not_found() {
        reply(&Problem::with_title_and_type(ProblemStatus::NOT_FOUND))
    } else if let Some(Rejected(problem)) = rejection.find::<Rejected>() {
        reply(problem)
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        reply(
            &Problem::with_title(ProblemStatus::BAD_REQUEST)
                .title("Invalid Request Body.")
                .detail(format!("Request body is invalid. {}", e)),
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        reply(&Problem::with_title_and_type(
            ProblemStatus::METHOD_NOT_ALLOWED,
        ))
    } else {
        tracing::error!("unhandled rejection: {:?}", rejection);
        reply(&Problem::with_title_and_type(
            ProblemStatus::INTERNAL_SERVER_ERROR,
        ))
    };

    Ok(reply)
}
