use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use manual_core::{Credentials, DatabaseError, SessionData, SessionStore, UserData};
use serde_json::json;

use crate::{
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, ValidatedJson},
    serialized::{LoginResult, Message, ToSerialized},
    Router, ServerContext,
};

/// The name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "session";

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it.
/// Rejects the request if the session cookie is missing, unknown, or expired.
pub struct Session(SessionData);

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ServerError::Unauthorized("Unauthorized"))?;

        let session = state
            .manual
            .auth
            .session(&token)
            .ok_or(ServerError::Unauthorized("Session expired"))?;

        Ok(Self(session))
    }
}

/// A [Session] whose user is an admin
pub struct AdminSession {
    pub user: UserData,
}

#[async_trait]
impl FromRequestParts<ServerContext> for AdminSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let user = state
            .manual
            .auth
            .user(&session.0)
            .await
            .map_err(|e| match e {
                // The user was deleted while the session was still alive
                DatabaseError::NotFound { .. } => ServerError::Unauthorized("Unauthorized"),
                e => ServerError::from(e),
            })?;

        if !user.is_admin {
            return Err(ServerError::Forbidden);
        }

        Ok(Self { user })
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(
            SessionStore::SESSION_DURATION_IN_HOURS,
        ))
        .build()
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginSchema,
    responses(
        (status = 200, body = LoginResult, description = "Sets the session cookie"),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn login(
    State(context): State<ServerContext>,
    jar: CookieJar,
    ValidatedJson(body): ValidatedJson<LoginSchema>,
) -> ServerResult<(CookieJar, Json<LoginResult>)> {
    let (session, user) = context
        .manual
        .auth
        .login(Credentials {
            username: body.username,
            password: body.password,
        })
        .await?;

    Ok((
        jar.add(session_cookie(session.token)),
        Json(user.to_serialized()),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, body = Message)
    )
)]
async fn logout(State(context): State<ServerContext>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        context.manual.auth.logout(cookie.value());
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));

    (jar, Json(Message::new("Logged out")))
}

#[utoipa::path(
    get,
    path = "/api/auth/check",
    tag = "auth",
    responses(
        (status = 200, description = "The session is valid"),
        (status = 401, description = "The session is missing or expired")
    )
)]
async fn check(session: Option<Session>) -> impl IntoResponse {
    match session {
        Some(_) => (StatusCode::OK, Json(json!({ "authenticated": true }))),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        ),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/check", get(check))
}
