use axum::{
    async_trait, debug_handler,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json,
};
use campusguessr_game::{AuthError, Credentials, DatabaseError, Registration, SessionData, UserData};
use log::info;
use thiserror::Error;

use crate::{
    context::ServerContext,
    cookies::removal_cookie,
    errors::{ServerError, ServerResult},
    schemas::{LoginSchema, RegisterSchema},
    serialized::FormView,
    Router,
};

/// Wraps [SessionData] so [FromRequestParts] can be implemented for it
pub struct Session(SessionData);

impl Session {
    /// Returns the user of the session
    pub fn user(&self) -> &UserData {
        &self.0.user
    }
}

#[derive(Debug, Error)]
pub enum SessionRejection {
    #[error("Missing session")]
    Missing,
    #[error("Session does not exist")]
    Invalid,
    #[error(transparent)]
    Storage(DatabaseError),
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Storage(e) => ServerError::from(e).into_response(),
            e => (StatusCode::UNAUTHORIZED, e.to_string()).into_response(),
        }
    }
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = SessionRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        context: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let token = context
            .cookies
            .session_token(&parts.headers)
            .ok_or(SessionRejection::Missing)?;

        let session = context
            .game
            .auth
            .session(token)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => SessionRejection::Invalid,
                e => SessionRejection::Storage(e),
            })?;

        Ok(Self(session))
    }
}

/// Deletes the session the request carries, if any
async fn end_session(context: &ServerContext, headers: &HeaderMap) -> ServerResult<()> {
    if let Some(token) = context.cookies.session_token(headers) {
        context.game.auth.logout(token).await?;
    }

    Ok(())
}

fn clear_cookie() -> AppendHeaders<[(header::HeaderName, String); 1]> {
    AppendHeaders([(header::SET_COOKIE, removal_cookie())])
}

#[utoipa::path(
    get,
    path = "/register",
    tag = "auth",
    responses(
        (status = 200, body = FormView)
    )
)]
async fn register_form() -> Json<FormView> {
    Json(FormView::register(None))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body(content = RegisterSchema, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Registered, the login form follows", body = FormView),
        (status = 400, description = "The first failed check", body = FormView)
    )
)]
async fn register_user(
    State(context): State<ServerContext>,
    Form(form): Form<RegisterSchema>,
) -> ServerResult<Response> {
    let registration = Registration {
        username: form.username,
        password: form.password,
        confirmation: form.confirmation,
    };

    match context.game.auth.register(registration).await {
        Ok(_) => Ok(Json(FormView::login(None)).into_response()),
        Err(e) if e.is_user_facing() => Ok((
            StatusCode::BAD_REQUEST,
            Json(FormView::register(Some(e.to_string()))),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    responses(
        (status = 200, description = "Any previous session is ended", body = FormView)
    )
)]
async fn login_form(
    State(context): State<ServerContext>,
    headers: HeaderMap,
) -> ServerResult<impl IntoResponse> {
    end_session(&context, &headers).await?;

    Ok((clear_cookie(), Json(FormView::login(None))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = LoginSchema, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, the session cookie is set"),
        (status = 400, description = "A field is missing", body = FormView),
        (status = 401, description = "Username and password do not match", body = FormView)
    )
)]
#[debug_handler]
async fn login(
    State(context): State<ServerContext>,
    headers: HeaderMap,
    Form(form): Form<LoginSchema>,
) -> ServerResult<Response> {
    end_session(&context, &headers).await?;

    let credentials = Credentials {
        username: form.username,
        password: form.password,
    };

    match context.game.auth.login(credentials).await {
        Ok(session) => {
            let cookie = context.cookies.session_cookie(&session.token);

            Ok((
                AppendHeaders([(header::SET_COOKIE, cookie)]),
                Redirect::to("/"),
            )
                .into_response())
        }
        Err(e) if e.is_user_facing() => {
            let status = match e {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_REQUEST,
            };

            Ok((
                status,
                clear_cookie(),
                Json(FormView::login(Some(e.to_string()))),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 303, description = "Session ended, redirects home")
    )
)]
async fn logout(
    State(context): State<ServerContext>,
    headers: HeaderMap,
) -> ServerResult<impl IntoResponse> {
    end_session(&context, &headers).await?;
    info!("Session ended");

    Ok((clear_cookie(), Redirect::to("/")))
}

pub fn router() -> Router {
    Router::new()
        .route("/register", get(register_form).post(register_user))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}
