use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json,
};

use crate::{
    auth::{Session, SessionRejection},
    context::ServerContext,
    errors::{ServerError, ServerResult, UploadError},
    schemas::UploadSchema,
    serialized::{HomeView, PlayView, ToSerialized, UploadResult},
    Router,
};

#[utoipa::path(
    get,
    path = "/",
    tag = "game",
    responses(
        (status = 200, description = "Every player's best score, highest first", body = HomeView)
    )
)]
async fn home(State(context): State<ServerContext>) -> ServerResult<Json<HomeView>> {
    let standings = context.game.leaderboard.standings().await?;
    let view: HomeView = standings.to_serialized();

    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/play",
    tag = "game",
    responses(
        (status = 200, body = PlayView),
        (status = 503, description = "No photos are available")
    )
)]
async fn play(State(context): State<ServerContext>) -> ServerResult<Json<PlayView>> {
    let round = context.game.rounds.generate().await?;
    let view = PlayView::from_round(&round).ok_or(ServerError::NoPhotos)?;

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "game",
    request_body = UploadSchema,
    responses(
        (status = 200, body = UploadResult),
        (status = 400, description = "The body is not a score", body = UploadResult),
        (status = 401, description = "Not logged in", body = UploadResult),
        (status = 500, description = "The score could not be stored", body = UploadResult)
    )
)]
#[debug_handler]
async fn upload(
    State(context): State<ServerContext>,
    session: Result<Session, SessionRejection>,
    body: Result<Json<UploadSchema>, JsonRejection>,
) -> Result<Json<UploadResult>, UploadError> {
    let session = session.map_err(|rejection| match rejection {
        SessionRejection::Storage(e) => UploadError::Storage(e),
        _ => UploadError::Unauthenticated("You must be logged in to upload a score"),
    })?;

    let Json(body) = body.map_err(|e| UploadError::MalformedInput(e.body_text()))?;

    context
        .game
        .leaderboard
        .submit(session.user(), body.score)
        .await?;

    Ok(Json(UploadResult::received()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/play", get(play))
        .route("/upload", post(upload))
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use axum::http::{header, Method, StatusCode};
    use campusguessr_game::{
        Database, DatabaseError, HighScoreData, NewScore, NewSession, NewUser, PhotoData,
        ScoreData, SessionData, SqliteDatabase, UserData, PHOTOS_PER_ROUND,
    };

    use crate::testing::{self, json_request, request, send};

    const STORAGE_FAULT: &str = "disk I/O error at /var/lib/campusguessr/campusguessr.db";

    /// Accounts and sessions work, but the leaderboard table can't be used
    struct BrokenLeaderboard(SqliteDatabase);

    fn storage_fault() -> DatabaseError {
        DatabaseError::Internal(STORAGE_FAULT.into())
    }

    #[async_trait]
    impl Database for BrokenLeaderboard {
        async fn user_by_username(&self, username: &str) -> Result<UserData, DatabaseError> {
            self.0.user_by_username(username).await
        }

        async fn users_by_username(
            &self,
            username: &str,
        ) -> Result<Vec<UserData>, DatabaseError> {
            self.0.users_by_username(username).await
        }

        async fn create_user(&self, new_user: NewUser) -> Result<UserData, DatabaseError> {
            self.0.create_user(new_user).await
        }

        async fn session_by_token(&self, token: &str) -> Result<SessionData, DatabaseError> {
            self.0.session_by_token(token).await
        }

        async fn create_session(
            &self,
            new_session: NewSession,
        ) -> Result<SessionData, DatabaseError> {
            self.0.create_session(new_session).await
        }

        async fn delete_session_by_token(&self, token: &str) -> Result<(), DatabaseError> {
            self.0.delete_session_by_token(token).await
        }

        async fn clear_expired_sessions(&self) -> Result<(), DatabaseError> {
            self.0.clear_expired_sessions().await
        }

        async fn list_photos(&self) -> Result<Vec<PhotoData>, DatabaseError> {
            self.0.list_photos().await
        }

        async fn create_score(&self, _: NewScore) -> Result<ScoreData, DatabaseError> {
            Err(storage_fault())
        }

        async fn list_scores(&self) -> Result<Vec<ScoreData>, DatabaseError> {
            Err(storage_fault())
        }

        async fn high_scores(&self) -> Result<Vec<HighScoreData>, DatabaseError> {
            Err(storage_fault())
        }
    }

    async fn broken_leaderboard_context() -> crate::ServerContext {
        let database = SqliteDatabase::in_memory().await.unwrap();
        testing::context_from(BrokenLeaderboard(database))
    }

    #[tokio::test]
    async fn home_lists_best_scores_highest_first() {
        let context = testing::context().await;

        let john = testing::register_and_login(&context, "john", "hunter2").await;
        let mary = testing::register_and_login(&context, "mary", "hunter2").await;

        for (cookie, score) in [(&john, 800), (&mary, 2000), (&john, 3100), (&mary, 50)] {
            let body = format!(r#"{{"score": {}}}"#, score);
            let response = send(&context, json_request("/upload", &body, Some(cookie))).await;
            assert_eq!(response.status, StatusCode::OK);
        }

        let response = send(&context, request(Method::GET, "/", None, None)).await;
        let scores = response.json()["scores"].clone();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            scores,
            serde_json::json!([
                { "username": "john", "score": 3100 },
                { "username": "mary", "score": 2000 },
            ])
        );
    }

    #[tokio::test]
    async fn play_serves_distinct_photos() {
        let context = testing::context_with_photos(12).await;

        let response = send(&context, request(Method::GET, "/play", None, None)).await;
        let json = response.json();
        let data = json["data"].as_array().unwrap();

        let ids: HashSet<_> = data
            .iter()
            .map(|photo| photo["selectedPhoto"].as_u64().unwrap())
            .collect();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(json["photosPerGame"], PHOTOS_PER_ROUND);
        assert_eq!(data.len(), PHOTOS_PER_ROUND);
        assert_eq!(ids.len(), PHOTOS_PER_ROUND);
        assert!(ids.iter().all(|id| (1..=12).contains(id)));
        assert_eq!(json["selectedPhoto"], data[0]["selectedPhoto"]);
        assert!(data[0]["realLat"].is_f64());
        assert!(data[0]["realLng"].is_f64());
    }

    #[tokio::test]
    async fn play_without_photos_is_unavailable() {
        let context = testing::context().await;

        let response = send(&context, request(Method::GET, "/play", None, None)).await;

        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn upload_records_the_score_for_the_session_user() {
        let context = testing::context().await;
        let cookie = testing::register_and_login(&context, "john", "hunter2").await;

        let response = send(&context, json_request("/upload", r#"{"score": 42}"#, Some(&cookie))).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json()["success"], true);

        let scores = context.game.database().list_scores().await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].username, "john");
        assert_eq!(scores[0].score, 42);
    }

    #[tokio::test]
    async fn upload_without_a_session_stores_nothing() {
        let context = testing::context().await;
        let forged = "campusguessr_session=abc.0123";

        for cookie in [None, Some(forged)] {
            let response = send(&context, json_request("/upload", r#"{"score": 42}"#, cookie)).await;
            let json = response.json();

            assert_eq!(response.status, StatusCode::UNAUTHORIZED);
            assert_eq!(json["success"], false);
            assert!(json["error"].is_string());
        }

        assert!(context.game.database().list_scores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_uploads_are_rejected() {
        let context = testing::context().await;
        let cookie = testing::register_and_login(&context, "john", "hunter2").await;

        for body in [r#"{"points": 42}"#, r#"{"score": "lots"}"#, "not json"] {
            let response = send(&context, json_request("/upload", body, Some(&cookie))).await;

            assert_eq!(response.status, StatusCode::BAD_REQUEST);
            assert_eq!(response.json()["success"], false);
        }

        assert!(context.game.database().list_scores().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_score_storage_is_reported_without_details() {
        let context = broken_leaderboard_context().await;
        let cookie = testing::register_and_login(&context, "john", "hunter2").await;

        let response = send(&context, json_request("/upload", r#"{"score": 42}"#, Some(&cookie))).await;
        let json = response.json();

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Score could not be saved");
        assert!(!String::from_utf8_lossy(&response.body).contains("disk I/O"));
    }

    #[tokio::test]
    async fn internal_errors_hide_the_database_message() {
        let context = broken_leaderboard_context().await;

        let response = send(&context, request(Method::GET, "/", None, None)).await;
        let body = String::from_utf8_lossy(&response.body);

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal server error");
        assert!(!body.contains("disk I/O"));
    }

    #[tokio::test]
    async fn responses_are_never_cached() {
        let context = testing::context().await;

        let response = send(&context, request(Method::GET, "/", None, None)).await;

        assert_eq!(
            response.headers[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(response.headers[header::EXPIRES], "0");
        assert_eq!(response.headers[header::PRAGMA], "no-cache");
    }
}
