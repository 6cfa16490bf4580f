use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::{auth, game, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    paths(
        game::home,
        game::play,
        game::upload,
        auth::register_form,
        auth::register_user,
        auth::login_form,
        auth::login,
        auth::logout,
    ),
    components(schemas(
        schemas::RegisterSchema,
        schemas::LoginSchema,
        schemas::UploadSchema,
        serialized::HighScore,
        serialized::HomeView,
        serialized::RoundPhoto,
        serialized::PlayView,
        serialized::FormView,
        serialized::UploadResult,
    )),
    info(description = "campusguessr-server serves rounds, accounts and the leaderboard")
)]
pub struct ApiDoc;

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
