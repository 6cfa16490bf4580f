use serde::Deserialize;
use utoipa::ToSchema;

/// The registration form. Missing fields are reported by validation, not rejected here.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterSchema {
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginSchema {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadSchema {
    /// Total score of the round, computed by the client
    pub score: i64,
}
