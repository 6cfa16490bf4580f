//! All view data that is exposed from endpoints is defined here
//! along with the conversions from game types

use campusguessr_game::{HighScoreData, RoundData, RoundPhoto as GameRoundPhoto, PHOTOS_PER_ROUND};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HighScore {
    username: String,
    score: i64,
}

/// The leaderboard shown on the home page
#[derive(Debug, Serialize, ToSchema)]
pub struct HomeView {
    scores: Vec<HighScore>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundPhoto {
    real_lat: f64,
    real_lng: f64,
    selected_photo: u32,
}

/// A round to play
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayView {
    selected_photo: u32,
    data: Vec<RoundPhoto>,
    photos_per_game: usize,
}

/// The register and login forms, with the error of the last submission if any
#[derive(Debug, Serialize, ToSchema)]
pub struct FormView {
    view: String,
    error: Option<String>,
}

impl FormView {
    pub fn register(error: Option<String>) -> Self {
        Self {
            view: "register".to_string(),
            error,
        }
    }

    pub fn login(error: Option<String>) -> Self {
        Self {
            view: "login".to_string(),
            error,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl UploadResult {
    pub fn received() -> Self {
        Self {
            success: true,
            message: Some("Score received successfully".to_string()),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<HighScore> for HighScoreData {
    fn to_serialized(&self) -> HighScore {
        HighScore {
            username: self.username.clone(),
            score: self.max_score,
        }
    }
}

impl ToSerialized<HomeView> for Vec<HighScoreData> {
    fn to_serialized(&self) -> HomeView {
        HomeView {
            scores: self.iter().map(|x| x.to_serialized()).collect(),
        }
    }
}

impl ToSerialized<RoundPhoto> for GameRoundPhoto {
    fn to_serialized(&self) -> RoundPhoto {
        RoundPhoto {
            real_lat: self.latitude,
            real_lng: self.longitude,
            selected_photo: self.photo_id,
        }
    }
}

impl PlayView {
    /// Returns nothing for an empty round
    pub fn from_round(round: &RoundData) -> Option<Self> {
        Some(Self {
            selected_photo: round.first_photo()?,
            data: round.photos.to_serialized(),
            photos_per_game: PHOTOS_PER_ROUND,
        })
    }
}
