use log::{debug, warn};
use rand::{seq::SliceRandom, thread_rng, Rng};
use thiserror::Error;

use crate::{DatabaseError, PhotoData, SharedDatabase};

/// How many photos a single round consists of
pub const PHOTOS_PER_ROUND: usize = 5;

/// One photo to guess the location of
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPhoto {
    pub photo_id: u32,
    pub latitude: f64,
    pub longitude: f64,
}

/// A freshly generated round
#[derive(Debug, Clone)]
pub struct RoundData {
    pub photos: Vec<RoundPhoto>,
}

impl RoundData {
    /// The photo the round starts with
    pub fn first_photo(&self) -> Option<u32> {
        self.photos.first().map(|p| p.photo_id)
    }
}

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("There are no photos to play with")]
    NoPhotos,
    #[error(transparent)]
    Db(#[from] DatabaseError),
}

pub struct Rounds {
    db: SharedDatabase,
}

impl Rounds {
    pub fn new(db: &SharedDatabase) -> Self {
        Self { db: db.clone() }
    }

    /// Picks [PHOTOS_PER_ROUND] distinct photos at random
    pub async fn generate(&self) -> Result<RoundData, RoundError> {
        let photos = self.db.list_photos().await?;

        select_round(photos, PHOTOS_PER_ROUND, &mut thread_rng())
    }
}

/// Selects up to `count` distinct photos out of every photo with a valid filename.
/// If fewer valid photos exist, all of them are used in a random order.
pub fn select_round<R>(
    photos: Vec<PhotoData>,
    count: usize,
    rng: &mut R,
) -> Result<RoundData, RoundError>
where
    R: Rng + ?Sized,
{
    let mut candidates: Vec<_> = photos
        .into_iter()
        .filter_map(|photo| match photo.photo_id() {
            Some(photo_id) => Some(RoundPhoto {
                photo_id,
                latitude: photo.latitude,
                longitude: photo.longitude,
            }),
            None => {
                warn!("Skipping photo with unexpected filename {}", photo.filename);
                None
            }
        })
        .collect();

    if candidates.is_empty() {
        return Err(RoundError::NoPhotos);
    }

    if candidates.len() < count {
        warn!(
            "Only {} photos available, round will be short",
            candidates.len()
        );
    }

    candidates.shuffle(rng);
    candidates.truncate(count);

    debug!(
        "Generated round {:?}",
        candidates.iter().map(|p| p.photo_id).collect::<Vec<_>>()
    );

    Ok(RoundData { photos: candidates })
}
