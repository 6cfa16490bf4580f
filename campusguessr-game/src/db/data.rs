use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The type used for primary keys in the database.
pub type PrimaryKey = i64;

/// A campusguessr account
#[derive(Debug, Clone, FromRow)]
pub struct UserData {
    pub id: PrimaryKey,
    pub username: String,
    /// The argon2 hash of the password, in PHC string format
    #[sqlx(rename = "hash")]
    pub password: String,
}

/// Login session data for authentication
#[derive(Debug, Clone)]
pub struct SessionData {
    pub id: PrimaryKey,
    /// The session token, or key if you will
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// The user that is logged in
    pub user: UserData,
}

/// A photo that can be served in a round
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PhotoData {
    /// Expected to look like `<integer>.jpg`
    pub filename: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A single leaderboard submission
#[derive(Debug, Clone, FromRow)]
pub struct ScoreData {
    pub id: PrimaryKey,
    pub username: String,
    pub score: i64,
    /// Unix timestamp of the submission
    pub created_at: i64,
}

/// The best score a user has submitted
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct HighScoreData {
    pub username: String,
    pub max_score: i64,
}

impl PhotoData {
    /// The numeric id encoded in the filename, if it follows the `<integer>.jpg` pattern.
    /// Only the canonical spelling counts, so `01.jpg` and `+1.jpg` don't alias `1.jpg`.
    pub fn photo_id(&self) -> Option<u32> {
        let stem = self.filename.strip_suffix(".jpg")?;
        let photo_id: u32 = stem.parse().ok()?;

        (photo_id.to_string() == stem).then_some(photo_id)
    }
}

#[cfg(test)]
mod test {
    use super::PhotoData;

    fn photo(filename: &str) -> PhotoData {
        PhotoData {
            filename: filename.to_string(),
            latitude: 42.37,
            longitude: -71.11,
        }
    }

    #[test]
    fn photo_ids_are_parsed_from_filenames() {
        assert_eq!(photo("12.jpg").photo_id(), Some(12));
        assert_eq!(photo("12.png").photo_id(), None);
        assert_eq!(photo("harvard-yard.jpg").photo_id(), None);
        assert_eq!(photo("-3.jpg").photo_id(), None);
        assert_eq!(photo("0.jpg").photo_id(), Some(0));
    }

    #[test]
    fn non_canonical_filenames_have_no_id() {
        for filename in ["01.jpg", "+1.jpg", "001.jpg", "0001.jpg", "00.jpg"] {
            assert_eq!(photo(filename).photo_id(), None, "{}", filename);
        }
    }
}
