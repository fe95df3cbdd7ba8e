use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Song, SongId};

/// Opaque identifier supplied by the caller
pub type UserId = i32;

/// A user's like of a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i32,
    pub user_id: UserId,
    pub song_id: SongId,
    pub liked_at: DateTime<Utc>,
}

/// The slice of a like the recommendation engine reads
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LikedSong {
    pub song_id: SongId,
    pub genre: String,
    pub liked_at: DateTime<Utc>,
}

/// A like together with the song it references
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikedSongDetail {
    #[serde(flatten)]
    pub like: Like,
    pub song: Song,
}
