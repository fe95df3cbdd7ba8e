use serde::{Deserialize, Serialize};

mod like;
mod song;

pub use like::{Like, LikedSong, LikedSongDetail, UserId};
pub use song::{NewSong, Song, SongId};

// ============================================================================
// Request / Response Types
// ============================================================================

/// Body of like and unlike requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub user_id: UserId,
}

/// Query string of the recommendations endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationParams {
    pub user_id: UserId,
}

/// Query string of the search endpoint
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
