use serde::{Deserialize, Serialize};

/// Catalog identifier of a song
pub type SongId = i32;

/// A song in the catalog
///
/// Reference data: rows are created when the catalog is loaded and are never
/// mutated by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: String,
    pub year: Option<i32>,
    /// Higher is more popular
    pub popularity: i32,
}

impl Song {
    /// Case-insensitive substring match over title, artist and album
    pub fn matches_text(&self, needle_lowercase: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(needle_lowercase);

        contains(&self.title)
            || contains(&self.artist)
            || self.album.as_deref().is_some_and(contains)
    }
}

/// A song that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: String,
    pub year: Option<i32>,
    pub popularity: i32,
}

impl NewSong {
    pub fn with_id(self, id: SongId) -> Song {
        Song {
            id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            genre: self.genre,
            year: self.year,
            popularity: self.popularity,
        }
    }
}
