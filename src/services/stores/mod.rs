//! Data-access capabilities
//!
//! The recommendation engine and the like/search services never reach for a
//! global connection. They receive these traits, so PostgreSQL, an in-memory
//! fixture or a caching decorator can stand behind the same calls.

use crate::{
    error::AppResult,
    models::{Like, LikedSong, LikedSongDetail, Song, SongId, UserId},
};

pub mod cached;
pub mod memory;
pub mod postgres;

pub use cached::CachedCatalog;
pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Read access to the song catalog
///
/// Every list is ordered by popularity descending, then id ascending.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Looks up a single song
    async fn find_song(&self, id: SongId) -> AppResult<Option<Song>>;

    /// Most popular songs of the whole catalog
    async fn top_songs(&self, limit: usize) -> AppResult<Vec<Song>>;

    /// Most popular songs of one genre, skipping the given ids
    async fn songs_by_genre(
        &self,
        genre: &str,
        exclude: &[SongId],
        limit: usize,
    ) -> AppResult<Vec<Song>>;

    /// Case-insensitive substring search over title, artist and album
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Song>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Users and the like relation
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LikeStore: Send + Sync {
    async fn user_exists(&self, user_id: UserId) -> AppResult<bool>;

    /// Every like of a user with the liked song's genre, oldest first
    async fn fetch_likes(&self, user_id: UserId) -> AppResult<Vec<LikedSong>>;

    /// Every like of a user with the full song, newest first
    async fn liked_songs(&self, user_id: UserId) -> AppResult<Vec<LikedSongDetail>>;

    /// Records a like; `None` when the user already likes the song
    async fn insert_like(&self, user_id: UserId, song_id: SongId) -> AppResult<Option<Like>>;

    /// Removes a like and returns how many rows went away
    async fn delete_like(&self, user_id: UserId, song_id: SongId) -> AppResult<u64>;
}
