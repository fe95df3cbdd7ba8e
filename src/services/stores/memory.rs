use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::{
    db::seed::{demo_songs, DEMO_USER_ID},
    error::AppResult,
    models::{Like, LikedSong, LikedSongDetail, NewSong, Song, SongId, UserId},
    services::stores::{Catalog, LikeStore},
};

/// Process-local store for development and tests
///
/// Cloning is cheap; clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<InMemoryStoreInner>>,
}

#[derive(Default)]
struct InMemoryStoreInner {
    songs: BTreeMap<SongId, Song>,
    users: HashSet<UserId>,
    likes: Vec<Like>,
    next_song_id: SongId,
    next_like_id: i32,
}

/// Popularity descending, then id ascending
fn by_popularity(a: &Song, b: &Song) -> std::cmp::Ordering {
    b.popularity.cmp(&a.popularity).then(a.id.cmp(&b.id))
}

fn ranked<'a>(songs: impl Iterator<Item = &'a Song>, limit: usize) -> Vec<Song> {
    let mut songs: Vec<Song> = songs.cloned().collect();
    songs.sort_by(by_popularity);
    songs.truncate(limit);
    songs
}

impl InMemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo catalog plus the demo user
    pub async fn demo() -> Self {
        let store = Self::new();
        store.add_user(DEMO_USER_ID).await;
        for song in demo_songs() {
            store.add_song(song).await;
        }
        store
    }

    /// Adds a catalog entry and returns it with its assigned id
    pub async fn add_song(&self, song: NewSong) -> Song {
        let mut inner = self.inner.write().await;
        inner.next_song_id += 1;
        let song = song.with_id(inner.next_song_id);
        inner.songs.insert(song.id, song.clone());
        song
    }

    pub async fn add_user(&self, user_id: UserId) {
        self.inner.write().await.users.insert(user_id);
    }
}

#[async_trait::async_trait]
impl Catalog for InMemoryStore {
    async fn find_song(&self, id: SongId) -> AppResult<Option<Song>> {
        Ok(self.inner.read().await.songs.get(&id).cloned())
    }

    async fn top_songs(&self, limit: usize) -> AppResult<Vec<Song>> {
        let inner = self.inner.read().await;
        Ok(ranked(inner.songs.values(), limit))
    }

    async fn songs_by_genre(
        &self,
        genre: &str,
        exclude: &[SongId],
        limit: usize,
    ) -> AppResult<Vec<Song>> {
        let inner = self.inner.read().await;
        let pool = inner
            .songs
            .values()
            .filter(|song| song.genre == genre && !exclude.contains(&song.id));
        Ok(ranked(pool, limit))
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Song>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(ranked(
            inner.songs.values().filter(|song| song.matches_text(&needle)),
            limit,
        ))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait::async_trait]
impl LikeStore for InMemoryStore {
    async fn user_exists(&self, user_id: UserId) -> AppResult<bool> {
        Ok(self.inner.read().await.users.contains(&user_id))
    }

    async fn fetch_likes(&self, user_id: UserId) -> AppResult<Vec<LikedSong>> {
        let inner = self.inner.read().await;
        // Likes are appended, so storage order is chronological
        let likes = inner
            .likes
            .iter()
            .filter(|like| like.user_id == user_id)
            .filter_map(|like| {
                inner.songs.get(&like.song_id).map(|song| LikedSong {
                    song_id: like.song_id,
                    genre: song.genre.clone(),
                    liked_at: like.liked_at,
                })
            })
            .collect();
        Ok(likes)
    }

    async fn liked_songs(&self, user_id: UserId) -> AppResult<Vec<LikedSongDetail>> {
        let inner = self.inner.read().await;
        let details = inner
            .likes
            .iter()
            .rev()
            .filter(|like| like.user_id == user_id)
            .filter_map(|like| {
                inner.songs.get(&like.song_id).map(|song| LikedSongDetail {
                    like: like.clone(),
                    song: song.clone(),
                })
            })
            .collect();
        Ok(details)
    }

    async fn insert_like(&self, user_id: UserId, song_id: SongId) -> AppResult<Option<Like>> {
        let mut inner = self.inner.write().await;

        let duplicate = inner
            .likes
            .iter()
            .any(|like| like.user_id == user_id && like.song_id == song_id);
        if duplicate {
            return Ok(None);
        }

        // Keep timestamps strictly increasing so like order survives sorting
        let now = Utc::now();
        let liked_at = inner
            .likes
            .last()
            .map_or(now, |last| now.max(last.liked_at + Duration::microseconds(1)));

        inner.next_like_id += 1;
        let like = Like {
            id: inner.next_like_id,
            user_id,
            song_id,
            liked_at,
        };
        inner.likes.push(like.clone());

        Ok(Some(like))
    }

    async fn delete_like(&self, user_id: UserId, song_id: SongId) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.likes.len();
        inner
            .likes
            .retain(|like| !(like.user_id == user_id && like.song_id == song_id));
        Ok((before - inner.likes.len()) as u64)
    }
}
