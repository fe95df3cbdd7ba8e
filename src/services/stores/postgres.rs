//! PostgreSQL-backed catalog and like store
//!
//! One pool serves both traits. Ordering and limits are pushed down into SQL;
//! every list query breaks popularity ties on the song id.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{Like, LikedSong, LikedSongDetail, Song, SongId, UserId},
    services::stores::{Catalog, LikeStore},
};

const SONG_COLUMNS: &str = "id, title, artist, album, genre, year, popularity";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes `%`, `_` and `\` so user text matches literally inside `ILIKE`
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Row shape of the likes ⋈ songs join
#[derive(sqlx::FromRow)]
struct LikedSongRow {
    like_id: i32,
    user_id: UserId,
    liked_at: DateTime<Utc>,
    id: SongId,
    title: String,
    artist: String,
    album: Option<String>,
    genre: String,
    year: Option<i32>,
    popularity: i32,
}

impl From<LikedSongRow> for LikedSongDetail {
    fn from(row: LikedSongRow) -> Self {
        LikedSongDetail {
            like: Like {
                id: row.like_id,
                user_id: row.user_id,
                song_id: row.id,
                liked_at: row.liked_at,
            },
            song: Song {
                id: row.id,
                title: row.title,
                artist: row.artist,
                album: row.album,
                genre: row.genre,
                year: row.year,
                popularity: row.popularity,
            },
        }
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl Catalog for PgStore {
    async fn find_song(&self, id: SongId) -> AppResult<Option<Song>> {
        let song = sqlx::query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(song)
    }

    async fn top_songs(&self, limit: usize) -> AppResult<Vec<Song>> {
        let songs = sqlx::query_as::<_, Song>(&format!(
            "SELECT {SONG_COLUMNS} FROM songs ORDER BY popularity DESC, id ASC LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn songs_by_genre(
        &self,
        genre: &str,
        exclude: &[SongId],
        limit: usize,
    ) -> AppResult<Vec<Song>> {
        let songs = sqlx::query_as::<_, Song>(&format!(
            r#"
            SELECT {SONG_COLUMNS}
            FROM songs
            WHERE genre = $1 AND NOT (id = ANY($2))
            ORDER BY popularity DESC, id ASC
            LIMIT $3
            "#
        ))
        .bind(genre)
        .bind(exclude)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Song>> {
        let songs = sqlx::query_as::<_, Song>(&format!(
            r#"
            SELECT {SONG_COLUMNS}
            FROM songs
            WHERE title ILIKE $1 OR artist ILIKE $1 OR album ILIKE $1
            ORDER BY popularity DESC, id ASC
            LIMIT $2
            "#
        ))
        .bind(like_pattern(query))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(songs)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait::async_trait]
impl LikeStore for PgStore {
    async fn user_exists(&self, user_id: UserId) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn fetch_likes(&self, user_id: UserId) -> AppResult<Vec<LikedSong>> {
        let likes = sqlx::query_as::<_, LikedSong>(
            r#"
            SELECT l.song_id, s.genre, l.liked_at
            FROM song_likes l
            JOIN songs s ON s.id = l.song_id
            WHERE l.user_id = $1
            ORDER BY l.liked_at ASC, l.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(likes)
    }

    async fn liked_songs(&self, user_id: UserId) -> AppResult<Vec<LikedSongDetail>> {
        let rows = sqlx::query_as::<_, LikedSongRow>(
            r#"
            SELECT l.id AS like_id, l.user_id, l.liked_at,
                   s.id, s.title, s.artist, s.album, s.genre, s.year, s.popularity
            FROM song_likes l
            JOIN songs s ON s.id = l.song_id
            WHERE l.user_id = $1
            ORDER BY l.liked_at DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LikedSongDetail::from).collect())
    }

    async fn insert_like(&self, user_id: UserId, song_id: SongId) -> AppResult<Option<Like>> {
        let like = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO song_likes (user_id, song_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, song_id) DO NOTHING
            RETURNING id, user_id, song_id, liked_at
            "#,
        )
        .bind(user_id)
        .bind(song_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(like)
    }

    async fn delete_like(&self, user_id: UserId, song_id: SongId) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM song_likes WHERE user_id = $1 AND song_id = $2")
            .bind(user_id)
            .bind(song_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
