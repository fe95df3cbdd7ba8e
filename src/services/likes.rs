use crate::{
    error::{AppError, AppResult},
    models::{Like, LikedSongDetail, SongId, UserId},
    services::stores::{Catalog, LikeStore},
};

/// Records that a user likes a song
///
/// Both the song and the user must exist. A user likes a song at most once;
/// a repeated like is a conflict rather than a second row.
pub async fn like_song(
    catalog: &dyn Catalog,
    likes: &dyn LikeStore,
    user_id: UserId,
    song_id: SongId,
) -> AppResult<Like> {
    if catalog.find_song(song_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Song {} not found", song_id)));
    }

    if !likes.user_exists(user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    let like = likes.insert_like(user_id, song_id).await?.ok_or_else(|| {
        AppError::Conflict(format!("User {} already likes song {}", user_id, song_id))
    })?;

    tracing::info!(user_id, song_id, like_id = like.id, "Song liked");

    Ok(like)
}

/// Removes a like; unliking a song that is not liked is not an error
pub async fn unlike_song(likes: &dyn LikeStore, user_id: UserId, song_id: SongId) -> AppResult<()> {
    let removed = likes.delete_like(user_id, song_id).await?;

    tracing::info!(user_id, song_id, removed, "Song unliked");

    Ok(())
}

/// A user's likes with their songs, newest first
pub async fn liked_songs(likes: &dyn LikeStore, user_id: UserId) -> AppResult<Vec<LikedSongDetail>> {
    likes.liked_songs(user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::Song,
        services::stores::{InMemoryStore, MockCatalog, MockLikeStore},
    };
    use chrono::Utc;

    fn rock_song(id: SongId) -> Song {
        Song {
            id,
            title: "Sweet Child O' Mine".to_string(),
            artist: "Guns N' Roses".to_string(),
            album: None,
            genre: "Rock".to_string(),
            year: Some(1987),
            popularity: 85,
        }
    }

    #[tokio::test]
    async fn test_like_unknown_song() {
        let mut catalog = MockCatalog::new();
        catalog.expect_find_song().returning(|_| Ok(None));
        let mut likes = MockLikeStore::new();
        likes.expect_insert_like().never();

        let result = like_song(&catalog, &likes, 1, 99).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_like_unknown_user() {
        let mut catalog = MockCatalog::new();
        catalog.expect_find_song().returning(|id| Ok(Some(rock_song(id))));
        let mut likes = MockLikeStore::new();
        likes.expect_user_exists().returning(|_| Ok(false));
        likes.expect_insert_like().never();

        let result = like_song(&catalog, &likes, 42, 6).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_like_is_conflict() {
        let mut catalog = MockCatalog::new();
        catalog.expect_find_song().returning(|id| Ok(Some(rock_song(id))));
        let mut likes = MockLikeStore::new();
        likes.expect_user_exists().returning(|_| Ok(true));
        likes.expect_insert_like().returning(|_, _| Ok(None));

        let result = like_song(&catalog, &likes, 1, 6).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_like_returns_stored_like() {
        let mut catalog = MockCatalog::new();
        catalog.expect_find_song().returning(|id| Ok(Some(rock_song(id))));
        let mut likes = MockLikeStore::new();
        likes.expect_user_exists().returning(|_| Ok(true));
        likes.expect_insert_like().returning(|user_id, song_id| {
            Ok(Some(Like {
                id: 5,
                user_id,
                song_id,
                liked_at: Utc::now(),
            }))
        });

        let like = like_song(&catalog, &likes, 1, 6).await.unwrap();
        assert_eq!(like.id, 5);
        assert_eq!(like.song_id, 6);
    }

    #[tokio::test]
    async fn test_unlike_is_idempotent() {
        let store = InMemoryStore::demo().await;
        like_song(&store, &store, 1, 3).await.unwrap();

        unlike_song(&store, 1, 3).await.unwrap();
        unlike_song(&store, 1, 3).await.unwrap();

        assert!(liked_songs(&store, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_like_then_list() {
        let store = InMemoryStore::demo().await;
        like_song(&store, &store, 1, 1).await.unwrap();
        like_song(&store, &store, 1, 2).await.unwrap();

        let liked = liked_songs(&store, 1).await.unwrap();
        let titles: Vec<&str> = liked.iter().map(|d| d.song.title.as_str()).collect();
        assert_eq!(titles, vec!["Shape of You", "Bohemian Rhapsody"]);
    }
}
