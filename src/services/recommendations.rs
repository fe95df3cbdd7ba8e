use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{LikedSong, Song, SongId, UserId},
    services::stores::{Catalog, LikeStore},
};

/// Maximum number of songs a recommendation contains
pub const RECOMMENDATION_LIMIT: usize = 10;

/// The single catalog read a recommendation needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// Cold start: most popular songs of the whole catalog
    Popular { limit: usize },
    /// Most popular songs of the dominant genre the user has not liked yet
    Genre {
        genre: String,
        exclude: Vec<SongId>,
        limit: usize,
    },
}

/// Number of likes per genre
///
/// Every entry counts, so a duplicated like weighs twice.
pub fn genre_counts(liked: &[LikedSong]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for like in liked {
        *counts.entry(like.genre.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Genre with the most likes
///
/// On a tie the genre whose first like comes earliest in `liked` wins.
/// `None` only for an empty slice.
pub fn dominant_genre(liked: &[LikedSong]) -> Option<&str> {
    let counts = genre_counts(liked);
    let mut best: Option<(&str, usize)> = None;

    for like in liked {
        let genre = like.genre.as_str();
        let count = counts.get(genre).copied().unwrap_or(0);
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((genre, count)),
        }
    }

    best.map(|(genre, _)| genre)
}

/// Distinct ids of every liked song, in first-liked order
pub fn excluded_ids(liked: &[LikedSong]) -> Vec<SongId> {
    let mut seen = HashSet::new();
    liked
        .iter()
        .map(|like| like.song_id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Decides which catalog read answers a recommendation for these likes
pub fn plan(liked: &[LikedSong]) -> CatalogQuery {
    match dominant_genre(liked) {
        None => CatalogQuery::Popular {
            limit: RECOMMENDATION_LIMIT,
        },
        Some(genre) => CatalogQuery::Genre {
            genre: genre.to_string(),
            exclude: excluded_ids(liked),
            limit: RECOMMENDATION_LIMIT,
        },
    }
}

/// Final ordering of a candidate list
///
/// Drops excluded songs, sorts by popularity descending with ties on ascending
/// id, and caps the list at [`RECOMMENDATION_LIMIT`]. Applied to whatever the
/// catalog returns, so the output never depends on the backend's ordering.
pub fn rank(mut songs: Vec<Song>, exclude: &[SongId]) -> Vec<Song> {
    songs.retain(|song| !exclude.contains(&song.id));
    songs.sort_by_key(|song| (Reverse(song.popularity), song.id));
    songs.dedup_by_key(|song| song.id);
    songs.truncate(RECOMMENDATION_LIMIT);
    songs
}

/// Runs a planned query against the catalog and ranks the result
pub async fn execute(catalog: &dyn Catalog, query: &CatalogQuery) -> AppResult<Vec<Song>> {
    match query {
        CatalogQuery::Popular { limit } => Ok(rank(catalog.top_songs(*limit).await?, &[])),
        CatalogQuery::Genre {
            genre,
            exclude,
            limit,
        } => {
            let songs = catalog.songs_by_genre(genre, exclude, *limit).await?;
            Ok(rank(songs, exclude))
        }
    }
}

/// Recommends up to ten songs for a user
///
/// Users without likes get the most popular songs. Everyone else gets the most
/// popular songs of their dominant genre they have not liked yet, which may be
/// empty: there is no fallback to another genre.
pub async fn get_recommendations(
    catalog: &dyn Catalog,
    likes: &dyn LikeStore,
    user_id: UserId,
) -> AppResult<Vec<Song>> {
    let mut liked = likes.fetch_likes(user_id).await?;
    // Stores are not required to order likes; ties resolve on like order
    liked.sort_by_key(|like| (like.liked_at, like.song_id));

    let query = plan(&liked);

    match &query {
        CatalogQuery::Popular { .. } => {
            tracing::info!(user_id, catalog = catalog.name(), "Cold start, recommending popular songs");
        }
        CatalogQuery::Genre { genre, exclude, .. } => {
            tracing::info!(
                user_id,
                catalog = catalog.name(),
                like_count = liked.len(),
                dominant_genre = %genre,
                excluded = exclude.len(),
                "Recommending from dominant genre"
            );
        }
    }

    let songs = execute(catalog, &query).await?;

    tracing::debug!(user_id, count = songs.len(), "Recommendations ready");

    Ok(songs)
}
