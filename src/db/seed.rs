use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{NewSong, UserId},
};

/// The single user the demo front end acts as
pub const DEMO_USER_ID: UserId = 1;

/// Ten well-known songs across Rock, Pop and Hip-Hop
pub fn demo_songs() -> Vec<NewSong> {
    let rows: [(&str, &str, &str, &str, i32, i32); 10] = [
        ("Bohemian Rhapsody", "Queen", "A Night at the Opera", "Rock", 1975, 95),
        ("Shape of You", "Ed Sheeran", "÷", "Pop", 2017, 90),
        ("Stairway to Heaven", "Led Zeppelin", "Led Zeppelin IV", "Rock", 1971, 90),
        ("Blinding Lights", "The Weeknd", "After Hours", "Pop", 2019, 88),
        ("God's Plan", "Drake", "Scorpion", "Hip-Hop", 2018, 87),
        ("Sweet Child O' Mine", "Guns N' Roses", "Appetite for Destruction", "Rock", 1987, 85),
        ("Anti-Hero", "Taylor Swift", "Midnights", "Pop", 2022, 85),
        ("HUMBLE.", "Kendrick Lamar", "DAMN.", "Hip-Hop", 2017, 82),
        ("Smells Like Teen Spirit", "Nirvana", "Nevermind", "Rock", 1991, 88),
        ("Billie Jean", "Michael Jackson", "Thriller", "Pop", 1982, 92),
    ];

    rows.into_iter()
        .map(|(title, artist, album, genre, year, popularity)| NewSong {
            title: title.to_string(),
            artist: artist.to_string(),
            album: Some(album.to_string()),
            genre: genre.to_string(),
            year: Some(year),
            popularity,
        })
        .collect()
}

/// Seeds the demo user and, when the catalog is empty, the demo songs
///
/// Returns the number of songs inserted.
pub async fn seed_catalog(pool: &PgPool) -> AppResult<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(DEMO_USER_ID)
        .execute(&mut *tx)
        .await?;

    // Keep SERIAL ahead of the explicitly inserted demo user
    sqlx::query("SELECT setval(pg_get_serial_sequence('users', 'id'), GREATEST((SELECT MAX(id) FROM users), 1))")
        .execute(&mut *tx)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(&mut *tx)
        .await?;

    if existing > 0 {
        tx.commit().await?;
        tracing::info!(existing, "Catalog already populated, skipping seed");
        return Ok(0);
    }

    let songs = demo_songs();
    for song in &songs {
        sqlx::query(
            r#"
            INSERT INTO songs (title, artist, album, genre, year, popularity)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&song.title)
        .bind(&song.artist)
        .bind(&song.album)
        .bind(&song.genre)
        .bind(song.year)
        .bind(song.popularity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(inserted = songs.len(), "Seeded demo catalog");

    Ok(songs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_demo_catalog_shape() {
        let songs = demo_songs();
        assert_eq!(songs.len(), 10);

        let genres: HashSet<&str> = songs.iter().map(|s| s.genre.as_str()).collect();
        assert_eq!(genres, HashSet::from(["Rock", "Pop", "Hip-Hop"]));
    }

    #[test]
    fn test_demo_catalog_most_popular_is_queen() {
        let songs = demo_songs();
        let top = songs.iter().max_by_key(|s| s.popularity).unwrap();
        assert_eq!(top.title, "Bohemian Rhapsody");
        assert_eq!(top.popularity, 95);
    }
}
