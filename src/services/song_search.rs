use crate::{
    error::{AppError, AppResult},
    models::Song,
    services::stores::Catalog,
};

/// Maximum number of songs a search returns
pub const SEARCH_LIMIT: usize = 20;

/// Free-text search over title, artist and album
///
/// Blank queries are rejected. Matching is a case-insensitive substring test
/// delegated to the catalog, most popular songs first.
pub async fn search_songs(catalog: &dyn Catalog, query: Option<&str>) -> AppResult<Vec<Song>> {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Query parameter required".to_string()))?;

    let songs = catalog.search(query, SEARCH_LIMIT).await?;

    tracing::debug!(query = %query, results = songs.len(), "Song search completed");

    Ok(songs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stores::{InMemoryStore, MockCatalog};

    #[tokio::test]
    async fn test_missing_query_is_rejected() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().never();

        let result = search_songs(&catalog, None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().never();

        let result = search_songs(&catalog, Some("   ")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_query_is_trimmed_and_limited() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search()
            .withf(|query, limit| query.to_string() == "queen" && *limit == SEARCH_LIMIT)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        search_songs(&catalog, Some("  queen ")).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_matches_album() {
        let store = InMemoryStore::demo().await;

        let songs = search_songs(&store, Some("thriller")).await.unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Billie Jean");
    }

    #[tokio::test]
    async fn test_search_orders_by_popularity() {
        let store = InMemoryStore::demo().await;

        // "e" appears in nearly every row
        let songs = search_songs(&store, Some("e")).await.unwrap();
        assert!(songs.windows(2).all(|w| w[0].popularity >= w[1].popularity));
        assert_eq!(songs[0].title, "Bohemian Rhapsody");
    }
}
