use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{Song, SongId},
    services::stores::Catalog,
};

const CATALOG_CACHE_TTL: u64 = 300; // 5 minutes

/// Read-through Redis cache in front of another catalog
///
/// Only whole-catalog reads are cached. Genre queries depend on the caller's
/// likes and always go to the inner catalog.
#[derive(Clone)]
pub struct CachedCatalog {
    inner: Arc<dyn Catalog>,
    cache: Cache,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn Catalog>, cache: Cache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl Catalog for CachedCatalog {
    async fn find_song(&self, id: SongId) -> AppResult<Option<Song>> {
        self.inner.find_song(id).await
    }

    async fn top_songs(&self, limit: usize) -> AppResult<Vec<Song>> {
        let key = CacheKey::TopSongs(limit);
        cached!(self.cache, key, CATALOG_CACHE_TTL, self.inner.top_songs(limit))
    }

    async fn songs_by_genre(
        &self,
        genre: &str,
        exclude: &[SongId],
        limit: usize,
    ) -> AppResult<Vec<Song>> {
        self.inner.songs_by_genre(genre, exclude, limit).await
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Song>> {
        let key = CacheKey::SongSearch(query.to_string(), limit);
        cached!(self.cache, key, CATALOG_CACHE_TTL, self.inner.search(query, limit))
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
