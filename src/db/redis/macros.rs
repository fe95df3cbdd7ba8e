/// Read-through caching over a [`Cache`](crate::db::Cache).
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues the
/// result for a background write with the given TTL and returns it. Errors from
/// the cache lookup or the block are propagated with `?`, and the expansion
/// evaluates to `Ok(value)`, so it sits in tail position of an `AppResult` fn.
///
/// # Example
/// ```rust,ignore
/// async fn top_songs(&self, limit: usize) -> AppResult<Vec<Song>> {
///     let key = CacheKey::TopSongs(limit);
///     cached!(self.cache, key, 300, self.inner.top_songs(limit))
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            tracing::debug!(key = %$key, "Cache hit");
            Ok(cached)
        } else {
            tracing::debug!(key = %$key, "Cache miss");
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
