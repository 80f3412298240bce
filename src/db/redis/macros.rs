/// Read-through caching for fallible async lookups.
///
/// Returns the cached value when present. Otherwise awaits `$block`, hands the
/// result to the background writer and returns it. A failed cache read is
/// logged and treated as a miss, so an unavailable Redis only costs latency.
///
/// # Arguments
/// * `$cache`: cache with `get_from_cache` and `set_in_background` methods.
/// * `$key`: the [`CacheKey`](crate::db::CacheKey) to read and write.
/// * `$ttl`: time-to-live of a written value, in seconds.
/// * `$block`: future producing an `AppResult` of the value on a miss.
///
/// # Example
/// ```rust,ignore
/// cached!(cache, CacheKey::Poster(title.to_string()), 3600, self.search_poster(title))
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
