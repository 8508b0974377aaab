//! Derived-value caches on data objects.

/// Types that memoize values computed from their buffers, such as array
/// ranges and the point bounds read from them. Every mutating method calls
/// `invalidate_cache` before returning.
pub trait InvalidateCache {
    fn invalidate_cache(&mut self);
}
