//! Read-through cache of record store queries keyed by their query shape.
//!
//! Keys are segment lists; invalidating a key drops every entry whose key starts with it, so
//! `["games"]` covers the platform and on-sale listings as well.
//!
//! Every invalidation bumps a generation counter. Readers capture it before hitting the store
//! and hand it back on insert, so a result fetched before a mutation never lands in the cache
//! after that mutation's invalidation. Entries also expire after the configured lifetime, which
//! bounds staleness from writers outside this process.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;

use crate::dao::models::{GameEntity, Platform};

const GAMES_SEGMENT: &str = "games";
const GAME_SEGMENT: &str = "game";

/// Identifies a cached query by its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// `["games"]`: the full listing and, as a prefix, every derived listing.
    pub fn all_games() -> Self {
        Self(vec![GAMES_SEGMENT.into()])
    }

    /// `["games", "platform", <platform>]`.
    pub fn games_by_platform(platform: Platform) -> Self {
        Self(vec![
            GAMES_SEGMENT.into(),
            "platform".into(),
            platform.as_str().into(),
        ])
    }

    /// `["games", "onSale"]`.
    pub fn on_sale_games() -> Self {
        Self(vec![GAMES_SEGMENT.into(), "onSale".into()])
    }

    /// `["game", <id>]`.
    pub fn game(id: &str) -> Self {
        Self(vec![GAME_SEGMENT.into(), id.into()])
    }

    /// Key segments in order.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// A cached query result.
#[derive(Debug, Clone)]
pub enum CachedQuery {
    /// Result of a listing query.
    Games(Arc<Vec<GameEntity>>),
    /// Result of a single record lookup; `None` caches a miss.
    Game(Arc<Option<GameEntity>>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedQuery,
    stored_at: Instant,
}

/// Concurrent query cache. The data access service is its only writer.
#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    generation: AtomicU64,
    ttl: Option<Duration>,
}

impl QueryCache {
    /// Create an empty cache whose entries never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache whose entries expire `ttl` after being stored.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Current invalidation generation. Capture it before fetching what will be inserted.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn lookup(&self, key: &QueryKey) -> Option<CachedQuery> {
        let entry = self.entries.get(key)?.value().clone();
        match self.ttl {
            Some(ttl) if entry.stored_at.elapsed() >= ttl => {
                self.entries
                    .remove_if(key, |_, current| current.stored_at == entry.stored_at);
                None
            }
            _ => Some(entry.value),
        }
    }

    /// Cached listing for `key`, if present and fresh.
    pub fn games(&self, key: &QueryKey) -> Option<Arc<Vec<GameEntity>>> {
        match self.lookup(key) {
            Some(CachedQuery::Games(games)) => Some(games),
            _ => None,
        }
    }

    /// Cached single record lookup for `key`, if present and fresh.
    pub fn game(&self, key: &QueryKey) -> Option<Arc<Option<GameEntity>>> {
        match self.lookup(key) {
            Some(CachedQuery::Game(game)) => Some(game),
            _ => None,
        }
    }

    /// Store a result fetched while `generation` was current.
    ///
    /// Returns `false` and leaves the key empty when an invalidation happened since. The entry
    /// is written first and rechecked afterwards, so an invalidation racing the write either
    /// removes it or is observed by the recheck.
    pub fn insert_fetched(&self, key: QueryKey, value: CachedQuery, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        let stored_at = Instant::now();
        self.entries.insert(key.clone(), Entry { value, stored_at });
        if self.generation() == generation {
            return true;
        }
        self.entries
            .remove_if(&key, |_, current| current.stored_at == stored_at);
        false
    }

    /// Drop every entry whose key starts with `prefix`, returning how many were removed.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before.saturating_sub(self.entries.len())
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    /// Whether a value is cached for exactly `key`.
    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> CachedQuery {
        CachedQuery::Games(Arc::new(Vec::new()))
    }

    fn put(cache: &QueryCache, key: QueryKey, value: CachedQuery) {
        assert!(cache.insert_fetched(key, value, cache.generation()));
    }

    #[test]
    fn games_prefix_covers_derived_listings_only() {
        let cache = QueryCache::new();
        put(&cache, QueryKey::all_games(), listing());
        put(&cache, QueryKey::games_by_platform(Platform::Ps5), listing());
        put(&cache, QueryKey::on_sale_games(), listing());
        put(&cache, QueryKey::game("g1"), CachedQuery::Game(Arc::new(None)));

        assert_eq!(cache.invalidate_prefix(&QueryKey::all_games()), 3);
        assert!(cache.contains(&QueryKey::game("g1")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn single_record_keys_are_independent() {
        let cache = QueryCache::new();
        put(&cache, QueryKey::game("g1"), CachedQuery::Game(Arc::new(None)));
        put(&cache, QueryKey::game("g10"), CachedQuery::Game(Arc::new(None)));

        assert_eq!(cache.invalidate_prefix(&QueryKey::game("g1")), 1);
        assert!(cache.contains(&QueryKey::game("g10")));
    }

    #[test]
    fn typed_getters_ignore_mismatched_variants() {
        let cache = QueryCache::new();
        put(&cache, QueryKey::game("g1"), listing());
        assert!(cache.game(&QueryKey::game("g1")).is_none());
        assert!(cache.games(&QueryKey::game("g1")).is_some());
    }

    #[test]
    fn results_fetched_before_an_invalidation_are_not_stored() {
        let cache = QueryCache::new();
        let before = cache.generation();
        cache.invalidate_prefix(&QueryKey::all_games());

        assert!(!cache.insert_fetched(QueryKey::all_games(), listing(), before));
        assert!(!cache.contains(&QueryKey::all_games()));

        let current = cache.generation();
        assert!(cache.insert_fetched(QueryKey::all_games(), listing(), current));
        assert!(cache.contains(&QueryKey::all_games()));
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = QueryCache::with_ttl(Duration::ZERO);
        put(&cache, QueryKey::all_games(), listing());
        assert!(cache.games(&QueryKey::all_games()).is_none());
        assert!(cache.is_empty());

        let cache = QueryCache::with_ttl(Duration::from_secs(60));
        put(&cache, QueryKey::all_games(), listing());
        assert!(cache.games(&QueryKey::all_games()).is_some());
    }

    #[test]
    fn keys_render_as_segment_lists() {
        assert_eq!(
            QueryKey::games_by_platform(Platform::Xbox).to_string(),
            "[games, platform, xbox]"
        );
    }
}
