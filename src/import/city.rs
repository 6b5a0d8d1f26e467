//! City resolution - map free-text city names to stable identifiers
//!
//! One resolver lives for exactly one import call; its cache keeps a
//! batch from re-looking-up (or re-creating) the same city row by row.

use std::collections::HashMap;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::import::types::NewCity;
use crate::store::ImportStore;

pub struct CityResolver {
    /// Trimmed, exact-case name -> id, valid for this batch only.
    cache: HashMap<String, Uuid>,
    /// Lazily fetched fallback; outer Option tracks whether we asked.
    fallback: Option<Option<Uuid>>,
}

impl CityResolver {
    pub fn new() -> Self {
        CityResolver {
            cache: HashMap::new(),
            fallback: None,
        }
    }

    /// Fallback city for rows without a usable name: the first city in
    /// the store. Fetched once per batch.
    pub async fn fallback_id(&mut self, store: &dyn ImportStore) -> Option<Uuid> {
        if let Some(id) = self.fallback {
            return id;
        }
        let id = match store.first_city_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to load fallback city: {}", e);
                None
            }
        };
        self.fallback = Some(id);
        id
    }

    /// Resolve a city name, short-circuiting on the first hit:
    /// cache, exact-name lookup, case-insensitive lookup, create.
    /// Returns `None` only when creation itself fails.
    pub async fn resolve(&mut self, store: &dyn ImportStore, name: &str) -> Option<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return self.fallback_id(store).await;
        }

        if let Some(id) = self.cache.get(name) {
            return Some(*id);
        }

        match store.find_city_by_name(name).await {
            Ok(Some(id)) => {
                self.cache.insert(name.to_string(), id);
                return Some(id);
            }
            Ok(None) => {}
            Err(e) => warn!("City lookup failed for \"{}\": {}", name, e),
        }

        match store.find_city_by_name_ci(name).await {
            Ok(Some(id)) => {
                self.cache.insert(name.to_string(), id);
                return Some(id);
            }
            Ok(None) => {}
            Err(e) => warn!("City lookup failed for \"{}\": {}", name, e),
        }

        let city = NewCity::from_name(name);
        match store.insert_city(&city).await {
            Ok(id) => {
                debug!("Created city \"{}\" ({})", city.name, city.slug);
                self.cache.insert(name.to_string(), id);
                Some(id)
            }
            Err(e) => {
                warn!("Failed to create city \"{}\": {}", name, e);
                None
            }
        }
    }
}

impl Default for CityResolver {
    fn default() -> Self {
        CityResolver::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::MockStore;

    #[tokio::test]
    async fn test_resolve_existing_city_exact() {
        let store = MockStore::new();
        let berlin = store.add_city("Berlin");

        let mut resolver = CityResolver::new();
        assert_eq!(resolver.resolve(&store, "Berlin").await, Some(berlin));
        assert_eq!(store.calls().city_inserts, 0);
    }

    #[tokio::test]
    async fn test_resolve_case_insensitive() {
        let store = MockStore::new();
        let hamburg = store.add_city("Hamburg");

        let mut resolver = CityResolver::new();
        assert_eq!(resolver.resolve(&store, "hamburg").await, Some(hamburg));
        assert_eq!(store.calls().city_inserts, 0);
    }

    #[tokio::test]
    async fn test_resolve_creates_unknown_city_with_slug() {
        let store = MockStore::new();

        let mut resolver = CityResolver::new();
        let id = resolver.resolve(&store, "München").await;
        assert!(id.is_some());

        let cities = store.cities.lock().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "München");
        assert_eq!(cities[0].slug, "muenchen");
    }

    #[tokio::test]
    async fn test_cache_avoids_repeat_store_calls() {
        let store = MockStore::new();

        let mut resolver = CityResolver::new();
        let first = resolver.resolve(&store, "Dresden").await;
        let second = resolver.resolve(&store, "Dresden").await;

        assert_eq!(first, second);
        // One miss-pair of lookups and exactly one creation; the second
        // resolution is served from the cache.
        assert_eq!(store.calls().city_inserts, 1);
        assert_eq!(store.calls().city_lookups, 2);
    }

    #[tokio::test]
    async fn test_cached_lookup_for_known_city() {
        let store = MockStore::new();
        store.add_city("Leipzig");

        let mut resolver = CityResolver::new();
        resolver.resolve(&store, "Leipzig").await;
        resolver.resolve(&store, "Leipzig").await;

        assert_eq!(store.calls().city_lookups, 1);
        assert_eq!(store.calls().city_inserts, 0);
    }

    #[tokio::test]
    async fn test_blank_name_returns_fallback() {
        let store = MockStore::new();
        let first = store.add_city("Berlin");
        store.add_city("Hamburg");

        let mut resolver = CityResolver::new();
        assert_eq!(resolver.resolve(&store, "  ").await, Some(first));
        assert_eq!(store.calls().city_lookups, 0);
    }

    #[tokio::test]
    async fn test_blank_name_with_empty_store() {
        let store = MockStore::new();
        let mut resolver = CityResolver::new();
        assert_eq!(resolver.resolve(&store, "").await, None);
    }

    #[tokio::test]
    async fn test_creation_failure_yields_none() {
        let store = MockStore::new();
        *store.fail_city_insert.lock().unwrap() = true;

        let mut resolver = CityResolver::new();
        assert_eq!(resolver.resolve(&store, "Neustadt").await, None);
    }
}
