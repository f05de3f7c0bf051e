//! Tests for the bounded LRU cache

use std::sync::atomic::{AtomicUsize, Ordering};

use cadence_scheduler::infra::BoundedCache;

#[tokio::test]
async fn test_get_or_load_caches_hits() {
    let cache = BoundedCache::new(4);
    let loads = AtomicUsize::new(0);
    let loads = &loads;

    for _ in 0..3 {
        let value = cache
            .get_or_load(7_u64, || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>("alice".to_string())
            })
            .await
            .unwrap();
        assert_eq!(value, "alice");
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_load_is_not_cached() {
    let cache: BoundedCache<u64, String> = BoundedCache::new(4);
    let err = cache
        .get_or_load(1, || async { Err(anyhow::anyhow!("not found")) })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "not found");
    assert!(cache.is_empty());
}

#[test]
fn test_recently_read_entries_survive_eviction() {
    let cache = BoundedCache::new(3);
    for key in 1..=3 {
        cache.insert(key, key * 10);
    }
    assert_eq!(cache.get(&1), Some(10));

    assert_eq!(cache.insert(4, 40), Some(2));
    assert_eq!(cache.insert(5, 50), Some(3));
    assert_eq!(cache.get(&1), Some(10));
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.capacity(), 3);
}

#[test]
fn test_remove_and_clear() {
    let cache = BoundedCache::new(2);
    cache.insert("a", 1);
    cache.insert("b", 2);
    assert_eq!(cache.remove(&"a"), Some(1));
    assert_eq!(cache.remove(&"a"), None);

    cache.insert("c", 3);
    assert_eq!(cache.len(), 2);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get(&"b"), None);
}
