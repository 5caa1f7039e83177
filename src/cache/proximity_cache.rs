//! A geospatially keyed result cache: a query is answered from any live entry
//! computed for a point within the configured radius.

use crate::cache::error::CacheError;
use crate::cache::store::CacheStore;
use crate::types::estimation::EstimationResult;
use crate::utils::haversine_km;
use crate::LatLon;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub const CACHE_KEY_PREFIX: &str = "rural_aqi:";
pub const DEFAULT_CACHE_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(1800);

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

// Shortest length of one degree of latitude, in km.
const KM_PER_DEGREE: f64 = 110.5;

/// The stored value: a result plus the time it was created and how long it lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub created_at: DateTime<Utc>,
    pub ttl_ms: u64,
    pub result: EstimationResult,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age_ms = (now - self.created_at).num_milliseconds();
        age_ms < 0 || age_ms as u64 >= self.ttl_ms
    }
}

/// The key a result for `point` is stored under.
pub fn cache_key(point: LatLon) -> String {
    format!("{}{:.6},{:.6}", CACHE_KEY_PREFIX, point.0, point.1)
}

/// The point encoded in a key produced by [`cache_key`].
pub fn parse_cache_key(key: &str) -> Option<LatLon> {
    let (lat, lon) = key.strip_prefix(CACHE_KEY_PREFIX)?.split_once(',')?;
    Some(LatLon(lat.parse().ok()?, lon.parse().ok()?))
}

#[derive(Debug, Clone, PartialEq)]
struct CachedPoint {
    key: String,
    point: LatLon,
}

impl RTreeObject for CachedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.0, self.point.1])
    }
}

impl PointDistance for CachedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_lat = self.point.0 - point[0];
        let d_lon = self.point.1 - point[1];
        d_lat * d_lat + d_lon * d_lon
    }
}

pub struct ProximityCache {
    store: Arc<dyn CacheStore>,
    index: RwLock<RTree<CachedPoint>>,
    radius_km: f64,
    ttl: Duration,
}

impl ProximityCache {
    pub fn new(store: Arc<dyn CacheStore>, radius_km: f64, ttl: Duration) -> Self {
        Self {
            store,
            index: RwLock::new(RTree::new()),
            radius_km,
            ttl,
        }
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Rebuilds the spatial index from the live keys in the store, including
    /// entries written by other clients sharing it. Returns the number of
    /// indexed entries.
    pub async fn warm_index(&self) -> Result<usize, CacheError> {
        let points: Vec<CachedPoint> = self
            .store
            .keys(CACHE_KEY_PREFIX)
            .await?
            .into_iter()
            .filter_map(|key| parse_cache_key(&key).map(|point| CachedPoint { key, point }))
            .collect();
        let count = points.len();
        *self.index.write().await = RTree::bulk_load(points);
        debug!("Proximity cache index holds {} live entries", count);
        Ok(count)
    }

    /// Indexed points within the radius of `point`, nearest first.
    async fn candidates(&self, point: LatLon) -> Vec<(CachedPoint, f64)> {
        let d_lat = self.radius_km / KM_PER_DEGREE;
        let widest_lat = (point.0.abs() + d_lat).min(89.99).to_radians();
        let d_lon = (self.radius_km / (KM_PER_DEGREE * widest_lat.cos())).min(180.0);
        let envelope = AABB::from_corners(
            [point.0 - d_lat, point.1 - d_lon],
            [point.0 + d_lat, point.1 + d_lon],
        );

        let index = self.index.read().await;
        let mut found: Vec<(CachedPoint, f64)> = index
            .locate_in_envelope(&envelope)
            .map(|cached| (cached.clone(), haversine_km(cached.point, point)))
            .filter(|(_, distance_km)| *distance_km <= self.radius_km)
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }

    async fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };
        let (entry, _) = bincode::serde::decode_from_slice::<CacheEntry, _>(&bytes, BINCODE_CONFIG)
            .map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })?;
        if entry.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// The cached result for the nearest live entry within the radius, if any.
    ///
    /// The index is rebuilt from the store's live keys first, so entries
    /// written by other clients are found and expired ones are gone.
    pub async fn lookup(&self, point: LatLon) -> Result<Option<EstimationResult>, CacheError> {
        self.warm_index().await?;
        for (cached, distance_km) in self.candidates(point).await {
            match self.read_entry(&cached.key).await {
                Ok(Some(entry)) => {
                    info!(
                        "Cache hit for {:?}: entry '{}' is {:.2} km away",
                        point, cached.key, distance_km
                    );
                    return Ok(Some(entry.result));
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring unreadable cache entry: {}", e),
            }
        }
        Ok(None)
    }

    /// Stores `result` under the literal coordinates of `point`.
    pub async fn store(&self, point: LatLon, result: &EstimationResult) -> Result<(), CacheError> {
        let entry = CacheEntry {
            created_at: Utc::now(),
            ttl_ms: self.ttl.as_millis() as u64,
            result: result.clone(),
        };
        let bytes = bincode::serde::encode_to_vec(&entry, BINCODE_CONFIG).map_err(CacheError::Encode)?;
        let key = cache_key(point);
        self.store.set_ex(&key, bytes, self.ttl).await
    }

    /// Returns a cached result near `point`, or runs `compute` and caches what it returns.
    ///
    /// Concurrent misses for nearby points may both compute; the last write wins.
    pub async fn get_or_compute<F, Fut, E>(&self, point: LatLon, compute: F) -> Result<EstimationResult, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<EstimationResult, E>>,
        E: From<CacheError>,
    {
        if let Some(result) = self.lookup(point).await? {
            return Ok(result);
        }
        info!("Cache miss for {:?}", point);
        let result = compute().await?;
        if let Err(e) = self.store(point, &result).await {
            warn!("Could not cache result for {:?}: {}", point, e);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::types::pollutant::Pollutant;
    use std::collections::BTreeMap;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reads find nothing and every write fails.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Ok(None)
        }

        async fn set_ex(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".to_string()))
        }

        async fn keys(&self, _prefix: &str) -> Result<Vec<String>, CacheError> {
            Ok(vec![])
        }
    }

    fn result_for(point: LatLon, overall_index: u16) -> EstimationResult {
        EstimationResult {
            location: point,
            concentrations: BTreeMap::from([(Pollutant::Pm25, 44.0)]),
            sub_indices: BTreeMap::from([(Pollutant::Pm25, overall_index)]),
            overall_index,
            dominant_pollutant: Pollutant::Pm25,
            weather: None,
            computed_at: Utc::now(),
        }
    }

    async fn counted(
        cache: &ProximityCache,
        point: LatLon,
        calls: &AtomicUsize,
    ) -> Result<EstimationResult, CacheError> {
        cache
            .get_or_compute(point, move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(result_for(point, 70 + n as u16))
            })
            .await
    }

    #[test]
    fn keys_round_trip() {
        let key = cache_key(LatLon(22.3, -73.25));
        assert_eq!(key, "rural_aqi:22.300000,-73.250000");
        assert_eq!(parse_cache_key(&key), Some(LatLon(22.3, -73.25)));
        assert_eq!(parse_cache_key("other:1,2"), None);
    }

    #[tokio::test]
    async fn nearby_query_reuses_result() -> Result<(), CacheError> {
        let cache = ProximityCache::new(Arc::new(MemoryStore::new()), 10.0, DEFAULT_CACHE_TTL);
        let calls = AtomicUsize::new(0);

        let a = counted(&cache, LatLon(22.30, 73.20), &calls).await?;
        // About 3 km away.
        let b = counted(&cache, LatLon(22.32, 73.22), &calls).await?;
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // About 50 km away.
        let c = counted(&cache, LatLon(22.75, 73.20), &calls).await?;
        assert_ne!(a, c);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn nearest_entry_wins() -> Result<(), CacheError> {
        let cache = ProximityCache::new(Arc::new(MemoryStore::new()), 10.0, DEFAULT_CACHE_TTL);
        cache.store(LatLon(22.30, 73.20), &result_for(LatLon(22.30, 73.20), 60)).await?;
        cache.store(LatLon(22.36, 73.20), &result_for(LatLon(22.36, 73.20), 90)).await?;

        let hit = cache.lookup(LatLon(22.35, 73.20)).await?.unwrap();
        assert_eq!(hit.overall_index, 90);
        Ok(())
    }

    #[tokio::test]
    async fn expired_entries_are_recomputed() -> Result<(), CacheError> {
        let cache = ProximityCache::new(Arc::new(MemoryStore::new()), 10.0, Duration::from_millis(50));
        let calls = AtomicUsize::new(0);

        counted(&cache, LatLon(22.30, 73.20), &calls).await?;
        counted(&cache, LatLon(22.30, 73.20), &calls).await?;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let fresh = counted(&cache, LatLon(22.31, 73.20), &calls).await?;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fresh.overall_index, 71);
        Ok(())
    }

    #[tokio::test]
    async fn entries_from_a_shared_store_are_visible() -> Result<(), CacheError> {
        let store = Arc::new(MemoryStore::new());
        let first = ProximityCache::new(store.clone(), 10.0, DEFAULT_CACHE_TTL);
        let second = ProximityCache::new(store, 10.0, DEFAULT_CACHE_TTL);
        first.store(LatLon(22.30, 73.20), &result_for(LatLon(22.30, 73.20), 66)).await?;

        let hit = second.lookup(LatLon(22.31, 73.20)).await?.unwrap();
        assert_eq!(hit.overall_index, 66);

        let calls = AtomicUsize::new(0);
        let shared = counted(&second, LatLon(22.31, 73.21), &calls).await?;
        assert_eq!(shared.overall_index, 66);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn index_drops_expired_keys() -> Result<(), CacheError> {
        let cache = ProximityCache::new(Arc::new(MemoryStore::new()), 10.0, Duration::from_millis(30));
        cache.store(LatLon(22.30, 73.20), &result_for(LatLon(22.30, 73.20), 60)).await?;
        cache.store(LatLon(25.00, 75.00), &result_for(LatLon(25.00, 75.00), 61)).await?;
        assert_eq!(cache.warm_index().await?, 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.warm_index().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn failed_store_still_returns_the_result() {
        let cache = ProximityCache::new(Arc::new(BrokenStore), 10.0, DEFAULT_CACHE_TTL);
        let result = cache
            .get_or_compute(LatLon(22.3, 73.2), || async {
                Ok::<_, CacheError>(result_for(LatLon(22.3, 73.2), 77))
            })
            .await;
        assert!(matches!(result, Ok(ref r) if r.overall_index == 77));
    }

    #[tokio::test]
    async fn compute_errors_are_not_cached() {
        let cache = ProximityCache::new(Arc::new(MemoryStore::new()), 10.0, DEFAULT_CACHE_TTL);
        let failed = cache
            .get_or_compute(LatLon(22.3, 73.2), || async {
                Err::<EstimationResult, _>(CacheError::Backend("upstream down".to_string()))
            })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.lookup(LatLon(22.3, 73.2)).await.unwrap(), None);
    }
}
