//! 开奖结果缓存
//!
//! - `CacheStore`：通用 (键, TTL) 存储接口，时间取自注入的 `Clock`
//! - `InMemoryTtlCache` / `NullCache`：内存实现与禁用实现
//! - `ResultsCache`：以 (产品, 期号) 为键包装 `ResultsProvider`，
//!   同一键的并发请求合并为一次拉取，失败结果不缓存

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use lotto_scan_payload::Product;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::{bounded_duration, EngineConfig};
use crate::core::clock::Clock;
use crate::core::provider::{DrawResult, ResultsProvider};
use crate::errors::ProviderError;

/// 缓存存储接口
pub trait CacheStore<K, V>: Send + Sync
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V>;
    fn put(&self, key: K, val: V);
    fn invalidate(&self, key: &K);
    fn clear(&self);
    /// 未过期条目数
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 缓存条目：值与写入时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: DateTime<Utc>,
}

/// 内存缓存实现
pub struct InMemoryTtlCache<K, V> {
    data: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> InMemoryTtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self { data: RwLock::new(HashMap::new()), ttl: bounded_duration(ttl_secs), clock }
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: DateTime<Utc>) -> bool {
        now - entry.fetched_at < self.ttl
    }

    /// 读取条目及其写入时间
    pub fn get_entry(&self, key: &K) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let data = self.data.read().ok()?;
        data.get(key).filter(|entry| self.is_fresh(entry, now)).cloned()
    }

    /// 清理过期条目
    pub fn cleanup_expired(&self) {
        let now = self.clock.now();
        if let Ok(mut data) = self.data.write() {
            data.retain(|_, entry| now - entry.fetched_at < self.ttl);
        }
    }
}

impl<K, V> CacheStore<K, V> for InMemoryTtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.get_entry(key).map(|entry| entry.value)
    }

    fn put(&self, key: K, val: V) {
        let fetched_at = self.clock.now();
        if let Ok(mut data) = self.data.write() {
            data.insert(key, CacheEntry { value: val, fetched_at });
        }
    }

    fn invalidate(&self, key: &K) {
        if let Ok(mut data) = self.data.write() {
            data.remove(key);
        }
    }

    fn clear(&self) {
        if let Ok(mut data) = self.data.write() {
            data.clear();
        }
    }

    fn len(&self) -> usize {
        let now = self.clock.now();
        match self.data.read() {
            Ok(data) => data.values().filter(|entry| self.is_fresh(entry, now)).count(),
            Err(_) => 0,
        }
    }
}

/// 空实现：禁用缓存时使用
pub struct NullCache<K, V>(PhantomData<fn() -> (K, V)>);

impl<K, V> NullCache<K, V> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, V> Default for NullCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheStore<K, V> for NullCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, _key: &K) -> Option<V> {
        None
    }
    fn put(&self, _key: K, _val: V) {}
    fn invalidate(&self, _key: &K) {}
    fn clear(&self) {}
    fn len(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    InMem,
    Disabled,
}

/// 缓存键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundKey {
    pub product: Product,
    pub round: u32,
}

impl RoundKey {
    pub fn new(product: Product, round: u32) -> Self {
        Self { product, round }
    }
}

pub type ResultStore = Arc<dyn CacheStore<RoundKey, DrawResult>>;

/// 缓存工厂
pub fn build_cache(config: &EngineConfig, clock: Arc<dyn Clock>) -> ResultStore {
    match config.cache_backend() {
        CacheBackend::Disabled => Arc::new(NullCache::<RoundKey, DrawResult>::new()),
        CacheBackend::InMem => Arc::new(InMemoryTtlCache::<RoundKey, DrawResult>::new(
            config.cache_ttl_secs,
            clock,
        )),
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<DrawResult, ProviderError>>>;
type InflightMap = Arc<Mutex<HashMap<RoundKey, SharedFetch>>>;

/// 开奖结果缓存
///
/// 同一 (产品, 期号) 同时最多只有一次进行中的拉取；不同键互不阻塞。
pub struct ResultsCache {
    store: ResultStore,
    provider: Arc<dyn ResultsProvider>,
    inflight: InflightMap,
}

impl ResultsCache {
    pub fn new(store: ResultStore, provider: Arc<dyn ResultsProvider>) -> Self {
        Self { store, provider, inflight: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn from_config(
        config: &EngineConfig,
        provider: Arc<dyn ResultsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(build_cache(config, clock), provider)
    }

    pub async fn get(&self, product: Product, round: u32) -> Result<DrawResult, ProviderError> {
        let key = RoundKey::new(product, round);
        if let Some(hit) = self.store.get(&key) {
            debug!(product = %product, round, "开奖结果缓存命中");
            return Ok(hit);
        }

        let fetch = {
            let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
            // 进行中的拉取在移出 inflight 前已写入缓存
            if let Some(hit) = self.store.get(&key) {
                return Ok(hit);
            }
            match inflight.get(&key) {
                Some(existing) => {
                    debug!(product = %product, round, "等待进行中的拉取");
                    existing.clone()
                }
                None => {
                    debug!(product = %product, round, "开奖结果缓存未命中，开始拉取");
                    let fetch = self.spawn_fetch(key);
                    inflight.insert(key, fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    fn spawn_fetch(&self, key: RoundKey) -> SharedFetch {
        let provider = Arc::clone(&self.provider);
        let store = Arc::clone(&self.store);
        let inflight = Arc::clone(&self.inflight);
        async move {
            let result = provider.fetch(key.product, key.round).await;
            match &result {
                Ok(draw) => store.put(key, draw.clone()),
                Err(e) => {
                    warn!(product = %key.product, round = key.round, error = %e, "开奖结果拉取失败")
                }
            }
            inflight.lock().unwrap_or_else(|e| e.into_inner()).remove(&key);
            result
        }
        .boxed()
        .shared()
    }

    pub fn invalidate(&self, product: Product, round: u32) {
        self.store.invalidate(&RoundKey::new(product, round));
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::TimeZone;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap()))
    }

    #[test]
    fn test_in_memory_cache_expires_after_ttl() {
        let clock = clock();
        let cache = InMemoryTtlCache::<String, u32>::new(3600, clock.clone());

        cache.put("k".to_string(), 7);
        assert_eq!(cache.get(&"k".to_string()), Some(7));
        assert_eq!(cache.len(), 1);

        clock.advance(Duration::seconds(3599));
        assert_eq!(cache.get(&"k".to_string()), Some(7));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get(&"k".to_string()), None);
        assert_eq!(cache.len(), 0);

        cache.cleanup_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_in_memory_cache_invalidate_and_clear() {
        let cache = InMemoryTtlCache::<u32, u32>::new(60, clock());
        cache.put(1, 10);
        cache.put(2, 20);
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get_entry(&2).map(|e| e.value), Some(20));
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_null_cache() {
        let cache = NullCache::<String, String>::new();
        cache.put("test_key".to_string(), "test_value".to_string());
        assert_eq!(cache.get(&"test_key".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_build_cache_respects_backend() {
        let disabled = EngineConfig { cache_enabled: false, ..EngineConfig::default() };
        let store = build_cache(&disabled, clock());
        store.put(RoundKey::new(Product::Lotto645, 1), sample());
        assert_eq!(store.len(), 0);

        let store = build_cache(&EngineConfig::default(), clock());
        store.put(RoundKey::new(Product::Lotto645, 1), sample());
        assert_eq!(store.len(), 1);
    }

    fn sample() -> DrawResult {
        use crate::core::provider::{FirstPrize, WinningNumbers};
        DrawResult {
            product: Product::Lotto645,
            round: 1,
            drawn_at: Utc.with_ymd_and_hms(2002, 12, 7, 11, 45, 0).unwrap(),
            winning: WinningNumbers::Lotto645 { numbers: [10, 23, 29, 33, 37, 40], bonus: 16 },
            first_prize: FirstPrize { amount: 0, winner_count: 0 },
            tier_prizes: Default::default(),
        }
    }
}
