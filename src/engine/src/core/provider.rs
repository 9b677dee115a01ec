//! 开奖结果提供方接口
//!
//! 实际的 HTTP 传输在本库之外实现；这里只定义接口与数据结构，
//! 另附一个内存实现供测试和离线场景使用。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lotto_scan_payload::Product;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::errors::ProviderError;

/// 中奖号码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum WinningNumbers {
    Lotto645 {
        numbers: [u8; 6],
        bonus: u8,
    },
    Pension720 {
        group: u8,
        number: String,
        /// 附加奖号码，单独公布
        bonus_number: String,
    },
}

impl WinningNumbers {
    pub fn product(&self) -> Product {
        match self {
            WinningNumbers::Lotto645 { .. } => Product::Lotto645,
            WinningNumbers::Pension720 { .. } => Product::Pension720,
        }
    }
}

/// 一等奖信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstPrize {
    /// 单注奖金
    pub amount: u64,
    pub winner_count: u32,
}

/// 一期开奖结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawResult {
    pub product: Product,
    pub round: u32,
    pub drawn_at: DateTime<Utc>,
    pub winning: WinningNumbers,
    pub first_prize: FirstPrize,
    /// 各等级单注奖金（随期变化的等级由提供方给出，键为等级）
    pub tier_prizes: BTreeMap<u8, u64>,
}

impl DrawResult {
    /// 提供方给出的某等级单注奖金；一等奖缺省时取 `first_prize`
    pub fn provider_prize(&self, tier: u8) -> Option<u64> {
        match self.tier_prizes.get(&tier) {
            Some(amount) => Some(*amount),
            None if tier == 1 => Some(self.first_prize.amount),
            None => None,
        }
    }
}

#[async_trait]
pub trait ResultsProvider: Send + Sync {
    async fn fetch(&self, product: Product, round: u32) -> Result<DrawResult, ProviderError>;
}

/// 内存结果提供方：按 (产品, 期号) 返回预置结果，并统计调用次数
#[derive(Debug, Default)]
pub struct InMemoryResultsProvider {
    results: RwLock<HashMap<(Product, u32), DrawResult>>,
    calls: AtomicUsize,
}

impl InMemoryResultsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: impl IntoIterator<Item = DrawResult>) -> Self {
        let provider = Self::new();
        for result in results {
            provider.publish(result);
        }
        provider
    }

    pub fn publish(&self, result: DrawResult) {
        if let Ok(mut results) = self.results.write() {
            results.insert((result.product, result.round), result);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn into_shared(self) -> Arc<dyn ResultsProvider> {
        Arc::new(self)
    }
}

#[async_trait]
impl ResultsProvider for InMemoryResultsProvider {
    async fn fetch(&self, product: Product, round: u32) -> Result<DrawResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let results = self.results.read().map_err(|_| ProviderError::Unavailable)?;
        results.get(&(product, round)).cloned().ok_or(ProviderError::NotPublished)
    }
}
