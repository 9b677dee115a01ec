//! 奖级规则表
//!
//! Lotto645 按命中个数与特别号定级，1-3 等奖金由提供方逐期给出；
//! Pension720 按组号+号码完全一致或号码末尾连续相同位数定级，奖金固定。

use lotto_scan_payload::Product;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 奖级；`Bonus` 为 Pension720 附加奖，汇总时按 2 等计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rank", rename_all = "snake_case")]
pub enum PrizeTier {
    NoWin,
    Rank(u8),
    Bonus,
}

impl PrizeTier {
    /// 用于比较与汇总的名次；未中奖为 `None`
    pub fn rank(self) -> Option<u8> {
        match self {
            PrizeTier::NoWin => None,
            PrizeTier::Rank(r) => Some(r),
            PrizeTier::Bonus => Some(2),
        }
    }

    pub fn is_win(self) -> bool {
        self.rank().is_some()
    }
}

impl fmt::Display for PrizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrizeTier::NoWin => write!(f, "no win"),
            PrizeTier::Rank(r) => write!(f, "tier {}", r),
            PrizeTier::Bonus => write!(f, "bonus"),
        }
    }
}

/// 奖金来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "amount", rename_all = "snake_case")]
pub enum PrizeAmount {
    Fixed(u64),
    /// 随期变化，取开奖结果中的金额
    ProviderSupplied,
}

/// 单个奖级的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrizeRule {
    pub tier: PrizeTier,
    pub amount: PrizeAmount,
    pub description: &'static str,
}

pub const LOTTO645_FOURTH_PRIZE: u64 = 50_000;
pub const LOTTO645_FIFTH_PRIZE: u64 = 5_000;

pub const LOTTO645_RULES: [PrizeRule; 5] = [
    PrizeRule {
        tier: PrizeTier::Rank(1),
        amount: PrizeAmount::ProviderSupplied,
        description: "6 numbers matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(2),
        amount: PrizeAmount::ProviderSupplied,
        description: "5 numbers and the bonus number matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(3),
        amount: PrizeAmount::ProviderSupplied,
        description: "5 numbers matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(4),
        amount: PrizeAmount::Fixed(LOTTO645_FOURTH_PRIZE),
        description: "4 numbers matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(5),
        amount: PrizeAmount::Fixed(LOTTO645_FIFTH_PRIZE),
        description: "3 numbers matched",
    },
];

/// 号码末尾连续相同位数 -> 名次，按位数从多到少排列
///
/// 位数与名次的对应关系集中在这一张表里。
pub const PENSION_SUFFIX_TIERS: [(usize, u8); 6] =
    [(6, 2), (5, 3), (4, 4), (3, 5), (2, 6), (1, 7)];

pub const PENSION720_NUMBER_LEN: usize = 6;

/// 年金类奖级以总额计：月额 × 月数
const PENSION720_FIRST_TOTAL: u64 = 7_000_000 * 12 * 20;
const PENSION720_SECOND_TOTAL: u64 = 1_000_000 * 12 * 10;

pub const PENSION720_RULES: [PrizeRule; 8] = [
    PrizeRule {
        tier: PrizeTier::Rank(1),
        amount: PrizeAmount::Fixed(PENSION720_FIRST_TOTAL),
        description: "7,000,000 KRW monthly for 20 years",
    },
    PrizeRule {
        tier: PrizeTier::Rank(2),
        amount: PrizeAmount::Fixed(PENSION720_SECOND_TOTAL),
        description: "1,000,000 KRW monthly for 10 years",
    },
    PrizeRule {
        tier: PrizeTier::Rank(3),
        amount: PrizeAmount::Fixed(1_000_000),
        description: "last 5 digits matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(4),
        amount: PrizeAmount::Fixed(100_000),
        description: "last 4 digits matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(5),
        amount: PrizeAmount::Fixed(50_000),
        description: "last 3 digits matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(6),
        amount: PrizeAmount::Fixed(5_000),
        description: "last 2 digits matched",
    },
    PrizeRule {
        tier: PrizeTier::Rank(7),
        amount: PrizeAmount::Fixed(1_000),
        description: "last digit matched",
    },
    PrizeRule {
        tier: PrizeTier::Bonus,
        amount: PrizeAmount::Fixed(PENSION720_SECOND_TOTAL),
        description: "bonus draw: 1,000,000 KRW monthly for 10 years",
    },
];

/// 查找某产品某奖级的规则
pub fn rule_for(product: Product, tier: PrizeTier) -> Option<&'static PrizeRule> {
    let rules: &'static [PrizeRule] = match product {
        Product::Lotto645 => &LOTTO645_RULES,
        Product::Pension720 => &PENSION720_RULES,
    };
    rules.iter().find(|rule| rule.tier == tier)
}

/// Lotto645 定级：6 中 -> 1；5 中 + 特别号 -> 2；5 中 -> 3；4 中 -> 4；3 中 -> 5
pub fn lotto645_tier(match_count: usize, has_bonus: bool) -> PrizeTier {
    match (match_count, has_bonus) {
        (6, _) => PrizeTier::Rank(1),
        (5, true) => PrizeTier::Rank(2),
        (5, false) => PrizeTier::Rank(3),
        (4, _) => PrizeTier::Rank(4),
        (3, _) => PrizeTier::Rank(5),
        _ => PrizeTier::NoWin,
    }
}

/// 两个号码串末尾连续相同的位数（最多 6 位）
pub fn trailing_match_len(a: &str, b: &str) -> usize {
    a.bytes()
        .rev()
        .zip(b.bytes().rev())
        .take(PENSION720_NUMBER_LEN)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Pension720 主奖定级，返回（奖级, 计入的末尾位数）
///
/// 组号与号码完全一致为 1 等；否则按最长末尾匹配查表，较短的匹配不另计。
pub fn pension720_main_tier(
    ticket_group: u8,
    ticket_number: &str,
    winning_group: u8,
    winning_number: &str,
) -> (PrizeTier, usize) {
    if ticket_group == winning_group && ticket_number == winning_number {
        return (PrizeTier::Rank(1), PENSION720_NUMBER_LEN);
    }
    let matched = trailing_match_len(ticket_number, winning_number);
    PENSION_SUFFIX_TIERS
        .iter()
        .find(|(digits, _)| matched >= *digits)
        .map(|(digits, rank)| (PrizeTier::Rank(*rank), *digits))
        .unwrap_or((PrizeTier::NoWin, 0))
}

/// Pension720 附加奖：末尾 6 位与附加奖号码完全一致
pub fn pension720_bonus_tier(ticket_number: &str, bonus_number: &str) -> (PrizeTier, usize) {
    let matched = trailing_match_len(ticket_number, bonus_number);
    if matched == PENSION720_NUMBER_LEN {
        (PrizeTier::Bonus, matched)
    } else {
        (PrizeTier::NoWin, matched)
    }
}
