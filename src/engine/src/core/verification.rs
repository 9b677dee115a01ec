//! 兑奖核验
//!
//! 流程：开奖时间判断 -> 缓存/拉取开奖结果 -> 逐注定级 -> 汇总。
//! 开奖前、结果暂不可用、产品不支持都是正常结果，不作为错误返回。

use chrono::{DateTime, Utc};
use lotto_scan_payload::{Game, LotteryTicket, LottoGame, PensionDraw, PensionGame, Product};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::core::cache::ResultsCache;
use crate::core::clock::Clock;
use crate::core::prize::{self, PrizeAmount, PrizeTier};
use crate::core::provider::{DrawResult, ResultsProvider, WinningNumbers};
use crate::core::schedule::{DrawScheduleOracle, DrawState};

/// 网络失败与尚未公布无法区分，统一使用同一提示
pub const RESULTS_UNAVAILABLE_REASON: &str =
    "draw results are not available right now, try again later";

/// 单注命中详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum MatchDetail {
    Lotto645 {
        /// 命中的号码，按票面顺序
        matched_numbers: Vec<u8>,
        matched_count: usize,
        has_bonus: bool,
    },
    Pension720 {
        draw: PensionDraw,
        matched_digits: usize,
        group_matched: bool,
    },
}

/// 单注核验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub label: String,
    pub tier: PrizeTier,
    pub detail: MatchDetail,
    pub prize_amount: u64,
    pub description: Option<String>,
}

/// 整张彩票的核验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketResult {
    pub product: Product,
    pub round: u32,
    pub drawn_at: DateTime<Utc>,
    pub games: Vec<GameOutcome>,
    /// 最好名次（附加奖按 2 等计）；未中奖为 `None`
    pub best_tier: Option<u8>,
    pub total_prize: u64,
    pub has_win: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// 尚未开奖
    BeforeDraw {
        product: Product,
        round: u32,
        next_draw_at: DateTime<Utc>,
        /// 该期的开奖时刻（可推算时）
        round_draw_at: Option<DateTime<Utc>>,
    },
    /// 开奖结果暂不可用，可稍后重试
    Unavailable { product: Product, round: u32, reason: String },
    /// 无法核验该产品/期号
    Unsupported { product: Product, round: u32, reason: String },
    Resolved(TicketResult),
}

impl VerificationOutcome {
    fn unavailable(product: Product, round: u32) -> Self {
        VerificationOutcome::Unavailable {
            product,
            round,
            reason: RESULTS_UNAVAILABLE_REASON.to_string(),
        }
    }

    pub fn resolved(&self) -> Option<&TicketResult> {
        match self {
            VerificationOutcome::Resolved(result) => Some(result),
            _ => None,
        }
    }
}

/// 兑奖核验引擎
pub struct VerificationEngine {
    schedule: DrawScheduleOracle,
    cache: Arc<ResultsCache>,
    clock: Arc<dyn Clock>,
}

impl VerificationEngine {
    pub fn new(
        schedule: DrawScheduleOracle,
        cache: Arc<ResultsCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { schedule, cache, clock }
    }

    pub fn from_config(
        config: &EngineConfig,
        provider: Arc<dyn ResultsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(ResultsCache::from_config(config, provider, Arc::clone(&clock)));
        Self::new(DrawScheduleOracle::from_config(config), cache, clock)
    }

    pub fn schedule(&self) -> &DrawScheduleOracle {
        &self.schedule
    }

    pub fn cache(&self) -> &ResultsCache {
        &self.cache
    }

    pub async fn verify(&self, ticket: &LotteryTicket) -> VerificationOutcome {
        let (product, round) = (ticket.product, ticket.round);
        let now = self.clock.now();

        if round == 0 {
            return VerificationOutcome::Unsupported {
                product,
                round,
                reason: "round 0 is not a valid draw".to_string(),
            };
        }

        match self.schedule.is_draw_completed(product, round, now) {
            DrawState::Completed => {}
            DrawState::Pending => {
                let next_draw_at = self.schedule.next_draw_timestamp(product, now);
                info!(product = %product, round, next_draw_at = %next_draw_at, "尚未开奖");
                return VerificationOutcome::BeforeDraw {
                    product,
                    round,
                    next_draw_at,
                    round_draw_at: self.schedule.draw_instant(product, round),
                };
            }
            DrawState::Unsupported => {
                info!(product = %product, round, "无法推算开奖期号");
                return VerificationOutcome::Unsupported {
                    product,
                    round,
                    reason: format!("{} draw rounds cannot be determined", product.display_name()),
                };
            }
        }

        let result = match self.cache.get(product, round).await {
            Ok(result) => result,
            Err(e) => {
                warn!(product = %product, round, error = %e, "开奖结果不可用");
                return VerificationOutcome::unavailable(product, round);
            }
        };

        if result.product != product
            || result.round != round
            || result.winning.product() != product
        {
            warn!(
                product = %product,
                round,
                got_product = %result.product,
                got_round = result.round,
                "开奖结果与彩票不符"
            );
            return VerificationOutcome::unavailable(product, round);
        }

        let resolved = Self::evaluate(ticket, &result);
        info!(
            product = %product,
            round,
            best_tier = ?resolved.best_tier,
            total_prize = resolved.total_prize,
            "兑奖核验完成"
        );
        VerificationOutcome::Resolved(resolved)
    }

    /// 按开奖结果逐注定级并汇总；纯函数
    pub fn evaluate(ticket: &LotteryTicket, result: &DrawResult) -> TicketResult {
        let games: Vec<GameOutcome> =
            ticket.games.iter().map(|game| evaluate_game(game, result)).collect();

        let best_tier = games.iter().filter_map(|g| g.tier.rank()).min();
        let total_prize = games.iter().fold(0u64, |acc, g| acc.saturating_add(g.prize_amount));

        TicketResult {
            product: ticket.product,
            round: ticket.round,
            drawn_at: result.drawn_at,
            games,
            best_tier,
            total_prize,
            has_win: total_prize > 0,
        }
    }
}

fn evaluate_game(game: &Game, result: &DrawResult) -> GameOutcome {
    let label = game.label();
    match (game, &result.winning) {
        (Game::Lotto645(g), WinningNumbers::Lotto645 { numbers, bonus }) => {
            evaluate_lotto(label, g, numbers, *bonus, result)
        }
        (Game::Pension720(g), WinningNumbers::Pension720 { group, number, bonus_number }) => {
            evaluate_pension(label, g, *group, number, bonus_number, result)
        }
        (Game::Lotto645(_), _) => no_match(
            label,
            MatchDetail::Lotto645 {
                matched_numbers: Vec::new(),
                matched_count: 0,
                has_bonus: false,
            },
        ),
        (Game::Pension720(g), _) => no_match(
            label,
            MatchDetail::Pension720 { draw: g.draw, matched_digits: 0, group_matched: false },
        ),
    }
}

fn evaluate_lotto(
    label: String,
    game: &LottoGame,
    winning: &[u8; 6],
    bonus: u8,
    result: &DrawResult,
) -> GameOutcome {
    let matched_numbers: Vec<u8> =
        game.numbers.iter().copied().filter(|n| winning.contains(n)).collect();
    let matched_count = matched_numbers.len();
    let has_bonus = game.numbers.contains(&bonus);
    let tier = prize::lotto645_tier(matched_count, has_bonus);
    let (prize_amount, description) = prize_for(Product::Lotto645, tier, result);

    GameOutcome {
        label,
        tier,
        detail: MatchDetail::Lotto645 { matched_numbers, matched_count, has_bonus },
        prize_amount,
        description,
    }
}

fn evaluate_pension(
    label: String,
    game: &PensionGame,
    group: u8,
    number: &str,
    bonus_number: &str,
    result: &DrawResult,
) -> GameOutcome {
    let (tier, matched_digits) = match game.draw {
        PensionDraw::MainDraw => {
            prize::pension720_main_tier(game.group, &game.number, group, number)
        }
        PensionDraw::BonusDraw => prize::pension720_bonus_tier(&game.number, bonus_number),
    };
    let group_matched = game.draw == PensionDraw::MainDraw && game.group == group;
    let (prize_amount, description) = prize_for(Product::Pension720, tier, result);

    GameOutcome {
        label,
        tier,
        detail: MatchDetail::Pension720 { draw: game.draw, matched_digits, group_matched },
        prize_amount,
        description,
    }
}

fn no_match(label: String, detail: MatchDetail) -> GameOutcome {
    GameOutcome { label, tier: PrizeTier::NoWin, detail, prize_amount: 0, description: None }
}

/// 奖级对应的单注奖金与说明；随期变化的奖级取开奖结果中的金额
fn prize_for(product: Product, tier: PrizeTier, result: &DrawResult) -> (u64, Option<String>) {
    let Some(rule) = prize::rule_for(product, tier) else {
        return (0, None);
    };
    let amount = match rule.amount {
        PrizeAmount::Fixed(amount) => amount,
        PrizeAmount::ProviderSupplied => {
            tier.rank().and_then(|r| result.provider_prize(r)).unwrap_or(0)
        }
    };
    (amount, Some(rule.description.to_string()))
}
