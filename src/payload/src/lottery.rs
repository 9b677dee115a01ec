//! 彩票二维码解码
//!
//! 二维码内容形如 `http://m.dhlottery.co.kr/?v=<编码>`，`v` 为定位编码：
//!
//! - Pension720：`pd` + 2 位保留位 + 4 位期号 + 1 位组号 + `s` + 6 位号码
//! - Lotto645：4 位期号 + 最多 5 个 13 字符的号码块（1 位方式字符 + 12 位数字）
//!
//! 解码是纯函数：不做 I/O、不读时钟。无法识别时返回 `NotALotteryPayload`，
//! 调用方应回落到内容分类器。

use tracing::debug;

use crate::types::{
    Game, GameMode, LotteryDecode, LotteryTicket, LottoGame, PensionDraw, PensionGame, Product,
};

/// 官方彩票二维码的域名标记
pub const LOTTERY_DOMAIN_MARKER: &str = "dhlottery.co.kr";

const LOTTO_BLOCK_LEN: usize = 13;
const LOTTO_MAX_GAMES: usize = 5;
const LOTTO_LABELS: [char; LOTTO_MAX_GAMES] = ['A', 'B', 'C', 'D', 'E'];
const LOTTO_MIN_NUMBER: u8 = 1;
const LOTTO_MAX_NUMBER: u8 = 45;

/// 解码彩票二维码地址
pub fn decode(url: &str) -> LotteryDecode {
    let input = url.trim();
    if !input.to_ascii_lowercase().contains(LOTTERY_DOMAIN_MARKER) {
        return LotteryDecode::NotALotteryPayload;
    }
    let Some(v) = extract_v_param(input) else {
        return LotteryDecode::NotALotteryPayload;
    };

    let ticket = if v.starts_with("pd") {
        decode_pension(v)
    } else {
        decode_lotto(v)
    };

    match ticket {
        Some(t) => LotteryDecode::Ticket(t),
        None => {
            debug!(v, "彩票编码无法解析，按普通内容处理");
            LotteryDecode::NotALotteryPayload
        }
    }
}

/// 取 `?v=`（或 `&v=`）之后、下一个 `&`/`#` 之前的值
fn extract_v_param(input: &str) -> Option<&str> {
    let start = ["?v=", "&v="]
        .iter()
        .filter_map(|marker| input.find(marker).map(|i| i + marker.len()))
        .min()?;
    let rest = &input[start..];
    let end = rest.find(['&', '#']).unwrap_or(rest.len());
    let v = rest[..end].trim();
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// `pd` + `\d{2}` + `\d{4}`(期号) + `\d`(组号) + `s` + `\d{6}`(号码)
fn decode_pension(v: &str) -> Option<LotteryTicket> {
    let body = v.strip_prefix("pd")?;
    let reserved = body.get(0..2)?;
    let round_str = body.get(2..6)?;
    let group_str = body.get(6..7)?;
    let marker = body.get(7..8)?;
    let number = body.get(8..14)?;
    if !all_digits(reserved)
        || !all_digits(round_str)
        || !all_digits(group_str)
        || marker != "s"
        || !all_digits(number)
    {
        return None;
    }
    // 号码必须恰好 6 位
    if body[14..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let round: u32 = round_str.parse().ok()?;
    if round == 0 {
        return None;
    }
    let group: u8 = group_str.parse().ok()?;

    // 同一组号码同时参与主奖与附加奖，具体区分在核验阶段完成
    let games = [PensionDraw::MainDraw, PensionDraw::BonusDraw]
        .into_iter()
        .map(|draw| Game::Pension720(PensionGame { draw, group, number: number.to_string() }))
        .collect();

    Some(LotteryTicket { product: Product::Pension720, round, games })
}

/// `^\d{4}[mqn]` 后接号码块
fn decode_lotto(v: &str) -> Option<LotteryTicket> {
    let round_str = v.get(0..4)?;
    if !all_digits(round_str) {
        return None;
    }
    let first_mode = v[4..].chars().next()?;
    if !matches!(first_mode, 'm' | 'q' | 'n') {
        return None;
    }
    let round: u32 = round_str.parse().ok()?;
    if round == 0 {
        return None;
    }

    let blocks = &v[4..];
    let mut games = Vec::new();
    for (idx, label) in LOTTO_LABELS.iter().enumerate() {
        let start = idx * LOTTO_BLOCK_LEN;
        let Some(block) = blocks.get(start..start + LOTTO_BLOCK_LEN) else {
            if blocks.len() > start {
                debug!(label = %label, "号码块不完整，跳过");
            }
            break;
        };
        let mut chars = block.chars();
        let Some(mode) = chars.next().and_then(GameMode::from_code) else {
            // 方式字符之外的内容是票面尾部序列号，不是号码块
            break;
        };
        if let Some(game) = decode_lotto_block(*label, mode, chars.as_str()) {
            games.push(Game::Lotto645(game));
        }
    }

    if games.is_empty() {
        return None;
    }
    Some(LotteryTicket { product: Product::Lotto645, round, games })
}

/// 12 位数字拆为 6 个两位数；保留恰好 6 个互不相同且在 [1,45] 内的号码
fn decode_lotto_block(label: char, mode: GameMode, digits: &str) -> Option<LottoGame> {
    if mode == GameMode::Blank {
        return None;
    }
    if digits.bytes().all(|b| b == b'0') {
        debug!(label = %label, "全零号码块，跳过");
        return None;
    }

    let mut numbers: Vec<u8> = Vec::with_capacity(6);
    for pair in digits.as_bytes().chunks(2) {
        let Ok(text) = std::str::from_utf8(pair) else {
            continue;
        };
        if !all_digits(text) {
            continue;
        }
        let Ok(n) = text.parse::<u8>() else {
            continue;
        };
        if (LOTTO_MIN_NUMBER..=LOTTO_MAX_NUMBER).contains(&n) && !numbers.contains(&n) {
            numbers.push(n);
        }
    }

    let numbers: [u8; 6] = match numbers.try_into() {
        Ok(arr) => arr,
        Err(partial) => {
            debug!(label = %label, valid = partial.len(), "号码块有效号码不足 6 个，丢弃");
            return None;
        }
    };
    Some(LottoGame { label, numbers, mode })
}
