//! 核心数据类型定义
//!
//! 扫码内容分类结果（`ScannedPayload`）与彩票票面（`LotteryTicket`）

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 扫码内容类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Url,
    Phone,
    Sms,
    Email,
    Wifi,
    Geo,
    Contact,
    Event,
    Text,
}

/// 分类后的扫码内容，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedPayload {
    pub raw: String,
    pub content: PayloadContent,
}

impl ScannedPayload {
    pub(crate) fn new(raw: &str, content: PayloadContent) -> Self {
        Self { raw: raw.to_string(), content }
    }

    pub fn kind(&self) -> ContentKind {
        self.content.kind()
    }
}

/// 各类别的结构化字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadContent {
    Url(UrlPayload),
    Phone(PhonePayload),
    Sms(SmsPayload),
    Email(EmailPayload),
    Wifi(WifiPayload),
    Geo(GeoPayload),
    Contact(ContactPayload),
    Event(EventPayload),
    Text(TextPayload),
}

impl PayloadContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            PayloadContent::Url(_) => ContentKind::Url,
            PayloadContent::Phone(_) => ContentKind::Phone,
            PayloadContent::Sms(_) => ContentKind::Sms,
            PayloadContent::Email(_) => ContentKind::Email,
            PayloadContent::Wifi(_) => ContentKind::Wifi,
            PayloadContent::Geo(_) => ContentKind::Geo,
            PayloadContent::Contact(_) => ContentKind::Contact,
            PayloadContent::Event(_) => ContentKind::Event,
            PayloadContent::Text(_) => ContentKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlPayload {
    /// 解析成功时为规范化后的地址，否则为原始文本
    pub url: String,
    pub scheme: Option<String>,
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonePayload {
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsPayload {
    pub number: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailPayload {
    pub address: String,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiPayload {
    /// 加密方式，缺省为 "nopass"
    pub encryption: String,
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub label: Option<String>,
    pub zoom: Option<u8>,
}

/// 名片来源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactFormat {
    VCard,
    MeCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub format: ContactFormat,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// 保持原始出现顺序
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub organization: Option<String>,
    pub title: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    pub note: Option<String>,
}

impl ContactPayload {
    pub(crate) fn empty(format: ContactFormat) -> Self {
        Self {
            format,
            full_name: None,
            first_name: None,
            last_name: None,
            phones: Vec::new(),
            emails: Vec::new(),
            organization: None,
            title: None,
            address: None,
            url: None,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    /// 缺少时间部分时取当天零点
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub organizer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
}

/// 彩票产品
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    Lotto645,
    Pension720,
}

impl Product {
    pub const ALL: [Product; 2] = [Product::Lotto645, Product::Pension720];

    pub fn display_name(&self) -> &'static str {
        match self {
            Product::Lotto645 => "Lotto 6/45",
            Product::Pension720 => "Pension 720+",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 选号方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Manual,
    Auto,
    Blank,
}

impl GameMode {
    /// 票面编码中的方式字符：m 手动、q 自动、n 空白
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'm' => Some(GameMode::Manual),
            'q' => Some(GameMode::Auto),
            'n' => Some(GameMode::Blank),
            _ => None,
        }
    }
}

/// Lotto645 单注，`numbers` 恒为 6 个互不相同且在 [1,45] 内的号码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LottoGame {
    pub label: char,
    pub numbers: [u8; 6],
    pub mode: GameMode,
}

/// Pension720 的抽奖类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PensionDraw {
    MainDraw,
    BonusDraw,
}

/// Pension720 单注，`number` 为 6 位数字串（前导零有效）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionGame {
    pub draw: PensionDraw,
    pub group: u8,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "product", rename_all = "snake_case")]
pub enum Game {
    Lotto645(LottoGame),
    Pension720(PensionGame),
}

impl Game {
    pub fn label(&self) -> String {
        match self {
            Game::Lotto645(g) => g.label.to_string(),
            Game::Pension720(g) => match g.draw {
                PensionDraw::MainDraw => "main".to_string(),
                PensionDraw::BonusDraw => "bonus".to_string(),
            },
        }
    }
}

/// 解码后的彩票
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryTicket {
    pub product: Product,
    pub round: u32,
    pub games: Vec<Game>,
}

/// 彩票解码结果；非彩票内容不是错误，调用方应回落到内容分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotteryDecode {
    Ticket(LotteryTicket),
    NotALotteryPayload,
}

impl LotteryDecode {
    pub fn into_ticket(self) -> Option<LotteryTicket> {
        match self {
            LotteryDecode::Ticket(t) => Some(t),
            LotteryDecode::NotALotteryPayload => None,
        }
    }

    pub fn is_ticket(&self) -> bool {
        matches!(self, LotteryDecode::Ticket(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_mode_codes() {
        assert_eq!(GameMode::from_code('m'), Some(GameMode::Manual));
        assert_eq!(GameMode::from_code('q'), Some(GameMode::Auto));
        assert_eq!(GameMode::from_code('n'), Some(GameMode::Blank));
        assert_eq!(GameMode::from_code('2'), None);
    }

    #[test]
    fn test_payload_kind_tag() {
        let content = PayloadContent::Phone(PhonePayload { number: "1".into() });
        let p = ScannedPayload::new("tel:1", content);
        assert_eq!(p.kind(), ContentKind::Phone);
    }
}
