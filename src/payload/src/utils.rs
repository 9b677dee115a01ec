//! 工具函数模块
//!
//! 前缀匹配、分号字段拆分、转义处理、内容行解析与日期解析

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use percent_encoding::percent_decode_str;

/// 字符串工具
pub struct TextUtils;

impl TextUtils {
    /// 忽略 ASCII 大小写的前缀剥离
    pub fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
        let n = prefix.len();
        if s.len() < n || !s.is_char_boundary(n) {
            return None;
        }
        if s[..n].eq_ignore_ascii_case(prefix) {
            Some(&s[n..])
        } else {
            None
        }
    }

    /// 忽略 ASCII 大小写的子串判断
    pub fn contains_ci(haystack: &str, needle: &str) -> bool {
        haystack.to_ascii_uppercase().contains(&needle.to_ascii_uppercase())
    }

    /// 拆分 `K:V;K:V;;` 形式的字段（WIFI / MECARD / MATMSG）
    ///
    /// 反斜杠转义下一个字符；空字段（即 `;;`）表示负载结束。
    /// 键统一转为大写，值保持原样（已去转义）。
    pub fn split_fields(body: &str) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut key: Option<String> = None;
        let mut chars = body.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                ':' if key.is_none() => {
                    key = Some(std::mem::take(&mut current).trim().to_ascii_uppercase());
                }
                ';' => {
                    match key.take() {
                        Some(k) => fields.push((k, std::mem::take(&mut current))),
                        None if current.trim().is_empty() => break,
                        // 没有键的片段直接丢弃
                        None => current.clear(),
                    }
                }
                _ => current.push(c),
            }
        }
        if let Some(k) = key {
            fields.push((k, current));
        }
        fields
    }

    /// 取第一个匹配键的非空值
    pub fn first_field(fields: &[(String, String)], key: &str) -> Option<String> {
        fields
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    }

    /// 解析 URI 查询串，键转为小写
    ///
    /// 只做百分号解码（RFC 6068），`+` 保持字面值。
    pub fn query_pairs(query: &str) -> Vec<(String, String)> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (Self::percent_decode(key).to_ascii_lowercase(), Self::percent_decode(value))
            })
            .collect()
    }

    /// 百分号解码，非 UTF-8 结果时按原样保留
    pub fn percent_decode(s: &str) -> String {
        percent_decode_str(s)
            .decode_utf8()
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| s.to_string())
    }

    /// 去除 vCard / iCalendar 值中的转义
    pub fn unescape_text_value(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') | Some('N') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    /// 展开折行：以空格或制表符开头的行接续上一行，兼容 CRLF 与 LF
    pub fn unfold_lines(text: &str) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for raw in text.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(last) = lines.last_mut() {
                    last.push_str(&line[1..]);
                    continue;
                }
            }
            lines.push(line.to_string());
        }
        lines
    }

    /// 解析内容行 `GROUP.NAME;PARAM=X:VALUE`，返回（大写属性名, 原始值）
    pub fn parse_content_line(line: &str) -> Option<(String, &str)> {
        let (head, value) = line.split_once(':')?;
        let name = head.split(';').next()?.trim();
        let name = name.rsplit('.').next().unwrap_or(name);
        if name.is_empty() {
            return None;
        }
        Some((name.to_ascii_uppercase(), value))
    }

    /// 非空则返回去除首尾空白的值
    pub fn non_empty(value: &str) -> Option<String> {
        let v = value.trim();
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    }
}

/// 日期工具
pub struct DateUtils;

impl DateUtils {
    /// 解析 `YYYYMMDD[THHMMSS][Z]`，缺少时间部分时为当天零点
    pub fn parse_compact_datetime(value: &str) -> Option<NaiveDateTime> {
        let v = value.trim();
        let date_part = v.get(..8)?;
        if !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()?;
        let rest = &v[8..];
        let time = match rest.strip_prefix('T').or_else(|| rest.strip_prefix('t')) {
            Some(t) => {
                let hms = t.get(..6)?;
                NaiveTime::parse_from_str(hms, "%H%M%S").ok()?
            }
            None => NaiveTime::from_hms_opt(0, 0, 0)?,
        };
        Some(date.and_time(time))
    }
}
