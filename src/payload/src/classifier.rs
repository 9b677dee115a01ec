//! 扫码内容分类器
//!
//! 按固定顺序逐条尝试语法规则，第一条命中的规则决定类别。
//! 任何输入都能得到结果：无法识别的内容归为 `Text`。
//! 关键字一旦命中就不会降级，只有 `geo:` 在坐标非数字时继续向后尝试。

use tracing::trace;
use url::Url;

use crate::types::{
    ContactFormat, ContactPayload, EmailPayload, EventPayload, GeoPayload, PayloadContent,
    PhonePayload, ScannedPayload, SmsPayload, TextPayload, UrlPayload, WifiPayload,
};
use crate::utils::{DateUtils, TextUtils};

/// 一条分类规则：判定 + 提取
struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    extract: fn(&str) -> Option<PayloadContent>,
}

/// 规则顺序即优先级，输入可能同时满足多种语法
const RULES: &[Rule] = &[
    Rule {
        name: "url",
        matches: is_url,
        extract: extract_url,
    },
    Rule {
        name: "phone",
        matches: is_phone,
        extract: extract_phone,
    },
    Rule {
        name: "sms",
        matches: is_sms,
        extract: extract_sms,
    },
    Rule {
        name: "email",
        matches: is_email,
        extract: extract_email,
    },
    Rule {
        name: "wifi",
        matches: is_wifi,
        extract: extract_wifi,
    },
    Rule {
        name: "geo",
        matches: is_geo,
        extract: extract_geo,
    },
    Rule {
        name: "vcard",
        matches: is_vcard,
        extract: extract_vcard,
    },
    Rule {
        name: "mecard",
        matches: is_mecard,
        extract: extract_mecard,
    },
    Rule {
        name: "event",
        matches: is_event,
        extract: extract_event,
    },
];

/// 将任意扫码文本分类为结构化内容，永不失败
pub fn classify(raw: &str) -> ScannedPayload {
    let input = raw.trim();
    for rule in RULES {
        if !(rule.matches)(input) {
            continue;
        }
        if let Some(content) = (rule.extract)(input) {
            trace!(rule = rule.name, "扫码内容命中规则");
            return ScannedPayload::new(raw, content);
        }
        trace!(rule = rule.name, "规则命中但提取失败，继续尝试");
    }
    ScannedPayload::new(raw, PayloadContent::Text(TextPayload { text: input.to_string() }))
}

fn is_url(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "http://").is_some()
        || TextUtils::strip_prefix_ci(s, "https://").is_some()
}

fn extract_url(s: &str) -> Option<PayloadContent> {
    let payload = match Url::parse(s) {
        Ok(parsed) => UrlPayload {
            url: parsed.as_str().to_string(),
            scheme: Some(parsed.scheme().to_string()),
            host: parsed.host_str().map(str::to_string),
        },
        Err(_) => UrlPayload { url: s.to_string(), scheme: None, host: None },
    };
    Some(PayloadContent::Url(payload))
}

fn is_phone(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "tel:").is_some()
}

fn extract_phone(s: &str) -> Option<PayloadContent> {
    let rest = TextUtils::strip_prefix_ci(s, "tel:")?;
    Some(PayloadContent::Phone(PhonePayload { number: rest.trim().to_string() }))
}

fn is_sms(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "smsto:").is_some()
        || TextUtils::strip_prefix_ci(s, "sms:").is_some()
}

fn extract_sms(s: &str) -> Option<PayloadContent> {
    // SMSTO:<num>[:<body>]，正文为字面值
    if let Some(rest) = TextUtils::strip_prefix_ci(s, "smsto:") {
        let (number, body) = match rest.split_once(':') {
            Some((n, b)) => (n, TextUtils::non_empty(b)),
            None => (rest, None),
        };
        return Some(PayloadContent::Sms(SmsPayload { number: number.trim().to_string(), body }));
    }

    // sms:<num>[?body=<urlencoded>]
    let rest = TextUtils::strip_prefix_ci(s, "sms:")?;
    let (number, query) = match rest.split_once('?') {
        Some((n, q)) => (n, Some(q)),
        None => (rest, None),
    };
    let body = query.and_then(|q| {
        TextUtils::query_pairs(q)
            .into_iter()
            .find(|(k, _)| k == "body")
            .and_then(|(_, v)| TextUtils::non_empty(&v))
    });
    Some(PayloadContent::Sms(SmsPayload { number: number.trim().to_string(), body }))
}

fn is_email(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "mailto:").is_some()
        || TextUtils::strip_prefix_ci(s, "MATMSG:").is_some()
}

fn split_address_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(TextUtils::non_empty)
        .collect()
}

fn extract_email(s: &str) -> Option<PayloadContent> {
    if let Some(rest) = TextUtils::strip_prefix_ci(s, "MATMSG:") {
        let fields = TextUtils::split_fields(rest);
        return Some(PayloadContent::Email(EmailPayload {
            address: TextUtils::first_field(&fields, "TO").unwrap_or_default(),
            subject: TextUtils::first_field(&fields, "SUB"),
            body: TextUtils::first_field(&fields, "BODY"),
            ..EmailPayload::default()
        }));
    }

    let rest = TextUtils::strip_prefix_ci(s, "mailto:")?;
    let (address, query) = match rest.split_once('?') {
        Some((a, q)) => (a, Some(q)),
        None => (rest, None),
    };
    let mut email = EmailPayload {
        address: TextUtils::percent_decode(address.trim()),
        ..EmailPayload::default()
    };
    for (key, value) in query.map(TextUtils::query_pairs).unwrap_or_default() {
        match key.as_str() {
            "subject" => email.subject = TextUtils::non_empty(&value),
            "body" => email.body = TextUtils::non_empty(&value),
            "cc" => email.cc.extend(split_address_list(&value)),
            "bcc" => email.bcc.extend(split_address_list(&value)),
            _ => {}
        }
    }
    Some(PayloadContent::Email(email))
}

fn is_wifi(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "WIFI:").is_some()
}

fn extract_wifi(s: &str) -> Option<PayloadContent> {
    let rest = TextUtils::strip_prefix_ci(s, "WIFI:")?;
    let fields = TextUtils::split_fields(rest);
    Some(PayloadContent::Wifi(WifiPayload {
        encryption: TextUtils::first_field(&fields, "T").unwrap_or_else(|| "nopass".to_string()),
        ssid: TextUtils::first_field(&fields, "S"),
        password: TextUtils::first_field(&fields, "P"),
        hidden: TextUtils::first_field(&fields, "H")
            .map(|h| h.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }))
}

fn is_geo(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "geo:").is_some()
}

/// 坐标不是数字时返回 None，交由后续规则处理
fn extract_geo(s: &str) -> Option<PayloadContent> {
    let rest = TextUtils::strip_prefix_ci(s, "geo:")?;
    let (coords, query) = match rest.split_once('?') {
        Some((c, q)) => (c, Some(q)),
        None => (rest, None),
    };
    let mut parts = coords.split(',');
    let latitude = parse_coordinate(parts.next()?)?;
    let longitude = parse_coordinate(parts.next()?)?;

    let mut geo = GeoPayload { latitude, longitude, label: None, zoom: None };
    for (key, value) in query.map(TextUtils::query_pairs).unwrap_or_default() {
        match key.as_str() {
            "q" => geo.label = TextUtils::non_empty(&value),
            "z" => geo.zoom = value.trim().parse().ok(),
            _ => {}
        }
    }
    Some(PayloadContent::Geo(geo))
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_vcard(s: &str) -> bool {
    TextUtils::contains_ci(s, "BEGIN:VCARD")
}

/// 从第一个 `marker`（不区分大小写）处截取；标记前的文字不参与解析
fn from_marker<'a>(s: &'a str, marker: &str) -> &'a str {
    // ASCII 大小写转换不改变字节偏移
    match s.to_ascii_uppercase().find(marker) {
        Some(offset) => &s[offset..],
        None => s,
    }
}

fn text_value(raw_value: &str) -> Option<String> {
    TextUtils::non_empty(&TextUtils::unescape_text_value(raw_value))
}

fn extract_vcard(s: &str) -> Option<PayloadContent> {
    let mut contact = ContactPayload::empty(ContactFormat::VCard);
    let mut inside = false;

    for line in TextUtils::unfold_lines(from_marker(s, "BEGIN:VCARD")) {
        let Some((name, raw_value)) = TextUtils::parse_content_line(line.trim_start()) else {
            continue;
        };
        match name.as_str() {
            "BEGIN" if raw_value.trim().eq_ignore_ascii_case("VCARD") => inside = true,
            "END" if raw_value.trim().eq_ignore_ascii_case("VCARD") => {
                if inside {
                    break;
                }
            }
            _ if !inside => {}
            "FN" => contact.full_name = text_value(raw_value),
            "N" => {
                // 姓;名;中间名;前缀;后缀
                let mut parts = split_structured(raw_value).into_iter();
                contact.last_name = parts.next().and_then(|p| TextUtils::non_empty(&p));
                contact.first_name = parts.next().and_then(|p| TextUtils::non_empty(&p));
            }
            "TEL" => contact.phones.extend(text_value(raw_value)),
            "EMAIL" => contact.emails.extend(text_value(raw_value)),
            "ORG" => contact.organization = join_parts(&split_structured(raw_value)),
            "TITLE" => contact.title = text_value(raw_value),
            "ADR" => contact.address = join_parts(&split_structured(raw_value)),
            "URL" => contact.url = text_value(raw_value),
            "NOTE" => contact.note = text_value(raw_value),
            _ => {}
        }
    }

    if contact.full_name.is_none() {
        contact.full_name =
            compose_name(contact.first_name.as_deref(), contact.last_name.as_deref());
    }
    Some(PayloadContent::Contact(contact))
}

/// 按未转义的 `;` 拆分结构化值，并去除转义
fn split_structured(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ';' {
            parts.push(TextUtils::unescape_text_value(&std::mem::take(&mut current)));
        } else {
            current.push(c);
        }
    }
    parts.push(TextUtils::unescape_text_value(&current));
    parts
}

fn join_parts(parts: &[String]) -> Option<String> {
    let joined = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    TextUtils::non_empty(&joined)
}

fn compose_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    match (first, last) {
        (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
        (Some(f), None) => Some(f.to_string()),
        (None, Some(l)) => Some(l.to_string()),
        (None, None) => None,
    }
}

fn is_mecard(s: &str) -> bool {
    TextUtils::strip_prefix_ci(s, "MECARD:").is_some()
}

fn extract_mecard(s: &str) -> Option<PayloadContent> {
    let rest = TextUtils::strip_prefix_ci(s, "MECARD:")?;
    let fields = TextUtils::split_fields(rest);
    let mut contact = ContactPayload::empty(ContactFormat::MeCard);

    if let Some(name) = TextUtils::first_field(&fields, "N") {
        // MECARD 的姓名写作 "姓,名"
        match name.split_once(',') {
            Some((last, first)) => {
                contact.last_name = TextUtils::non_empty(last);
                contact.first_name = TextUtils::non_empty(first);
                contact.full_name =
                    compose_name(contact.first_name.as_deref(), contact.last_name.as_deref());
            }
            None => contact.full_name = Some(name),
        }
    }
    contact.phones.extend(TextUtils::first_field(&fields, "TEL"));
    contact.emails.extend(TextUtils::first_field(&fields, "EMAIL"));
    contact.address = TextUtils::first_field(&fields, "ADR");
    contact.url = TextUtils::first_field(&fields, "URL");
    contact.note = TextUtils::first_field(&fields, "NOTE");
    Some(PayloadContent::Contact(contact))
}

fn is_event(s: &str) -> bool {
    TextUtils::contains_ci(s, "BEGIN:VCALENDAR") || TextUtils::contains_ci(s, "BEGIN:VEVENT")
}

fn extract_event(s: &str) -> Option<PayloadContent> {
    let mut event = EventPayload::default();
    let has_vevent = TextUtils::contains_ci(s, "BEGIN:VEVENT");
    let mut inside = !has_vevent;
    let body = if has_vevent { from_marker(s, "BEGIN:VEVENT") } else { s };

    for line in TextUtils::unfold_lines(body) {
        let Some((name, raw_value)) = TextUtils::parse_content_line(line.trim_start()) else {
            continue;
        };
        let value = TextUtils::unescape_text_value(raw_value);
        match name.as_str() {
            "BEGIN" if value.trim().eq_ignore_ascii_case("VEVENT") => inside = true,
            "END" if value.trim().eq_ignore_ascii_case("VEVENT") => {
                if inside {
                    break;
                }
            }
            _ if !inside => {}
            "SUMMARY" => event.title = TextUtils::non_empty(&value),
            "DESCRIPTION" => event.description = TextUtils::non_empty(&value),
            "LOCATION" => event.location = TextUtils::non_empty(&value),
            "DTSTART" => event.start = DateUtils::parse_compact_datetime(&value),
            "DTEND" => event.end = DateUtils::parse_compact_datetime(&value),
            "ORGANIZER" => {
                let organizer =
                    TextUtils::strip_prefix_ci(value.trim(), "mailto:").unwrap_or(value.trim());
                event.organizer = TextUtils::non_empty(organizer);
            }
            _ => {}
        }
    }
    Some(PayloadContent::Event(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;

    #[test]
    fn test_rule_order_is_fixed() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec!["url", "phone", "sms", "email", "wifi", "geo", "vcard", "mecard", "event"]
        );
    }

    #[test]
    fn test_url_case_insensitive() {
        let p = classify("HTTPS://Example.com/path?x=1");
        match p.content {
            PayloadContent::Url(u) => {
                assert_eq!(u.host.as_deref(), Some("example.com"));
                assert_eq!(u.scheme.as_deref(), Some("https"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_url_parse_failure_keeps_raw() {
        let p = classify("http://exa mple.com");
        match p.content {
            PayloadContent::Url(u) => {
                assert_eq!(u.url, "http://exa mple.com");
                assert!(u.host.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_phone() {
        let p = classify("tel: +821012345678 ");
        let expected = PhonePayload { number: "+821012345678".into() };
        assert_eq!(p.content, PayloadContent::Phone(expected));
    }

    fn sms(number: &str, body: Option<&str>) -> PayloadContent {
        PayloadContent::Sms(SmsPayload { number: number.into(), body: body.map(Into::into) })
    }

    #[test]
    fn test_sms_variants() {
        let p = classify("sms:+8210555?body=hello%20world");
        assert_eq!(p.content, sms("+8210555", Some("hello world")));

        let p = classify("SMSTO:010-1234:see you at 5:30");
        assert_eq!(p.content, sms("010-1234", Some("see you at 5:30")));

        let p = classify("smsto:0101");
        assert_eq!(p.content, sms("0101", None));
    }

    #[test]
    fn test_sms_body_keeps_literal_plus() {
        let p = classify("sms:010?body=1+1%3D2");
        assert_eq!(p.content, sms("010", Some("1+1=2")));
    }

    #[test]
    fn test_mailto() {
        let p =
            classify("mailto:a%40b.com?subject=Hi%20there&body=x&cc=c@d.com,e@f.com&bcc=g@h.com");
        match p.content {
            PayloadContent::Email(e) => {
                assert_eq!(e.address, "a@b.com");
                assert_eq!(e.subject.as_deref(), Some("Hi there"));
                assert_eq!(e.body.as_deref(), Some("x"));
                assert_eq!(e.cc, vec!["c@d.com".to_string(), "e@f.com".to_string()]);
                assert_eq!(e.bcc, vec!["g@h.com".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_matmsg() {
        let p = classify("MATMSG:TO:x@y.com;SUB:Hello;BODY:Line\\;two;;");
        match p.content {
            PayloadContent::Email(e) => {
                assert_eq!(e.address, "x@y.com");
                assert_eq!(e.subject.as_deref(), Some("Hello"));
                assert_eq!(e.body.as_deref(), Some("Line;two"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_wifi_defaults_and_order() {
        let p = classify("WIFI:S:Cafe;H:true;;");
        assert_eq!(
            p.content,
            PayloadContent::Wifi(WifiPayload {
                encryption: "nopass".into(),
                ssid: Some("Cafe".into()),
                password: None,
                hidden: true,
            })
        );
        let p = classify("WIFI:P:pw;T:WEP;S:Net;;");
        match p.content {
            PayloadContent::Wifi(w) => {
                assert_eq!(w.encryption, "WEP");
                assert_eq!(w.ssid.as_deref(), Some("Net"));
                assert_eq!(w.password.as_deref(), Some("pw"));
                assert!(!w.hidden);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_geo() {
        let p = classify("geo:37.5665,126.9780?q=Seoul%20City%20Hall&z=15");
        assert_eq!(
            p.content,
            PayloadContent::Geo(GeoPayload {
                latitude: 37.5665,
                longitude: 126.978,
                label: Some("Seoul City Hall".into()),
                zoom: Some(15),
            })
        );
    }

    #[test]
    fn test_geo_non_numeric_falls_through() {
        let p = classify("geo:north,east");
        assert_eq!(p.kind(), ContentKind::Text);
        assert_eq!(p.content, PayloadContent::Text(TextPayload { text: "geo:north,east".into() }));
    }

    #[test]
    fn test_vcard() {
        let raw = concat!(
            "BEGIN:VCARD\r\n",
            "VERSION:3.0\r\n",
            "N:Hong;Gildong;;;\r\n",
            "TEL;TYPE=CELL:010-1111-2222\r\n",
            "TEL;TYPE=WORK:02-333-4444\r\n",
            "EMAIL:gd@example.com\r\n",
            "ORG:Acme;R&D\r\n",
            "TITLE:Engineer\r\n",
            "ADR;TYPE=WORK:;;1 Main St;Seoul;;04524;Korea\r\n",
            "URL:https://acme.example\r\n",
            "NOTE:line one\\nline\r\n",
            "  two\r\n",
            "END:VCARD",
        );
        let p = classify(raw);
        match p.content {
            PayloadContent::Contact(c) => {
                assert_eq!(c.format, ContactFormat::VCard);
                assert_eq!(c.last_name.as_deref(), Some("Hong"));
                assert_eq!(c.first_name.as_deref(), Some("Gildong"));
                assert_eq!(c.full_name.as_deref(), Some("Gildong Hong"));
                assert_eq!(c.phones, vec!["010-1111-2222", "02-333-4444"]);
                assert_eq!(c.emails, vec!["gd@example.com".to_string()]);
                assert_eq!(c.organization.as_deref(), Some("Acme R&D"));
                assert_eq!(c.title.as_deref(), Some("Engineer"));
                assert_eq!(c.address.as_deref(), Some("1 Main St Seoul 04524 Korea"));
                assert_eq!(c.url.as_deref(), Some("https://acme.example"));
                assert_eq!(c.note.as_deref(), Some("line one\nline two"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_vcard_fn_wins_over_n() {
        let p = classify("BEGIN:VCARD\nFN:Dr. Kim\nN:Kim;Minsu\nEND:VCARD");
        match p.content {
            PayloadContent::Contact(c) => assert_eq!(c.full_name.as_deref(), Some("Dr. Kim")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_vcard_marker_inside_line() {
        let p = classify("card BEGIN:VCARD\nFN:Kim\nTEL:010\nEND:VCARD");
        match p.content {
            PayloadContent::Contact(c) => {
                assert_eq!(c.format, ContactFormat::VCard);
                assert_eq!(c.full_name.as_deref(), Some("Kim"));
                assert_eq!(c.phones, vec!["010"]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let p = classify("scan me: begin:vcard\nN:Lee;Jisoo\nend:vcard");
        match p.content {
            PayloadContent::Contact(c) => assert_eq!(c.full_name.as_deref(), Some("Jisoo Lee")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_event_marker_inside_line() {
        let p = classify("invite BEGIN:VEVENT\nSUMMARY:Dinner\nLOCATION:Hall\nEND:VEVENT");
        match p.content {
            PayloadContent::Event(e) => {
                assert_eq!(e.title.as_deref(), Some("Dinner"));
                assert_eq!(e.location.as_deref(), Some("Hall"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mecard() {
        let p = classify(concat!(
            "MECARD:N:Doe,John;TEL:123;TEL:456;EMAIL:j@d.com;",
            "ADR:Somewhere;URL:http\\://j.d;NOTE:hi;;",
        ));
        match p.content {
            PayloadContent::Contact(c) => {
                assert_eq!(c.format, ContactFormat::MeCard);
                assert_eq!(c.full_name.as_deref(), Some("John Doe"));
                assert_eq!(c.phones, vec!["123".to_string()]);
                assert_eq!(c.emails, vec!["j@d.com".to_string()]);
                assert_eq!(c.address.as_deref(), Some("Somewhere"));
                assert_eq!(c.url.as_deref(), Some("http://j.d"));
                assert_eq!(c.note.as_deref(), Some("hi"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_event() {
        let raw = concat!(
            "BEGIN:VCALENDAR\n",
            "BEGIN:VEVENT\n",
            "SUMMARY:Team sync\n",
            "DESCRIPTION:Weekly\\, short\n",
            "LOCATION:Room 4\n",
            "DTSTART:20250301T140000Z\n",
            "DTEND;VALUE=DATE:20250302\n",
            "ORGANIZER;CN=Lee:mailto:lee@example.com\n",
            "END:VEVENT\n",
            "END:VCALENDAR",
        );
        let p = classify(raw);
        match p.content {
            PayloadContent::Event(e) => {
                assert_eq!(e.title.as_deref(), Some("Team sync"));
                assert_eq!(e.description.as_deref(), Some("Weekly, short"));
                assert_eq!(e.location.as_deref(), Some("Room 4"));
                let start = e.start.map(|d| d.to_string());
                let end = e.end.map(|d| d.to_string());
                assert_eq!(start.as_deref(), Some("2025-03-01 14:00:00"));
                assert_eq!(end.as_deref(), Some("2025-03-02 00:00:00"));
                assert_eq!(e.organizer.as_deref(), Some("lee@example.com"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_url_precedes_vcard_marker() {
        let p = classify("https://example.com/?q=BEGIN:VCARD");
        assert_eq!(p.kind(), ContentKind::Url);
    }

    #[test]
    fn test_text_fallback_is_trimmed() {
        let p = classify("  just words \n");
        assert_eq!(p.content, PayloadContent::Text(TextPayload { text: "just words".into() }));
        assert_eq!(p.raw, "  just words \n");
    }
}
