//! 内容分类的黑盒测试

use lotto_scan_payload::{
    classify, interpret, ContentKind, PayloadContent, ScanInterpretation, WifiPayload,
};

#[test]
fn test_unrecognized_input_is_trimmed_text() {
    let samples = [
        "hello world",
        "   padded   ",
        "ftp://files.example.com",
        "telephone 123",
        "WIFIS:nope",
        "BEGIN:VTODO",
        "",
        "로또 당첨 기원",
    ];
    for s in samples {
        let p = classify(s);
        assert_eq!(p.kind(), ContentKind::Text, "{:?}", s);
        match p.content {
            PayloadContent::Text(t) => assert_eq!(t.text, s.trim()),
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_phone_number() {
    let p = classify("tel:+821012345678");
    assert_eq!(p.kind(), ContentKind::Phone);
    match p.content {
        PayloadContent::Phone(ph) => assert_eq!(ph.number, "+821012345678"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_wifi_fields() {
    let p = classify("WIFI:T:WPA;S:HomeNet;P:secret123;;");
    assert_eq!(
        p.content,
        PayloadContent::Wifi(WifiPayload {
            encryption: "WPA".into(),
            ssid: Some("HomeNet".into()),
            password: Some("secret123".into()),
            hidden: false,
        })
    );
}

#[test]
fn test_every_grammar_has_a_kind() {
    let cases = [
        ("https://example.com", ContentKind::Url),
        ("TEL:010", ContentKind::Phone),
        ("sms:010", ContentKind::Sms),
        ("SMSTO:010:hi", ContentKind::Sms),
        ("mailto:a@b.c", ContentKind::Email),
        ("MATMSG:TO:a@b.c;;", ContentKind::Email),
        ("WIFI:S:x;;", ContentKind::Wifi),
        ("geo:1.5,2.5", ContentKind::Geo),
        ("BEGIN:VCARD\nFN:A\nEND:VCARD", ContentKind::Contact),
        ("MECARD:N:A;;", ContentKind::Contact),
        ("BEGIN:VEVENT\nSUMMARY:x\nEND:VEVENT", ContentKind::Event),
    ];
    for (raw, kind) in cases {
        assert_eq!(classify(raw).kind(), kind, "{}", raw);
    }
}

#[test]
fn test_payload_serializes_with_kind_tag() {
    let p = classify("tel:123");
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["content"]["kind"], "phone");
    assert_eq!(json["content"]["number"], "123");
}

#[test]
fn test_interpret_plain_text() {
    match interpret("nothing special") {
        ScanInterpretation::Content(p) => assert_eq!(p.kind(), ContentKind::Text),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_embedded_vcard_keeps_fields() {
    match classify("card BEGIN:VCARD\nFN:Kim\nTEL:010\nEND:VCARD").content {
        PayloadContent::Contact(c) => {
            assert_eq!(c.full_name.as_deref(), Some("Kim"));
            assert_eq!(c.phones, vec!["010"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}
