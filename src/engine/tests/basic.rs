use chrono::{TimeZone, Utc};
use lotto_scan_engine::{
    get_version, ConfigError, DrawScheduleOracle, DrawState, EngineConfig,
    InMemoryResultsProvider, LotteryEngine, ManualClock, NotificationAction, Product,
    RoundEstimate, TicketStatus, VerificationOutcome,
};
use std::sync::Arc;

#[test]
fn test_version() {
    assert!(!get_version().is_empty());
}

#[test]
fn test_config_from_lookup() -> anyhow::Result<()> {
    let config = EngineConfig::from_lookup(|key| match key {
        "LOTTO_CACHE_TTL_SECS" => Some("60".to_string()),
        "LOTTO_PENSION_EPOCH" => Some("2020-05-07".to_string()),
        _ => None,
    })?;
    assert_eq!(config.cache_ttl_secs, 60);

    let oracle = DrawScheduleOracle::from_config(&config);
    // 2024-01-04 20:00 KST
    let now = Utc.with_ymd_and_hms(2024, 1, 4, 11, 0, 0).unwrap();
    assert_eq!(oracle.current_round(Product::Pension720, now), RoundEstimate::Known(192));
    Ok(())
}

#[test]
fn test_out_of_range_config_is_rejected() {
    for (key, value) in [
        ("LOTTO_CACHE_TTL_SECS", "100000000000000000"),
        ("LOTTO_REMINDER_OFFSET_SECS", "9000000000000000"),
        ("LOTTO_PENSION_EPOCH", "2020-05-08"),
    ] {
        let err = EngineConfig::from_lookup(|k| (k == key).then(|| value.to_string()))
            .expect_err("out of range value must be rejected");
        let ConfigError::InvalidValue { key: got, .. } = err;
        assert_eq!(got, key);
    }
}

/// 配置上限内的最大值可以正常组装并调度提醒
#[test]
fn test_engine_with_maximum_durations() {
    let config = EngineConfig {
        cache_ttl_secs: u64::MAX,
        reminder_offset_secs: u64::MAX,
        ..EngineConfig::default()
    };
    let now = Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(now));
    let engine = LotteryEngine::new(&config, Arc::new(InMemoryResultsProvider::new()), clock);

    let status = TicketStatus::new(Product::Lotto645, 1102, false);
    let commands = engine.notifications.evaluate_all(&[status], now);
    assert_eq!(commands[0].action, NotificationAction::Schedule);
    assert!(commands[0].firing_at.is_some_and(|at| at > now));
}

#[test]
fn test_public_schedule_api() {
    let oracle = DrawScheduleOracle::default();
    // 2024-01-06 21:00 KST
    let now = Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap();
    assert_eq!(oracle.current_round(Product::Lotto645, now), RoundEstimate::Known(1101));
    assert_eq!(oracle.is_draw_completed(Product::Lotto645, 1101, now), DrawState::Completed);
    assert_eq!(oracle.current_round(Product::Pension720, now), RoundEstimate::Unsupported);
}

#[tokio::test]
async fn test_engine_with_empty_provider_is_unavailable() {
    let provider = Arc::new(InMemoryResultsProvider::new());
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap()));
    let engine = LotteryEngine::new(&EngineConfig::default(), provider.clone(), clock);

    let ticket = lotto_scan_payload::decode_lottery("http://m.dhlottery.co.kr/?v=1101m010203040506")
        .into_ticket()
        .expect("ticket");
    let outcome = engine.verification.verify(&ticket).await;
    assert!(matches!(outcome, VerificationOutcome::Unavailable { .. }));
    assert_eq!(provider.call_count(), 1);

    let now = Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap();
    let commands = engine
        .notifications
        .evaluate_all(&[TicketStatus::from_ticket(&ticket, false)], now);
    assert_eq!(commands[0].action, NotificationAction::Schedule);
    assert_eq!(commands[1].action, NotificationAction::Cancel);
}
