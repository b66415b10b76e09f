use chrono::{Duration, Local, TimeZone};
use smartbin::core::bin_monitor::{month_key, week_key, StateStore};
use smartbin::core::config::Settings;
use smartbin::core::protocol::split_chunk;

#[test]
fn test_reports_feed_daily_weekly_and_monthly_history() {
    let mut store = StateStore::new(Settings::default());
    let start = Local.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();

    for (offset, capacity) in [(0, 20), (1, 40), (8, 60)] {
        let at = start + Duration::days(offset);
        let line = format!("TUTUP,{},25,0,0\n", capacity);
        store.apply_batch(&split_chunk(&line), at);
    }

    let history = store.history();
    assert_eq!(history.daily().len(), 3);
    assert_eq!(history.monthly().len(), 1);
    assert_eq!(history.weekly().len(), 2);

    let april = &history.monthly()[&month_key(&start)];
    assert_eq!(april.count, 3);
    assert_eq!(april.min, 20);
    assert_eq!(april.max, 60);
    assert!((april.average() - 40.0).abs() < f64::EPSILON);

    let first_week = &history.weekly()[&week_key(&start)];
    assert_eq!(first_week.count, 2);
}

#[test]
fn test_partial_reports_do_not_record_samples() {
    let mut store = StateStore::new(Settings::default());
    store.apply_batch(&split_chunk("DISTANCE:10\nSTATUS:BUKA\n"), Local::now());

    assert!(store.history().is_empty());
}

#[test]
fn test_a_year_of_reports_keeps_twelve_months() {
    let mut store = StateStore::new(Settings::default());

    for month in 1..=12 {
        let at = Local.with_ymd_and_hms(2025, month, 15, 12, 0, 0).unwrap();
        store.apply_batch(&split_chunk("TUTUP,50,25,0,0\n"), at);
    }
    let next_january = Local.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
    store.apply_batch(&split_chunk("TUTUP,50,25,0,0\n"), next_january);

    let monthly = store.history().monthly();
    assert_eq!(monthly.len(), 12);
    assert!(!monthly.contains_key("2025-01"));
    assert!(monthly.contains_key("2026-01"));
}

#[test]
fn test_week_keys_include_the_month() {
    let march = Local.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
    let april = Local.with_ymd_and_hms(2026, 4, 9, 0, 0, 0).unwrap();

    assert_eq!(week_key(&march), "2026-03-W2");
    assert_eq!(week_key(&april), "2026-04-W2");
    assert_eq!(month_key(&april), "2026-04");
}
