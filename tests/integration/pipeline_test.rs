use chrono::{Local, TimeZone};
use smartbin::core::bin_monitor::{DoorStatus, LogKind, StateStore, Transition};
use smartbin::core::config::{Settings, UsageCounting};
use smartbin::core::protocol::{classify, split_chunk, DeviceEvent, LineAssembler};

fn closed_store() -> StateStore {
    StateStore::new(Settings::default())
}

#[test]
fn test_open_report_adds_local_transition_on_top_of_device_counters() {
    let mut store = closed_store();
    let now = Local::now();

    let outcome = store.apply_batch(&split_chunk("BUKA,45,27,3,120\n"), now);

    let state = store.state();
    assert_eq!(outcome.transition, Some(Transition::Opened));
    assert_eq!(state.status, DoorStatus::Open);
    assert_eq!(state.capacity, 45);
    assert_eq!(state.distance, 27);
    assert_eq!(state.daily_usage, 4);
    assert_eq!(state.total_usage, 121);
    assert_eq!(state.last_activity, Some(now));
}

#[test]
fn test_device_only_counting_trusts_the_report() {
    let settings = Settings {
        usage_counting: UsageCounting::DeviceOnly,
        ..Settings::default()
    };
    let mut store = StateStore::new(settings);

    store.apply_batch(&split_chunk("BUKA,45,27,3,120\n"), Local::now());

    assert_eq!(store.state().daily_usage, 3);
    assert_eq!(store.state().total_usage, 120);
}

#[test]
fn test_distance_partial_recomputes_capacity() {
    let mut store = closed_store();
    store.apply_batch(&split_chunk("DISTANCE:10\n"), Local::now());

    assert_eq!(store.state().distance, 10);
    assert_eq!(store.state().capacity, 80);
}

#[test]
fn test_malformed_field_defaults_to_zero() {
    let mut store = closed_store();
    store.apply_batch(&split_chunk("STATUS,notanumber,27,3,120\n"), Local::now());

    let state = store.state();
    assert_eq!(state.capacity, 0);
    assert_eq!(state.distance, 27);
    assert_eq!(state.daily_usage, 3);
    assert_eq!(state.total_usage, 120);
    assert_eq!(state.status, DoorStatus::Closed);
}

#[test]
fn test_last_full_report_in_chunk_wins_and_partials_are_dropped() {
    let mut store = closed_store();
    let chunk = "TUTUP,10,45,1,5\nDISTANCE:5\nTUTUP,30,35,2,6\n";

    let outcome = store.apply_batch(&split_chunk(chunk), Local::now());

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.superseded, 2);
    assert_eq!(store.state().capacity, 30);
    assert_eq!(store.state().distance, 35);
}

#[test]
fn test_full_report_is_idempotent() {
    let mut store = closed_store();
    let now = Local::now();
    let events = split_chunk("BUKA,45,27,3,120\n");

    store.apply_batch(&events, now);
    let first = store.snapshot();
    store.apply_batch(&events, now);

    assert_eq!(store.snapshot(), first);
}

#[test]
fn test_diagnostics_are_logged_even_next_to_a_full_report() {
    let mut store = closed_store();
    let chunk = "SYSTEM_READY\nhello from firmware\nTUTUP,10,45,0,0\n";

    let outcome = store.apply_batch(&split_chunk(chunk), Local::now());

    assert_eq!(outcome.logged, 2);
    let kinds: Vec<LogKind> = store.logs().entries().map(|e| e.kind).collect();
    assert!(kinds.contains(&LogKind::Device));
    assert!(kinds.contains(&LogKind::Success));
}

#[test]
fn test_assembler_joins_lines_split_across_reads() {
    let mut assembler = LineAssembler::new();
    let mut store = closed_store();

    for piece in ["BU", "KA,45,2", "7,3,120\nDIST", "ANCE:10\n"] {
        let events = assembler.push(piece);
        store.apply_batch(&events, Local::now());
    }

    assert!(!assembler.has_pending());
    assert_eq!(store.state().status, DoorStatus::Open);
    assert_eq!(store.state().distance, 10);
    assert_eq!(store.state().daily_usage, 4);
}

#[test]
fn test_line_cut_by_a_read_joins_the_next_batch() {
    let mut assembler = LineAssembler::new();
    let mut store = closed_store();

    let first = assembler.push("TUTUP,10,45,1,1\nTUTUP,20,");
    assert_eq!(first.len(), 1);
    store.apply_batch(&first, Local::now());
    assert_eq!(store.state().capacity, 10);

    let second = assembler.push("40,1,1\nDISTANCE:5\n");
    assert_eq!(second.len(), 2);
    let outcome = store.apply_batch(&second, Local::now());

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.superseded, 1);
    assert_eq!(store.state().capacity, 20);
    assert_eq!(store.state().distance, 40);
}

#[test]
fn test_daily_usage_resets_on_a_new_day() {
    let mut store = closed_store();
    let day_one = Local.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap();
    let day_two = Local.with_ymd_and_hms(2026, 3, 3, 8, 0, 0).unwrap();

    store.apply_batch(&split_chunk("STATUS:BUKA\nSTATUS:TUTUP\n"), day_one);
    assert_eq!(store.state().daily_usage, 1);

    store.apply_batch(&split_chunk("DISTANCE:20\n"), day_two);
    assert_eq!(store.state().daily_usage, 0);
    assert_eq!(store.state().total_usage, 1);
}

#[test]
fn test_classifier_recognises_each_line_shape() {
    assert!(classify("BUKA,45,27,3,120").is_full());
    assert!(matches!(classify("STATUS:BUKA"), DeviceEvent::Partial(_)));
    assert!(matches!(classify("CMD_RECEIVED:STATUS"), DeviceEvent::Partial(_)));
    assert!(matches!(classify("just a message"), DeviceEvent::Message(_)));
}
