//! Wake-cycle tests: boot, background processing, scheduled feeding,
//! jam recovery, battery alerts and backup-cell charging.

use petfeeder::app::events::{AppEvent, FeedTrigger};
use petfeeder::app::service::FeederService;
use petfeeder::config::{FeederConfig, FEEDING_MELODY, LOW_BATTERY_BEEP};
use petfeeder::power::{PowerMode, WakeReason};
use petfeeder::settings::{ScheduleSlot, CALIBRATION_DEFAULT};

use crate::mock_hw::{MemStore, MockBoard, RecordingSink};

fn booted(board: &mut MockBoard, store: &MemStore, config: FeederConfig) -> (FeederService, RecordingSink) {
    let mut service = FeederService::new(config);
    let mut sink = RecordingSink::default();
    service.boot(board, store, &mut sink);
    (service, sink)
}

fn run_wakes(service: &mut FeederService, board: &mut MockBoard, store: &mut MemStore, sink: &mut RecordingSink, n: usize) {
    for _ in 0..n {
        assert_eq!(service.run_once(board, store, sink), WakeReason::BackgroundTick);
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_reports_slots_and_settles_in_powersave() {
    let mut board = MockBoard::at(12, 0, 0);
    let store = MemStore::default();
    let (service, sink) = booted(&mut board, &store, FeederConfig::default());

    assert_eq!(sink.events[0], AppEvent::Started { enabled_slots: 3 });
    assert!(sink.contains(&AppEvent::PowerModeChanged {
        from: PowerMode::Full,
        to: PowerMode::PowerSave,
    }));
    assert_eq!(service.power_mode(), PowerMode::PowerSave);
    assert_eq!(board.published.last(), Some(&PowerMode::PowerSave));
    assert!(!board.display_lit);
    // Primary cell: never charged.
    assert_eq!(board.charging, Some(false));
    assert!(board.rtc_writes.is_empty());
}

#[test]
fn stored_settings_are_used() {
    let mut board = MockBoard::at(12, 0, 0);
    let mut store = MemStore::default();
    store.slots.insert(3, ScheduleSlot::new(12, 0, 2));
    store.calibration = Some(820);
    let (service, sink) = booted(&mut board, &store, FeederConfig::default());

    assert!(sink.contains(&AppEvent::Started { enabled_slots: 4 }));
    assert_eq!(service.context().calibration, 820);
    assert_eq!(service.context().scheduler.slot(3), Some(ScheduleSlot::new(12, 0, 2)));
}

#[test]
fn storage_failure_falls_back_to_factory_settings() {
    let mut board = MockBoard::at(12, 0, 0);
    let store = MemStore {
        fail_load: true,
        calibration: Some(820),
        ..MemStore::default()
    };
    let (service, sink) = booted(&mut board, &store, FeederConfig::default());

    assert_eq!(sink.events[0], AppEvent::StorageFailed);
    assert_eq!(sink.events[1], AppEvent::Started { enabled_slots: 3 });
    assert_eq!(service.context().calibration, CALIBRATION_DEFAULT);
}

#[test]
fn halted_clock_is_restarted_at_boot() {
    let mut board = MockBoard::at(9, 30, 0);
    board.halted = true;
    let store = MemStore::default();
    let _ = booted(&mut board, &store, FeederConfig::default());

    assert_eq!(board.rtc_writes.len(), 1);
    assert!(!board.halted);
    assert_eq!(board.now.hour, 0);
    assert_eq!(board.now.year, 16);
}

// ── Scheduled feeding ─────────────────────────────────────────

#[test]
fn slot_fires_once_with_melody_and_full_dispense() {
    // Factory slot 1 is 07:00 × 6 servings.
    let mut board = MockBoard::at(6, 59, 50);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());

    // Two minutes of 2 s wakes; the 07:00 minute is checked twice.
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 60);

    let started = sink.count(|e| matches!(e, AppEvent::FeedingStarted { .. }));
    assert_eq!(started, 1, "events: {:?}", sink.events);
    assert!(sink.contains(&AppEvent::FeedingStarted {
        servings: 6,
        trigger: FeedTrigger::Scheduled,
    }));
    assert!(sink.contains(&AppEvent::FeedingDone { servings: 6, jams: 0 }));

    assert_eq!(board.melodies, [FEEDING_MELODY]);
    assert_eq!(board.forward_steps, 24);
    assert_eq!(board.back_steps, 0);
    assert!(!board.servo_powered());
    // Servings left, counted down per serving.
    assert_eq!(board.decimals, [6, 5, 4, 3, 2, 1, 0]);

    assert_eq!(service.power_mode(), PowerMode::PowerSave);
    assert_eq!(board.published.last(), Some(&PowerMode::PowerSave));
    assert_eq!(service.context().scheduler.last_triggered_day(0), Some(15));
}

#[test]
fn feeding_runs_in_full_mode() {
    let mut board = MockBoard::at(6, 59, 50);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 20);

    let feed_at = sink
        .events
        .iter()
        .position(|e| matches!(e, AppEvent::FeedingStarted { .. }))
        .unwrap();
    assert_eq!(
        sink.events[feed_at - 1],
        AppEvent::PowerModeChanged {
            from: PowerMode::Low,
            to: PowerMode::Full,
        }
    );
}

#[test]
fn schedule_is_not_checked_more_often_than_the_interval() {
    let mut board = MockBoard::at(6, 59, 50);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());

    // 06:59:50 + 14 × 2 s = 07:00:18: inside the minute but before the
    // first check is due.
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 14);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FeedingStarted { .. })), 0);

    run_wakes(&mut service, &mut board, &mut store, &mut sink, 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FeedingStarted { .. })), 1);
}

#[test]
fn disabled_slot_never_fires() {
    // Factory slot 4 is 00:00 with zero servings.
    let mut board = MockBoard::at(23, 59, 40);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 60);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::FeedingStarted { .. })), 0);
    assert_eq!(board.forward_steps, 0);
}

#[test]
fn jam_backs_off_pauses_and_completes() {
    let mut board = MockBoard::at(6, 59, 50);
    board.forward_script.extend([true, false, true]);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 20);

    assert!(sink.contains(&AppEvent::Jam { consecutive: 1 }));
    assert!(sink.contains(&AppEvent::FeedingDone { servings: 6, jams: 1 }));
    assert_eq!(board.forward_steps, 25);
    assert_eq!(board.back_steps, 1);
    assert_eq!(board.delays_ms, [200]);
    assert!(!board.servo_powered());
}

// ── Battery ───────────────────────────────────────────────────

#[test]
fn low_battery_alerts_on_schedule_check() {
    let mut board = MockBoard::at(12, 0, 0);
    board.battery = 400;
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 15);

    // 400 counts → 429 mV at the pin × 7.99.
    assert!(sink.contains(&AppEvent::LowBattery { millivolts: 3427 }));
    assert_eq!(board.melodies, [LOW_BATTERY_BEEP]);
}

#[test]
fn uncommitted_battery_reading_is_not_an_alert() {
    let mut board = MockBoard::at(12, 0, 0);
    board.battery = 0;
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 30);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::LowBattery { .. })), 0);
    assert!(board.melodies.is_empty());
}

#[test]
fn healthy_battery_is_quiet() {
    let mut board = MockBoard::at(12, 0, 0);
    board.battery = 600;
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 30);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::LowBattery { .. })), 0);
}

// ── Backup cell ───────────────────────────────────────────────

#[test]
fn rechargeable_cell_is_charged_once_per_minute() {
    let config = FeederConfig {
        rechargeable_backup: true,
        ..FeederConfig::default()
    };
    let mut board = MockBoard::at(12, 0, 0);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, config);
    assert_eq!(board.charging, None);

    // 12:00:02, first wake of the minute.
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 1);
    assert_eq!(board.charging, Some(true));
    // 12:00:04, same minute.
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 1);
    assert_eq!(board.charging, Some(false));

    // Up to 12:01:00.
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 28);
    assert_eq!(board.now.minute, 1);
    assert_eq!(board.charging, Some(true));
}

#[test]
fn primary_cell_is_never_charged() {
    let mut board = MockBoard::at(12, 0, 0);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    run_wakes(&mut service, &mut board, &mut store, &mut sink, 40);
    assert_eq!(board.charging, Some(false));
}

// ── Power modes ───────────────────────────────────────────────

#[test]
fn background_wake_passes_through_low() {
    let mut board = MockBoard::at(12, 0, 0);
    let mut store = MemStore::default();
    let (mut service, mut sink) = booted(&mut board, &store, FeederConfig::default());
    board.published.clear();
    sink.events.clear();

    run_wakes(&mut service, &mut board, &mut store, &mut sink, 1);
    assert_eq!(board.published, [PowerMode::Low, PowerMode::PowerSave]);
    assert_eq!(
        sink.events,
        [
            AppEvent::PowerModeChanged {
                from: PowerMode::PowerSave,
                to: PowerMode::Low,
            },
            AppEvent::PowerModeChanged {
                from: PowerMode::Low,
                to: PowerMode::PowerSave,
            },
        ]
    );
    assert!(board.feeds > 0);
}
