//! Menu tests: navigation, value editors, commits, timeouts and actions,
//! driven through a button-woken `run_once`.

use petfeeder::app::events::{AppEvent, FeedTrigger};
use petfeeder::app::ports::Button;
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;
use petfeeder::power::{PowerMode, WakeReason};
use petfeeder::settings::{ScheduleSlot, CALIBRATION_DEFAULT};

use crate::mock_hw::{MemStore, MockBoard, RecordingSink};

struct Rig {
    board: MockBoard,
    store: MemStore,
    sink: RecordingSink,
    service: FeederService,
}

impl Rig {
    fn new(board: MockBoard) -> Self {
        Self::with_config(board, FeederConfig::default())
    }

    fn with_config(mut board: MockBoard, config: FeederConfig) -> Self {
        let store = MemStore::default();
        let mut sink = RecordingSink::default();
        let mut service = FeederService::new(config);
        service.boot(&mut board, &store, &mut sink);
        sink.events.clear();
        board.published.clear();
        board.wake_for_menu();
        Self {
            board,
            store,
            sink,
            service,
        }
    }

    /// One button-woken cycle; returns once every menu level has timed out.
    fn open_menu(&mut self) {
        let reason = self.service.run_once(&mut self.board, &mut self.store, &mut self.sink);
        assert_eq!(reason, WakeReason::MenuRequested);
        assert_eq!(self.board.pending_presses(), 0, "unconsumed presses");
    }

    /// Events other than power-mode changes.
    fn menu_events(&self) -> Vec<AppEvent> {
        self.sink
            .events
            .iter()
            .filter(|e| !matches!(e, AppEvent::PowerModeChanged { .. }))
            .cloned()
            .collect()
    }
}

// ── Session ───────────────────────────────────────────────────

#[test]
fn idle_menu_opens_and_times_out() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.open_menu();

    assert_eq!(rig.menu_events(), [AppEvent::MenuOpened, AppEvent::MenuClosed]);
    assert_eq!(
        rig.board.published,
        [PowerMode::Low, PowerMode::Full, PowerMode::PowerSave]
    );
    assert_eq!(rig.service.power_mode(), PowerMode::PowerSave);
    assert_eq!(rig.board.texts.first().map(String::as_str), Some("BAT"));
    // Ten seconds of silence at the top level.
    assert!(rig.board.now.second >= 10);
}

#[test]
fn menu_charges_a_rechargeable_cell() {
    let config = FeederConfig {
        rechargeable_backup: true,
        ..FeederConfig::default()
    };
    let mut rig = Rig::with_config(MockBoard::at(12, 0, 0), config);
    rig.open_menu();
    assert_eq!(rig.board.charging, Some(true));
}

#[test]
fn cursor_stops_at_the_ends() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board.press_n(1, Button::Minus).press_n(5, Button::Plus);
    rig.open_menu();

    let texts: Vec<&str> = rig.board.texts.iter().map(String::as_str).collect();
    assert_eq!(texts, ["BAT", "BAT", "CLK", "SCH", "TST", "CAL", "CAL"]);
}

// ── Editors ───────────────────────────────────────────────────

#[test]
fn calibration_edit_is_clamped_and_saved() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board
        .press_n(4, Button::Plus)
        .press_n(1, Button::Enter)
        .press_n(61, Button::Minus)
        .press_n(1, Button::Enter);
    rig.open_menu();

    assert_eq!(
        rig.menu_events(),
        [
            AppEvent::MenuOpened,
            AppEvent::CalibrationSaved { value: 750 },
            AppEvent::MenuClosed,
        ]
    );
    assert_eq!(rig.store.calibration, Some(750));
    assert_eq!(rig.service.context().calibration, 750);
    assert_eq!(rig.board.decimals.first(), Some(&CALIBRATION_DEFAULT));
    assert_eq!(rig.board.decimals.last(), Some(&750));
}

#[test]
fn schedule_slot_edit_saves_only_that_slot() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board
        .press_n(2, Button::Plus) // SCH
        .press_n(1, Button::Enter)
        .press_n(1, Button::Plus) // F 2
        .press_n(1, Button::Enter)
        .press_n(1, Button::Enter) // HRS
        .press_n(1, Button::Plus)
        .press_n(1, Button::Enter);
    rig.open_menu();

    let saved = ScheduleSlot::new(18, 0, 6);
    assert!(rig.sink.contains(&AppEvent::SlotSaved { index: 1, slot: saved }));
    assert_eq!(rig.store.slots.len(), 1);
    assert_eq!(rig.store.slots.get(&1), Some(&saved));
    assert_eq!(rig.service.context().scheduler.slot(1), Some(saved));
    assert!(rig.board.texts.iter().any(|t| t == "F 2"));
    assert!(rig.board.texts.iter().any(|t| t == "HRS"));
}

#[test]
fn editor_timeout_discards_the_value() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board
        .press_n(4, Button::Plus)
        .press_n(1, Button::Enter)
        .press_n(3, Button::Plus);
    rig.open_menu();

    assert_eq!(rig.menu_events(), [AppEvent::MenuOpened, AppEvent::MenuClosed]);
    assert_eq!(rig.store.calibration, None);
    assert_eq!(rig.service.context().calibration, CALIBRATION_DEFAULT);
    assert_eq!(rig.board.decimals.last(), Some(&802));
}

#[test]
fn failed_write_keeps_the_value_in_ram() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.store.fail_writes = true;
    rig.board
        .press_n(4, Button::Plus)
        .press_n(1, Button::Enter)
        .press_n(1, Button::Plus)
        .press_n(1, Button::Enter);
    rig.open_menu();

    assert!(rig.sink.contains(&AppEvent::StorageFailed));
    assert!(rig.sink.contains(&AppEvent::CalibrationSaved { value: 800 }));
    assert_eq!(rig.service.context().calibration, 800);
}

#[test]
fn clock_hour_edit_zeroes_seconds() {
    let mut rig = Rig::new(MockBoard::at(12, 34, 50));
    rig.board
        .press_n(1, Button::Plus) // CLK
        .press_n(1, Button::Enter)
        .press_n(1, Button::Enter) // HRS
        .press_n(1, Button::Plus)
        .press_n(1, Button::Enter);
    rig.open_menu();

    assert!(rig.sink.contains(&AppEvent::ClockSet));
    let written = rig.board.rtc_writes[0];
    assert_eq!(written.hour, 13);
    assert_eq!(written.minute, 34);
    assert_eq!(written.second, 0);
    assert_eq!(written.day, 15);
}

#[test]
fn clock_day_edit_keeps_the_time() {
    let mut rig = Rig::new(MockBoard::at(12, 34, 50));
    rig.board
        .press_n(1, Button::Plus) // CLK
        .press_n(1, Button::Enter)
        .press_n(2, Button::Plus) // DAY
        .press_n(1, Button::Enter)
        .press_n(2, Button::Minus)
        .press_n(1, Button::Enter);
    rig.open_menu();

    let written = rig.board.rtc_writes[0];
    assert_eq!(written.day, 13);
    assert_eq!((written.hour, written.minute), (12, 34));
    assert_ne!(written.second, 0);
}

// ── Actions ───────────────────────────────────────────────────

#[test]
fn test_dispense_runs_ten_servings_without_melody() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board.press_n(3, Button::Plus).press_n(1, Button::Enter);
    rig.open_menu();

    assert!(rig.sink.contains(&AppEvent::FeedingStarted {
        servings: 10,
        trigger: FeedTrigger::Test,
    }));
    assert!(rig.sink.contains(&AppEvent::FeedingDone { servings: 10, jams: 0 }));
    assert_eq!(rig.board.forward_steps, 40);
    assert!(rig.board.melodies.is_empty());
    assert!(!rig.board.servo_powered());
    // A test run does not mark any slot as fired.
    assert_eq!(rig.service.context().scheduler.last_triggered_day(0), None);
}

#[test]
fn battery_view_shows_tens_of_millivolts() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board.battery = 512;
    rig.board.press_n(1, Button::Enter).press_n(1, Button::Enter);
    rig.open_menu();

    // 512 counts → 550 mV at the pin × 7.99 = 4394 mV.
    assert_eq!(rig.board.decimals, [439]);
    assert_eq!(rig.menu_events(), [AppEvent::MenuOpened, AppEvent::MenuClosed]);
}

#[test]
fn battery_view_follows_the_reading() {
    let mut rig = Rig::new(MockBoard::at(12, 0, 0));
    rig.board.battery = 512;
    rig.board
        .change_battery(120, 600)
        .press_n(1, Button::Enter)
        .press(300, Button::Enter);
    rig.open_menu();

    // 600 counts → 644 mV at the pin × 7.99 = 5145 mV.
    assert_eq!(rig.board.decimals, [439, 514]);
    assert_eq!(rig.board.battery, 600);
}
