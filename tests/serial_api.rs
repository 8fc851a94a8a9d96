//! End-to-end serial API scenarios against a simulated board.
//!
//! Each test boots a bird on a fresh (or carried-over) store and drives it
//! with decoded protocol frames exactly as the transport collaborator would,
//! asserting hardware effects and responses.

use std::cell::{Cell, RefCell};

use brrd_core::board::{Clock, EyeLeds, LightSensors, ServoBank, Speaker};
use brrd_core::brrd::Brrd;
use brrd_core::light::LightChannel;
use brrd_core::motion::Servo;
use brrd_core::protocol::{Link, Message};
use brrd_core::store::{NvStore, RamStore};

// ── Simulated board ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Effect {
    Servo(Servo, u8),
    Attach(Servo),
    Detach(Servo),
    Led(u8, u8, u8),
    Tone(u16, u16),
}

/// A board where time is manual, light is scripted, and every hardware
/// effect is recorded.
struct SimBoard {
    now: Cell<u64>,
    effects: RefCell<Vec<Effect>>,
    light: [Cell<u16>; 2],
    store: RamStore,
}

impl SimBoard {
    fn new() -> Self {
        Self {
            now: Cell::new(0),
            effects: RefCell::new(Vec::new()),
            light: [Cell::new(300), Cell::new(300)],
            store: RamStore::new(),
        }
    }

    fn take_effects(&mut self) -> Vec<Effect> {
        self.effects.borrow_mut().drain(..).collect()
    }

    fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SimBoard {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(ms as u64);
    }
}

impl ServoBank for SimBoard {
    fn write(&mut self, servo: Servo, angle: u8) {
        self.effects.borrow_mut().push(Effect::Servo(servo, angle));
    }

    fn attach(&mut self, servo: Servo) {
        self.effects.borrow_mut().push(Effect::Attach(servo));
    }

    fn detach(&mut self, servo: Servo) {
        self.effects.borrow_mut().push(Effect::Detach(servo));
    }
}

impl LightSensors for SimBoard {
    fn read(&mut self, channel: LightChannel) -> u16 {
        self.light[channel.index()].get()
    }
}

impl EyeLeds for SimBoard {
    fn write(&mut self, r: u8, g: u8, b: u8) {
        self.effects.borrow_mut().push(Effect::Led(r, g, b));
    }
}

impl Speaker for SimBoard {
    fn tone(&mut self, freq_hz: u16, duration_ms: u16) {
        self.effects.borrow_mut().push(Effect::Tone(freq_hz, duration_ms));
        self.advance(duration_ms as u64);
    }
}

impl NvStore for SimBoard {
    fn read(&self, addr: u8) -> u8 {
        self.store.read(addr)
    }

    fn write(&mut self, addr: u8, value: u8) {
        self.store.write(addr, value);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn booted_bird(board: &mut SimBoard) -> Brrd {
    let mut bird = Brrd::new();
    bird.init(board);
    board.take_effects();
    bird
}

fn frame(link: Link, action: char, command: char, key: u8, value: u16) -> Message {
    Message::new(link, action, command, key, value)
}

fn wire(msg: &Message) -> String {
    format!("{}", msg)
}

// ── Emote get/set round trips ────────────────────────────────────────────────

#[test]
fn test_happy_set_then_get_round_trip() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    // @V1,75! sets happy, silently.
    let set = frame(Link::Primary, '@', 'V', 1, 75);
    assert_eq!(bird.handle(&mut board, &set), None);

    // @V0,0! reads it back on the same link.
    let get = frame(Link::Primary, '@', 'V', 0, 0);
    let response = bird.handle(&mut board, &get).expect("get emits a response");
    assert_eq!(wire(&response), "#V0,75!");
    assert_eq!(response.link, Link::Primary);
}

#[test]
fn test_all_five_emote_commands() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    let scalars = [('V', 10), ('W', 20), ('X', 30), ('Y', 40), ('Z', 50)];
    for (cmd, value) in scalars {
        bird.handle(&mut board, &frame(Link::Primary, '@', cmd, 1, value));
    }
    for (cmd, value) in scalars {
        let response = bird
            .handle(&mut board, &frame(Link::Secondary, '@', cmd, 0, 0))
            .expect("each get responds");
        assert_eq!(response.value, value);
        assert_eq!(response.link, Link::Secondary, "response follows the request's link");
    }
}

#[test]
fn test_oversized_emote_value_folds() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    bird.handle(&mut board, &frame(Link::Primary, '@', 'V', 1, 300));
    let response = bird
        .handle(&mut board, &frame(Link::Primary, '@', 'V', 0, 0))
        .unwrap();
    assert_eq!(response.value, 1, "300 folds to 300/256 = 1");
}

// ── Movement commands ────────────────────────────────────────────────────────

#[test]
fn test_both_wings_wave_synchronised_and_opposed() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    let left_up = bird.motion.cal(Servo::LeftWing).pose_a;
    let left_down = bird.motion.cal(Servo::LeftWing).pose_b;

    // #O1,0! — synchronised.
    bird.handle(&mut board, &frame(Link::Primary, '#', 'O', 1, 0));
    let effects = board.take_effects();
    assert_eq!(effects[1], Effect::Servo(Servo::LeftWing, left_up));

    // #O1,1! — opposed.
    bird.handle(&mut board, &frame(Link::Primary, '#', 'O', 1, 1));
    let effects = board.take_effects();
    assert_eq!(effects[1], Effect::Servo(Servo::LeftWing, left_down));
}

#[test]
fn test_gesture_keys_drive_calibrated_poses() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    let beak = bird.motion.cal(Servo::Beak);

    // #B0,0! — beak open.
    bird.handle(&mut board, &frame(Link::Primary, '#', 'B', 0, 0));
    assert_eq!(
        board.take_effects(),
        vec![Effect::Servo(Servo::Beak, beak.pose_a)]
    );

    // #B4,0! — beak laugh: three open/close cycles.
    bird.handle(&mut board, &frame(Link::Primary, '#', 'B', 4, 0));
    let writes = board.take_effects();
    assert_eq!(writes.len(), 6);
    assert_eq!(writes[5], Effect::Servo(Servo::Beak, beak.pose_b));
}

#[test]
fn test_detach_all_and_reattach_on_next_move() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    // #O0,0! releases everything (init had attached all four).
    bird.handle(&mut board, &frame(Link::Primary, '#', 'O', 0, 0));
    let effects = board.take_effects();
    assert_eq!(
        effects,
        vec![
            Effect::Detach(Servo::Rotation),
            Effect::Detach(Servo::Beak),
            Effect::Detach(Servo::RightWing),
            Effect::Detach(Servo::LeftWing),
        ]
    );
}

#[test]
fn test_raw_position_command_is_byte_folded() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    // #S5,1000! → 1000/256 = 3.
    bird.handle(&mut board, &frame(Link::Primary, '#', 'S', 5, 1000));
    assert_eq!(
        board.take_effects()[0],
        Effect::Servo(Servo::Rotation, 3)
    );
}

// ── Device control ───────────────────────────────────────────────────────────

#[test]
fn test_servo_move_with_scaled_settle_time() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    let before = board.now_ms();

    // @R15,70! → right wing to 70, settle 150 ms.
    bird.handle(&mut board, &frame(Link::Primary, '@', 'R', 15, 70));

    assert_eq!(board.take_effects(), vec![Effect::Servo(Servo::RightWing, 70)]);
    assert_eq!(board.now_ms() - before, 150, "move blocks for key x 10 ms");
}

#[test]
fn test_eye_channel_commands_compose() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    // Boot default is violet 128/10/128; @E1,200! lifts only green.
    bird.handle(&mut board, &frame(Link::Primary, '@', 'E', 1, 200));
    assert_eq!(bird.eyes.rgb(), [128, 200, 128]);
    assert_eq!(board.take_effects(), vec![Effect::Led(128, 200, 128)]);
}

#[test]
fn test_tone_command_blocks_for_duration() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    let before = board.now_ms();

    // @P7,523! → 523 Hz for 70 ms.
    bird.handle(&mut board, &frame(Link::Primary, '@', 'P', 7, 523));

    assert_eq!(board.take_effects(), vec![Effect::Tone(523, 70)]);
    assert_eq!(board.now_ms() - before, 70);
}

#[test]
fn test_light_readback_reports_settled_values() {
    let mut board = SimBoard::new();
    board.light[0].set(420);
    board.light[1].set(180);
    let mut bird = booted_bird(&mut board);

    let left = bird
        .handle(&mut board, &frame(Link::Primary, '@', 'I', 0, 0))
        .unwrap();
    assert_eq!(wire(&left), "#I0,420!");

    let right = bird
        .handle(&mut board, &frame(Link::Secondary, '@', 'J', 0, 0))
        .unwrap();
    assert_eq!(right.value, 180);
    assert_eq!(right.link, Link::Secondary);
}

// ── Configuration commands ───────────────────────────────────────────────────

#[test]
fn test_calibration_keys_cover_all_slots() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    // ^E0..^E11 set home/pose_a/pose_b for the four servos in order.
    for key in 0..12u8 {
        bird.handle(&mut board, &frame(Link::Primary, '^', 'E', key, 200 + key as u16));
    }

    let order = [Servo::Rotation, Servo::Beak, Servo::RightWing, Servo::LeftWing];
    for (i, servo) in order.iter().enumerate() {
        let cal = bird.motion.cal(*servo);
        assert_eq!(cal.home, 200 + i as u8);
        assert_eq!(cal.pose_a, 204 + i as u8);
        assert_eq!(cal.pose_b, 208 + i as u8);
    }
}

#[test]
fn test_save_commands_persist_current_values() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);

    bird.handle(&mut board, &frame(Link::Primary, '@', 'V', 1, 33));
    bird.handle(&mut board, &frame(Link::Primary, '@', 'X', 1, 44));
    bird.handle(&mut board, &frame(Link::Primary, '@', 'E', 0, 5));

    bird.handle(&mut board, &frame(Link::Primary, '^', 'E', 12, 0)); // save mood
    bird.handle(&mut board, &frame(Link::Primary, '^', 'E', 13, 0)); // save state
    bird.handle(&mut board, &frame(Link::Primary, '^', 'E', 14, 0)); // save colour

    // Reboot on the same store: everything comes back.
    let mut rebooted = Brrd::new();
    rebooted.enable_light_sensors(false);
    rebooted.init(&mut board);

    assert_eq!(rebooted.emotes.happy(), 33);
    assert_eq!(rebooted.emotes.food(), 44);
    assert_eq!(rebooted.eyes.rgb()[0], 5);
}

// ── Permissive no-op policy ──────────────────────────────────────────────────

#[test]
fn test_unknown_frames_do_nothing() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    let happy_before = bird.emotes.happy();

    let unknowns = [
        frame(Link::Primary, '&', 'S', 0, 0), // reserved class
        frame(Link::Primary, '?', 'S', 0, 0), // unknown class
        frame(Link::Primary, '@', 'Q', 1, 99), // unknown control command
        frame(Link::Primary, '#', 'S', 42, 0), // unknown gesture key
        frame(Link::Primary, '^', 'Z', 0, 0), // unknown config command
        frame(Link::Primary, '^', 'E', 200, 0), // unknown config key
    ];
    for msg in &unknowns {
        assert_eq!(bird.handle(&mut board, msg), None);
    }

    assert!(board.take_effects().is_empty());
    assert_eq!(bird.emotes.happy(), happy_before);
}

// ── Update tick behaviour ────────────────────────────────────────────────────

#[test]
fn test_idle_sweep_over_the_update_loop() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    bird.enable_light_sensors(false);

    // A raw move leaves the wing attached (auto-detach is off by default).
    bird.handle(&mut board, &frame(Link::Primary, '@', 'L', 10, 30));
    assert!(bird.motion.is_attached(Servo::LeftWing));

    board.advance(2_999);
    bird.update(&mut board, &mut ());
    assert!(bird.motion.is_attached(Servo::LeftWing), "2 999 ms idle: still held");

    board.advance(2);
    bird.update(&mut board, &mut ());
    assert!(!bird.motion.is_attached(Servo::LeftWing), "3 001 ms idle: released");
}

#[test]
fn test_auto_save_over_the_update_loop() {
    let mut board = SimBoard::new();
    let mut bird = booted_bird(&mut board);
    bird.enable_light_sensors(false);
    bird.emotes.set_auto_save(true);

    bird.handle(&mut board, &frame(Link::Primary, '@', 'V', 1, 77));

    board.advance(120_001);
    bird.update(&mut board, &mut ());

    let mut rebooted = Brrd::new();
    rebooted.enable_light_sensors(false);
    rebooted.init(&mut board);
    assert_eq!(rebooted.emotes.happy(), 77, "auto-save persisted the new mood");
}
