//! # Simulated bird session
//!
//! Boots the firmware on a printing board, drives it through a scripted
//! serial session (moods, gestures, calibration), then dims the virtual room
//! until the dark trigger fires. Time is manual, so the whole session runs
//! instantly while preserving every blocking delay in the log.
//!
//! Run with:
//!
//! ```text
//! cargo run --example simulation --features std
//! RUST_LOG=debug cargo run --example simulation --features std
//! ```

use std::cell::Cell;

use brrd_core::board::{Clock, EyeLeds, LightSensors, ServoBank, Speaker};
use brrd_core::brrd::Brrd;
use brrd_core::light::{LightChannel, LightEvents};
use brrd_core::motion::Servo;
use brrd_core::protocol::{Link, Message};
use brrd_core::store::{NvStore, RamStore};

// ── Printing board ───────────────────────────────────────────────────────────

struct PrintBoard {
    now: Cell<u64>,
    light: [Cell<u16>; 2],
    store: RamStore,
}

impl PrintBoard {
    fn new() -> Self {
        Self {
            now: Cell::new(0),
            light: [Cell::new(430), Cell::new(410)],
            store: RamStore::new(),
        }
    }

    fn set_light(&self, left: u16, right: u16) {
        self.light[0].set(left);
        self.light[1].set(right);
    }
}

impl Clock for PrintBoard {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.now.set(self.now.get() + ms as u64);
    }
}

impl ServoBank for PrintBoard {
    fn write(&mut self, servo: Servo, angle: u8) {
        println!("  [{:>7}ms] servo {:?} -> {}", self.now.get(), servo, angle);
    }

    fn attach(&mut self, servo: Servo) {
        println!("  [{:>7}ms] servo {:?} attached", self.now.get(), servo);
    }

    fn detach(&mut self, servo: Servo) {
        println!("  [{:>7}ms] servo {:?} detached", self.now.get(), servo);
    }
}

impl LightSensors for PrintBoard {
    fn read(&mut self, channel: LightChannel) -> u16 {
        self.light[channel.index()].get()
    }
}

impl EyeLeds for PrintBoard {
    fn write(&mut self, r: u8, g: u8, b: u8) {
        println!("  [{:>7}ms] eyes #{:02x}{:02x}{:02x}", self.now.get(), r, g, b);
    }
}

impl Speaker for PrintBoard {
    fn tone(&mut self, freq_hz: u16, duration_ms: u16) {
        println!(
            "  [{:>7}ms] tone {} Hz for {} ms",
            self.now.get(),
            freq_hz,
            duration_ms
        );
        self.now.set(self.now.get() + duration_ms as u64);
    }
}

impl NvStore for PrintBoard {
    fn read(&self, addr: u8) -> u8 {
        self.store.read(addr)
    }

    fn write(&mut self, addr: u8, value: u8) {
        self.store.write(addr, value);
    }
}

// ── Trigger reporter ─────────────────────────────────────────────────────────

struct Reporter;

impl LightEvents for Reporter {
    fn on_dark(&mut self, channel: LightChannel) {
        println!("  !! dark trigger on {:?}", channel);
    }

    fn on_bright(&mut self, channel: LightChannel) {
        println!("  !! bright trigger on {:?}", channel);
    }
}

// ── Session script ───────────────────────────────────────────────────────────

fn section(title: &str) {
    println!("\n== {} ==", title);
}

fn send(bird: &mut Brrd, board: &mut PrintBoard, msg: Message) {
    println!("  >> {}", msg);
    if let Some(response) = bird.handle(board, &msg) {
        println!("  << {}", response);
    }
}

fn main() {
    env_logger::init();

    let mut board = PrintBoard::new();
    let mut bird = Brrd::new();

    section("boot (factory-blank store)");
    bird.init(&mut board);
    println!(
        "  calibrated: settled L {} / R {}",
        bird.light.settled(LightChannel::Left),
        bird.light.settled(LightChannel::Right)
    );

    section("serial session");
    let frames = [
        Message::new(Link::Primary, '@', 'V', 0, 0),    // get happy
        Message::new(Link::Primary, '@', 'V', 1, 95),   // very happy now
        Message::new(Link::Primary, '@', 'V', 0, 0),    // read it back
        Message::new(Link::Primary, '@', 'F', 0, 90),   // hue to green
        Message::new(Link::Secondary, '#', 'O', 1, 1),  // opposed wing wave
        Message::new(Link::Secondary, '#', 'B', 4, 0),  // beak laugh
        Message::new(Link::Primary, '^', 'E', 0, 85),   // recalibrate rotation home
        Message::new(Link::Primary, '^', 'E', 12, 0),   // save mood
        Message::new(Link::Primary, '@', 'I', 0, 0),    // read left light
    ];
    for msg in frames {
        send(&mut bird, &mut board, msg);
    }

    section("idle release");
    board.sleep_ms(3_100);
    bird.update(&mut board, &mut Reporter);
    println!(
        "  rotation attached: {}",
        bird.motion.is_attached(Servo::Rotation)
    );

    section("settling");
    // Run one quiet window at the boot light level so the trigger
    // thresholds bracket the current room instead of the pre-boot zeroes.
    for _ in 0..10 {
        board.sleep_ms(250);
        bird.update(&mut board, &mut ());
    }
    println!(
        "  thresholds: dark <{} / bright >{}",
        bird.light.dark_threshold(LightChannel::Left),
        bird.light.bright_threshold(LightChannel::Left)
    );

    section("dusk falls");
    // Step the room darker slowly enough to pass the delta interlock, then
    // let the next window complete against the settled thresholds.
    let mut level = 430u16;
    for _ in 0..12 {
        level = level.saturating_sub(70);
        board.set_light(level, level.saturating_sub(20));
        board.sleep_ms(250);
        bird.update(&mut board, &mut Reporter);
    }
    println!(
        "  settled L {} / R {} (dark below {})",
        bird.light.settled(LightChannel::Left),
        bird.light.settled(LightChannel::Right),
        bird.light.dark_threshold(LightChannel::Left)
    );

    println!("\ndone — one simulated session, zero real milliseconds.");
}
