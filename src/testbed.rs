//! Shared test rig: a scripted board that records every hardware effect.
//!
//! The rig implements every board capability, so it satisfies the `Board`
//! blanket impl. Time is a [`ManualClock`]-style counter that `sleep_ms`
//! advances, which lets tests assert the exact ordering and duration of
//! blocking sequences without real elapsed time.

use core::cell::{Cell, RefCell};

use heapless::Vec;

use crate::board::{Clock, EyeLeds, LightSensors, ServoBank, Speaker};
use crate::light::LightChannel;
use crate::motion::Servo;
use crate::store::{NvStore, RamStore};

/// One recorded hardware effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Act {
    Write(Servo, u8),
    Attach(Servo),
    Detach(Servo),
    Sleep(u32),
    Led(u8, u8, u8),
    Tone(u16, u16),
}

/// Recording board: manual time, scripted light readings, RAM store.
pub(crate) struct Rig {
    now: Cell<u64>,
    log: RefCell<Vec<Act, 256>>,
    light: [Cell<u16>; 2],
    pub(crate) store: RamStore,
}

impl Rig {
    pub(crate) fn new() -> Self {
        Self {
            now: Cell::new(0),
            log: RefCell::new(Vec::new()),
            light: [Cell::new(0), Cell::new(0)],
            store: RamStore::new(),
        }
    }

    /// A rig whose store is already seeded with factory defaults.
    pub(crate) fn seeded() -> Self {
        let mut rig = Self::new();
        crate::store::seed_if_unset(&mut rig.store);
        rig
    }

    /// Drain and return everything recorded so far.
    pub(crate) fn take_log(&mut self) -> Vec<Act, 256> {
        core::mem::take(&mut *self.log.borrow_mut())
    }

    /// Script the next raw readings for both light channels.
    pub(crate) fn set_light(&self, left: u16, right: u16) {
        self.light[0].set(left);
        self.light[1].set(right);
    }

    /// Jump the clock forward without recording a sleep.
    pub(crate) fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    fn push(&self, act: Act) {
        let _ = self.log.borrow_mut().push(act);
    }
}

impl Clock for Rig {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.push(Act::Sleep(ms));
        self.now.set(self.now.get() + ms as u64);
    }
}

impl ServoBank for Rig {
    fn write(&mut self, servo: Servo, angle: u8) {
        self.push(Act::Write(servo, angle));
    }

    fn attach(&mut self, servo: Servo) {
        self.push(Act::Attach(servo));
    }

    fn detach(&mut self, servo: Servo) {
        self.push(Act::Detach(servo));
    }
}

impl LightSensors for Rig {
    fn read(&mut self, channel: LightChannel) -> u16 {
        self.light[channel.index()].get()
    }
}

impl EyeLeds for Rig {
    fn write(&mut self, r: u8, g: u8, b: u8) {
        self.push(Act::Led(r, g, b));
    }
}

impl Speaker for Rig {
    fn tone(&mut self, freq_hz: u16, duration_ms: u16) {
        self.push(Act::Tone(freq_hz, duration_ms));
        self.now.set(self.now.get() + duration_ms as u64);
    }
}

impl NvStore for Rig {
    fn read(&self, addr: u8) -> u8 {
        self.store.read(addr)
    }

    fn write(&mut self, addr: u8, value: u8) {
        self.store.write(addr, value);
    }
}
