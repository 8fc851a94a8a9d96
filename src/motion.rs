/*
 * Copyright (c) Flout Labs.
 * Licensed under the MIT License.
 */

//! Actuator motion tracking — calibration triples, attach bookkeeping,
//! blocking moves, idle release, and the canned gesture repertoire.
//!
//! Each of the four servos carries a calibrated triple `[home, pose_a,
//! pose_b]` loaded from the store at boot and written through on every
//! calibration change. Moves are blocking: the settle delay is a hardware
//! constraint of the pulse driver (no completion signal), and the gesture
//! sequences depend on that strict ordering.
//!
//! Attach state is purely in-memory. With auto-detach enabled, every move
//! brackets itself with an attach/detach pair so the servo drops holding
//! torque (less jitter, less power) at the cost of per-move latency; either
//! way, [`MotionTracker::sweep_idle`] releases any servo that has not moved
//! for [`IDLE_DETACH_MS`].

use heapless::Deque;

use crate::board::{Clock, ServoBank};
use crate::store::{servo_cal_addr, NvStore};

// ─── Servo identity ─────────────────────────────────────────────────────────

/// One of the four positional actuators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Servo {
    /// Body rotation. Poses: home, left, right.
    Rotation,
    /// Beak. Poses: home, open, closed.
    Beak,
    /// Right wing. Poses: home, up, down.
    RightWing,
    /// Left wing. Poses: home, up, down.
    LeftWing,
}

impl Servo {
    /// All four servos, in address-map order.
    pub const ALL: [Servo; 4] = [
        Servo::Rotation,
        Servo::Beak,
        Servo::RightWing,
        Servo::LeftWing,
    ];

    /// Stable index into per-servo arrays (address-map order).
    pub const fn index(self) -> usize {
        match self {
            Servo::Rotation => 0,
            Servo::Beak => 1,
            Servo::RightWing => 2,
            Servo::LeftWing => 3,
        }
    }
}

/// Calibrated positions for one servo.
///
/// The semantic meaning of `pose_a`/`pose_b` depends on the servo: left/right
/// for rotation, open/closed for the beak, up/down for the wings. Angles are
/// raw 8-bit values; no range validation is applied (caller responsibility —
/// the owner calibrates against their own build of the hardware).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoCal {
    /// Resting position.
    pub home: u8,
    /// First extreme (left / open / up).
    pub pose_a: u8,
    /// Second extreme (right / closed / down).
    pub pose_b: u8,
}

// ─── Tracker ────────────────────────────────────────────────────────────────

/// Idle time after which an attached servo is released by the sweep.
pub const IDLE_DETACH_MS: u64 = 3_000;

/// Number of entries kept in the recently-moved ring.
pub const RECENT_SLOTS: usize = 5;

/// Owns calibration, attach state and move recency for all four servos.
///
/// The tracker is pure state; every hardware effect goes through the
/// `ServoBank`/`Clock` capabilities passed into the method that needs them.
#[derive(Debug)]
pub struct MotionTracker {
    cal: [ServoCal; 4],
    attached: [bool; 4],
    last_move_ms: [u64; 4],
    last_pos: [u8; 4],
    recent: Deque<Servo, RECENT_SLOTS>,
    auto_detach: bool,
}

impl MotionTracker {
    /// Construct a tracker with zeroed calibration and all servos detached.
    ///
    /// Call [`load_cal`](Self::load_cal) before moving anything.
    pub fn new() -> Self {
        Self {
            cal: [ServoCal::default(); 4],
            attached: [false; 4],
            last_move_ms: [0; 4],
            last_pos: [0; 4],
            recent: Deque::new(),
            auto_detach: false,
        }
    }

    // ── Calibration ────────────────────────────────────────────────────────

    /// Load all four calibration triples from the store.
    ///
    /// Keeping a RAM copy means a blown store cell degrades one boot's poses
    /// rather than forcing a store read on every move.
    pub fn load_cal<S: NvStore + ?Sized>(&mut self, store: &S) {
        for servo in Servo::ALL {
            let addrs = servo_cal_addr(servo);
            self.cal[servo.index()] = ServoCal {
                home: store.read(addrs[0]),
                pose_a: store.read(addrs[1]),
                pose_b: store.read(addrs[2]),
            };
        }
        log::debug!("servo calibration loaded from store");
    }

    /// Current calibration triple for `servo`.
    pub fn cal(&self, servo: Servo) -> ServoCal {
        self.cal[servo.index()]
    }

    /// Overwrite the whole triple for `servo`, writing through to the store.
    pub fn set_cal<S: NvStore + ?Sized>(&mut self, store: &mut S, servo: Servo, cal: ServoCal) {
        let addrs = servo_cal_addr(servo);
        store.write(addrs[0], cal.home);
        store.write(addrs[1], cal.pose_a);
        store.write(addrs[2], cal.pose_b);
        self.cal[servo.index()] = cal;
    }

    /// Set the home position for `servo`, writing through to the store.
    pub fn set_home<S: NvStore + ?Sized>(&mut self, store: &mut S, servo: Servo, pos: u8) {
        store.write(servo_cal_addr(servo)[0], pos);
        self.cal[servo.index()].home = pos;
    }

    /// Set the first extreme for `servo`, writing through to the store.
    pub fn set_pose_a<S: NvStore + ?Sized>(&mut self, store: &mut S, servo: Servo, pos: u8) {
        store.write(servo_cal_addr(servo)[1], pos);
        self.cal[servo.index()].pose_a = pos;
    }

    /// Set the second extreme for `servo`, writing through to the store.
    pub fn set_pose_b<S: NvStore + ?Sized>(&mut self, store: &mut S, servo: Servo, pos: u8) {
        store.write(servo_cal_addr(servo)[2], pos);
        self.cal[servo.index()].pose_b = pos;
    }

    // ── Attach state ───────────────────────────────────────────────────────

    /// Whether auto-detach mode is on.
    pub fn auto_detach(&self) -> bool {
        self.auto_detach
    }

    /// Enable or disable auto-detach. Releases all servos either way, so the
    /// next move starts from a known detached state.
    pub fn set_auto_detach<B: ServoBank + ?Sized>(&mut self, bank: &mut B, on: bool) {
        self.auto_detach = on;
        self.detach_all(bank);
    }

    /// Whether `servo` currently holds torque.
    pub fn is_attached(&self, servo: Servo) -> bool {
        self.attached[servo.index()]
    }

    /// Engage `servo`. No-op if already attached.
    pub fn attach<B: ServoBank + ?Sized>(&mut self, bank: &mut B, servo: Servo) {
        if !self.attached[servo.index()] {
            bank.attach(servo);
            self.attached[servo.index()] = true;
        }
    }

    /// Release `servo`. No-op if already detached.
    pub fn detach<B: ServoBank + ?Sized>(&mut self, bank: &mut B, servo: Servo) {
        if self.attached[servo.index()] {
            bank.detach(servo);
            self.attached[servo.index()] = false;
        }
    }

    /// Engage all four servos.
    pub fn attach_all<B: ServoBank + ?Sized>(&mut self, bank: &mut B) {
        for servo in Servo::ALL {
            self.attach(bank, servo);
        }
    }

    /// Release all four servos.
    pub fn detach_all<B: ServoBank + ?Sized>(&mut self, bank: &mut B) {
        for servo in Servo::ALL {
            self.detach(bank, servo);
        }
    }

    /// Release any servo that has not moved for [`IDLE_DETACH_MS`].
    ///
    /// Called once per update tick.
    pub fn sweep_idle<B: ServoBank + ?Sized>(&mut self, bank: &mut B, now_ms: u64) {
        for servo in Servo::ALL {
            let idle = now_ms.saturating_sub(self.last_move_ms[servo.index()]);
            if self.attached[servo.index()] && idle >= IDLE_DETACH_MS {
                log::debug!("idle sweep releasing {:?} after {} ms", servo, idle);
                self.detach(bank, servo);
            }
        }
    }

    // ── Moves ──────────────────────────────────────────────────────────────

    /// Move `servo` to `pos`, blocking for `settle_ms`.
    ///
    /// With auto-detach on, the move brackets itself with attach/detach.
    /// Always records the move time, the commanded position, and pushes the
    /// servo onto the front of the recency ring.
    pub fn move_to<B: ServoBank + Clock + ?Sized>(
        &mut self,
        board: &mut B,
        servo: Servo,
        pos: u8,
        settle_ms: u16,
    ) {
        if self.auto_detach {
            self.attach(board, servo);
        }

        board.write(servo, pos);
        board.sleep_ms(settle_ms as u32);

        if self.auto_detach {
            self.detach(board, servo);
        }

        self.record(board.now_ms(), servo, pos);
    }

    /// Move both wings in one bracketed step: two writes, one settle delay.
    ///
    /// Both wings share the bookkeeping update (right first, then left), so a
    /// composite counts as one move per wing in the recency ring.
    pub fn move_wings<B: ServoBank + Clock + ?Sized>(
        &mut self,
        board: &mut B,
        right_pos: u8,
        left_pos: u8,
        settle_ms: u16,
    ) {
        if self.auto_detach {
            self.attach(board, Servo::RightWing);
            self.attach(board, Servo::LeftWing);
        }

        board.write(Servo::RightWing, right_pos);
        board.write(Servo::LeftWing, left_pos);
        board.sleep_ms(settle_ms as u32);

        if self.auto_detach {
            self.detach(board, Servo::RightWing);
            self.detach(board, Servo::LeftWing);
        }

        let now = board.now_ms();
        self.record(now, Servo::RightWing, right_pos);
        self.record(now, Servo::LeftWing, left_pos);
    }

    /// Move all four servos to their home poses (50 ms settle each).
    pub fn home_all<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        for servo in Servo::ALL {
            let home = self.cal[servo.index()].home;
            self.move_to(board, servo, home, 50);
        }
    }

    /// Last commanded position for `servo`.
    pub fn last_position(&self, servo: Servo) -> u8 {
        self.last_pos[servo.index()]
    }

    /// Timestamp of the last move of `servo` (0 if never moved).
    pub fn last_move_ms(&self, servo: Servo) -> u64 {
        self.last_move_ms[servo.index()]
    }

    /// The recently-moved servos, most recent first (up to [`RECENT_SLOTS`]).
    pub fn recent(&self) -> impl Iterator<Item = Servo> + '_ {
        self.recent.iter().copied()
    }

    fn record(&mut self, now_ms: u64, servo: Servo, pos: u8) {
        self.last_move_ms[servo.index()] = now_ms;
        self.last_pos[servo.index()] = pos;
        if self.recent.is_full() {
            let _ = self.recent.pop_back();
        }
        let _ = self.recent.push_front(servo);
    }
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Gestures ───────────────────────────────────────────────────────────────
//
// Fixed sequences of timed moves. Offsets and settle times are tuned to the
// original hardware; nothing here is independently stateful.

impl MotionTracker {
    /// Open the beak.
    pub fn beak_open<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        self.move_to(board, Servo::Beak, self.cal(Servo::Beak).pose_a, 100);
    }

    /// Close the beak.
    pub fn beak_close<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        self.move_to(board, Servo::Beak, self.cal(Servo::Beak).pose_b, 100);
    }

    /// Return the beak to its home pose.
    pub fn beak_home<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        self.move_to(board, Servo::Beak, self.cal(Servo::Beak).home, 100);
    }

    /// Two quick open/close snips.
    pub fn beak_snip<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        for _ in 0..2 {
            self.beak_open(board);
            self.beak_close(board);
        }
    }

    /// Three open/close cycles with a short close — reads as a chuckle.
    pub fn beak_laugh<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        let cal = self.cal(Servo::Beak);
        for _ in 0..3 {
            self.move_to(board, Servo::Beak, cal.pose_a, 100);
            self.move_to(board, Servo::Beak, cal.pose_b, 50);
        }
    }

    /// Move the beak to a raw position.
    pub fn beak_pos<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, pos: u8) {
        self.move_to(board, Servo::Beak, pos, 100);
    }

    /// Rotate to the calibrated left pose.
    pub fn rotate_left<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        self.move_to(board, Servo::Rotation, self.cal(Servo::Rotation).pose_a, 200);
    }

    /// Rotate to the calibrated right pose.
    pub fn rotate_right<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        self.move_to(board, Servo::Rotation, self.cal(Servo::Rotation).pose_b, 200);
    }

    /// Rotate back to centre.
    pub fn rotate_home<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        self.move_to(board, Servo::Rotation, self.cal(Servo::Rotation).home, 150);
    }

    /// Four full left/right shakes, then home.
    pub fn shake<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        let cal = self.cal(Servo::Rotation);
        for _ in 0..4 {
            self.move_to(board, Servo::Rotation, cal.pose_a, 300);
            self.move_to(board, Servo::Rotation, cal.pose_b, 300);
        }
        self.move_to(board, Servo::Rotation, cal.home, 150);
    }

    /// Bounce at each rotation extreme with a 20-step overshoot, then home.
    pub fn rotate_bounce<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B) {
        let cal = self.cal(Servo::Rotation);

        let boing_a = if cal.pose_a < cal.home {
            cal.pose_a.saturating_add(20)
        } else {
            cal.pose_a.saturating_sub(20)
        };
        let boing_b = if cal.pose_b > cal.home {
            cal.pose_b.saturating_sub(20)
        } else {
            cal.pose_b.saturating_add(20)
        };

        self.move_to(board, Servo::Rotation, cal.pose_a, 300);
        for _ in 0..3 {
            self.move_to(board, Servo::Rotation, boing_a, 50);
            self.move_to(board, Servo::Rotation, cal.pose_a, 50);
        }

        self.move_to(board, Servo::Rotation, cal.pose_b, 300);
        for _ in 0..3 {
            self.move_to(board, Servo::Rotation, boing_b, 50);
            self.move_to(board, Servo::Rotation, cal.pose_b, 50);
        }

        self.move_to(board, Servo::Rotation, cal.home, 150);
    }

    /// Rotate to a raw position.
    pub fn rotate_pos<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, pos: u8) {
        self.move_to(board, Servo::Rotation, pos, 100);
    }

    /// Raise one wing to its calibrated up pose.
    pub fn wing_up<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, wing: Servo) {
        let settle = if wing == Servo::LeftWing { 50 } else { 100 };
        self.move_to(board, wing, self.cal(wing).pose_a, settle);
    }

    /// Lower one wing to its calibrated down pose.
    pub fn wing_down<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, wing: Servo) {
        let settle = if wing == Servo::LeftWing { 50 } else { 100 };
        self.move_to(board, wing, self.cal(wing).pose_b, settle);
    }

    /// Return one wing to its home pose.
    pub fn wing_home<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, wing: Servo) {
        let settle = if wing == Servo::LeftWing { 50 } else { 100 };
        self.move_to(board, wing, self.cal(wing).home, settle);
    }

    /// Three up/down flaps, then home.
    pub fn wing_wave<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, wing: Servo) {
        let cal = self.cal(wing);
        for _ in 0..3 {
            self.move_to(board, wing, cal.pose_a, 150);
            self.move_to(board, wing, cal.pose_b, 150);
        }
        self.move_to(board, wing, cal.home, 80);
    }

    /// Three quick flutters around the down pose, then home.
    pub fn wing_gust<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, wing: Servo) {
        let cal = self.cal(wing);
        let gust = gust_offset(cal);
        for _ in 0..3 {
            self.move_to(board, wing, cal.pose_b, 50);
            self.move_to(board, wing, gust, 50);
        }
        self.move_to(board, wing, cal.home, 80);
    }

    /// Move one wing to a raw position.
    pub fn wing_pos<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, wing: Servo, pos: u8) {
        self.move_to(board, wing, pos, 80);
    }

    /// Raise (`up == true`) or lower both wings together.
    pub fn both_wings_up<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, up: bool) {
        let right = self.cal(Servo::RightWing);
        let left = self.cal(Servo::LeftWing);
        if up {
            self.move_wings(board, right.pose_a, left.pose_a, 150);
        } else {
            self.move_wings(board, right.pose_b, left.pose_b, 150);
        }
    }

    /// Four flap cycles with both wings, then home.
    ///
    /// `opposed == false` flaps both wings together; `opposed == true`
    /// alternates them (right up while left down).
    pub fn both_wings_wave<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, opposed: bool) {
        let right = self.cal(Servo::RightWing);
        let left = self.cal(Servo::LeftWing);

        if self.auto_detach {
            self.attach(board, Servo::RightWing);
            self.attach(board, Servo::LeftWing);
        }

        for _ in 0..4 {
            if opposed {
                wing_write_pair(board, right.pose_a, left.pose_b, 150);
                wing_write_pair(board, right.pose_b, left.pose_a, 150);
            } else {
                wing_write_pair(board, right.pose_a, left.pose_a, 150);
                wing_write_pair(board, right.pose_b, left.pose_b, 150);
            }
        }

        wing_write_pair(board, right.home, left.home, 80);

        if self.auto_detach {
            self.detach(board, Servo::RightWing);
            self.detach(board, Servo::LeftWing);
        }

        let now = board.now_ms();
        self.record(now, Servo::RightWing, right.home);
        self.record(now, Servo::LeftWing, left.home);
    }

    /// Three flutter cycles around both down poses, then home.
    ///
    /// Same `opposed` convention as [`both_wings_wave`](Self::both_wings_wave).
    pub fn both_wings_gust<B: ServoBank + Clock + ?Sized>(&mut self, board: &mut B, opposed: bool) {
        let right = self.cal(Servo::RightWing);
        let left = self.cal(Servo::LeftWing);
        let gust_r = gust_offset(right);
        let gust_l = gust_offset(left);

        if self.auto_detach {
            self.attach(board, Servo::RightWing);
            self.attach(board, Servo::LeftWing);
        }

        for _ in 0..3 {
            if opposed {
                wing_write_pair(board, gust_r, left.pose_b, 50);
                wing_write_pair(board, right.pose_b, gust_l, 50);
            } else {
                wing_write_pair(board, right.pose_b, left.pose_b, 50);
                wing_write_pair(board, gust_r, gust_l, 50);
            }
        }

        wing_write_pair(board, right.home, left.home, 80);

        if self.auto_detach {
            self.detach(board, Servo::RightWing);
            self.detach(board, Servo::LeftWing);
        }

        let now = board.now_ms();
        self.record(now, Servo::RightWing, right.home);
        self.record(now, Servo::LeftWing, left.home);
    }
}

/// Flutter overshoot: 20 steps beyond the down pose, away from home.
fn gust_offset(cal: ServoCal) -> u8 {
    if cal.pose_b < cal.home {
        cal.pose_b.saturating_add(20)
    } else {
        cal.pose_b.saturating_sub(20)
    }
}

/// One raw two-wing step: both writes, then a single settle delay.
fn wing_write_pair<B: ServoBank + Clock + ?Sized>(board: &mut B, right: u8, left: u8, settle_ms: u16) {
    board.write(Servo::RightWing, right);
    board.write(Servo::LeftWing, left);
    board.sleep_ms(settle_ms as u32);
}

// ─── Tests ──────────────────────────────────────────────────────────────────
