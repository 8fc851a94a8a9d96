/*
 * Copyright (c) Flout Labs.
 * Licensed under the MIT License.
 */

//! The bird itself — one aggregate owning every subsystem, with the boot
//! sequence, the periodic update tick, and the serial command dispatcher.
//!
//! [`Brrd`] is pure state; all hardware flows through the [`Board`] passed
//! into each method. Dispatch is strictly serial: each [`Message`] is handled
//! to completion (including any blocking moves it triggers) before the next,
//! regardless of which link it arrived on, and produces at most one response
//! on the same link.

use crate::board::{Board, Clock, Speaker};
use crate::emote::{fold_high_byte, Emotes};
use crate::eyes::{Eyes, HUE_BLUE};
use crate::light::{LightChannel, LightEngine, LightEvents};
use crate::motion::{MotionTracker, Servo};
use crate::protocol::{Message, ACTION_CONFIG, ACTION_CONTROL, ACTION_MOVEMENT, ACTION_RESERVED};
use crate::store;

/// Servo order used by the `^E` calibration keys.
const CONFIG_SERVO_ORDER: [Servo; 4] = [
    Servo::Rotation,
    Servo::Beak,
    Servo::RightWing,
    Servo::LeftWing,
];

/// The whole bird: motion tracker, light engine, emote ledger, eyes.
///
/// Construct with [`new`](Self::new), then run [`init`](Self::init) once with
/// the board before anything else. Afterwards, call [`update`](Self::update)
/// from the main loop and [`handle`](Self::handle) for every decoded frame
/// the transports deliver.
#[derive(Debug)]
pub struct Brrd {
    /// Actuator calibration, attach state and gestures.
    pub motion: MotionTracker,
    /// Ambient-light calibration and triggers.
    pub light: LightEngine,
    /// The five emotion scalars.
    pub emotes: Emotes,
    /// Eye colour state.
    pub eyes: Eyes,
    light_enabled: bool,
}

impl Default for Brrd {
    fn default() -> Self {
        Self::new()
    }
}

impl Brrd {
    /// Construct an uninitialised bird with light sensing enabled.
    pub fn new() -> Self {
        Self {
            motion: MotionTracker::new(),
            light: LightEngine::new(),
            emotes: Emotes::new(),
            eyes: Eyes::new(),
            light_enabled: true,
        }
    }

    /// Enable or disable the light subsystem (sampling, triggers, and the
    /// startup calibration loop).
    pub fn enable_light_sensors(&mut self, on: bool) {
        self.light_enabled = on;
    }

    /// Whether the light subsystem is enabled.
    pub fn light_sensors_enabled(&self) -> bool {
        self.light_enabled
    }

    // ── Boot ───────────────────────────────────────────────────────────────

    /// Full boot sequence.
    ///
    /// Seeds the store on first-ever boot, loads calibration and emotes
    /// (with the boot treat), blocks on the first light window when sensing
    /// is enabled, engages and homes all servos, shows the default eye
    /// colour, and chirps.
    pub fn init<B: Board>(&mut self, board: &mut B) {
        log::info!("beginning initialisation");

        store::seed_if_unset(board);

        self.motion.load_cal(board);
        self.emotes.load(board);

        if self.light_enabled {
            self.calibrate_light_blocking(board);
        }

        // Later moves assume a known attached state to bracket against.
        self.motion.attach_all(board);
        self.motion.home_all(board);

        self.eyes.load_default(board);
        self.startup_chirp(board);

        log::info!("initialisation complete");
    }

    /// Block until the light engine completes its first window, blinking the
    /// eyes as a progress indicator.
    fn calibrate_light_blocking<B: Board>(&mut self, board: &mut B) {
        log::info!("calibrating light sensors");

        let mut blink = false;
        while !self.light.is_calibrated() {
            let now = board.now_ms();
            self.light.sample(board, now);

            let intensity = if blink { 1.0 } else { 0.8 };
            self.eyes.set_hsi(board, HUE_BLUE, 0.0, intensity);
            blink = !blink;

            board.sleep_ms(100);
        }
    }

    /// The three-note boot jingle, five times over.
    pub fn startup_chirp<B: Speaker + Clock + ?Sized>(&self, board: &mut B) {
        for _ in 0..5 {
            board.tone(260, 70);
            board.tone(280, 70);
            board.tone(300, 70);
            board.sleep_ms(100);
        }
    }

    // ── Periodic tick ──────────────────────────────────────────────────────

    /// One cooperative update tick: light sampling and triggers, the emote
    /// auto-save check, and the idle-detach sweep.
    pub fn update<B: Board, E: LightEvents + ?Sized>(&mut self, board: &mut B, events: &mut E) {
        if self.light_enabled {
            let now = board.now_ms();
            self.light.sample(board, now);
            self.light.evaluate(events);
        }

        let now = board.now_ms();
        self.emotes.tick(board, now);
        self.motion.sweep_idle(board, now);
    }

    // ── Dispatch ───────────────────────────────────────────────────────────

    /// Handle one decoded frame; returns the response to transmit, if any.
    ///
    /// Unknown action/command/key combinations are no-ops: no response, no
    /// state change. The returned message carries the originating link.
    pub fn handle<B: Board>(&mut self, board: &mut B, msg: &Message) -> Option<Message> {
        log::debug!("dispatch {} from {:?}", msg, msg.link);

        match msg.action {
            ACTION_CONTROL => self.handle_control(board, msg),
            ACTION_MOVEMENT => {
                self.handle_movement(board, msg);
                None
            }
            ACTION_CONFIG => {
                self.handle_config(board, msg);
                None
            }
            ACTION_RESERVED => None, // reserved for app-specific extensions
            other => {
                log::debug!("unknown action {:?}", other);
                None
            }
        }
    }

    /// `@` — device control: raw servo moves, eyes, speaker, read-backs,
    /// emote get/set.
    fn handle_control<B: Board>(&mut self, board: &mut B, msg: &Message) -> Option<Message> {
        let settle = msg.key as u16 * 10;

        match msg.command {
            'S' => self.motion.move_to(board, Servo::Rotation, msg.value as u8, settle),
            'B' => self.motion.move_to(board, Servo::Beak, msg.value as u8, settle),
            'R' => self.motion.move_to(board, Servo::RightWing, msg.value as u8, settle),
            'L' => self.motion.move_to(board, Servo::LeftWing, msg.value as u8, settle),

            'E' => {
                let [r, g, b] = self.eyes.rgb();
                let v = msg.value as u8;
                match msg.key {
                    0 => self.eyes.set_rgb(board, v, g, b),
                    1 => self.eyes.set_rgb(board, r, v, b),
                    2 => self.eyes.set_rgb(board, r, g, v),
                    _ => {}
                }
            }

            'F' => {
                let [h, s, i] = self.eyes.hsi();
                match msg.key {
                    0 => self.eyes.set_hsi(board, msg.value as f32, s, i),
                    1 => self.eyes.set_hsi(board, h, msg.value as f32 / 100.0, i),
                    2 => self.eyes.set_hsi(board, h, s, msg.value as f32 / 100.0),
                    _ => {}
                }
            }

            'P' => board.tone(msg.value, settle),

            'I' => return Some(msg.response('I', self.light.settled(LightChannel::Left))),
            'J' => return Some(msg.response('J', self.light.settled(LightChannel::Right))),

            'V' => match msg.key {
                0 => return Some(msg.response('V', self.emotes.happy() as u16)),
                1 => self.emotes.set_happy(msg.value),
                _ => {}
            },
            'W' => match msg.key {
                0 => return Some(msg.response('W', self.emotes.chill() as u16)),
                1 => self.emotes.set_chill(msg.value),
                _ => {}
            },
            'X' => match msg.key {
                0 => return Some(msg.response('X', self.emotes.food() as u16)),
                1 => self.emotes.set_food(msg.value),
                _ => {}
            },
            'Y' => match msg.key {
                0 => return Some(msg.response('Y', self.emotes.water() as u16)),
                1 => self.emotes.set_water(msg.value),
                _ => {}
            },
            'Z' => match msg.key {
                0 => return Some(msg.response('Z', self.emotes.play() as u16)),
                1 => self.emotes.set_play(msg.value),
                _ => {}
            },

            other => log::debug!("unknown control command {:?}", other),
        }

        None
    }

    /// `#` — canned gestures, raw poses and the detach escape hatch.
    fn handle_movement<B: Board>(&mut self, board: &mut B, msg: &Message) {
        match msg.command {
            'S' => match msg.key {
                0 => self.motion.rotate_left(board),
                1 => self.motion.rotate_right(board),
                2 => self.motion.rotate_home(board),
                3 => self.motion.shake(board),
                4 => self.motion.rotate_bounce(board),
                5 => self.motion.rotate_pos(board, fold_high_byte(msg.value)),
                _ => {}
            },

            'B' => match msg.key {
                0 => self.motion.beak_open(board),
                1 => self.motion.beak_close(board),
                2 => self.motion.beak_home(board),
                3 => self.motion.beak_snip(board),
                4 => self.motion.beak_laugh(board),
                5 => self.motion.beak_pos(board, fold_high_byte(msg.value)),
                _ => {}
            },

            'R' => self.handle_wing(board, Servo::RightWing, msg),
            'L' => self.handle_wing(board, Servo::LeftWing, msg),

            'O' => match msg.key {
                0 => self.motion.detach_all(board),
                1 => match msg.value {
                    0 => self.motion.both_wings_wave(board, false),
                    1 => self.motion.both_wings_wave(board, true),
                    _ => {}
                },
                2 => match msg.value {
                    0 => self.motion.both_wings_gust(board, false),
                    1 => self.motion.both_wings_gust(board, true),
                    _ => {}
                },
                _ => {}
            },

            other => log::debug!("unknown movement command {:?}", other),
        }
    }

    fn handle_wing<B: Board>(&mut self, board: &mut B, wing: Servo, msg: &Message) {
        match msg.key {
            0 => self.motion.wing_up(board, wing),
            1 => self.motion.wing_down(board, wing),
            2 => self.motion.wing_home(board, wing),
            3 => self.motion.wing_wave(board, wing),
            4 => self.motion.wing_gust(board, wing),
            5 => self.motion.wing_pos(board, wing, fold_high_byte(msg.value)),
            _ => {}
        }
    }

    /// `^` — persisted configuration: calibration slots and explicit saves.
    fn handle_config<B: Board>(&mut self, board: &mut B, msg: &Message) {
        if msg.command != 'E' {
            log::debug!("unknown config command {:?}", msg.command);
            return;
        }

        let pos = msg.value as u8;
        match msg.key {
            0..=3 => {
                let servo = CONFIG_SERVO_ORDER[msg.key as usize];
                self.motion.set_home(board, servo, pos);
            }
            4..=7 => {
                let servo = CONFIG_SERVO_ORDER[msg.key as usize - 4];
                self.motion.set_pose_a(board, servo, pos);
            }
            8..=11 => {
                let servo = CONFIG_SERVO_ORDER[msg.key as usize - 8];
                self.motion.set_pose_b(board, servo, pos);
            }
            12 => self.emotes.save_mood(board),
            13 => self.emotes.save_state(board),
            14 => self.eyes.save_default(board),
            _ => {}
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
