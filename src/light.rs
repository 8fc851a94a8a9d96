/*
 * Copyright (c) Flout Labs.
 * Licensed under the MIT License.
 */

//! Ambient-light sensing — rolling-window calibration, noise interlock, and
//! the dark/normal/bright trigger classifier.
//!
//! Two photoresistor channels are sampled together at most once per
//! [`SAMPLE_PERIOD_MS`]. Ten accepted samples form a window; completing a
//! window produces each channel's *settled* value (the window average) and
//! refreshes the trigger thresholds around the *previous* window's settled
//! value. The settled value is then classified against those lagging
//! thresholds, so a trigger means "this window reads darker/brighter than
//! the last one by more than the margin" — a slow ambient drift re-centres
//! every window, while a genuine change trips [`LightState::Dark`] or
//! [`LightState::Bright`] until the next window adapts.
//!
//! A raw step of [`DELTA_LIMIT`] or more between consecutive readings on
//! *either* channel discards the whole tick's sample for *both* channels.
//! The interlock is deliberately conservative: flicker on one side says
//! nothing trustworthy about the other side either.
//!
//! Trigger notification is a capability ([`LightEvents`]) with default no-op
//! methods; `()` implements it, so a host with no interest passes `&mut ()`.
//! The margin hysteresis here is the authoritative trigger behaviour — there
//! is deliberately no repeated-trigger debounce on top of it.

use crate::board::LightSensors;

// ─── Channel identity ───────────────────────────────────────────────────────

/// One of the two photoresistor channels (robot's left and right eye).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightChannel {
    /// Left-eye sensor.
    Left,
    /// Right-eye sensor.
    Right,
}

impl LightChannel {
    /// Both channels, left first.
    pub const ALL: [LightChannel; 2] = [LightChannel::Left, LightChannel::Right];

    /// Stable index into per-channel arrays.
    pub const fn index(self) -> usize {
        match self {
            LightChannel::Left => 0,
            LightChannel::Right => 1,
        }
    }
}

/// Trigger classification of a channel's settled value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightState {
    /// Within the threshold band (boundary values included).
    Normal,
    /// Settled value below the dark threshold.
    Dark,
    /// Settled value above the bright threshold.
    Bright,
}

// ─── Notify capability ──────────────────────────────────────────────────────

/// Notify-on-trigger capability fired by [`LightEngine::evaluate`].
///
/// Both methods default to no-ops and `()` implements the trait, so absence
/// of a handler is a valid, typed state rather than a null check.
pub trait LightEvents {
    /// A channel's settled value dropped below its dark threshold.
    fn on_dark(&mut self, channel: LightChannel) {
        let _ = channel;
    }

    /// A channel's settled value rose above its bright threshold.
    fn on_bright(&mut self, channel: LightChannel) {
        let _ = channel;
    }
}

impl LightEvents for () {}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Minimum spacing between accepted sampling ticks.
pub const SAMPLE_PERIOD_MS: u64 = 250;

/// Samples per averaging window.
pub const WINDOW_SIZE: u16 = 10;

/// Raw inter-sample step that voids the whole tick for both channels.
pub const DELTA_LIMIT: u16 = 80;

/// Largest raw reading the converter produces (10-bit).
pub const ADC_MAX: u16 = 1023;

/// Default margin above the settled value for the bright threshold.
pub const BRIGHT_MARGIN: u16 = 10;

/// Default margin below the settled value for the dark threshold.
pub const DARK_MARGIN: u16 = 8;

/// Per-channel window state. Resets every completed window.
#[derive(Clone, Copy, Debug, Default)]
struct ChannelWindow {
    raw: u16,
    prev_raw: u16,
    sum: u16,
    min_raw: u16,
    max_raw: u16,
    settled: u16,
    prev_settled: u16,
    dark_thresh: u16,
    bright_thresh: u16,
}

/// Rolling-window calibration and trigger engine for both light channels.
#[derive(Clone, Debug)]
pub struct LightEngine {
    channels: [ChannelWindow; 2],
    sample_count: u16,
    last_sampled_ms: u64,
    calibrated: bool,
    bright_margin: u16,
    dark_margin: u16,
}

impl LightEngine {
    /// Construct an engine with default margins and no completed window yet.
    pub fn new() -> Self {
        Self {
            channels: [ChannelWindow::default(); 2],
            sample_count: 0,
            last_sampled_ms: 0,
            calibrated: false,
            bright_margin: BRIGHT_MARGIN,
            dark_margin: DARK_MARGIN,
        }
    }

    /// Whether at least one window has completed (thresholds exist).
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Margin a window average must rise by to read as bright.
    pub fn set_bright_margin(&mut self, margin: u16) {
        self.bright_margin = margin;
    }

    /// Margin a window average must fall by to read as dark.
    pub fn set_dark_margin(&mut self, margin: u16) {
        self.dark_margin = margin;
    }

    // ── Sampling ───────────────────────────────────────────────────────────

    /// Take one sampling tick. Call once per update.
    ///
    /// Rate-limited to [`SAMPLE_PERIOD_MS`]; a voided tick (delta interlock)
    /// does not advance the window or the rate-limit stamp, so sampling
    /// resumes on the next tick.
    pub fn sample<S: LightSensors + ?Sized>(&mut self, sensors: &mut S, now_ms: u64) {
        if now_ms.wrapping_sub(self.last_sampled_ms) < SAMPLE_PERIOD_MS {
            return;
        }

        for channel in LightChannel::ALL {
            let window = &mut self.channels[channel.index()];
            window.prev_raw = window.raw;
            window.raw = sensors.read(channel);
        }

        for channel in LightChannel::ALL {
            let window = &self.channels[channel.index()];
            let delta = window.raw.abs_diff(window.prev_raw);
            if delta >= DELTA_LIMIT {
                log::debug!("raw delta {} on {:?} voids this sample", delta, channel);
                return;
            }
        }

        for window in &mut self.channels {
            if self.sample_count == 0 {
                window.min_raw = window.raw;
                window.max_raw = window.raw;
            }
            window.min_raw = window.min_raw.min(window.raw);
            window.max_raw = window.max_raw.max(window.raw);
            window.sum += window.raw;
        }
        self.sample_count += 1;

        if self.sample_count >= WINDOW_SIZE {
            self.complete_window();
        }

        self.last_sampled_ms = now_ms;
    }

    fn complete_window(&mut self) {
        for (window, channel) in self.channels.iter_mut().zip(LightChannel::ALL) {
            window.prev_settled = window.settled;
            window.settled = window.sum / WINDOW_SIZE;

            // Thresholds bracket the displaced average, so the fresh settled
            // value is judged against where the light level used to be.
            window.bright_thresh = (window.prev_settled + self.bright_margin).min(ADC_MAX);
            window.dark_thresh = window.prev_settled.saturating_sub(self.dark_margin);

            log::info!(
                "{:?} settled {} (window min {} max {}), triggers at <{} / >{}",
                channel,
                window.settled,
                window.min_raw,
                window.max_raw,
                window.dark_thresh,
                window.bright_thresh,
            );

            window.sum = 0;
        }
        self.sample_count = 0;
        self.calibrated = true;
    }

    // ── Classification ─────────────────────────────────────────────────────

    /// Classify a channel's settled value against its thresholds.
    ///
    /// Boundary values (settled equal to a threshold) are [`LightState::Normal`].
    pub fn classify(&self, channel: LightChannel) -> LightState {
        let window = &self.channels[channel.index()];
        if window.settled < window.dark_thresh {
            LightState::Dark
        } else if window.settled > window.bright_thresh {
            LightState::Bright
        } else {
            LightState::Normal
        }
    }

    /// Classify both channels and fire the notify capability on triggers.
    ///
    /// Returns the two states, left first. Call once per tick after
    /// [`sample`](Self::sample).
    pub fn evaluate<E: LightEvents + ?Sized>(&self, events: &mut E) -> [LightState; 2] {
        let mut states = [LightState::Normal; 2];
        for channel in LightChannel::ALL {
            let state = self.classify(channel);
            match state {
                LightState::Dark => {
                    log::debug!(
                        "dark on {:?}: {} < {}",
                        channel,
                        self.settled(channel),
                        self.dark_threshold(channel)
                    );
                    events.on_dark(channel);
                }
                LightState::Bright => {
                    log::debug!(
                        "bright on {:?}: {} > {}",
                        channel,
                        self.settled(channel),
                        self.bright_threshold(channel)
                    );
                    events.on_bright(channel);
                }
                LightState::Normal => {}
            }
            states[channel.index()] = state;
        }
        states
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// Last raw reading for `channel`.
    pub fn raw(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].raw
    }

    /// Settled (window-averaged) value for `channel`.
    pub fn settled(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].settled
    }

    /// Settled value of the window before the current one.
    pub fn previous_settled(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].prev_settled
    }

    /// Smallest raw reading seen in the current (or last) window.
    pub fn window_min(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].min_raw
    }

    /// Largest raw reading seen in the current (or last) window.
    pub fn window_max(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].max_raw
    }

    /// Current dark trigger threshold for `channel`.
    pub fn dark_threshold(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].dark_thresh
    }

    /// Current bright trigger threshold for `channel`.
    pub fn bright_threshold(&self, channel: LightChannel) -> u16 {
        self.channels[channel.index()].bright_thresh
    }
}

impl Default for LightEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
