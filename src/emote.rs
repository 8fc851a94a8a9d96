//! Mood and state ledger — five bounded scalars with periodic persistence.
//!
//! Two *mood* scalars (happy, chill) and three *state* scalars (food, water,
//! play), each an 8-bit value conventionally 0–100 over the serial API.
//! Values live in RAM and hit the store only on an explicit save, through the
//! `^E12`/`^E13` commands, or on the opt-in auto-save timer.
//!
//! Out-of-range input is folded, not rejected: see [`fold_high_byte`].

use crate::store::{NvStore, MOOD_ADDR, STATE_ADDR};

/// Interval between automatic persists when auto-save is enabled.
pub const AUTO_SAVE_INTERVAL_MS: u64 = 120_000;

/// Play bonus granted on every boot, applied through the folding setter.
pub const WELCOME_BONUS: u16 = 20;

/// Reduce an oversized value to a byte.
///
/// Values above 256 are reduced by integer-dividing by 256 — `300` becomes
/// `1`, not `44`. This is the established wire behaviour (a dashboard slider
/// overshooting its range collapses to near-zero rather than wrapping to an
/// arbitrary mood), and callers depend on it; do not swap in a clamp or a
/// modulo. `256` itself is not above the limit and truncates to `0` through
/// the low-byte path.
pub fn fold_high_byte(v: u16) -> u8 {
    if v > 256 {
        (v / 256) as u8
    } else {
        v as u8
    }
}

/// The five emotion scalars and their persistence bookkeeping.
#[derive(Clone, Debug)]
pub struct Emotes {
    happy: u8,
    chill: u8,
    food: u8,
    water: u8,
    play: u8,
    auto_save: bool,
    last_save_ms: u64,
}

impl Emotes {
    /// Construct a ledger with zeroed scalars and auto-save off.
    ///
    /// Call [`load`](Self::load) to pull the persisted values at boot.
    pub fn new() -> Self {
        Self {
            happy: 0,
            chill: 0,
            food: 0,
            water: 0,
            play: 0,
            auto_save: false,
            last_save_ms: 0,
        }
    }

    /// Load all five scalars from the store and grant the welcome bonus.
    ///
    /// The +20 play treat happens on every boot, not just the first — being
    /// switched on is itself a small pleasure.
    pub fn load<S: NvStore + ?Sized>(&mut self, store: &S) {
        self.happy = store.read(MOOD_ADDR[0]);
        self.chill = store.read(MOOD_ADDR[1]);
        self.food = store.read(STATE_ADDR[0]);
        self.water = store.read(STATE_ADDR[1]);
        self.play = store.read(STATE_ADDR[2]);

        self.set_play(self.play as u16 + WELCOME_BONUS);
        log::debug!(
            "emotes loaded: happy {} chill {} food {} water {} play {}",
            self.happy,
            self.chill,
            self.food,
            self.water,
            self.play
        );
    }

    // ── Setters ────────────────────────────────────────────────────────────

    /// Set happy, folding oversized values.
    pub fn set_happy(&mut self, v: u16) {
        self.happy = fold_high_byte(v);
    }

    /// Set chill, folding oversized values.
    pub fn set_chill(&mut self, v: u16) {
        self.chill = fold_high_byte(v);
    }

    /// Set food, folding oversized values.
    pub fn set_food(&mut self, v: u16) {
        self.food = fold_high_byte(v);
    }

    /// Set water, folding oversized values.
    pub fn set_water(&mut self, v: u16) {
        self.water = fold_high_byte(v);
    }

    /// Set play, folding oversized values.
    pub fn set_play(&mut self, v: u16) {
        self.play = fold_high_byte(v);
    }

    /// Overwrite both mood scalars. In-memory only.
    pub fn set_mood(&mut self, happy: u8, chill: u8) {
        self.happy = happy;
        self.chill = chill;
    }

    /// Overwrite all three state scalars. In-memory only.
    pub fn set_state(&mut self, food: u8, water: u8, play: u8) {
        self.food = food;
        self.water = water;
        self.play = play;
    }

    // ── Getters ────────────────────────────────────────────────────────────

    /// Current happy value.
    pub fn happy(&self) -> u8 {
        self.happy
    }

    /// Current chill value.
    pub fn chill(&self) -> u8 {
        self.chill
    }

    /// Current food value.
    pub fn food(&self) -> u8 {
        self.food
    }

    /// Current water value.
    pub fn water(&self) -> u8 {
        self.water
    }

    /// Current play value.
    pub fn play(&self) -> u8 {
        self.play
    }

    // ── Persistence ────────────────────────────────────────────────────────

    /// Persist the two mood scalars.
    pub fn save_mood<S: NvStore + ?Sized>(&self, store: &mut S) {
        store.write(MOOD_ADDR[0], self.happy);
        store.write(MOOD_ADDR[1], self.chill);
    }

    /// Persist the three state scalars.
    pub fn save_state<S: NvStore + ?Sized>(&self, store: &mut S) {
        store.write(STATE_ADDR[0], self.food);
        store.write(STATE_ADDR[1], self.water);
        store.write(STATE_ADDR[2], self.play);
    }

    /// Enable or disable the periodic auto-save.
    pub fn set_auto_save(&mut self, on: bool) {
        self.auto_save = on;
    }

    /// Whether auto-save is enabled.
    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// Auto-save check. Call once per update tick.
    ///
    /// Persists mood and state and resets the timer once strictly more than
    /// [`AUTO_SAVE_INTERVAL_MS`] has passed since the last save.
    pub fn tick<S: NvStore + ?Sized>(&mut self, store: &mut S, now_ms: u64) {
        if self.auto_save && now_ms.wrapping_sub(self.last_save_ms) > AUTO_SAVE_INTERVAL_MS {
            log::debug!("auto-saving mood and state");
            self.save_state(store);
            self.save_mood(store);
            self.last_save_ms = now_ms;
        }
    }
}

impl Default for Emotes {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
