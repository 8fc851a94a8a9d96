//! Tri-colour eye light — RGB and HSI entry points, brightness ceiling,
//! persisted default colour.
//!
//! The eyes accept colour in two spaces. RGB is the raw byte interface the
//! store persists; HSI is what expressive code wants (sweep a hue, dim the
//! intensity). Both entry points keep the *other* representation in sync, so
//! a single-channel change over the serial API (`@E`/`@F`) can reuse the
//! remaining two channels of the current colour.
//!
//! The conversion formulas are the published Neltner HSI→RGB and Atkins
//! RGB→HSV routines; hue is kept in degrees on both paths.

use crate::board::EyeLeds;
use crate::store::{NvStore, COLOUR_ADDR};

// ─── Named hues ─────────────────────────────────────────────────────────────

/// Hue of red on this LED hardware, degrees.
pub const HUE_RED: f32 = 330.0;
/// Hue of orange, degrees.
pub const HUE_ORANGE: f32 = 20.0;
/// Hue of yellow, degrees.
pub const HUE_YELLOW: f32 = 45.0;
/// Hue of green, degrees.
pub const HUE_GREEN: f32 = 90.0;
/// Hue of blue, degrees.
pub const HUE_BLUE: f32 = 210.0;
/// Hue of violet, degrees.
pub const HUE_VIOLET: f32 = 270.0;

// ─── Eyes ───────────────────────────────────────────────────────────────────

/// Current eye colour in both RGB and HSI, plus the brightness ceiling.
#[derive(Clone, Debug)]
pub struct Eyes {
    rgb: [u8; 3],
    hsi: [f32; 3],
    max_brightness: f32,
}

impl Eyes {
    /// Construct dark eyes with the ceiling fully open.
    pub fn new() -> Self {
        Self {
            rgb: [0; 3],
            hsi: [0.0; 3],
            max_brightness: 1.0,
        }
    }

    /// Cap the LED output. 1.0 is full brightness, 0.5 halves every channel.
    pub fn set_max_brightness(&mut self, ceiling: f32) {
        self.max_brightness = ceiling;
    }

    /// Current colour as raw RGB bytes.
    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    /// Current colour as `[hue°, saturation, intensity]`.
    pub fn hsi(&self) -> [f32; 3] {
        self.hsi
    }

    /// Set the eye colour from RGB bytes.
    ///
    /// Stores the raw bytes, derives the HSI equivalent, and writes the
    /// brightness-scaled output to the LEDs.
    pub fn set_rgb<B: EyeLeds + ?Sized>(&mut self, leds: &mut B, r: u8, g: u8, b: u8) {
        let [h, s, v] = rgb_to_hsv(r, g, b);
        self.rgb = [r, g, b];
        self.hsi = [h * 360.0, s, v];

        leds.write(
            (r as f32 * self.max_brightness) as u8,
            (g as f32 * self.max_brightness) as u8,
            (b as f32 * self.max_brightness) as u8,
        );
    }

    /// Set the eye colour from hue (degrees), saturation and intensity (0–1).
    ///
    /// The brightness ceiling is folded into the stored RGB, matching what
    /// the LEDs actually show.
    pub fn set_hsi<B: EyeLeds + ?Sized>(&mut self, leds: &mut B, h: f32, s: f32, i: f32) {
        let [r, g, b] = hsi_to_rgb(h, s, i);

        let scaled = [
            (r as f32 * self.max_brightness) as u8,
            (g as f32 * self.max_brightness) as u8,
            (b as f32 * self.max_brightness) as u8,
        ];
        self.rgb = scaled;
        self.hsi = [h, s, i];

        leds.write(scaled[0], scaled[1], scaled[2]);
    }

    /// Load the persisted default colour and show it.
    pub fn load_default<B: EyeLeds + NvStore + ?Sized>(&mut self, board: &mut B) {
        let r = board.read(COLOUR_ADDR[0]);
        let g = board.read(COLOUR_ADDR[1]);
        let b = board.read(COLOUR_ADDR[2]);
        self.set_rgb(board, r, g, b);
    }

    /// Persist the current colour as the boot default.
    pub fn save_default<S: NvStore + ?Sized>(&self, store: &mut S) {
        store.write(COLOUR_ADDR[0], self.rgb[0]);
        store.write(COLOUR_ADDR[1], self.rgb[1]);
        store.write(COLOUR_ADDR[2], self.rgb[2]);
    }
}

impl Default for Eyes {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Colour math ────────────────────────────────────────────────────────────

/// Cosine via range reduction and a truncated even series.
///
/// `core` has no float intrinsics, so this mirrors the crate's policy of
/// small self-contained approximations over a float-math dependency. After
/// wrapping into [-π, π] the series is accurate to about 2e-3 at the interval
/// edge — well under half an LED step for the conversions below.
fn cos_approx(x: f32) -> f32 {
    use core::f32::consts::{PI, TAU};

    let mut x = x % TAU;
    if x > PI {
        x -= TAU;
    } else if x < -PI {
        x += TAU;
    }

    let x2 = x * x;
    // 1 - x²/2! + x⁴/4! - x⁶/6! + x⁸/8! - x¹⁰/10!
    1.0 - x2 / 2.0 + x2 * x2 / 24.0 - x2 * x2 * x2 / 720.0 + x2 * x2 * x2 * x2 / 40_320.0
        - x2 * x2 * x2 * x2 * x2 / 3_628_800.0
}

/// HSI to RGB, after Brian Neltner (Saikoled).
///
/// Hue in degrees (wrapped mod 360), saturation and intensity clamped to
/// [0, 1]. Works the colour wheel in three 120° sectors.
fn hsi_to_rgb(h: f32, s: f32, i: f32) -> [u8; 3] {
    use core::f32::consts::PI;

    let h = (h % 360.0) * PI / 180.0;
    let s = s.clamp(0.0, 1.0);
    let i = i.clamp(0.0, 1.0);

    let base = 255.0 * i / 3.0;
    let sector = |h: f32| {
        let ratio = cos_approx(h) / cos_approx(1.047_196_6 - h);
        (base * (1.0 + s * ratio), base * (1.0 + s * (1.0 - ratio)), base * (1.0 - s))
    };

    let (r, g, b);
    if h < 2.094_39 {
        let (major, minor, rest) = sector(h);
        r = major;
        g = minor;
        b = rest;
    } else if h < 4.188_787 {
        let (major, minor, rest) = sector(h - 2.094_39);
        g = major;
        b = minor;
        r = rest;
    } else {
        let (major, minor, rest) = sector(h - 4.188_787);
        b = major;
        r = minor;
        g = rest;
    }

    [
        r.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        b.clamp(0.0, 255.0) as u8,
    ]
}

/// RGB to HSV, after Robert Atkins (RGBConverter).
///
/// Returns `[h, s, v]` each in [0, 1].
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [f32; 3] {
    let rd = r as f32 / 255.0;
    let gd = g as f32 / 255.0;
    let bd = b as f32 / 255.0;

    let max = rd.max(gd).max(bd);
    let min = rd.min(gd).min(bd);
    let d = max - min;

    let v = max;
    let s = if max == 0.0 { 0.0 } else { d / max };

    let h = if max == min {
        0.0 // achromatic
    } else {
        let h = if max == rd {
            (gd - bd) / d + if gd < bd { 6.0 } else { 0.0 }
        } else if max == gd {
            (bd - rd) / d + 2.0
        } else {
            (rd - gd) / d + 4.0
        };
        h / 6.0
    };

    [h, s, v]
}

// ─── Tests ──────────────────────────────────────────────────────────────────
