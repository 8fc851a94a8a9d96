//! # brrd-core
//!
//! Firmware core for a small animatronic bird.
//!
//! Four hobby servos (body rotation, beak, two wings), tri-colour eye LEDs,
//! a piezo speaker, two photoresistors, and a five-field ASCII command
//! protocol multiplexed over two serial links. Calibration, mood and the
//! default eye colour persist to byte-addressable non-volatile storage, so
//! the bird keeps its personality across power cycles.
//!
//! ---
//!
//! ## This is a core, not a sketch.
//!
//! Everything hardware-shaped sits behind a capability trait: the servo
//! pulse driver, the light sensors, the LED channels, the speaker, the
//! store, and — crucially — *time*. Blocking settle delays go through
//! [`board::Clock::sleep_ms`], so the whole firmware runs against a manual
//! clock in tests and simulations, with every move, trigger and auto-save
//! asserted in order and without real elapsed milliseconds.
//!
//! The execution model is a single cooperative context. Moves block for
//! their settle duration (the pulse driver has no completion signal), the
//! dispatcher is strictly serial across both links, and shared state has one
//! writer by construction. A port to a platform with real concurrency must
//! keep all core operations behind one logical executor to preserve the
//! ordering that the gesture sequences depend on.
//!
//! ## The pipeline
//!
//! ```text
//! serial links ──► Message ──► Brrd::handle ──► MotionTracker ──► ServoBank
//!                                   │          ├─ Eyes ─────────► EyeLeds
//!                                   │          ├─ Emotes ───────► NvStore
//!                                   ▼          └─ Speaker
//!                             Option<Message> (response, same link)
//!
//! main loop ──► Brrd::update ──► LightEngine ──► LightEvents (dark/bright)
//!                             ├─ Emotes auto-save
//!                             └─ idle-detach sweep
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`board`] | [`board::Board`], [`board::Clock`], [`board::ManualClock`] | Hardware capability traits and the aggregate board contract |
//! | [`store`] | [`store::NvStore`], [`store::RamStore`] | Address map, first-boot seeding, reference RAM store |
//! | [`motion`] | [`motion::MotionTracker`], [`motion::Servo`] | Calibration triples, blocking moves, idle release, gestures |
//! | [`light`] | [`light::LightEngine`], [`light::LightEvents`] | Rolling-window calibration, delta interlock, dark/bright triggers |
//! | [`emote`] | [`emote::Emotes`] | Five bounded scalars with fold semantics and auto-save |
//! | [`eyes`] | [`eyes::Eyes`] | RGB/HSI eye colour, brightness ceiling, persisted default |
//! | [`protocol`] | [`protocol::Message`], [`protocol::Link`] | The decoded five-field frame and its wire constants |
//! | [`brrd`] | [`brrd::Brrd`] | The aggregate: boot, update tick, command dispatch |
//! | [`snapshot`] | [`snapshot::ConfigSnapshot`] | Serialisable config dump (requires the `serde` feature) |
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default with no heap required. Enable the
//! `std` feature for host-side demos. Enable the `serde` feature for
//! serialisation support (required for [`snapshot`]).
//!
//! ## License
//!
//! MIT.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Pull in std when the feature is enabled (host-side demos, etc.)
#[cfg(feature = "std")]
extern crate std;

pub mod board;
pub mod brrd;
pub mod emote;
pub mod eyes;
pub mod light;
pub mod motion;
pub mod protocol;
pub mod store;

#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testbed;
