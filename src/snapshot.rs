//! Serialisable snapshot of the persisted configuration, for dashboards and
//! backups.
//!
//! Captures every slot of the store's address map — default colour, the four
//! calibration triples, mood, state, and the initialisation flag — as one
//! plain record. A host tool serialises it (JSON over the dashboard link,
//! a file on disk) and can later [`restore`](ConfigSnapshot::restore) it
//! into a blank store, e.g. when moving a bird's personality onto a
//! replacement board.
//!
//! Requires the `serde` feature.

use crate::motion::{Servo, ServoCal};
use crate::store::{servo_cal_addr, NvStore, COLOUR_ADDR, INIT_ADDR, MOOD_ADDR, STATE_ADDR};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// One full dump of the persisted configuration.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Format version — always [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Default eye colour, RGB.
    pub colour: [u8; 3],
    /// Rotation servo calibration.
    pub rotation: ServoCal,
    /// Beak servo calibration.
    pub beak: ServoCal,
    /// Right wing servo calibration.
    pub right_wing: ServoCal,
    /// Left wing servo calibration.
    pub left_wing: ServoCal,
    /// Mood scalars: happy, chill.
    pub mood: [u8; 2],
    /// State scalars: food, water, play.
    pub state: [u8; 3],
    /// Whether the store had been seeded when captured.
    pub initialised: bool,
}

impl ConfigSnapshot {
    /// Capture everything the store persists.
    pub fn capture<S: NvStore + ?Sized>(store: &S) -> Self {
        let read_cal = |servo: Servo| {
            let addrs = servo_cal_addr(servo);
            ServoCal {
                home: store.read(addrs[0]),
                pose_a: store.read(addrs[1]),
                pose_b: store.read(addrs[2]),
            }
        };

        Self {
            version: SNAPSHOT_VERSION,
            colour: [
                store.read(COLOUR_ADDR[0]),
                store.read(COLOUR_ADDR[1]),
                store.read(COLOUR_ADDR[2]),
            ],
            rotation: read_cal(Servo::Rotation),
            beak: read_cal(Servo::Beak),
            right_wing: read_cal(Servo::RightWing),
            left_wing: read_cal(Servo::LeftWing),
            mood: [store.read(MOOD_ADDR[0]), store.read(MOOD_ADDR[1])],
            state: [
                store.read(STATE_ADDR[0]),
                store.read(STATE_ADDR[1]),
                store.read(STATE_ADDR[2]),
            ],
            initialised: crate::store::is_initialised(store),
        }
    }

    /// Write every captured slot back into a store, including the flag.
    ///
    /// A restored store reads exactly as the captured one did; restoring an
    /// initialised snapshot therefore suppresses first-boot reseeding.
    pub fn restore<S: NvStore + ?Sized>(&self, store: &mut S) {
        for (addr, value) in COLOUR_ADDR.iter().zip(self.colour) {
            store.write(*addr, value);
        }

        for (servo, cal) in [
            (Servo::Rotation, self.rotation),
            (Servo::Beak, self.beak),
            (Servo::RightWing, self.right_wing),
            (Servo::LeftWing, self.left_wing),
        ] {
            let addrs = servo_cal_addr(servo);
            store.write(addrs[0], cal.home);
            store.write(addrs[1], cal.pose_a);
            store.write(addrs[2], cal.pose_b);
        }

        for (addr, value) in MOOD_ADDR.iter().zip(self.mood) {
            store.write(*addr, value);
        }
        for (addr, value) in STATE_ADDR.iter().zip(self.state) {
            store.write(*addr, value);
        }

        store.write(INIT_ADDR, self.initialised as u8);
    }

    /// Calibration triple for `servo`.
    pub fn cal(&self, servo: Servo) -> ServoCal {
        match servo {
            Servo::Rotation => self.rotation,
            Servo::Beak => self.beak,
            Servo::RightWing => self.right_wing,
            Servo::LeftWing => self.left_wing,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RamStore;

    #[test]
    fn test_capture_seeded_store() {
        let mut store = RamStore::new();
        crate::store::seed_if_unset(&mut store);

        let snapshot = ConfigSnapshot::capture(&store);

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.colour, [128, 10, 128]);
        assert_eq!(snapshot.rotation, ServoCal { home: 90, pose_a: 0, pose_b: 180 });
        assert_eq!(snapshot.mood, [80, 50]);
        assert_eq!(snapshot.state, [80, 80, 60]);
        assert!(snapshot.initialised);
    }

    #[test]
    fn test_restore_into_blank_store() {
        let mut original = RamStore::new();
        crate::store::seed_if_unset(&mut original);
        original.write(crate::store::MOOD_ADDR[0], 99);

        let snapshot = ConfigSnapshot::capture(&original);

        let mut replacement = RamStore::new();
        snapshot.restore(&mut replacement);

        assert_eq!(replacement, original);
        // The restored flag suppresses reseeding on the replacement board.
        assert!(!crate::store::seed_if_unset(&mut replacement));
        assert_eq!(replacement.read(crate::store::MOOD_ADDR[0]), 99);
    }

    #[test]
    fn test_cal_accessor_matches_fields() {
        let mut store = RamStore::new();
        crate::store::seed_if_unset(&mut store);
        let snapshot = ConfigSnapshot::capture(&store);

        assert_eq!(snapshot.cal(Servo::Beak), snapshot.beak);
        assert_eq!(snapshot.cal(Servo::LeftWing), snapshot.left_wing);
    }
}
