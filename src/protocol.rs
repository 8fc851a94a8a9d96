//! Dispatch message types for the two-channel serial command protocol.
//!
//! The transport collaborator parses raw frames
//! (`<action><command><key>,<value><delimiter>`, ASCII) and delivers the
//! decoded five-field tuple; the core never sees bytes. Outbound responses
//! reuse the same shape and go back over the link the request arrived on.
//!
//! Action classes:
//!
//! | action | class | routed to |
//! |--------|-------|-----------|
//! | `@` | device control | servo moves, eyes, speaker, sensor read-back, emote get/set |
//! | `#` | movement | canned gestures, raw poses, detach-all |
//! | `^` | configuration | calibration slots, mood/state/colour saves |
//! | `&` | reserved | ignored by the core |

// ─── Links ──────────────────────────────────────────────────────────────────

/// One of the two independent serial channels.
///
/// The channels are equivalent sources of messages (typically a wired
/// console and a radio modem); the dispatcher is strictly serial across
/// both, and a response never crosses to the other link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Link {
    /// First serial channel (the hardware UART on the original board).
    Primary,
    /// Second serial channel (bit-banged or radio-backed).
    Secondary,
}

// ─── Messages ───────────────────────────────────────────────────────────────

/// Device-control action class.
pub const ACTION_CONTROL: char = '@';
/// Movement action class.
pub const ACTION_MOVEMENT: char = '#';
/// Configuration action class.
pub const ACTION_CONFIG: char = '^';
/// Reserved action class — passed through as a no-op.
pub const ACTION_RESERVED: char = '&';
/// Conventional frame terminator.
pub const DELIMITER: char = '!';

/// One decoded protocol frame, inbound or outbound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// The serial channel this frame arrived on (or should leave on).
    pub link: Link,
    /// Action class: one of `@`, `#`, `^`, `&`.
    pub action: char,
    /// Command letter; meaning depends on the action class.
    pub command: char,
    /// Small operand — sub-command selector or scaled duration.
    pub key: u8,
    /// Large operand — position, colour value, frequency, or scalar.
    pub value: u16,
    /// Frame terminator, conventionally [`DELIMITER`].
    pub delimiter: char,
}

impl Message {
    /// Construct a frame with the conventional delimiter.
    pub fn new(link: Link, action: char, command: char, key: u8, value: u16) -> Self {
        Self {
            link,
            action,
            command,
            key,
            value,
            delimiter: DELIMITER,
        }
    }

    /// Build the response to this frame: same link, movement action class,
    /// key 0, carrying `value` under `command`.
    pub fn response(&self, command: char, value: u16) -> Self {
        Self::new(self.link, ACTION_MOVEMENT, command, 0, value)
    }
}

impl core::fmt::Display for Message {
    /// Renders the frame in wire form, e.g. `@V1,75!`.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}{}{},{}{}",
            self.action, self.command, self.key, self.value, self.delimiter
        )
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
