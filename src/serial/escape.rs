//! In-band escape command recognizer
//!
//! Commands share the host byte stream with payload data, so every received
//! byte passes through [`EscapeState::step`]. The recognizer is a pure
//! transition over a single "previous byte was `!`" flag:
//!
//! ```text
//!            '!'                 '!'  → Flush
//!   Idle ─────────▶ Pending ──── '.'  → Data('!')
//!    ▲                 │         cmd  → Command(code)
//!    └─────────────────┘         else → Unrecognized
//! ```
//!
//! Payloads carry a literal `!` as `!.`. Actions are only *named* here; the
//! transport captures operands and the mainline executes them.

use crate::config::{ESCAPE_BYTE, LITERAL_MARKER};

/// Escape recognizer state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EscapeState {
    pending: bool,
}

/// What the receive path should do with one byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escape {
    /// Queue this byte to RX
    Data(u8),
    /// Byte swallowed as the start of an escape sequence
    Consumed,
    /// `!!`: the packet layer should send what it has buffered
    Flush,
    /// `!` followed by a command letter
    Command(CommandCode),
    /// `!` followed by a byte with no meaning
    Unrecognized,
}

impl EscapeState {
    /// Fresh recognizer, no escape pending
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: false }
    }

    /// True if the previous byte opened an escape sequence
    #[must_use]
    pub const fn is_pending(self) -> bool {
        self.pending
    }

    /// Advance by one received byte
    #[must_use]
    pub fn step(self, byte: u8) -> (Self, Escape) {
        const IDLE: EscapeState = EscapeState { pending: false };

        if !self.pending {
            return if byte == ESCAPE_BYTE {
                (Self { pending: true }, Escape::Consumed)
            } else {
                (IDLE, Escape::Data(byte))
            };
        }

        let outcome = match byte {
            ESCAPE_BYTE => Escape::Flush,
            LITERAL_MARKER => Escape::Data(ESCAPE_BYTE),
            _ => CommandCode::from_byte(byte).map_or(Escape::Unrecognized, Escape::Command),
        };
        (IDLE, outcome)
    }
}

/// Single-byte command selectors that may follow the escape byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandCode {
    /// `L`: transmit power preset low
    PowerLow,
    /// `H`: transmit power preset high
    PowerHigh,
    /// `M`: transmit power preset maximum
    PowerMax,
    /// `P`: report transmit power
    QueryPower,
    /// `F`: report firmware identity checksums
    FirmwareIdentity,
    /// `V`: version probe
    Version,
    /// `h`: request a heartbeat from the MAC
    Heartbeat,
    /// `C`: discard everything queued in RX
    ClearRx,
    /// `Z`: hardware reset
    Reset,
    /// `R`: restore default parameters
    RestoreDefaults,
    /// `D`: request a parameter dump from EEPROM
    ParameterDump,
    /// `B`: reboot into reprogram mode, confirmed by `up` in RX
    Reprogram,
    /// `g`: set the EEPROM pointer from hex digits queued in RX
    EepromAddress,
    /// `w`: write one EEPROM page from RX
    EepromWritePage,
    /// `j`: write one EEPROM byte from RX
    EepromWriteByte,
    /// `E`: dump EEPROM as text
    EepromDump,
    /// `I`: dump EEPROM as binary records
    EepromDumpBinary,
    /// `p`: power the EEPROM on
    EepromPowerOn,
    /// `o`: power the EEPROM off
    EepromPowerOff,
    /// `y`: lift EEPROM write protection
    EepromWriteEnable,
    /// `Y`: re-initialise the modem
    Reinit,
    /// `0`..`9`: drive a user pin
    UserPin {
        /// Pin number, `0..USER_PIN_COUNT`
        pin: u8,
        /// Level to drive
        high: bool,
    },
}

impl CommandCode {
    /// Decode the byte following `!`
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        let code = match byte {
            b'L' => Self::PowerLow,
            b'H' => Self::PowerHigh,
            b'M' => Self::PowerMax,
            b'P' => Self::QueryPower,
            b'F' => Self::FirmwareIdentity,
            b'V' => Self::Version,
            b'h' => Self::Heartbeat,
            b'C' => Self::ClearRx,
            b'Z' => Self::Reset,
            b'R' => Self::RestoreDefaults,
            b'D' => Self::ParameterDump,
            b'B' => Self::Reprogram,
            b'g' => Self::EepromAddress,
            b'w' => Self::EepromWritePage,
            b'j' => Self::EepromWriteByte,
            b'E' => Self::EepromDump,
            b'I' => Self::EepromDumpBinary,
            b'p' => Self::EepromPowerOn,
            b'o' => Self::EepromPowerOff,
            b'y' => Self::EepromWriteEnable,
            b'Y' => Self::Reinit,
            b'0'..=b'4' => Self::UserPin {
                pin: byte - b'0',
                high: true,
            },
            b'5'..=b'9' => Self::UserPin {
                pin: byte - b'5',
                high: false,
            },
            _ => return None,
        };
        Some(code)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CommandCode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::UserPin { pin, high } => defmt::write!(f, "UserPin({}, {})", pin, high),
            other => defmt::write!(f, "{}", defmt::Debug2Format(other)),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Escape {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Data(b) => defmt::write!(f, "Data(0x{:02X})", b),
            Self::Consumed => defmt::write!(f, "Consumed"),
            Self::Flush => defmt::write!(f, "Flush"),
            Self::Command(code) => defmt::write!(f, "Command({})", code),
            Self::Unrecognized => defmt::write!(f, "Unrecognized"),
        }
    }
}
