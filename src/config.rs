//! System configuration and protocol constants
//!
//! Buffer geometry, flow-control watermarks, escape protocol bytes and
//! timing constants are centralized here. Runtime-selectable settings live
//! in [`SerialConfig`].

use crate::types::BaudRate;

/// Host-link receive buffer capacity in bytes (one slot is never used)
pub const RX_BUFFER_SIZE: usize = 256;

/// Host-link transmit buffer capacity in bytes (one slot is never used)
pub const TX_BUFFER_SIZE: usize = 512;

/// Assert "not ready" once RX free space drops below this many bytes
pub const RX_READY_LOW_WATERMARK: usize = 17;

/// Deassert "not ready" once RX free space exceeds this many bytes
pub const RX_READY_HIGH_WATERMARK: usize = 34;

/// Bytes sent after the peer clears its ready line before it is sampled again
pub const FLOW_CREDIT_BURST: u8 = 8;

/// Escape byte introducing an in-band command
pub const ESCAPE_BYTE: u8 = b'!';

/// Byte that, after [`ESCAPE_BYTE`], inserts a literal escape byte into RX
pub const LITERAL_MARKER: u8 = b'.';

/// Byte emitted toward the host for an unrecognized escape command
pub const ERROR_INDICATOR: u8 = b'E';

/// Reply to the version probe, identifying CSMA-capable firmware
pub const VERSION_REPLY: u8 = b'1';

/// Mainline tick rate used for silence countdowns
pub const TICK_HZ: u32 = 100;

/// Mainline tick period in milliseconds
pub const TICK_PERIOD_MS: u64 = 1000 / TICK_HZ as u64;

/// First byte of the companion boot-banner pattern
pub const BANNER_BYTE_A: u8 = 0x86;

/// Second byte of the companion boot-banner pattern
pub const BANNER_BYTE_B: u8 = 0x98;

/// Consecutive alternating banner bytes that trigger silence mode
pub const BANNER_RUN_LENGTH: u8 = 80;

/// Silence window after a boot banner is detected (20 s)
pub const BANNER_SILENCE_TICKS: u16 = 20 * TICK_HZ as u16;

/// Silence window enforced at power-on (1 s)
pub const POWER_ON_SILENCE_TICKS: u16 = TICK_HZ as u16;

/// Depth of the interrupt-to-mainline command queue
pub const ACTION_QUEUE_DEPTH: usize = 4;

/// EEPROM size in bytes; the address pointer wraps at this boundary
pub const EEPROM_SIZE: u16 = 0x800;

/// EEPROM page size in bytes
pub const EEPROM_PAGE_SIZE: usize = 16;

/// Bytes covered by one EEPROM dump command
pub const EEPROM_DUMP_LEN: u16 = 0x80;

/// Filler for page-write bytes the host did not supply
pub const EEPROM_PAGE_FILL: u8 = 0xBD;

/// Number of user-controllable GPIO pins
pub const USER_PIN_COUNT: u8 = 5;

/// Transmit power presets in dBm
pub mod tx_power {
    //! Transmit power presets selected by escape commands

    /// `!L`
    pub const LOW_DBM: u8 = 0;

    /// `!H`
    pub const HIGH_DBM: u8 = 24;

    /// `!M`
    pub const MAX_DBM: u8 = 30;
}

/// Runtime serial link configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    /// Host-link baud rate
    pub baud: BaudRate,
    /// Gate transmission on the peer's ready-to-receive line
    pub hardware_flow_control: bool,
}

impl SerialConfig {
    /// Configuration from the persisted one-byte rate code and RTS/CTS flag
    #[must_use]
    pub const fn from_params(rate_code: u8, rtscts: bool) -> Self {
        Self {
            baud: BaudRate::from_code(rate_code),
            hardware_flow_control: rtscts,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud: BaudRate::DEFAULT,
            hardware_flow_control: false,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SerialConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} rtscts={}", self.baud, self.hardware_flow_control);
    }
}
