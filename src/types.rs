//! Shared types used across the modem firmware
//!
//! Domain types that enforce invariants at construction time: the nine
//! supported host-link rates and the saturating overflow counters.

use core::fmt;

/// Host-link baud rate class
///
/// Persisted parameters store the rate as a one-byte code (the rate in
/// kbaud, truncated). Unknown codes fall back to [`BaudRate::DEFAULT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaudRate {
    /// 1200 baud
    B1200,
    /// 2400 baud
    B2400,
    /// 4800 baud
    B4800,
    /// 9600 baud
    B9600,
    /// 19200 baud
    B19200,
    /// 38400 baud
    B38400,
    /// 57600 baud
    B57600,
    /// 115200 baud
    B115200,
    /// 230400 baud
    B230400,
}

impl BaudRate {
    /// Rate used when the configured code is not recognized
    pub const DEFAULT: Self = Self::B57600;

    /// All supported rates, slowest first
    pub const ALL: [Self; 9] = [
        Self::B1200,
        Self::B2400,
        Self::B4800,
        Self::B9600,
        Self::B19200,
        Self::B38400,
        Self::B57600,
        Self::B115200,
        Self::B230400,
    ];

    /// Look up a rate by its one-byte code, `None` if unsupported
    #[must_use]
    pub const fn try_from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::B1200),
            2 => Some(Self::B2400),
            4 => Some(Self::B4800),
            9 => Some(Self::B9600),
            19 => Some(Self::B19200),
            38 => Some(Self::B38400),
            57 => Some(Self::B57600),
            115 => Some(Self::B115200),
            230 => Some(Self::B230400),
            _ => None,
        }
    }

    /// Look up a rate by its one-byte code, falling back to the default
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match Self::try_from_code(code) {
            Some(rate) => rate,
            None => Self::DEFAULT,
        }
    }

    /// One-byte parameter code for this rate
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::B1200 => 1,
            Self::B2400 => 2,
            Self::B4800 => 4,
            Self::B9600 => 9,
            Self::B19200 => 19,
            Self::B38400 => 38,
            Self::B57600 => 57,
            Self::B115200 => 115,
            Self::B230400 => 230,
        }
    }

    /// Line rate in bits per second
    #[must_use]
    pub const fn bits_per_second(self) -> u32 {
        match self {
            Self::B1200 => 1_200,
            Self::B2400 => 2_400,
            Self::B4800 => 4_800,
            Self::B9600 => 9_600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
        }
    }

    /// Nominal byte rate handed to the packet layer for framing timeouts
    #[must_use]
    pub const fn framing_bytes_per_second(self) -> u32 {
        self.code() as u32 * 125
    }

    /// UART clock divider for a peripheral clock, rounded to nearest
    #[must_use]
    pub const fn divider(self, clock_hz: u32) -> u32 {
        let bps = self.bits_per_second();
        (clock_hz + bps / 2) / bps
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} baud", self.bits_per_second())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BaudRate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} baud", self.bits_per_second());
    }
}

/// Event counter that pins at `u16::MAX` instead of wrapping
///
/// A consumer only needs to know whether anything happened since it last
/// looked, so a pinned value is as good as an exact one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SaturatingCounter(u16);

impl SaturatingCounter {
    /// A zeroed counter
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Record one event
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Record `n` events
    pub fn add(&mut self, n: usize) {
        let n = u16::try_from(n).unwrap_or(u16::MAX);
        self.0 = self.0.saturating_add(n);
    }

    /// Current count
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// True once the counter has pinned
    #[must_use]
    pub const fn is_saturated(self) -> bool {
        self.0 == u16::MAX
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SaturatingCounter {
    fn format(&self, f: defmt::Formatter) {
        if self.is_saturated() {
            defmt::write!(f, ">={}", self.0);
        } else {
            defmt::write!(f, "{}", self.0);
        }
    }
}

/// Snapshot of the host-link overflow counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverflowCounts {
    /// Received bytes dropped because RX was full
    pub rx: SaturatingCounter,
    /// Outbound bytes dropped because TX was full
    pub tx: SaturatingCounter,
}

impl OverflowCounts {
    /// True if either direction has dropped data
    #[must_use]
    pub const fn any(&self) -> bool {
        self.rx.get() != 0 || self.tx.get() != 0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OverflowCounts {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "overflow(rx={}, tx={})", self.rx, self.tx);
    }
}
