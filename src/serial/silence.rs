//! Companion boot-banner detection and the timed silence window
//!
//! The companion host prints a long run of asterisks at half our line rate
//! while it boots; at our rate those arrive as alternating `0x86 0x98`
//! bytes. Anything we transmit during that time lands on its console, so a
//! sufficiently long run arms a silence window during which outbound writes
//! are refused.

use crate::config::{BANNER_BYTE_A, BANNER_BYTE_B, BANNER_RUN_LENGTH, BANNER_SILENCE_TICKS};

/// Banner detector plus silence countdown
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SilenceMonitor {
    last_byte: u8,
    run: u8,
    remaining: u16,
}

impl SilenceMonitor {
    /// Idle monitor, not silent
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_byte: 0,
            run: 0,
            remaining: 0,
        }
    }

    /// Feed one received byte; returns true when this byte armed silence
    pub fn observe(&mut self, byte: u8) -> bool {
        let alternating = (self.last_byte == BANNER_BYTE_A && byte == BANNER_BYTE_B)
            || (self.last_byte == BANNER_BYTE_B && byte == BANNER_BYTE_A);
        self.run = if alternating {
            self.run.saturating_add(1)
        } else {
            0
        };
        self.last_byte = byte;

        if self.run >= BANNER_RUN_LENGTH {
            self.run = 0;
            self.arm(BANNER_SILENCE_TICKS);
            return true;
        }
        false
    }

    /// Start (or restart) a silence window of `ticks` mainline ticks
    pub fn arm(&mut self, ticks: u16) {
        self.remaining = ticks;
    }

    /// End silence immediately; returns true if it was active
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.remaining = 0;
        was_active
    }

    /// Count one mainline tick; returns true when the window just expired
    pub fn tick(&mut self) -> bool {
        match self.remaining {
            0 => false,
            1 => {
                self.remaining = 0;
                true
            }
            _ => {
                self.remaining -= 1;
                false
            }
        }
    }

    /// True while outbound writes must be refused
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.remaining != 0
    }

    /// Ticks left in the current window
    #[must_use]
    pub const fn remaining_ticks(&self) -> u16 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_of_eighty_arms() {
        let mut monitor = SilenceMonitor::new();
        // first byte has no predecessor pair, so 81 bytes make 80 pairs
        let mut armed = false;
        for i in 0..=80u8 {
            let byte = if i % 2 == 0 { BANNER_BYTE_A } else { BANNER_BYTE_B };
            armed = monitor.observe(byte);
        }
        assert!(armed);
        assert_eq!(monitor.remaining_ticks(), BANNER_SILENCE_TICKS);
    }

    #[test]
    fn broken_run_restarts() {
        let mut monitor = SilenceMonitor::new();
        for i in 0..79u8 {
            let byte = if i % 2 == 0 { BANNER_BYTE_A } else { BANNER_BYTE_B };
            monitor.observe(byte);
        }
        monitor.observe(b'x');
        assert!(!monitor.is_active());
    }

    #[test]
    fn window_expires_once() {
        let mut monitor = SilenceMonitor::new();
        monitor.arm(2);
        assert!(!monitor.tick());
        assert!(monitor.tick());
        assert!(!monitor.tick());
        assert!(!monitor.is_active());
    }
}
