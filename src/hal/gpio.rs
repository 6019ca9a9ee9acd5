//! GPIO Abstractions
//!
//! User pins the host can drive through the `!0`..`!9` escapes.

use embassy_stm32::gpio::{Flex, Level, Speed};

use crate::config::USER_PIN_COUNT;

/// Host-controlled user pins
///
/// Pins float as inputs until the host first drives them.
pub struct UserPins<'d> {
    pins: [Flex<'d>; USER_PIN_COUNT as usize],
}

impl<'d> UserPins<'d> {
    /// Wrap the board's user pins, in pin-number order
    #[must_use]
    pub fn new(pins: [Flex<'d>; USER_PIN_COUNT as usize]) -> Self {
        Self { pins }
    }

    /// Make `pin` an output at the given level; out-of-range pins are ignored
    pub fn drive(&mut self, pin: u8, high: bool) {
        if let Some(flex) = self.pins.get_mut(usize::from(pin)) {
            flex.set_level(Level::from(high));
            flex.set_as_output(Speed::Low);
            defmt::debug!("user pin {} -> {}", pin, high);
        }
    }
}
