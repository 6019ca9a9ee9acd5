//! UART hardware seam
//!
//! The transport drives the peripheral only through this trait, so the same
//! logic runs against the STM32 USART in firmware and a recording mock in
//! host tests.

use crate::types::BaudRate;

/// Register-level operations the transport needs from a UART
pub trait UartPort {
    /// Program the clock divider for `baud`
    fn configure(&mut self, baud: BaudRate);

    /// Enable or disable the UART receive/transmit interrupt
    fn set_interrupts_enabled(&mut self, enabled: bool);

    /// Take the received byte, if the receive flag is set
    fn read_data(&mut self) -> Option<u8>;

    /// True if the transmit interrupt is armed and the data register is free
    fn transmit_ready(&mut self) -> bool;

    /// Load the transmit data register
    fn write_data(&mut self, byte: u8);

    /// Arm the transmit interrupt so the handler runs and sends a byte
    fn kick_transmitter(&mut self);

    /// Disarm the transmit interrupt; the transmitter is idle
    fn stop_transmitter(&mut self);

    /// True when the peer's ready-to-receive line says it has room
    fn peer_ready(&mut self) -> bool;

    /// Drive our ready-to-receive output; `true` tells the peer to hold off
    fn set_not_ready(&mut self, asserted: bool);

    /// Light or clear the silence-mode indicator
    fn set_silence_indicator(&mut self, on: bool);
}
