//! Host USART driven at register level
//!
//! The embassy driver owns pin muxing and clock enable; after that the
//! transport needs per-byte control from its own interrupt handler, so the
//! data, status and interrupt-enable registers are accessed directly.

use embassy_stm32::pac;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::serial::UartPort;
use crate::types::BaudRate;

/// USART kernel clock with the default (HSI16) clock tree
pub const UART_CLOCK_HZ: u32 = 16_000_000;

/// USART1 plus the modem-control and indicator pins
///
/// `cts` is the peer's ready line and `rts` ours, both active low.
pub struct HostUart<Cts, Rts, Led> {
    regs: pac::usart::Usart,
    clock_hz: u32,
    cts: Cts,
    rts: Rts,
    led: Led,
}

impl<Cts, Rts, Led> HostUart<Cts, Rts, Led>
where
    Cts: InputPin,
    Rts: OutputPin,
    Led: OutputPin,
{
    /// Take over USART1 after embassy has configured its pins
    #[must_use]
    pub fn new(cts: Cts, rts: Rts, led: Led) -> Self {
        Self {
            regs: pac::USART1,
            clock_hz: UART_CLOCK_HZ,
            cts,
            rts,
            led,
        }
    }
}

impl<Cts, Rts, Led> UartPort for HostUart<Cts, Rts, Led>
where
    Cts: InputPin,
    Rts: OutputPin,
    Led: OutputPin,
{
    fn configure(&mut self, baud: BaudRate) {
        let divider = u16::try_from(baud.divider(self.clock_hz)).unwrap_or(u16::MAX);
        self.regs.cr1().modify(|w| w.set_ue(false));
        self.regs.brr().write(|w| w.set_brr(divider));
        self.regs.cr1().modify(|w| {
            w.set_te(true);
            w.set_re(true);
            w.set_ue(true);
        });
        defmt::debug!("USART1 BRR={} for {}", divider, baud);
    }

    fn set_interrupts_enabled(&mut self, enabled: bool) {
        self.regs.cr1().modify(|w| {
            w.set_rxneie(enabled);
            if !enabled {
                w.set_txeie(false);
            }
        });
    }

    fn read_data(&mut self) -> Option<u8> {
        let isr = self.regs.isr().read();
        if isr.ore() {
            self.regs.icr().write(|w| w.set_ore(true));
        }
        if !isr.rxne() {
            return None;
        }
        Some(self.regs.rdr().read().dr().to_le_bytes()[0])
    }

    fn transmit_ready(&mut self) -> bool {
        self.regs.cr1().read().txeie() && self.regs.isr().read().txe()
    }

    fn write_data(&mut self, byte: u8) {
        self.regs.tdr().write(|w| w.set_dr(u16::from(byte)));
    }

    fn kick_transmitter(&mut self) {
        self.regs.cr1().modify(|w| w.set_txeie(true));
    }

    fn stop_transmitter(&mut self) {
        self.regs.cr1().modify(|w| w.set_txeie(false));
    }

    fn peer_ready(&mut self) -> bool {
        self.cts.is_low().unwrap_or(false)
    }

    fn set_not_ready(&mut self, asserted: bool) {
        let _ = self.rts.set_state(PinState::from(asserted));
    }

    fn set_silence_indicator(&mut self, on: bool) {
        let _ = self.led.set_state(PinState::from(on));
    }
}
