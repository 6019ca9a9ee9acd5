//! Interrupt-driven host serial transport
//!
//! Owns the RX and TX ring buffers and everything the UART interrupt
//! touches: escape recognition, operand capture for escape commands, the
//! credit gate on the peer's ready line, our own ready-to-receive
//! hysteresis, banner silence and the overflow counters.
//!
//! Nothing here waits. Writes that do not fit are truncated and counted,
//! reads that cannot be satisfied fail without consuming anything.
//!
//! # Contexts
//!
//! [`SerialTransport::service_interrupt`] (and the `on_*` handlers it calls)
//! run in the UART interrupt. Everything else is called from the mainline
//! loop. The transport is reached from both through
//! [`SharedTransport`](super::shared::SharedTransport).

use core::fmt;

use heapless::Deque;

use crate::command::{Action, HostLink};
use crate::config::{
    tx_power, SerialConfig, ACTION_QUEUE_DEPTH, EEPROM_PAGE_FILL, EEPROM_PAGE_SIZE, EEPROM_SIZE,
    ERROR_INDICATOR, ESCAPE_BYTE, FLOW_CREDIT_BURST, RX_BUFFER_SIZE, RX_READY_HIGH_WATERMARK,
    RX_READY_LOW_WATERMARK, TX_BUFFER_SIZE, VERSION_REPLY,
};
use crate::types::{OverflowCounts, SaturatingCounter};

use super::escape::{CommandCode, Escape, EscapeState};
use super::port::UartPort;
use super::ring::RingBuffer;
use super::silence::SilenceMonitor;

/// Bytes the host must leave in RX to confirm a reprogram request
const REPROGRAM_CONFIRMATION: &[u8] = b"up";

/// Host serial transport over a [`UartPort`]
pub struct SerialTransport<P> {
    port: P,
    config: SerialConfig,
    rx: RingBuffer<RX_BUFFER_SIZE>,
    tx: RingBuffer<TX_BUFFER_SIZE>,
    tx_idle: bool,
    credit: u8,
    not_ready: bool,
    exclusive: bool,
    escape: EscapeState,
    flush_requested: bool,
    actions: Deque<Action, ACTION_QUEUE_DEPTH>,
    silence: SilenceMonitor,
    rx_overflow: SaturatingCounter,
    tx_overflow: SaturatingCounter,
}

impl<P: UartPort> SerialTransport<P> {
    /// Wrap a port; call [`init`](Self::init) before enabling the interrupt
    #[must_use]
    pub fn new(port: P) -> Self {
        Self {
            port,
            config: SerialConfig::default(),
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            tx_idle: true,
            credit: 0,
            not_ready: false,
            exclusive: false,
            escape: EscapeState::new(),
            flush_requested: false,
            actions: Deque::new(),
            silence: SilenceMonitor::new(),
            rx_overflow: SaturatingCounter::new(),
            tx_overflow: SaturatingCounter::new(),
        }
    }

    /// Reset all buffers and link state and reprogram the UART
    ///
    /// Queued data in both directions is discarded and silence mode ends.
    pub fn init(&mut self, config: SerialConfig) {
        self.port.set_interrupts_enabled(false);

        self.rx.reset();
        self.tx.reset();
        self.tx_idle = true;
        self.credit = 0;
        self.exclusive = false;
        self.escape = EscapeState::new();
        self.flush_requested = false;
        self.actions.clear();
        self.silence = SilenceMonitor::new();
        self.port.set_silence_indicator(false);
        self.rx_overflow = SaturatingCounter::new();
        self.tx_overflow = SaturatingCounter::new();

        self.config = config;
        self.port.configure(config.baud);

        self.not_ready = false;
        self.port.set_not_ready(false);

        self.port.set_interrupts_enabled(true);

        #[cfg(feature = "embedded")]
        defmt::info!("serial init: {}", config);
    }

    // ------------------------------------------------------------------
    // Interrupt context
    // ------------------------------------------------------------------

    /// UART interrupt entry: receive first, then transmit
    pub fn service_interrupt(&mut self) {
        if let Some(byte) = self.port.read_data() {
            self.on_receive(byte);
        }
        if self.port.transmit_ready() {
            self.on_transmit_ready();
        }
    }

    /// Handle one received byte
    pub fn on_receive(&mut self, byte: u8) {
        if self.silence.observe(byte) {
            self.port.set_silence_indicator(true);
            #[cfg(feature = "embedded")]
            defmt::info!("boot banner detected, going silent");
        }

        if self.exclusive {
            self.queue_rx(byte);
            self.refresh_ready_gate();
            return;
        }

        // the escape byte cannot come out of a mangled banner character
        if byte == ESCAPE_BYTE {
            self.cancel_silence();
        }

        let (state, escape) = self.escape.step(byte);
        self.escape = state;
        match escape {
            Escape::Data(b) => self.queue_rx(b),
            Escape::Consumed => {}
            Escape::Flush => self.flush_requested = true,
            Escape::Command(code) => self.dispatch(code),
            Escape::Unrecognized => {
                self.enqueue_tx(ERROR_INDICATOR);
            }
        }

        self.refresh_ready_gate();
    }

    /// Handle the transmit-data-register-empty interrupt
    pub fn on_transmit_ready(&mut self) {
        if self.tx.is_empty() || !self.take_credit() {
            // leftover credit must not outlive the burst it was granted for
            self.credit = 0;
            self.tx_idle = true;
            self.port.stop_transmitter();
            return;
        }
        if let Some(byte) = self.tx.try_pop() {
            self.port.write_data(byte);
        }
    }

    fn queue_rx(&mut self, byte: u8) {
        if !self.rx.try_push(byte) {
            self.rx_overflow.increment();
        }
    }

    /// Resolve a command code, capturing any operands from RX
    ///
    /// Only memory is touched here; collaborator calls are deferred to the
    /// mainline through the action queue.
    fn dispatch(&mut self, code: CommandCode) {
        let action = match code {
            CommandCode::ClearRx => {
                self.rx.clear();
                return;
            }
            CommandCode::Version => {
                self.enqueue_tx(VERSION_REPLY);
                return;
            }
            CommandCode::Reprogram => {
                let confirmed = self.rx.holds_exactly(REPROGRAM_CONFIRMATION);
                for _ in REPROGRAM_CONFIRMATION {
                    self.rx.try_pop();
                }
                if !confirmed {
                    return;
                }
                Action::Reprogram
            }
            CommandCode::EepromAddress => {
                let address = self.drain_hex_address();
                if address == 0 {
                    self.cancel_silence();
                }
                Action::SetEepromAddress(address)
            }
            CommandCode::EepromWritePage => {
                let mut page = [EEPROM_PAGE_FILL; EEPROM_PAGE_SIZE];
                for slot in &mut page {
                    match self.rx.try_pop() {
                        Some(b) => *slot = b,
                        None => break,
                    }
                }
                Action::WriteEepromPage(page)
            }
            CommandCode::EepromWriteByte => match self.rx.try_pop() {
                Some(b) => Action::WriteEepromByte(b),
                None => {
                    self.enqueue_tx(ERROR_INDICATOR);
                    return;
                }
            },
            CommandCode::PowerLow => Action::SetTxPower(tx_power::LOW_DBM),
            CommandCode::PowerHigh => Action::SetTxPower(tx_power::HIGH_DBM),
            CommandCode::PowerMax => Action::SetTxPower(tx_power::MAX_DBM),
            CommandCode::QueryPower => Action::ReportTxPower,
            CommandCode::FirmwareIdentity => Action::FirmwareIdentity,
            CommandCode::Heartbeat => Action::Heartbeat,
            CommandCode::Reset => Action::Reset,
            CommandCode::RestoreDefaults => Action::RestoreDefaults,
            CommandCode::ParameterDump => Action::ParameterDump,
            CommandCode::EepromDump => Action::DumpEeprom,
            CommandCode::EepromDumpBinary => Action::DumpEepromBinary,
            CommandCode::EepromPowerOn => Action::EepromPower(true),
            CommandCode::EepromPowerOff => Action::EepromPower(false),
            CommandCode::EepromWriteEnable => Action::EepromWriteEnable,
            CommandCode::Reinit => Action::Reinit,
            CommandCode::UserPin { pin, high } => Action::UserPin { pin, high },
        };

        if let Err(_dropped) = self.actions.push_back(action) {
            #[cfg(feature = "embedded")]
            defmt::warn!("action queue full, dropped {}", _dropped);
            self.enqueue_tx(ERROR_INDICATOR);
        }
    }

    /// Consume all of RX as hex digits; non-hex bytes count as zero
    fn drain_hex_address(&mut self) -> u16 {
        let mut address: u16 = 0;
        while let Some(byte) = self.rx.try_pop() {
            address = address.wrapping_shl(4).wrapping_add(u16::from(hex_value(byte)));
        }
        address % EEPROM_SIZE
    }

    // ------------------------------------------------------------------
    // Flow control
    // ------------------------------------------------------------------

    fn gate_open(&mut self) -> bool {
        !self.config.hardware_flow_control
            || self.exclusive
            || self.credit > 0
            || self.port.peer_ready()
    }

    /// Spend one credit, sampling the peer line only when credit runs out
    fn take_credit(&mut self) -> bool {
        if !self.config.hardware_flow_control || self.exclusive {
            return true;
        }
        if self.credit > 0 {
            self.credit -= 1;
            return true;
        }
        if self.port.peer_ready() {
            self.credit = FLOW_CREDIT_BURST - 1;
            return true;
        }
        false
    }

    fn restart(&mut self) {
        if !self.gate_open() {
            return;
        }
        self.tx_idle = false;
        self.port.kick_transmitter();
    }

    /// Restart an idle transmitter once the flow-control gate opens
    pub fn check_flow_gate(&mut self) {
        if !self.tx.is_empty() && self.tx_idle {
            self.restart();
        }
    }

    fn refresh_ready_gate(&mut self) {
        let free = self.rx.free();
        if !self.not_ready && free < RX_READY_LOW_WATERMARK {
            self.not_ready = true;
            self.port.set_not_ready(true);
        } else if self.not_ready && free > RX_READY_HIGH_WATERMARK {
            self.not_ready = false;
            self.port.set_not_ready(false);
        }
    }

    /// True while we are telling the peer to hold off
    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        self.not_ready
    }

    /// Route received bytes straight to RX, bypassing escapes and gating
    pub fn set_exclusive_mode(&mut self, exclusive: bool) {
        self.exclusive = exclusive;
        if exclusive {
            self.escape = EscapeState::new();
            self.check_flow_gate();
        }
    }

    /// True while exclusive command mode owns the link
    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    // ------------------------------------------------------------------
    // Transmit side (mainline)
    // ------------------------------------------------------------------

    fn enqueue_tx(&mut self, byte: u8) -> bool {
        if !self.tx.try_push(byte) {
            self.tx_overflow.increment();
            return false;
        }
        if self.tx_idle {
            self.restart();
        }
        true
    }

    /// Queue one byte; refused while silent or when TX is full
    pub fn write(&mut self, byte: u8) -> bool {
        if self.silence.is_active() || self.tx.is_full() {
            return false;
        }
        self.enqueue_tx(byte)
    }

    /// Queue as much of `bytes` as fits; returns the accepted count
    ///
    /// Every byte that does not fit is counted as a TX overflow. While
    /// silent nothing is accepted and nothing is counted.
    pub fn write_block(&mut self, bytes: &[u8]) -> usize {
        if self.silence.is_active() || bytes.is_empty() {
            return 0;
        }
        let accepted = self.tx.try_push_block(bytes);
        self.tx_overflow.add(bytes.len() - accepted);
        if accepted > 0 && self.tx_idle {
            self.restart();
        }
        accepted
    }

    /// Free space in TX
    #[must_use]
    pub const fn write_space(&self) -> usize {
        self.tx.free()
    }

    /// Bytes queued in TX and not yet on the wire
    #[must_use]
    pub const fn write_pending(&self) -> usize {
        self.tx.len()
    }

    /// True while the transmit interrupt is parked
    #[must_use]
    pub const fn is_tx_idle(&self) -> bool {
        self.tx_idle
    }

    // ------------------------------------------------------------------
    // Receive side (mainline)
    // ------------------------------------------------------------------

    /// Take the oldest received byte
    pub fn read(&mut self) -> Option<u8> {
        let byte = self.rx.try_pop();
        self.refresh_ready_gate();
        byte
    }

    /// Fill `out` from RX, or consume nothing if too few bytes are queued
    pub fn read_block(&mut self, out: &mut [u8]) -> bool {
        if !self.rx.try_pop_block(out) {
            return false;
        }
        self.refresh_ready_gate();
        true
    }

    /// Next byte to be read, without consuming it
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek(0)
    }

    /// Byte `offset` places after the next one, without consuming anything
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.rx.peek(offset)
    }

    /// Bytes ready to read
    #[must_use]
    pub const fn read_available(&self) -> usize {
        self.rx.len()
    }

    /// RX headroom in bytes, counting the reserved slot
    #[must_use]
    pub const fn read_space_bytes(&self) -> usize {
        RX_BUFFER_SIZE - self.rx.len()
    }

    /// RX headroom as a percentage, in 8-byte steps
    #[must_use]
    pub fn read_space_percent(&self) -> u8 {
        let space = self.read_space_bytes();
        let percent = (100 * (space / 8)) / (RX_BUFFER_SIZE / 8);
        u8::try_from(percent).unwrap_or(100)
    }

    // ------------------------------------------------------------------
    // Signals and housekeeping (mainline)
    // ------------------------------------------------------------------

    /// Consume the `!!` flush signal
    pub fn take_flush_request(&mut self) -> bool {
        core::mem::take(&mut self.flush_requested)
    }

    /// Next escape command waiting for the mainline
    pub fn take_action(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    /// Count one mainline tick against the silence window
    pub fn tick(&mut self) {
        if self.silence.tick() {
            self.port.set_silence_indicator(false);
            #[cfg(feature = "embedded")]
            defmt::info!("silence window expired");
        }
    }

    /// Refuse outbound writes for `ticks` mainline ticks
    pub fn arm_silence(&mut self, ticks: u16) {
        self.silence.arm(ticks);
        self.port.set_silence_indicator(ticks != 0);
    }

    /// End silence mode immediately
    pub fn cancel_silence(&mut self) {
        if self.silence.cancel() {
            self.port.set_silence_indicator(false);
        }
    }

    /// True while outbound writes are refused
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        self.silence.is_active()
    }

    /// Snapshot of both overflow counters
    #[must_use]
    pub const fn overflow_counts(&self) -> OverflowCounts {
        OverflowCounts {
            rx: self.rx_overflow,
            tx: self.tx_overflow,
        }
    }

    /// Active link configuration
    #[must_use]
    pub const fn config(&self) -> SerialConfig {
        self.config
    }

    /// Byte rate the packet layer should assume for framing timeouts
    #[must_use]
    pub const fn serial_rate_bytes_per_sec(&self) -> u32 {
        self.config.baud.framing_bytes_per_second()
    }

    /// Underlying port
    #[must_use]
    pub const fn port(&self) -> &P {
        &self.port
    }

    /// Underlying port, mutably
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

/// Command replies bypass silence: a command implies the host is listening
impl<P: UartPort> fmt::Write for SerialTransport<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.enqueue_tx(b'\r');
            }
            self.enqueue_tx(byte);
        }
        Ok(())
    }
}

impl<P: UartPort> HostLink for SerialTransport<P> {
    fn write_raw(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.enqueue_tx(byte);
        }
    }

    fn clear_flush_request(&mut self) {
        self.flush_requested = false;
    }
}

const fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'A'..=b'F' => byte - b'A' + 10,
        b'a'..=b'f' => byte - b'a' + 10,
        _ => 0,
    }
}
