//! Shared test fixtures: a recording UART and transport helpers

#![allow(dead_code)]

use modem_firmware::config::SerialConfig;
use modem_firmware::serial::{SerialTransport, UartPort};
use modem_firmware::types::BaudRate;

/// UART that records everything the transport does to it
#[derive(Debug)]
pub struct MockPort {
    pub baud: Option<BaudRate>,
    pub interrupts_enabled: bool,
    pub pending_rx: Option<u8>,
    pub sent: Vec<u8>,
    pub tx_armed: bool,
    pub kicks: usize,
    pub peer_ready: bool,
    pub peer_samples: usize,
    pub not_ready: bool,
    pub silence_led: bool,
}

impl MockPort {
    pub fn new() -> Self {
        Self {
            baud: None,
            interrupts_enabled: false,
            pending_rx: None,
            sent: Vec::new(),
            tx_armed: false,
            kicks: 0,
            peer_ready: true,
            peer_samples: 0,
            not_ready: false,
            silence_led: false,
        }
    }
}

impl UartPort for MockPort {
    fn configure(&mut self, baud: BaudRate) {
        self.baud = Some(baud);
    }

    fn set_interrupts_enabled(&mut self, enabled: bool) {
        self.interrupts_enabled = enabled;
    }

    fn read_data(&mut self) -> Option<u8> {
        self.pending_rx.take()
    }

    fn transmit_ready(&mut self) -> bool {
        self.tx_armed
    }

    fn write_data(&mut self, byte: u8) {
        self.sent.push(byte);
    }

    fn kick_transmitter(&mut self) {
        self.tx_armed = true;
        self.kicks += 1;
    }

    fn stop_transmitter(&mut self) {
        self.tx_armed = false;
    }

    fn peer_ready(&mut self) -> bool {
        self.peer_samples += 1;
        self.peer_ready
    }

    fn set_not_ready(&mut self, asserted: bool) {
        self.not_ready = asserted;
    }

    fn set_silence_indicator(&mut self, on: bool) {
        self.silence_led = on;
    }
}

pub type Transport = SerialTransport<MockPort>;

/// Transport initialised with `config`
pub fn transport(config: SerialConfig) -> Transport {
    let mut t = SerialTransport::new(MockPort::new());
    t.init(config);
    t
}

/// Transport at the default rate without hardware flow control
pub fn plain() -> Transport {
    transport(SerialConfig::default())
}

/// Transport with hardware flow control enabled
pub fn flow_controlled() -> Transport {
    transport(SerialConfig {
        hardware_flow_control: true,
        ..SerialConfig::default()
    })
}

/// Deliver bytes to the receive path
pub fn feed(t: &mut Transport, bytes: &[u8]) {
    for &b in bytes {
        t.on_receive(b);
    }
}

/// Run transmit interrupts until the transmitter parks
pub fn drain(t: &mut Transport) -> Vec<u8> {
    let mut guard = 0;
    while t.port().tx_armed && guard < 10_000 {
        t.on_transmit_ready();
        guard += 1;
    }
    std::mem::take(&mut t.port_mut().sent)
}

/// Everything queued in RX
pub fn read_all(t: &mut Transport) -> Vec<u8> {
    std::iter::from_fn(|| t.read()).collect()
}

/// Banner run long enough to arm silence
pub fn banner() -> Vec<u8> {
    (0..=80)
        .map(|i| if i % 2 == 0 { 0x86 } else { 0x98 })
        .collect()
}
