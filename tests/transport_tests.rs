//! Serial Transport Tests
//!
//! Tests for the interrupt-driven host link: buffering, flow control,
//! silence mode and overflow accounting.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test transport_tests

mod common;

use core::fmt::Write;

use common::{banner, drain, feed, flow_controlled, plain, read_all, transport};
use modem_firmware::config::{
    SerialConfig, BANNER_SILENCE_TICKS, FLOW_CREDIT_BURST, RX_BUFFER_SIZE, TX_BUFFER_SIZE,
};
use modem_firmware::types::BaudRate;

// =============================================================================
// Initialisation
// =============================================================================

#[test]
fn init_programs_port() {
    let t = transport(SerialConfig::from_params(115, true));
    assert_eq!(t.port().baud, Some(BaudRate::B115200));
    assert!(t.port().interrupts_enabled);
    assert!(!t.port().not_ready);
    assert!(t.config().hardware_flow_control);
}

#[test]
fn unknown_rate_code_falls_back_to_default() {
    let t = transport(SerialConfig::from_params(99, false));
    assert_eq!(t.port().baud, Some(BaudRate::B57600));
    assert_eq!(t.serial_rate_bytes_per_sec(), 57 * 125);
}

#[test]
fn init_discards_queued_data_and_counters() {
    let mut t = plain();
    feed(&mut t, &[b'a'; 300]);
    t.write_block(&[0u8; 600]);
    assert!(t.overflow_counts().any());

    t.init(SerialConfig::default());
    assert_eq!(t.read_available(), 0);
    assert_eq!(t.write_pending(), 0);
    assert!(!t.overflow_counts().any());
    assert!(t.is_tx_idle());
}

#[test]
fn init_ends_silence() {
    let mut t = plain();
    t.arm_silence(50);
    assert!(t.port().silence_led);
    t.init(SerialConfig::default());
    assert!(!t.is_silent());
    assert!(!t.port().silence_led);
    assert_eq!(t.write_block(b"up"), 2);
}

// =============================================================================
// Transmit path
// =============================================================================

#[test]
fn write_kicks_idle_transmitter() {
    let mut t = plain();
    assert!(t.is_tx_idle());
    assert!(t.write(b'a'));
    assert!(!t.is_tx_idle());
    assert_eq!(t.port().kicks, 1);
    assert_eq!(drain(&mut t), b"a");
    assert!(t.is_tx_idle());
}

#[test]
fn block_write_goes_out_in_order() {
    let mut t = plain();
    assert_eq!(t.write_block(b"hello world"), 11);
    assert_eq!(drain(&mut t), b"hello world");
    assert_eq!(t.write_space(), TX_BUFFER_SIZE - 1);
}

#[test]
fn block_write_truncates_and_counts() {
    let mut t = plain();
    let accepted = t.write_block(&[0x55; 600]);
    assert_eq!(accepted, TX_BUFFER_SIZE - 1);
    assert_eq!(t.overflow_counts().tx.get(), 89);
    assert_eq!(t.write_space(), 0);
    assert!(!t.write(0x55));
}

#[test]
fn formatted_replies_use_crlf() {
    let mut t = plain();
    write!(t, "A\nB").unwrap();
    assert_eq!(drain(&mut t), b"A\r\nB");
}

#[test]
fn service_interrupt_handles_both_directions() {
    let mut t = plain();
    t.write(b'o');
    t.port_mut().pending_rx = Some(b'i');
    t.service_interrupt();
    assert_eq!(t.read(), Some(b'i'));
    assert_eq!(t.port().sent, b"o");
}

// =============================================================================
// Flow control
// =============================================================================

#[test]
fn no_credit_after_init() {
    let mut t = flow_controlled();
    t.port_mut().peer_ready = false;
    t.write(b'x');
    assert!(t.is_tx_idle());
    assert!(drain(&mut t).is_empty());
    assert_eq!(t.write_pending(), 1);
}

#[test]
fn clear_line_grants_a_burst() {
    let mut t = flow_controlled();
    t.write_block(&[7u8; 20]);

    // first byte samples the line and takes one credit from the burst
    t.on_transmit_ready();
    t.port_mut().peer_ready = false;
    let burst = drain(&mut t);
    assert_eq!(burst.len(), usize::from(FLOW_CREDIT_BURST));
    assert!(t.is_tx_idle());
    assert_eq!(t.write_pending(), 20 - usize::from(FLOW_CREDIT_BURST));
}

#[test]
fn gate_reopens_from_mainline() {
    let mut t = flow_controlled();
    t.port_mut().peer_ready = false;
    t.write_block(b"queued");
    t.check_flow_gate();
    assert!(!t.port().tx_armed);

    t.port_mut().peer_ready = true;
    t.check_flow_gate();
    assert!(t.port().tx_armed);
    assert_eq!(drain(&mut t), b"queued");
}

#[test]
fn line_sampled_once_per_burst() {
    let mut t = flow_controlled();
    t.write_block(&[1u8; 16]);
    let before = t.port().peer_samples;
    drain(&mut t);
    assert_eq!(t.port().peer_samples - before, 2);
}

#[test]
fn idle_transmitter_forfeits_unused_credit() {
    let mut t = flow_controlled();
    t.write_block(b"abc");
    assert_eq!(drain(&mut t), b"abc");

    t.port_mut().peer_ready = false;
    t.write_block(b"0123456789");
    assert!(drain(&mut t).is_empty());
    t.check_flow_gate();
    assert!(!t.port().tx_armed);
    assert_eq!(t.write_pending(), 10);

    t.port_mut().peer_ready = true;
    t.check_flow_gate();
    assert_eq!(drain(&mut t), b"0123456789");
}

#[test]
fn flow_control_off_ignores_peer() {
    let mut t = plain();
    t.port_mut().peer_ready = false;
    t.write_block(b"go");
    assert_eq!(drain(&mut t), b"go");
    assert_eq!(t.port().peer_samples, 0);
}

#[test]
fn exclusive_mode_bypasses_gate_and_escapes() {
    let mut t = flow_controlled();
    t.port_mut().peer_ready = false;
    assert!(!t.is_exclusive());
    t.set_exclusive_mode(true);
    assert!(t.is_exclusive());
    t.write(b'k');
    assert_eq!(drain(&mut t), b"k");

    feed(&mut t, b"!!x");
    assert!(!t.take_flush_request());
    assert_eq!(read_all(&mut t), b"!!x");
}

// =============================================================================
// Receive path
// =============================================================================

#[test]
fn ready_line_has_hysteresis() {
    let mut t = plain();
    // capacity is 255; asserted once free drops below 17
    feed(&mut t, &[b'a'; 238]);
    assert!(!t.is_not_ready());
    feed(&mut t, b"a");
    assert!(t.is_not_ready());
    assert!(t.port().not_ready);

    for _ in 0..18 {
        t.read();
    }
    assert!(t.is_not_ready());
    t.read();
    assert!(!t.is_not_ready());
    assert!(!t.port().not_ready);
}

#[test]
fn rx_overflow_counts_dropped_bytes() {
    let mut t = plain();
    feed(&mut t, &[b'z'; 300]);
    assert_eq!(t.read_available(), RX_BUFFER_SIZE - 1);
    assert_eq!(t.overflow_counts().rx.get(), 45);
}

#[test]
fn read_block_fails_without_consuming() {
    let mut t = plain();
    feed(&mut t, b"abc");
    let mut out = [0u8; 4];
    assert!(!t.read_block(&mut out));
    assert_eq!(t.read_available(), 3);
    let mut out = [0u8; 3];
    assert!(t.read_block(&mut out));
    assert_eq!(&out, b"abc");
}

#[test]
fn peek_looks_ahead() {
    let mut t = plain();
    feed(&mut t, b"xyz");
    assert_eq!(t.peek(), Some(b'x'));
    assert_eq!(t.peek_at(2), Some(b'z'));
    assert_eq!(t.peek_at(3), None);
    assert_eq!(t.read_available(), 3);
}

#[test]
fn read_space_reporting() {
    let mut t = plain();
    assert_eq!(t.read_space_bytes(), RX_BUFFER_SIZE);
    assert_eq!(t.read_space_percent(), 100);
    feed(&mut t, &[b'q'; 128]);
    assert_eq!(t.read_space_bytes(), 128);
    assert_eq!(t.read_space_percent(), 50);
}

// =============================================================================
// Silence mode
// =============================================================================

#[test]
fn banner_silences_output() {
    let mut t = plain();
    feed(&mut t, &banner());
    assert!(t.is_silent());
    assert!(t.port().silence_led);

    assert!(!t.write(b'a'));
    assert_eq!(t.write_block(b"abc"), 0);
    assert_eq!(t.overflow_counts().tx.get(), 0);
    assert_eq!(t.write_pending(), 0);
}

#[test]
fn silence_expires_after_window() {
    let mut t = plain();
    feed(&mut t, &banner());
    for _ in 1..BANNER_SILENCE_TICKS {
        t.tick();
    }
    assert!(t.is_silent());
    t.tick();
    assert!(!t.is_silent());
    assert!(!t.port().silence_led);
    assert!(t.write(b'a'));
}

#[test]
fn escape_byte_ends_silence() {
    let mut t = plain();
    t.arm_silence(1000);
    feed(&mut t, b"!");
    assert!(!t.is_silent());
    assert!(!t.port().silence_led);
}

#[test]
fn command_replies_bypass_silence() {
    let mut t = plain();
    t.arm_silence(1000);
    write!(t, "ok").unwrap();
    assert_eq!(drain(&mut t), b"ok");
    assert!(t.is_silent());
}

// =============================================================================
// Shared cell
// =============================================================================

#[test]
fn shared_cell_routes_interrupt_and_mainline() {
    use modem_firmware::command::{Action, HostLink};
    use modem_firmware::serial::SharedTransport;

    let shared: SharedTransport<common::MockPort> = SharedTransport::new();
    assert!(!shared.is_installed());
    shared.on_interrupt();
    assert_eq!(shared.take_action(), None);

    shared.install(plain());
    assert!(shared.is_installed());

    for &b in b"!h" {
        shared.with(|t| t.port_mut().pending_rx = Some(b));
        shared.on_interrupt();
    }
    assert_eq!(shared.take_action(), Some(Action::Heartbeat));

    let mut link = shared.handle();
    write!(link, "hi\n").unwrap();
    link.write_raw(&[0x05]);
    let sent = shared.with(|t| drain(t)).unwrap();
    assert_eq!(sent, b"hi\r\n\x05");
}
