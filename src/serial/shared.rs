//! Transport cell shared between the UART interrupt and the mainline
//!
//! Both contexts reach the one [`SerialTransport`] through a
//! `critical_section::Mutex`, so the index owned by the other side is never
//! read half-updated. `critical_section::with` saves and restores the prior
//! interrupt state, which makes nested use safe. The implementation is
//! chosen at link time: single-core Cortex-M in firmware, the `std` one on
//! the host.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;

use crate::command::{Action, HostLink};

use super::port::UartPort;
use super::transport::SerialTransport;

/// `static`-friendly home for a transport installed at startup
pub struct SharedTransport<P> {
    inner: Mutex<RefCell<Option<SerialTransport<P>>>>,
}

impl<P: UartPort> SharedTransport<P> {
    /// Empty cell; [`install`](Self::install) a transport before use
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Move a transport into the cell, replacing any previous one
    pub fn install(&self, transport: SerialTransport<P>) {
        critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).replace(transport);
        });
    }

    /// True once a transport has been installed
    #[must_use]
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// UART interrupt handler body
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| {
            if let Some(transport) = self.inner.borrow_ref_mut(cs).as_mut() {
                transport.service_interrupt();
            }
        });
    }

    /// Run `f` against the transport with the interrupt masked
    ///
    /// Returns `None` if nothing has been installed yet.
    pub fn with<R>(&self, f: impl FnOnce(&mut SerialTransport<P>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Next queued escape command, if any
    pub fn take_action(&self) -> Option<Action> {
        self.with(|t| t.take_action()).flatten()
    }

    /// Writer that takes the lock per chunk rather than for a whole reply
    #[must_use]
    pub fn handle(&self) -> TransportHandle<'_, P> {
        TransportHandle { shared: self }
    }
}

impl<P: UartPort> Default for SharedTransport<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mainline view of a [`SharedTransport`] used by command execution
///
/// Each call takes and releases the critical section, so a long reply does
/// not hold the UART interrupt off for its whole duration.
pub struct TransportHandle<'a, P> {
    shared: &'a SharedTransport<P>,
}

impl<P: UartPort> fmt::Write for TransportHandle<'_, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.shared
            .with(|t| fmt::Write::write_str(t, s))
            .unwrap_or(Ok(()))
    }
}

impl<P: UartPort> HostLink for TransportHandle<'_, P> {
    fn write_raw(&mut self, bytes: &[u8]) {
        self.shared.with(|t| t.write_raw(bytes));
    }

    fn clear_flush_request(&mut self) {
        self.shared.with(|t| t.clear_flush_request());
    }
}
