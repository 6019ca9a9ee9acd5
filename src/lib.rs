//! FHSS Packet Radio Modem Firmware Library
//!
//! Core of the modem firmware for an STM32G474 board: the interrupt-driven
//! host serial link and the bit interleaver used by the FEC pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Command Dispatcher  │  Packet / MAC (external)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    SERIAL / FEC LAYER                        │
//! │  Transport  │  Escape Protocol  │  Ring Buffers  │ Interleave │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  USART1  │  I2C EEPROM  │  GPIO                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Contexts
//!
//! Exactly two: the USART interrupt, which runs the receive path and the
//! transmit drain, and the mainline loop, which produces outbound bytes,
//! consumes inbound ones and executes queued escape commands. Nothing in
//! either path blocks.

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// STM32G474 implementations of the core's hardware traits.
#[cfg(feature = "embedded")]
pub mod hal;

/// Host Serial Link
///
/// Ring buffers, escape protocol, flow control and the shared transport.
pub mod serial;

/// Escape Command Execution
///
/// Mainline side of the escape protocol and its collaborator traits.
pub mod command;

/// Forward Error Correction
///
/// Bit interleaver for payload blocks.
pub mod fec;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::command::{Action, CommandDispatcher, Eeprom, HostLink, ModemControl};
    pub use crate::config::*;
    pub use crate::serial::{SerialTransport, SharedTransport, UartPort};
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
