//! Host serial link
//!
//! Ring buffers, the in-band escape protocol and the interrupt-driven
//! transport built on them. [`transport::SerialTransport`] is the entry
//! point; [`shared::SharedTransport`] makes it reachable from both the UART
//! interrupt and the mainline.

pub mod escape;
pub mod port;
pub mod ring;
pub mod shared;
pub mod silence;
pub mod transport;

pub use escape::{CommandCode, Escape, EscapeState};
pub use port::UartPort;
pub use ring::RingBuffer;
pub use shared::{SharedTransport, TransportHandle};
pub use silence::SilenceMonitor;
pub use transport::SerialTransport;
