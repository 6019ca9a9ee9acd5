//! Hardware Abstraction Layer
//!
//! STM32G474 bindings for the traits the portable core is written against:
//! the host USART behind [`UartPort`](crate::serial::UartPort), the
//! parameter EEPROM behind [`Eeprom`](crate::command::Eeprom) and the
//! board's indicator and user pins.

pub mod eeprom;
pub mod gpio;
pub mod uart;
