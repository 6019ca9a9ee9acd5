//! Escape command execution
//!
//! The UART interrupt only recognizes commands and captures their operands
//! from RX; it then queues an [`Action`]. The mainline loop drains that
//! queue into [`CommandDispatcher::execute`], which is where EEPROM I/O and
//! radio changes happen, well away from the time-critical interrupt.
//!
//! Replies follow the host tooling's expectations: text lines end in CRLF
//! and numbers are lowercase hex without padding.

use core::fmt::{self, Write};

use crate::config::{EEPROM_DUMP_LEN, EEPROM_PAGE_SIZE, EEPROM_SIZE, USER_PIN_COUNT};

/// Byte that opens each binary dump record
const DUMP_RECORD_TAG: u8 = 5;

/// Filler the page buffer holds before a read-back
const READ_BACK_FILL: u8 = 0xEE;

/// Resolved escape command, ready for the mainline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Set transmit power in dBm
    SetTxPower(u8),
    /// Reply with the current transmit power
    ReportTxPower,
    /// Reply with firmware identity checksums
    FirmwareIdentity,
    /// Ask the MAC for a heartbeat
    Heartbeat,
    /// Hardware reset
    Reset,
    /// Restore default parameters
    RestoreDefaults,
    /// Ask for a parameter dump from EEPROM
    ParameterDump,
    /// Reboot into reprogram mode (already confirmed)
    Reprogram,
    /// Move the EEPROM pointer
    SetEepromAddress(u16),
    /// Write one page at the EEPROM pointer
    WriteEepromPage([u8; EEPROM_PAGE_SIZE]),
    /// Write one byte at the EEPROM pointer and advance it
    WriteEepromByte(u8),
    /// Dump EEPROM from the pointer as text
    DumpEeprom,
    /// Dump EEPROM from the pointer as binary records
    DumpEepromBinary,
    /// Switch EEPROM power
    EepromPower(bool),
    /// Lift EEPROM write protection until the next write
    EepromWriteEnable,
    /// Re-initialise the modem
    Reinit,
    /// Drive a user pin
    UserPin {
        /// Pin number
        pin: u8,
        /// Level
        high: bool,
    },
}

#[cfg(feature = "embedded")]
impl defmt::Format for Action {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SetTxPower(dbm) => defmt::write!(f, "SetTxPower({}dBm)", dbm),
            Self::SetEepromAddress(addr) => defmt::write!(f, "SetEepromAddress(0x{:03X})", addr),
            Self::WriteEepromPage(_) => defmt::write!(f, "WriteEepromPage"),
            Self::WriteEepromByte(b) => defmt::write!(f, "WriteEepromByte(0x{:02X})", b),
            Self::EepromPower(on) => defmt::write!(f, "EepromPower({})", on),
            Self::UserPin { pin, high } => defmt::write!(f, "UserPin({}, {})", pin, high),
            other => defmt::write!(f, "{}", defmt::Debug2Format(other)),
        }
    }
}

/// Host-facing output used by command replies
pub trait HostLink: fmt::Write {
    /// Queue bytes verbatim, without newline translation
    fn write_raw(&mut self, bytes: &[u8]);

    /// Drop a pending `!!` flush signal
    fn clear_flush_request(&mut self);
}

/// Radio and system services commands reach into
pub trait ModemControl {
    /// Set transmit power in dBm
    fn set_tx_power(&mut self, dbm: u8);

    /// Current transmit power in dBm
    fn tx_power(&self) -> u8;

    /// Ask the MAC to send a heartbeat
    fn request_heartbeat(&mut self);

    /// Forget any outstanding heartbeat request
    fn cancel_heartbeat(&mut self);

    /// Ask the parameter subsystem to dump EEPROM parameters
    fn request_parameter_dump(&mut self);

    /// Reset persisted parameters to defaults
    fn restore_defaults(&mut self);

    /// Re-run radio and link initialisation
    fn reinit(&mut self);

    /// Software reset; on hardware this does not return
    fn reset(&mut self);

    /// Invalidate the application signature and reset into the bootloader
    fn enter_bootloader(&mut self);

    /// Write the firmware identity summary to `out`
    fn firmware_identity(&mut self, out: &mut impl fmt::Write) -> fmt::Result;

    /// Drive user pin `pin` as an output at the given level
    fn set_user_pin(&mut self, pin: u8, high: bool);
}

/// Failure reported by the EEPROM collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EepromError {
    /// Device did not acknowledge its address
    NoAcknowledge,
    /// Write cycle did not complete in time
    Timeout,
    /// Write attempted while protected
    WriteProtected,
}

impl EepromError {
    /// Numeric code shown to the host
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::NoAcknowledge => 1,
            Self::Timeout => 2,
            Self::WriteProtected => 3,
        }
    }
}

impl fmt::Display for EepromError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAcknowledge => write!(f, "no acknowledge"),
            Self::Timeout => write!(f, "write timeout"),
            Self::WriteProtected => write!(f, "write protected"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for EepromError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NoAcknowledge => defmt::write!(f, "NACK"),
            Self::Timeout => defmt::write!(f, "TIMEOUT"),
            Self::WriteProtected => defmt::write!(f, "WP"),
        }
    }
}

/// Page-oriented EEPROM access
pub trait Eeprom {
    /// Power the device up
    fn power_on(&mut self);

    /// Power the device down
    fn power_off(&mut self);

    /// Lift write protection
    fn write_enable(&mut self);

    /// Reassert write protection
    fn write_protect(&mut self);

    /// Read the page at `address`
    fn read_page(
        &mut self,
        address: u16,
        page: &mut [u8; EEPROM_PAGE_SIZE],
    ) -> Result<(), EepromError>;

    /// Write the page at `address`
    fn write_page(&mut self, address: u16, page: &[u8; EEPROM_PAGE_SIZE])
        -> Result<(), EepromError>;

    /// Write one byte at `address`
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), EepromError>;
}

/// Mainline executor for queued escape commands
#[derive(Clone, Debug, Default)]
pub struct CommandDispatcher {
    eeprom_address: u16,
}

impl CommandDispatcher {
    /// Dispatcher with the EEPROM pointer at zero
    #[must_use]
    pub const fn new() -> Self {
        Self { eeprom_address: 0 }
    }

    /// Current EEPROM pointer
    #[must_use]
    pub const fn eeprom_address(&self) -> u16 {
        self.eeprom_address
    }

    /// Carry out one action, writing any reply to `link`
    pub fn execute<L, M, E>(
        &mut self,
        action: Action,
        link: &mut L,
        modem: &mut M,
        eeprom: &mut E,
    ) -> fmt::Result
    where
        L: HostLink,
        M: ModemControl,
        E: Eeprom,
    {
        #[cfg(feature = "embedded")]
        defmt::debug!("escape command: {}", action);

        match action {
            Action::SetTxPower(dbm) => modem.set_tx_power(dbm),
            Action::ReportTxPower => writeln!(link, "TXPOWER={}", modem.tx_power())?,
            Action::FirmwareIdentity => modem.firmware_identity(link)?,
            Action::Heartbeat => modem.request_heartbeat(),
            Action::Reset => {
                writeln!(link, "Resetting...")?;
                modem.reset();
            }
            Action::RestoreDefaults => modem.restore_defaults(),
            Action::ParameterDump => modem.request_parameter_dump(),
            Action::Reprogram => modem.enter_bootloader(),
            Action::SetEepromAddress(address) => {
                self.eeprom_address = address % EEPROM_SIZE;
                writeln!(link, "EPRADDR=${:x}", self.eeprom_address)?;
            }
            Action::WriteEepromPage(page) => self.write_page(&page, link, eeprom)?,
            Action::WriteEepromByte(value) => self.write_byte(value, link, eeprom)?,
            Action::DumpEeprom => self.dump_text(link, eeprom)?,
            Action::DumpEepromBinary => self.dump_binary(link, eeprom)?,
            Action::EepromPower(true) => eeprom.power_on(),
            Action::EepromPower(false) => eeprom.power_off(),
            Action::EepromWriteEnable => eeprom.write_enable(),
            Action::Reinit => {
                link.clear_flush_request();
                modem.cancel_heartbeat();
                modem.reinit();
                writeln!(link, "REINITed")?;
            }
            Action::UserPin { pin, high } => {
                if pin < USER_PIN_COUNT {
                    modem.set_user_pin(pin, high);
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self, by: u16) {
        self.eeprom_address = (self.eeprom_address + by) % EEPROM_SIZE;
    }

    fn write_page<L: HostLink, E: Eeprom>(
        &mut self,
        page: &[u8; EEPROM_PAGE_SIZE],
        link: &mut L,
        eeprom: &mut E,
    ) -> fmt::Result {
        eeprom.power_on();
        writeln!(link)?;

        let address = self.eeprom_address;
        let result = match eeprom.write_page(address, page) {
            Err(_err) => {
                #[cfg(feature = "embedded")]
                defmt::warn!("EEPROM page write at 0x{:03X} failed: {}", address, _err);
                writeln!(link, "WRITE ERROR")
            }
            Ok(()) => {
                write!(link, "EEPROM WRITTEN @ ${address:x}\nREAD BACK")
                    .and_then(|()| {
                        let mut back = [READ_BACK_FILL; EEPROM_PAGE_SIZE];
                        match eeprom.read_page(address, &mut back) {
                            Ok(()) => write_hex_bytes(link, &back),
                            Err(err) => write!(link, " READ ERROR #{}", err.code()),
                        }
                    })
                    .and_then(|()| writeln!(link))
            }
        };

        eeprom.power_off();
        eeprom.write_protect();
        result
    }

    fn write_byte<L: HostLink, E: Eeprom>(
        &mut self,
        value: u8,
        link: &mut L,
        eeprom: &mut E,
    ) -> fmt::Result {
        eeprom.power_on();
        writeln!(link)?;

        let address = self.eeprom_address;
        let result = match eeprom.write_byte(address, value) {
            Err(_err) => {
                #[cfg(feature = "embedded")]
                defmt::warn!("EEPROM byte write at 0x{:03X} failed: {}", address, _err);
                writeln!(link, "WRITE ERROR")
            }
            Ok(()) => {
                self.advance(1);
                writeln!(link, "EEPROM WRITTEN {value:x} -> ${address:x}")
            }
        };

        eeprom.power_off();
        eeprom.write_protect();
        result
    }

    fn dump_text<L: HostLink, E: Eeprom>(&mut self, link: &mut L, eeprom: &mut E) -> fmt::Result {
        eeprom.power_on();
        let result = writeln!(link).and_then(|()| {
            let mut page = [0u8; EEPROM_PAGE_SIZE];
            for _ in 0..EEPROM_DUMP_LEN / EEPROM_PAGE_SIZE as u16 {
                write!(link, "EPR:{:x} : ", self.eeprom_address)?;
                match eeprom.read_page(self.eeprom_address, &mut page) {
                    Ok(()) => write_hex_bytes(link, &page)?,
                    Err(err) => write!(link, "READ ERROR #{}", err.code())?,
                }
                writeln!(link)?;
                self.advance(EEPROM_PAGE_SIZE as u16);
            }
            Ok(())
        });
        eeprom.power_off();
        result
    }

    fn dump_binary<L: HostLink, E: Eeprom>(
        &mut self,
        link: &mut L,
        eeprom: &mut E,
    ) -> fmt::Result {
        eeprom.power_on();
        let mut page = [0u8; EEPROM_PAGE_SIZE];
        let mut result = Ok(());
        for _ in 0..EEPROM_DUMP_LEN / EEPROM_PAGE_SIZE as u16 {
            let [lo, hi] = self.eeprom_address.to_le_bytes();
            link.write_raw(&[DUMP_RECORD_TAG, EEPROM_PAGE_SIZE as u8, lo, hi]);
            match eeprom.read_page(self.eeprom_address, &mut page) {
                Ok(()) => link.write_raw(&page),
                Err(err) => result = write!(link, "READ ERROR #{}", err.code()),
            }
            self.advance(EEPROM_PAGE_SIZE as u16);
        }
        eeprom.power_off();
        result
    }
}

fn write_hex_bytes(out: &mut impl Write, bytes: &[u8]) -> fmt::Result {
    bytes.iter().try_for_each(|b| write!(out, " {b:x}"))
}
