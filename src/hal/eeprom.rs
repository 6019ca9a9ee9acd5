//! 24C16-class I2C parameter EEPROM
//!
//! 2 KiB in eight 256-byte blocks; address bits 10..8 select the block
//! through the device address. The part sits behind a switched supply and
//! a write-protect pin, both driven here.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use crate::command::{Eeprom, EepromError};
use crate::config::{EEPROM_PAGE_SIZE, EEPROM_SIZE};

/// Base 7-bit device address
const DEVICE_ADDRESS: u8 = 0x50;

/// Acknowledge polls allowed while a write cycle completes
const WRITE_POLL_LIMIT: u32 = 20;

/// Delay between acknowledge polls
const WRITE_POLL_INTERVAL_US: u32 = 500;

/// Settling time after switching the supply on
const POWER_UP_DELAY_US: u32 = 1000;

/// I2C EEPROM with switched supply and write protect
pub struct I2cEeprom<B, Pwr, Wp, D> {
    bus: B,
    power: Pwr,
    write_protect: Wp,
    delay: D,
    writable: bool,
}

impl<B, Pwr, Wp, D> I2cEeprom<B, Pwr, Wp, D>
where
    B: I2c,
    Pwr: OutputPin,
    Wp: OutputPin,
    D: DelayNs,
{
    /// Driver starting powered down and write protected
    pub fn new(bus: B, mut power: Pwr, mut write_protect: Wp, delay: D) -> Self {
        let _ = power.set_low();
        let _ = write_protect.set_high();
        Self {
            bus,
            power,
            write_protect,
            delay,
            writable: false,
        }
    }

    fn split(address: u16) -> (u8, u8) {
        let address = address % EEPROM_SIZE;
        let [word, block] = address.to_le_bytes();
        (DEVICE_ADDRESS | (block & 0x07), word)
    }

    fn wait_for_write(&mut self, device: u8) -> Result<(), EepromError> {
        for _ in 0..WRITE_POLL_LIMIT {
            self.delay.delay_us(WRITE_POLL_INTERVAL_US);
            if self.bus.write(device, &[]).is_ok() {
                return Ok(());
            }
        }
        Err(EepromError::Timeout)
    }

    fn check_writable(&self) -> Result<(), EepromError> {
        if self.writable {
            Ok(())
        } else {
            Err(EepromError::WriteProtected)
        }
    }
}

impl<B, Pwr, Wp, D> Eeprom for I2cEeprom<B, Pwr, Wp, D>
where
    B: I2c,
    Pwr: OutputPin,
    Wp: OutputPin,
    D: DelayNs,
{
    fn power_on(&mut self) {
        let _ = self.power.set_high();
        self.delay.delay_us(POWER_UP_DELAY_US);
    }

    fn power_off(&mut self) {
        let _ = self.power.set_low();
    }

    fn write_enable(&mut self) {
        let _ = self.write_protect.set_low();
        self.writable = true;
    }

    fn write_protect(&mut self) {
        let _ = self.write_protect.set_high();
        self.writable = false;
    }

    fn read_page(
        &mut self,
        address: u16,
        page: &mut [u8; EEPROM_PAGE_SIZE],
    ) -> Result<(), EepromError> {
        let (device, word) = Self::split(address);
        self.bus
            .write_read(device, &[word], page)
            .map_err(|_| EepromError::NoAcknowledge)
    }

    fn write_page(
        &mut self,
        address: u16,
        page: &[u8; EEPROM_PAGE_SIZE],
    ) -> Result<(), EepromError> {
        self.check_writable()?;
        let (device, word) = Self::split(address);
        let mut frame = [0u8; EEPROM_PAGE_SIZE + 1];
        frame[0] = word;
        frame[1..].copy_from_slice(page);
        self.bus
            .write(device, &frame)
            .map_err(|_| EepromError::NoAcknowledge)?;
        self.wait_for_write(device)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), EepromError> {
        self.check_writable()?;
        let (device, word) = Self::split(address);
        self.bus
            .write(device, &[word, value])
            .map_err(|_| EepromError::NoAcknowledge)?;
        self.wait_for_write(device)
    }
}
