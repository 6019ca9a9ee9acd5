//! FHSS Modem Main Application
//!
//! Entry point for the STM32G474-based modem firmware.
//! Brings up the host USART, the parameter EEPROM and the user pins, then
//! runs the mainline tick that services the serial transport.

#![no_std]
#![no_main]

use core::fmt;

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Flex, Input, Level, Output, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::mode::Blocking;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, Uart};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use modem_firmware::hal::eeprom::I2cEeprom;
use modem_firmware::hal::gpio::UserPins;
use modem_firmware::hal::uart::HostUart;
use modem_firmware::prelude::*;

type HostPort = HostUart<Input<'static>, Output<'static>, Output<'static>>;
type ParamEeprom = I2cEeprom<I2c<'static, Blocking>, Output<'static>, Output<'static>, Delay>;

static TRANSPORT: SharedTransport<HostPort> = SharedTransport::new();

/// USART1 interrupt: receive path and transmit drain
#[interrupt]
unsafe fn USART1() {
    TRANSPORT.on_interrupt();
}

/// Board-level services reached by escape commands
struct Board {
    tx_power: u8,
    heartbeat_requested: bool,
    dump_requested: bool,
    user_pins: UserPins<'static>,
}

impl ModemControl for Board {
    fn set_tx_power(&mut self, dbm: u8) {
        self.tx_power = dbm;
        info!("tx power {}dBm", dbm);
    }

    fn tx_power(&self) -> u8 {
        self.tx_power
    }

    fn request_heartbeat(&mut self) {
        self.heartbeat_requested = true;
    }

    fn cancel_heartbeat(&mut self) {
        self.heartbeat_requested = false;
    }

    fn request_parameter_dump(&mut self) {
        self.dump_requested = true;
    }

    fn restore_defaults(&mut self) {
        self.tx_power = tx_power::HIGH_DBM;
        info!("parameters restored to defaults");
    }

    fn reinit(&mut self) {
        TRANSPORT.with(|t| t.init(t.config()));
    }

    fn reset(&mut self) {
        warn!("reset requested by host");
        cortex_m::peripheral::SCB::sys_reset();
    }

    fn enter_bootloader(&mut self) {
        warn!("rebooting into bootloader");
        cortex_m::peripheral::SCB::sys_reset();
    }

    fn firmware_identity(&mut self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(
            out,
            "{} {} baud={}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            TRANSPORT
                .with(|t| t.config().baud.bits_per_second())
                .unwrap_or_default()
        )
    }

    fn set_user_pin(&mut self, pin: u8, high: bool) {
        self.user_pins.drive(pin, high);
    }
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("FHSS modem firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    // Pin muxing and clock enable only; baud is reprogrammed by the transport
    // PA10 = RX, PA9 = TX
    let _uart = match Uart::new_blocking(p.USART1, p.PA10, p.PA9, usart::Config::default()) {
        Ok(uart) => uart,
        Err(_) => defmt::panic!("USART1 configuration rejected"),
    };

    let cts = Input::new(p.PA11, Pull::Up);
    let rts = Output::new(p.PA12, Level::Low, Speed::Low);
    let led = Output::new(p.PA5, Level::Low, Speed::Low);

    let mut transport = SerialTransport::new(HostUart::new(cts, rts, led));
    transport.init(SerialConfig::default());
    transport.arm_silence(POWER_ON_SILENCE_TICKS);
    TRANSPORT.install(transport);

    interrupt::USART1.set_priority(Priority::P1);
    // SAFETY: the handler only touches TRANSPORT, which is installed above
    unsafe { interrupt::USART1.enable() };

    info!("host link up");

    // PB8 = SCL, PB9 = SDA for I2C1 on STM32G474
    let i2c = I2c::new_blocking(p.I2C1, p.PB8, p.PB9, Hertz(100_000), Default::default());
    let mut eeprom: ParamEeprom = I2cEeprom::new(
        i2c,
        Output::new(p.PB0, Level::Low, Speed::Low),
        Output::new(p.PB1, Level::High, Speed::Low),
        Delay,
    );

    let mut board = Board {
        tx_power: tx_power::HIGH_DBM,
        heartbeat_requested: false,
        dump_requested: false,
        user_pins: UserPins::new([
            Flex::new(p.PC0),
            Flex::new(p.PC1),
            Flex::new(p.PC2),
            Flex::new(p.PC3),
            Flex::new(p.PC4),
        ]),
    };

    let mut dispatcher = CommandDispatcher::new();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));

    loop {
        ticker.next().await;

        let flush = TRANSPORT
            .with(|t| {
                t.tick();
                t.check_flow_gate();
                t.take_flush_request()
            })
            .unwrap_or(false);
        if flush {
            debug!("host requested flush");
        }

        while let Some(action) = TRANSPORT.take_action() {
            let mut link = TRANSPORT.handle();
            if dispatcher
                .execute(action, &mut link, &mut board, &mut eeprom)
                .is_err()
            {
                warn!("reply to {} truncated", action);
            }
        }

        if core::mem::take(&mut board.heartbeat_requested) {
            debug!("heartbeat requested");
        }
        if core::mem::take(&mut board.dump_requested) {
            debug!("parameter dump requested");
        }
    }
}
