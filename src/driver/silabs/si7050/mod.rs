//! Driver for the Silicon Labs Si7050/1/3/4/5 I2C temperature sensors.
//! Datasheet: https://www.silabs.com/documents/public/data-sheets/Si7050-1-3-4-5-A20.pdf

use std::ops::{Deref, DerefMut};

use embedded_hal::blocking::{
    delay::DelayUs,
    i2c::{Read, Write, WriteRead},
};
use num_traits::FromPrimitive;
use thiserror::Error;
use tracing::{debug, trace};

pub mod commands;
pub mod serial;
pub mod temperature;

pub use commands::{Resolution, DEFAULT_ADDRESS};
pub use serial::{check_serial, RawSerial, SensorType};
pub use temperature::calc_temperature;

use commands::serial::BURST_LEN;
use serial::{ID_INDEX, SERIAL_LEN};

#[derive(Debug, Error)]
pub enum Error {
    #[error("i2c error during {0}")]
    I2c(Stage),
    #[error("si7050 protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("buffer too small: need {needed} bytes, got {got}")]
    InvalidSize { needed: usize, got: usize },
    #[error("serial number crc mismatch")]
    InvalidCrc,
    #[error("unknown sensor type code {0:#04x}")]
    UnknownSensorType(u8),
}

/// The bus exchange that was in flight when a transport error occurred.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Reset,
    ReadUserRegister,
    WriteUserRegister,
    MeasureStart,
    MeasureRead,
    FirmwareVersion,
    SerialFirst,
    SerialSecond,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Reset => "reset",
            Stage::ReadUserRegister => "user register read",
            Stage::WriteUserRegister => "user register write",
            Stage::MeasureStart => "measurement start",
            Stage::MeasureRead => "measurement read",
            Stage::FirmwareVersion => "firmware version read",
            Stage::SerialFirst => "serial number read (first burst)",
            Stage::SerialSecond => "serial number read (second burst)",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FirmwareVersion {
    V1_0,
    V2_0,
    Unknown(u8),
}

impl From<u8> for FirmwareVersion {
    fn from(raw: u8) -> Self {
        match raw {
            0xFF => Self::V1_0,
            0x20 => Self::V2_0,
            other => Self::Unknown(other),
        }
    }
}

/// Either an I2C bus the driver owns or one borrowed from the caller.
pub enum Bus<'a, I2C> {
    Owned(I2C),
    Borrowed(&'a mut I2C),
}

impl<'a, I2C> Deref for Bus<'a, I2C> {
    type Target = I2C;

    fn deref(&self) -> &Self::Target {
        match self {
            Bus::Owned(i2c) => i2c,
            Bus::Borrowed(i2c) => &**i2c,
        }
    }
}

impl<'a, I2C> DerefMut for Bus<'a, I2C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self {
            Bus::Owned(i2c) => i2c,
            Bus::Borrowed(i2c) => &mut **i2c,
        }
    }
}

pub struct Si7050<'a, I2C> {
    bus: Bus<'a, I2C>,
    address: u8,
    resolution: Resolution,
}

impl<I2C> Si7050<'static, I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self::from_bus(Bus::Owned(i2c), address)
    }
}

impl<'a, I2C> Si7050<'a, I2C> {
    /// Drive a sensor on a bus that stays owned by the caller.
    pub fn borrowed(i2c: &'a mut I2C) -> Self {
        Self::borrowed_with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn borrowed_with_address(i2c: &'a mut I2C, address: u8) -> Self {
        Self::from_bus(Bus::Borrowed(i2c), address)
    }

    fn from_bus(bus: Bus<'a, I2C>, address: u8) -> Self {
        Self {
            bus,
            address,
            resolution: Resolution::default(),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// The resolution last written by this driver. Assumes the power-on
    /// default until [`Si7050::set_resolution`] succeeds.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn destroy(self) -> Bus<'a, I2C> {
        self.bus
    }
}

impl<'a, I2C> Si7050<'a, I2C>
where
    I2C: Read + Write + WriteRead,
{
    fn write(&mut self, stage: Stage, buf: &[u8]) -> Result<(), Error> {
        trace!("{stage}: write {buf:02x?}");
        Write::write(&mut *self.bus, self.address, buf).map_err(|_| Error::I2c(stage))
    }

    fn read(&mut self, stage: Stage, buf: &mut [u8]) -> Result<(), Error> {
        Read::read(&mut *self.bus, self.address, buf).map_err(|_| Error::I2c(stage))?;
        trace!("{stage}: read {buf:02x?}");
        Ok(())
    }

    /// Write a command and read the response behind a repeated start.
    fn write_read(&mut self, stage: Stage, cmd: &[u8], buf: &mut [u8]) -> Result<(), Error> {
        WriteRead::write_read(&mut *self.bus, self.address, cmd, buf)
            .map_err(|_| Error::I2c(stage))?;
        trace!("{stage}: write {cmd:02x?}, read {buf:02x?}");
        Ok(())
    }

    /// Software reset. The sensor does not respond for
    /// [`commands::reset::SETTLE_US`] afterwards.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.write(Stage::Reset, &[commands::reset::CMD])?;
        self.resolution = Resolution::default();
        debug!("reset si7050 at {:#04x}", self.address);
        Ok(())
    }

    /// Reset, wait for the sensor to come back, and select 14 bit resolution.
    pub fn reset_and_initialize<DELAY: DelayUs<u32>>(
        &mut self,
        delay: &mut DELAY,
    ) -> Result<(), Error> {
        self.reset()?;
        delay.delay_us(commands::reset::SETTLE_US);
        self.initialize()
    }

    /// Select 14 bit resolution, leaving the other user register bits as they are.
    pub fn initialize(&mut self) -> Result<(), Error> {
        self.set_resolution(Resolution::Bits14)
    }

    pub fn read_user_register(&mut self) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.write_read(
            Stage::ReadUserRegister,
            &[commands::user_register::READ],
            &mut buf,
        )?;
        Ok(buf[0])
    }

    /// Read the resolution currently configured on the device.
    pub fn read_resolution(&mut self) -> Result<Resolution, Error> {
        let reg = self.read_user_register()?;
        // every masked value is a valid resolution
        Ok(Resolution::from_u8(reg & commands::user_register::RESOLUTION_MASK)
            .unwrap_or_default())
    }

    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error> {
        let old = self.read_user_register()?;
        let new = resolution.apply(old);

        self.write(
            Stage::WriteUserRegister,
            &[commands::user_register::WRITE, new],
        )?;
        self.resolution = resolution;

        debug!(
            "set resolution to {} bits (user register {old:#04x} -> {new:#04x})",
            resolution.bit_count()
        );
        Ok(())
    }

    /// Trigger a measurement and read the raw result into `data[..2]`.
    ///
    /// Fails without touching the bus if `data` is shorter than 2 bytes.
    pub fn measure_temperature<DELAY: DelayUs<u32>>(
        &mut self,
        data: &mut [u8],
        delay: &mut DELAY,
    ) -> Result<(), Error> {
        if data.len() < 2 {
            return Err(ProtocolError::InvalidSize {
                needed: 2,
                got: data.len(),
            }
            .into());
        }

        self.write(Stage::MeasureStart, &[commands::measure::TRIGGER])?;
        delay.delay_us(self.resolution.conversion_time_us());
        self.read(Stage::MeasureRead, &mut data[..2])
    }

    /// Get the temperature in hundredths of a degree Celsius.
    pub fn get_temperature<DELAY: DelayUs<u32>>(
        &mut self,
        delay: &mut DELAY,
    ) -> Result<i32, Error> {
        let mut data = [0u8; 2];
        self.measure_temperature(&mut data, delay)?;
        Ok(calc_temperature(data))
    }

    /// Raw firmware revision byte: 0xFF for 1.0, 0x20 for 2.0.
    pub fn get_firmware_version(&mut self) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.write(Stage::FirmwareVersion, &commands::firmware::READ)?;
        self.read(Stage::FirmwareVersion, &mut buf)?;

        debug!("si7050 firmware version {:?}", FirmwareVersion::from(buf[0]));
        Ok(buf[0])
    }

    /// Read both serial number bursts, CRC bytes included.
    pub fn read_serial_raw(&mut self) -> Result<RawSerial, Error> {
        let mut first = [0u8; BURST_LEN];
        let mut second = [0u8; BURST_LEN];

        self.write_read(
            Stage::SerialFirst,
            &commands::serial::READ_FIRST,
            &mut first,
        )?;
        self.write_read(
            Stage::SerialSecond,
            &commands::serial::READ_SECOND,
            &mut second,
        )?;

        Ok(RawSerial::from_bursts(first, second))
    }

    /// Read the 8 byte electronic serial number. CRC bytes are dropped without
    /// being checked; see [`Si7050::get_serial_checked`].
    pub fn get_serial(&mut self) -> Result<[u8; SERIAL_LEN], Error> {
        Ok(self.read_serial_raw()?.serial())
    }

    pub fn get_serial_checked(&mut self) -> Result<[u8; SERIAL_LEN], Error> {
        let raw = self.read_serial_raw()?;
        if !raw.is_valid() {
            return Err(ProtocolError::InvalidCrc.into());
        }

        let serial = raw.serial();
        debug!("si7050 serial {serial:02x?}");
        Ok(serial)
    }

    /// The sensor type code embedded in the serial number.
    pub fn get_id(&mut self) -> Result<u8, Error> {
        Ok(self.get_serial()?[ID_INDEX])
    }

    pub fn get_sensor_type(&mut self) -> Result<SensorType, Error> {
        let id = self.get_id()?;
        SensorType::from_id(id).ok_or_else(|| ProtocolError::UnknownSensorType(id).into())
    }
}
