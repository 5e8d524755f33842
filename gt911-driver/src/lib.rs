#![cfg_attr(not(test), no_std)]
//! Blocking driver for the Goodix GT911 capacitive touch controller.
//!
//! The controller is built on the `embedded-hal` 1.0 traits. The optional
//! reset and interrupt lines are used at start-up to strap the chip onto one
//! of its two I2C addresses; afterwards touch points are polled with
//! [`Gt911::read_touches`].
//!
//! ```ignore
//! let mut touch = Gt911::new(i2c, Some(rst), Some(OpenDrainPin(int)), &mut delay, Config::default())?;
//! loop {
//!     for point in touch.read_touches()? {
//!         // ...
//!     }
//! }
//! ```

#[macro_use]
mod fmt;

pub mod device;
mod pin;

use device::{Device, DeviceError, DeviceInterface};
use device_driver::RegisterInterface;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
    i2c::{I2c, SevenBitAddress},
};
use heapless::Vec;

pub use pin::{InputOnlyPin, InterruptPin, OpenDrainPin};

/// Address used when INT is low (or not driven) while the chip leaves reset
pub const PRIMARY_ADDRESS: SevenBitAddress = 0x5D;
/// Address used when INT is high while the chip leaves reset
pub const SECONDARY_ADDRESS: SevenBitAddress = 0x14;
/// The GT911 tracks at most five touch points
pub const MAX_TOUCH_POINTS: usize = 5;

const PRODUCT_ID: [u8; 3] = *b"911";

/// Errors reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// The I2C transfer failed. The chip keeps its data, so the caller may retry.
    I2c(E),
    /// Driving or sampling one of the GPIO lines failed.
    Pin,
    /// A hardware reset was requested but no reset line was provided.
    ResetPinRequired,
    /// The product ID register did not read `"911"`.
    DeviceNotFound([u8; 3]),
}

impl<E> From<DeviceError<E>> for Error<E> {
    fn from(value: DeviceError<E>) -> Self {
        Error::I2c(value.0)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "I2C error: {e:?}"),
            Error::Pin => write!(f, "GPIO error"),
            Error::ResetPinRequired => write!(f, "a reset pin is required to reset the device"),
            Error::DeviceNotFound(id) => write!(f, "failed to find GT911, product id {id:02X?}"),
        }
    }
}

/// Clockwise rotation of the panel relative to the display.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Map a raw panel coordinate into the rotated frame.
    pub fn apply(self, x: i16, y: i16, resolution: Resolution) -> (i16, i16) {
        let w = i32::from(resolution.width);
        let h = i32::from(resolution.height);
        let (x, y) = (i32::from(x), i32::from(y));
        let (x, y) = match self {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (h - 1 - y, x),
            Rotation::Deg180 => (w - 1 - x, h - 1 - y),
            Rotation::Deg270 => (y, w - 1 - x),
        };
        (saturate(x), saturate(y))
    }
}

fn saturate(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Where the point records start and how they are decoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PointLayout {
    /// Records at 0x814F. Byte 0 is the chip's track id, followed by x, y and size.
    #[default]
    TrackId,
    /// Records at 0x8150, starting at x. The point id is the slot index.
    Coordinates,
}

/// Bring-up options for [`Gt911::new`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// Level INT is strapped to during reset. `true` selects [`SECONDARY_ADDRESS`],
    /// which only takes effect when both reset and interrupt lines are present.
    pub int_high: bool,
    /// Applied to every point returned by [`Gt911::read_touches`].
    pub rotation: Rotation,
    /// Point record format, see [`PointLayout`].
    pub layout: PointLayout,
}

impl Config {
    /// Primary address, no rotation, [`PointLayout::TrackId`]. Same as `Default`.
    pub const fn new() -> Self {
        Self {
            int_high: false,
            rotation: Rotation::Deg0,
            layout: PointLayout::TrackId,
        }
    }

    /// Set [`Config::int_high`].
    pub const fn with_int_high(mut self, int_high: bool) -> Self {
        self.int_high = int_high;
        self
    }

    /// Set [`Config::rotation`].
    pub const fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set [`Config::layout`].
    pub const fn with_layout(mut self, layout: PointLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// A single touch point as reported by the chip.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct TouchPoint {
    pub id: u8,
    pub x: i16,
    pub y: i16,
    pub size: i16,
}

/// Decoded point info register
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Status {
    pub ready: bool,
    pub large_detect: bool,
    pub proximity_valid: bool,
    pub key_pressed: bool,
    pub touch_count: u8,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Resolution {
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct FirmwareInfo {
    pub product_id: [u8; 3],
    pub firmware_version: u16,
    pub config_version: u8,
}

/// Commands accepted by the command register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    ReadCoordinates = 0x00,
    ReadRawData = 0x01,
    SoftwareReset = 0x02,
    ScreenOff = 0x05,
}

/// GT911 driver.
///
/// `I2C` may be a `&mut` borrow of a bus shared with other devices; the
/// reset and interrupt lines are owned until [`Gt911::release`].
pub struct Gt911<I2C, RST, INT> {
    i2c: I2C,
    address: SevenBitAddress,
    reset_pin: Option<RST>,
    interrupt_pin: Option<INT>,
    config: Config,
    panel: Resolution,
}

impl<I2C, RST, INT> Gt911<I2C, RST, INT>
where
    I2C: I2c,
    RST: OutputPin,
    INT: InterruptPin,
{
    /// Bring up the chip and check that it answers as a GT911.
    ///
    /// With a reset line the chip is pulsed and, if an interrupt line is
    /// present too, strapped onto the address selected by
    /// [`Config::int_high`]. With only an interrupt line, that line is
    /// never touched, so it must already be an input (see [`InputOnlyPin`]).
    pub fn new(
        i2c: I2C,
        reset_pin: Option<RST>,
        interrupt_pin: Option<INT>,
        delay: &mut impl DelayNs,
        config: Config,
    ) -> Result<Self, Error<I2C::Error>> {
        let address = if reset_pin.is_some() && interrupt_pin.is_some() && config.int_high {
            SECONDARY_ADDRESS
        } else {
            PRIMARY_ADDRESS
        };

        let mut gt911 = Self {
            i2c,
            address,
            reset_pin,
            interrupt_pin,
            config,
            panel: Resolution::default(),
        };

        // Without a reset line there is no strap to apply, INT is left as handed over
        if gt911.reset_pin.is_some() {
            gt911.reset(delay)?;
        }

        let product_id = gt911.product_id()?;
        if product_id != PRODUCT_ID {
            warn!("no GT911 at {:#x}, product id {:?}", address, product_id);
            return Err(Error::DeviceNotFound(product_id));
        }

        if config.rotation != Rotation::Deg0 {
            gt911.panel = gt911.resolution()?;
        }

        debug!("GT911 found at {:#x}", address);
        Ok(gt911)
    }

    /// Pulse the reset line, re-applying the address strap chosen at construction.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<I2C::Error>> {
        let Some(reset_pin) = self.reset_pin.as_mut() else {
            return Err(Error::ResetPinRequired);
        };

        reset_pin.set_low().map_err(|_| Error::Pin)?;
        delay.delay_ms(10);

        // INT is sampled on the rising edge of reset
        if let Some(interrupt_pin) = self.interrupt_pin.as_mut() {
            interrupt_pin
                .set_open_drain(PinState::from(self.config.int_high))
                .map_err(|_| Error::Pin)?;
            delay.delay_us(100);
        }

        reset_pin.set_high().map_err(|_| Error::Pin)?;
        delay.delay_ms(5);

        if let Some(interrupt_pin) = self.interrupt_pin.as_mut() {
            interrupt_pin.set_input().map_err(|_| Error::Pin)?;
        }

        trace!("GT911 reset, int_high {}", self.config.int_high);
        Ok(())
    }

    /// Read the currently active touch points.
    ///
    /// Returns an empty list when the chip has no new data. After the points
    /// are read the buffer status is cleared so the next poll only sees new
    /// data. If a point read fails the status is left untouched and the same
    /// data can be read again.
    pub fn read_touches(
        &mut self,
    ) -> Result<Vec<TouchPoint, MAX_TOUCH_POINTS>, Error<I2C::Error>> {
        let mut points = Vec::new();

        let status = self.status()?;
        if !status.ready {
            return Ok(points);
        }

        let count = usize::from(status.touch_count).min(MAX_TOUCH_POINTS);
        for slot in 0..count {
            let point = self.read_point(slot)?;
            if points.push(point).is_err() {
                break;
            }
        }

        self.device()
            .point_info()
            .write(|w| w.set_buffer_ready(false))?;

        trace!("{} touch points", points.len());
        Ok(points)
    }

    /// Read the point info register without clearing it.
    pub fn status(&mut self) -> Result<Status, Error<I2C::Error>> {
        let info = self.device().point_info().read()?;
        Ok(Status {
            ready: info.buffer_ready(),
            large_detect: info.large_detect(),
            proximity_valid: info.proximity_valid(),
            key_pressed: info.have_key(),
            touch_count: info.touch_count(),
        })
    }

    pub fn firmware_info(&mut self) -> Result<FirmwareInfo, Error<I2C::Error>> {
        let product_id = self.product_id()?;
        let mut device = self.device();
        let firmware_version = device.firmware_version().read()?.value();
        let config_version = device.config_version().read()?.value();
        Ok(FirmwareInfo {
            product_id,
            firmware_version,
            config_version,
        })
    }

    /// Output resolution from the chip's configuration block.
    pub fn resolution(&mut self) -> Result<Resolution, Error<I2C::Error>> {
        let resolution = self.device().resolution().read()?;
        Ok(Resolution {
            width: resolution.width(),
            height: resolution.height(),
        })
    }

    pub fn send_command(&mut self, command: Command) -> Result<(), Error<I2C::Error>> {
        let value = command as u8;
        let mut device = self.device();
        device.command_check().write(|w| w.set_value(value))?;
        device.command().write(|w| w.set_value(value))?;
        Ok(())
    }

    /// Read `buf.len()` bytes starting at `register`.
    pub fn read(&mut self, register: u16, buf: &mut [u8]) -> Result<(), Error<I2C::Error>> {
        let size_bits = u32::try_from(buf.len() * 8).unwrap_or(u32::MAX);
        self.interface().read_register(register, size_bits, buf)?;
        Ok(())
    }

    /// Write `data` starting at `register`.
    pub fn write(&mut self, register: u16, data: &[u8]) -> Result<(), Error<I2C::Error>> {
        let size_bits = u32::try_from(data.len() * 8).unwrap_or(u32::MAX);
        self.interface().write_register(register, size_bits, data)?;
        Ok(())
    }

    fn read_point(&mut self, slot: usize) -> Result<TouchPoint, Error<I2C::Error>> {
        let point = match self.config.layout {
            PointLayout::TrackId => {
                let record = self.device().touch_record(slot).read()?;
                TouchPoint {
                    id: record.track_id(),
                    x: record.x(),
                    y: record.y(),
                    size: record.size(),
                }
            }
            PointLayout::Coordinates => {
                let record = self.device().coordinate_record(slot).read()?;
                TouchPoint {
                    id: slot as u8,
                    x: record.x(),
                    y: record.y(),
                    size: record.size(),
                }
            }
        };

        let (x, y) = self.config.rotation.apply(point.x, point.y, self.panel);
        Ok(TouchPoint { x, y, ..point })
    }

    fn product_id(&mut self) -> Result<[u8; 3], Error<I2C::Error>> {
        let [a, b, c, _] = self.device().product_id().read()?.value().to_le_bytes();
        Ok([a, b, c])
    }

    fn interface(&mut self) -> DeviceInterface<&mut I2C> {
        DeviceInterface::new(&mut self.i2c, self.address)
    }

    fn device(&mut self) -> Device<DeviceInterface<&mut I2C>> {
        Device::new(self.interface())
    }
}

impl<I2C, RST, INT> Gt911<I2C, RST, INT>
where
    I2C: I2c,
    INT: InterruptPin + InputPin,
{
    /// Whether the chip is signalling new data on INT (active low).
    ///
    /// Without an interrupt line this always returns `true`, so callers that
    /// gate polling on it fall back to polling every time.
    pub fn interrupt_asserted(&mut self) -> Result<bool, Error<I2C::Error>> {
        match self.interrupt_pin.as_mut() {
            Some(interrupt_pin) => interrupt_pin.is_low().map_err(|_| Error::Pin),
            None => Ok(true),
        }
    }
}

impl<I2C, RST, INT> Gt911<I2C, RST, INT> {
    /// The I2C address selected at construction
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give back the bus and the GPIO lines.
    pub fn release(self) -> (I2C, Option<RST>, Option<INT>) {
        (self.i2c, self.reset_pin, self.interrupt_pin)
    }
}
