use embedded_hal::i2c::{self, Operation, SevenBitAddress};

device_driver::create_device! {
  device_name: Device,
  dsl: {
    config {
      type RegisterAddressType = u16;
    }
    /// Command register. Writing a command here is preceded by writing the
    /// same value to [`CommandCheck`].
    register Command {
      type Access = WO;
      const ADDRESS = 0x8040;
      const SIZE_BITS = 8;

      value: uint = 0..8,
    },
    /// Command check register. The chip only accepts some commands once
    /// this holds the same value as [`Command`].
    register CommandCheck {
      type Access = WO;
      const ADDRESS = 0x8046;
      const SIZE_BITS = 8;

      value: uint = 0..8,
    },
    /// Version of the configuration block currently loaded in the chip
    register ConfigVersion {
      type Access = RO;
      const ADDRESS = 0x8047;
      const SIZE_BITS = 8;

      value: uint = 0..8,
    },
    /// Product ID, three ASCII bytes. Reads `"911"` on a GT911.
    register ProductId {
      type Access = RO;
      type ByteOrder = LE;
      const ADDRESS = 0x8140;
      const SIZE_BITS = 24;

      value: uint = 0..24,
    },
    /// Firmware version, little endian
    register FirmwareVersion {
      type Access = RO;
      type ByteOrder = LE;
      const ADDRESS = 0x8144;
      const SIZE_BITS = 16;

      value: uint = 0..16,
    },
    /// Output resolution of the panel.
    /// This is a "virtual" register spanning the X and Y resolution pairs
    /// at 0x8146..0x8149, read in one go.
    register Resolution {
      type Access = RO;
      type ByteOrder = LE;
      const ADDRESS = 0x8146;
      const SIZE_BITS = 32;

      width: uint = 0..16,
      height: uint = 16..32,
    },
    /// Buffer status and number of touch points.
    /// [`buffer_ready`]: the chip has fresh coordinates; the host clears it
    ///   by writing 0 once the points have been read.
    register PointInfo {
      const ADDRESS = 0x814E;
      const SIZE_BITS = 8;

      touch_count: uint = 0..4,
      have_key: bool = 4,
      proximity_valid: bool = 5,
      large_detect: bool = 6,
      buffer_ready: bool = 7,
    },
    /// Touch point records. Each 8 byte record starts with the track id
    /// followed by the little endian x, y and size values.
    register TouchRecord {
      type Access = RO;
      type ByteOrder = LE;
      const ADDRESS = 0x814F;
      const SIZE_BITS = 64;
      const ALLOW_ADDRESS_OVERLAP = true;
      const REPEAT = {
        count: 5,
        stride: 8,
      };

      track_id: uint = 0..8,
      x: int = 8..24,
      y: int = 24..40,
      size: int = 40..56,
    },
    /// The same point records addressed one byte later, so that a record
    /// starts at the x coordinate and carries no track id.
    register CoordinateRecord {
      type Access = RO;
      type ByteOrder = LE;
      const ADDRESS = 0x8150;
      const SIZE_BITS = 64;
      const ALLOW_ADDRESS_OVERLAP = true;
      const REPEAT = {
        count: 5,
        stride: 8,
      };

      x: int = 0..16,
      y: int = 16..32,
      size: int = 32..48,
    },
  }
}

pub(crate) struct DeviceInterface<I2C> {
    device_address: SevenBitAddress,
    i2c: I2C,
}

impl<I2C> DeviceInterface<I2C> {
    pub(crate) const fn new(i2c: I2C, device_address: SevenBitAddress) -> Self {
        Self {
            i2c,
            device_address,
        }
    }
}

impl<BUS: i2c::I2c> device_driver::RegisterInterface for DeviceInterface<BUS> {
    type Error = DeviceError<BUS::Error>;

    type AddressType = u16;

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        // Adjacent writes go out as one transfer: address, then payload
        self.i2c.transaction(
            self.device_address,
            &mut [
                Operation::Write(&address.to_be_bytes()),
                Operation::Write(data),
            ],
        )?;
        Ok(())
    }

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        data: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .write_read(self.device_address, &address.to_be_bytes(), data)?;
        Ok(())
    }
}

/// Low level interface error that wraps the I2C error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct DeviceError<I2c>(pub I2c);

impl<I2c> From<I2c> for DeviceError<I2c> {
    fn from(value: I2c) -> Self {
        Self(value)
    }
}

impl<I2c> core::ops::Deref for DeviceError<I2c> {
    type Target = I2c;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<I2c> core::ops::DerefMut for DeviceError<I2c> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
