#![allow(dead_code)]

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg {
  Enable = 0x00,
  Atime = 0x01,
  Wtime = 0x03,
  Ailtl = 0x04,
  Ailth = 0x05,
  Aihtl = 0x06,
  Aihth = 0x07,
  Pers = 0x0C,
  Config = 0x0D,
  Control = 0x0F,
  Id = 0x12,
  Status = 0x13,
  Cdatal = 0x14,
  Cdatah = 0x15,
  Rdatal = 0x16,
  Rdatah = 0x17,
  Gdatal = 0x18,
  Gdatah = 0x19,
  Bdatal = 0x1A,
  Bdatah = 0x1B,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

/// Addressing mode carried in bits 5..6 of the command byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
  /// Every byte of the transaction targets the same register.
  Repeated = 0b00,
  /// The register pointer advances after each byte.
  AutoIncrement = 0b01,
  /// Special function (interrupt clear).
  Special = 0b11,
}

/// Command bit, set on every byte that addresses the device.
pub(crate) const CMD: u8 = 0x80;

/// Build the command byte for `reg` with the given addressing mode.
#[inline]
pub(crate) const fn command(reg: Reg, access: Access) -> u8 {
  CMD | ((access as u8) << 5) | (reg as u8 & 0x1F)
}

/// Split a command byte into `(address, access bits)`. Returns `None` when the command bit is clear.
#[inline]
pub(crate) const fn decode_command(byte: u8) -> Option<(u8, u8)> {
  if byte & CMD == 0 {
    return None;
  }
  Some((byte & 0x1F, (byte >> 5) & 0x03))
}

/// Special function: clear the RGBC channel interrupt latch.
pub(crate) const CLEAR_CHANNEL_INTERRUPT: u8 = CMD | 0x66;

// Constants used across the crate
pub(crate) const TCS34725_CHIP_ID: u8 = 0x44;
pub(crate) const TCS34727_CHIP_ID: u8 = 0x4D;

/// PON must be asserted at least 2.4 ms before the first RGBC cycle.
pub(crate) const POWER_ON_SETTLE_MS: u32 = 3;
/// Extra head-room a single-shot measurement may take beyond its integration time.
pub(crate) const SINGLESHOT_TIMEOUT_MARGIN_MS: u64 = 1000;

// I2C address (fixed for the whole family)
pub(crate) const ADDR_I2C: u8 = 0x29;
