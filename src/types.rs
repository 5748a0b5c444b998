/// RGBC analog gain (CONTROL.AGAIN).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
  /// 1x gain
  X1 = 0x00,
  /// 4x gain
  #[default]
  X4 = 0x01,
  /// 16x gain
  X16 = 0x02,
  /// 60x gain
  X60 = 0x03,
}

impl Gain {
  /// Amplification factor applied before digitization.
  pub const fn factor(self) -> f32 {
    GAIN_TABLE[self as usize]
  }
}

const GAIN_TABLE: [f32; 4] = [1.0, 4.0, 16.0, 60.0];

impl From<Gain> for u8 {
  fn from(value: Gain) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for Gain {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value & 0x03 {
      0x00 => Ok(Gain::X1),
      0x01 => Ok(Gain::X4),
      0x02 => Ok(Gain::X16),
      0x03 => Ok(Gain::X60),
      _ => Err(()),
    }
  }
}

/// Interrupt persistence filter (PERS.APERS).
///
/// Number of consecutive Clear-channel values outside the threshold window
/// required before the interrupt is asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Persistence {
  /// Every RGBC cycle generates an interrupt
  #[default]
  Every = 0x0,
  Cycle1 = 0x1,
  Cycle2 = 0x2,
  Cycle3 = 0x3,
  Cycle5 = 0x4,
  Cycle10 = 0x5,
  Cycle15 = 0x6,
  Cycle20 = 0x7,
  Cycle25 = 0x8,
  Cycle30 = 0x9,
  Cycle35 = 0xA,
  Cycle40 = 0xB,
  Cycle45 = 0xC,
  Cycle50 = 0xD,
  Cycle55 = 0xE,
  Cycle60 = 0xF,
}

impl Persistence {
  /// Out-of-range cycles required to trigger, `0` meaning every cycle.
  pub const fn cycles(self) -> u8 {
    match self {
      Persistence::Every => 0,
      Persistence::Cycle1 => 1,
      Persistence::Cycle2 => 2,
      Persistence::Cycle3 => 3,
      p => (p as u8 - 3) * 5,
    }
  }
}

impl From<Persistence> for u8 {
  fn from(value: Persistence) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for Persistence {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value & 0x0F {
      0x0 => Ok(Persistence::Every),
      0x1 => Ok(Persistence::Cycle1),
      0x2 => Ok(Persistence::Cycle2),
      0x3 => Ok(Persistence::Cycle3),
      0x4 => Ok(Persistence::Cycle5),
      0x5 => Ok(Persistence::Cycle10),
      0x6 => Ok(Persistence::Cycle15),
      0x7 => Ok(Persistence::Cycle20),
      0x8 => Ok(Persistence::Cycle25),
      0x9 => Ok(Persistence::Cycle30),
      0xA => Ok(Persistence::Cycle35),
      0xB => Ok(Persistence::Cycle40),
      0xC => Ok(Persistence::Cycle45),
      0xD => Ok(Persistence::Cycle50),
      0xE => Ok(Persistence::Cycle55),
      0xF => Ok(Persistence::Cycle60),
      _ => Err(()),
    }
  }
}

/// Chip variant descriptor. The family shares one register map; variants only
/// differ in the identity byte and the I2C bus voltage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceProfile {
  pub name: &'static str,
  /// Expected content of the ID register.
  pub chip_id: u8,
  /// I2C bus runs at 1.8 V instead of VDD.
  pub low_voltage_bus: bool,
}

impl DeviceProfile {
  pub const TCS34725: DeviceProfile =
    DeviceProfile { name: "TCS34725", chip_id: crate::defs::TCS34725_CHIP_ID, low_voltage_bus: false };
  pub const TCS34727: DeviceProfile =
    DeviceProfile { name: "TCS34727", chip_id: crate::defs::TCS34727_CHIP_ID, low_voltage_bus: true };
}

impl Default for DeviceProfile {
  fn default() -> Self {
    DeviceProfile::TCS34725
  }
}
