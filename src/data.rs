//! One RGBC sample and its derived color representations.
//!
//! The sensor reports four 16-bit little-endian channels in the order
//! Clear, Red, Green, Blue. Everything else (8-bit normalized channels,
//! IR-rejected values, packed pixels) is computed from those eight bytes.
//!
//! The IR estimate `(R + G + B - C) / 2` is computed once when the sample is
//! built and stored next to the raw bytes.

/// Raw RGBC sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Data {
  raw: [u8; 8],
  ir: i32,
}

impl Data {
  /// Build a sample from the CDATAL..BDATAH burst.
  pub const fn new(raw: [u8; 8]) -> Self {
    let c = u16::from_le_bytes([raw[0], raw[1]]) as i32;
    let r = u16::from_le_bytes([raw[2], raw[3]]) as i32;
    let g = u16::from_le_bytes([raw[4], raw[5]]) as i32;
    let b = u16::from_le_bytes([raw[6], raw[7]]) as i32;
    Self { raw, ir: (r + g + b - c) / 2 }
  }

  /// Build a sample from individual channel counts.
  pub const fn from_channels(clear: u16, red: u16, green: u16, blue: u16) -> Self {
    let [c0, c1] = clear.to_le_bytes();
    let [r0, r1] = red.to_le_bytes();
    let [g0, g1] = green.to_le_bytes();
    let [b0, b1] = blue.to_le_bytes();
    Self::new([c0, c1, r0, r1, g0, g1, b0, b1])
  }

  pub const fn raw(&self) -> &[u8; 8] {
    &self.raw
  }

  #[inline]
  pub const fn c16(&self) -> u16 {
    u16::from_le_bytes([self.raw[0], self.raw[1]])
  }

  #[inline]
  pub const fn r16(&self) -> u16 {
    u16::from_le_bytes([self.raw[2], self.raw[3]])
  }

  #[inline]
  pub const fn g16(&self) -> u16 {
    u16::from_le_bytes([self.raw[4], self.raw[5]])
  }

  #[inline]
  pub const fn b16(&self) -> u16 {
    u16::from_le_bytes([self.raw[6], self.raw[7]])
  }

  /// Estimated infrared component. Negative when Clear exceeds R + G + B.
  #[inline]
  pub const fn ir(&self) -> i32 {
    self.ir
  }

  pub const fn c_no_ir16(&self) -> u16 {
    reject_ir(self.c16(), self.ir)
  }

  pub const fn r_no_ir16(&self) -> u16 {
    reject_ir(self.r16(), self.ir)
  }

  pub const fn g_no_ir16(&self) -> u16 {
    reject_ir(self.g16(), self.ir)
  }

  pub const fn b_no_ir16(&self) -> u16 {
    reject_ir(self.b16(), self.ir)
  }

  /// Red normalized by Clear (0-255).
  pub fn r8(&self) -> u8 {
    raw_to_u8(self.r16() as i32, self.c16() as i32)
  }

  /// Green normalized by Clear (0-255).
  pub fn g8(&self) -> u8 {
    raw_to_u8(self.g16() as i32, self.c16() as i32)
  }

  /// Blue normalized by Clear (0-255).
  pub fn b8(&self) -> u8 {
    raw_to_u8(self.b16() as i32, self.c16() as i32)
  }

  /// Red normalized by Clear, IR removed from both.
  pub fn r_no_ir8(&self) -> u8 {
    raw_to_u8(self.r16() as i32 - self.ir, self.c16() as i32 - self.ir)
  }

  pub fn g_no_ir8(&self) -> u8 {
    raw_to_u8(self.g16() as i32 - self.ir, self.c16() as i32 - self.ir)
  }

  pub fn b_no_ir8(&self) -> u8 {
    raw_to_u8(self.b16() as i32 - self.ir, self.c16() as i32 - self.ir)
  }

  pub fn rgb565(&self) -> u16 {
    color565(self.r8(), self.g8(), self.b8())
  }

  /// `0x00RRGGBB`
  pub fn rgb888(&self) -> u32 {
    color888(self.r8(), self.g8(), self.b8())
  }

  /// RGB565 with the two bytes swapped, as most SPI displays expect.
  pub fn rgb565_swapped(&self) -> u16 {
    swap565(self.r8(), self.g8(), self.b8())
  }

  /// `0x00BBGGRR`
  pub fn rgb888_swapped(&self) -> u32 {
    swap888(self.r8(), self.g8(), self.b8())
  }

  pub fn rgb_no_ir565(&self) -> u16 {
    color565(self.r_no_ir8(), self.g_no_ir8(), self.b_no_ir8())
  }

  pub fn rgb_no_ir888(&self) -> u32 {
    color888(self.r_no_ir8(), self.g_no_ir8(), self.b_no_ir8())
  }

  pub fn rgb_no_ir565_swapped(&self) -> u16 {
    swap565(self.r_no_ir8(), self.g_no_ir8(), self.b_no_ir8())
  }

  pub fn rgb_no_ir888_swapped(&self) -> u32 {
    swap888(self.r_no_ir8(), self.g_no_ir8(), self.b_no_ir8())
  }
}

impl From<[u8; 8]> for Data {
  fn from(raw: [u8; 8]) -> Self {
    Data::new(raw)
  }
}

#[inline]
const fn reject_ir(channel: u16, ir: i32) -> u16 {
  let v = channel as i32 - ir;
  if v < 0 {
    0
  } else if v > u16::MAX as i32 {
    u16::MAX
  } else {
    v as u16
  }
}

/// `v / c` scaled to 0-255, truncated. A zero denominator yields 0.
pub fn raw_to_u8(v: i32, c: i32) -> u8 {
  if c == 0 {
    return 0;
  }
  let scaled = (v as f32 / c as f32 * 255.0) as i32;
  scaled.clamp(0, 0xFF) as u8
}

/// RGB332 packing.
pub const fn color332(r: u8, g: u8, b: u8) -> u8 {
  ((r >> 5) << 5) | ((g >> 5) << 2) | (b >> 6)
}

/// RGB565 packing.
pub const fn color565(r: u8, g: u8, b: u8) -> u16 {
  ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// RGB888 packing, `0x00RRGGBB`.
pub const fn color888(r: u8, g: u8, b: u8) -> u32 {
  (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// RGB565 packing with the high and low bytes exchanged.
pub const fn swap565(r: u8, g: u8, b: u8) -> u16 {
  color565(r, g, b).swap_bytes()
}

/// RGB888 packing in BGR order, `0x00BBGGRR`.
pub const fn swap888(r: u8, g: u8, b: u8) -> u32 {
  (b as u32) << 16 | (g as u32) << 8 | r as u32
}
