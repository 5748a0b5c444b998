//! Black/white point calibration.
//!
//! Measure a black and a white reference under the target lighting, then
//! map the IR-rejected channels linearly onto 0-255. The Clear channel is not
//! used once calibrated.
//!
//! ```
//! use tcs3472x::{Calibration, Data};
//!
//! let calib = Calibration::new([0x75, 0xA1, 0xAF], [0x0AFE, 0x15A6, 0x194D]).unwrap();
//! let d = Data::from_channels(0x3000, 0x0800, 0x1000, 0x1200);
//! let (r, g, b) = calib.rgb8(&d);
//! # let _ = (r, g, b);
//! ```

use crate::Data;

/// Raw IR-rejected counts that read as black and white, per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
  black: [u16; 3],
  white: [u16; 3],
}

impl Calibration {
  /// `black` and `white` are `[R, G, B]`. Returns `None` unless white is above
  /// black on every channel.
  pub fn new(black: [u16; 3], white: [u16; 3]) -> Option<Self> {
    if black.iter().zip(white.iter()).all(|(b, w)| w > b) {
      Some(Self { black, white })
    } else {
      None
    }
  }

  pub fn black(&self) -> [u16; 3] {
    self.black
  }

  pub fn white(&self) -> [u16; 3] {
    self.white
  }

  pub fn r8(&self, d: &Data) -> u8 {
    linear(d.r_no_ir16(), self.black[0], self.white[0])
  }

  pub fn g8(&self, d: &Data) -> u8 {
    linear(d.g_no_ir16(), self.black[1], self.white[1])
  }

  pub fn b8(&self, d: &Data) -> u8 {
    linear(d.b_no_ir16(), self.black[2], self.white[2])
  }

  pub fn rgb8(&self, d: &Data) -> (u8, u8, u8) {
    (self.r8(d), self.g8(d), self.b8(d))
  }
}

/// Map `raw` from `[low, high]` onto `[0, 255]`, rounded and clamped.
pub fn linear(raw: u16, low: u16, high: u16) -> u8 {
  let span = high as f32 - low as f32;
  let v = libm::roundf((raw as f32 - low as f32) / span * 255.0);
  v.clamp(0.0, 255.0) as u8
}
