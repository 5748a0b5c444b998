//! Photometric conversions from raw RGBC counts.
//!
//! Lux and color temperature follow the ams DN40 application note model:
//! subtract the IR estimate from each color channel, weight the remainder,
//! and divide by counts-per-lux (CPL), which folds in integration time, gain
//! and the device/glass attenuation factor (DGF).
//!
//! # Examples
//!
//! ```
//! use tcs3472x::{photometry::*, Data, Gain};
//!
//! let d = Data::from_channels(1200, 400, 500, 300);
//! let sat = calculate_saturation(0xC0);
//! if d.c16() < sat {
//!     let lux = calculate_lux(d.r16(), d.g16(), d.b16(), d.c16(), 153.6, Gain::X4);
//!     let ct = calculate_color_temperature(d.r16(), d.g16(), d.b16(), d.c16());
//!     assert!(lux >= 0.0 && ct.is_finite());
//! }
//! ```

use crate::{timing::ms_to_atime, Data, Gain};

/// Glass attenuation. Use 1.08 when the part sits behind clear glass.
pub const GA: f32 = 1.0;
/// Device factor.
pub const DF: f32 = 310.0;
/// Device and glass factor.
pub const DGF: f32 = GA * DF;
pub const R_COEF: f32 = 0.136;
pub const G_COEF: f32 = 1.0;
pub const B_COEF: f32 = -0.444;
pub const CT_COEF: f32 = 3810.0;
pub const CT_OFFSET: f32 = 1391.0;

/// Channel weights and DGF used by the lux equation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LuxCoefficients {
  pub dgf: f32,
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

impl Default for LuxCoefficients {
  fn default() -> Self {
    Self { dgf: DGF, r: R_COEF, g: G_COEF, b: B_COEF }
  }
}

/// Slope and offset of the color temperature equation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CtCoefficients {
  pub coef: f32,
  pub offset: f32,
}

impl Default for CtCoefficients {
  fn default() -> Self {
    Self { coef: CT_COEF, offset: CT_OFFSET }
  }
}

/// `(R + G + B - C) / 2`, computed in floating point.
#[inline]
pub fn ir(r: u16, g: u16, b: u16, c: u16) -> f32 {
  (r as i32 + g as i32 + b as i32 - c as i32) as f32 * 0.5
}

/// Counts per lux. NaN when `dgf <= 0`.
pub fn calculate_cpl(atime_ms: f32, gain: Gain, dgf: f32) -> f32 {
  if dgf > 0.0 {
    atime_ms * gain.factor() / dgf
  } else {
    f32::NAN
  }
}

/// Illuminance in lux with the default coefficients.
pub fn calculate_lux(r: u16, g: u16, b: u16, c: u16, atime_ms: f32, gain: Gain) -> f32 {
  calculate_lux_with(r, g, b, c, atime_ms, gain, &LuxCoefficients::default())
}

/// Illuminance in lux. Never negative; 0 when CPL is 0.
pub fn calculate_lux_with(r: u16, g: u16, b: u16, c: u16, atime_ms: f32, gain: Gain, k: &LuxCoefficients) -> f32 {
  let ir = ir(r, g, b, c);
  let g2 = k.r * (r as f32 - ir) + k.g * (g as f32 - ir) + k.b * (b as f32 - ir);
  let cpl = calculate_cpl(atime_ms, gain, k.dgf);
  let lx = if cpl != 0.0 { g2 / cpl } else { 0.0 };
  if lx >= 0.0 {
    lx
  } else {
    0.0
  }
}

/// Correlated color temperature in kelvin with the default coefficients.
///
/// Not guarded: when `R == IR` the result is infinite or NaN, callers must check.
pub fn calculate_color_temperature(r: u16, g: u16, b: u16, c: u16) -> f32 {
  calculate_color_temperature_with(r, g, b, c, &CtCoefficients::default())
}

pub fn calculate_color_temperature_with(r: u16, g: u16, b: u16, c: u16, k: &CtCoefficients) -> f32 {
  let ir = ir(r, g, b, c);
  k.coef * (b as f32 - ir) / (r as f32 - ir) + k.offset
}

/// Clear-channel count at which the sensor saturates for the given ATIME code.
///
/// Long integrations hit the 16-bit digital ceiling. Short ones saturate in the
/// analog stage at `1024` counts per cycle, derated by a quarter for ripple.
pub fn calculate_saturation(atime_code: u8) -> u16 {
  let cycles = 256 - atime_code as u32;
  if cycles > 63 {
    return 0xFFFF;
  }
  let sat = 1024 * cycles;
  (sat - (sat >> 2)) as u16
}

/// [`calculate_saturation`] for an integration time in ms. `None` for non-finite input.
pub fn calculate_saturation_ms(atime_ms: f32) -> Option<u16> {
  ms_to_atime(atime_ms).map(calculate_saturation)
}

/// IR share of Clear, clamped to `[0, 1]`. NaN when Clear is 0.
pub fn calculate_cratio(r: u16, g: u16, b: u16, c: u16) -> f32 {
  if c == 0 {
    return f32::NAN;
  }
  (ir(r, g, b, c) / c as f32).clamp(0.0, 1.0)
}

/// Highest illuminance measurable before saturation.
pub fn calculate_max_lux(atime_ms: f32, gain: Gain, dgf: f32) -> f32 {
  65535.0 / (3.0 * calculate_cpl(atime_ms, gain, dgf))
}

/// Ambient light source, classified by CRATIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LightSource {
  /// CRATIO < 0.1
  LedOrFluorescent,
  /// 0.1 <= CRATIO < 0.25
  Sunlight,
  /// CRATIO >= 0.25
  Incandescent,
}

impl LightSource {
  pub fn classify(cratio: f32) -> Option<Self> {
    if cratio.is_nan() {
      None
    } else if cratio < 0.1 {
      Some(LightSource::LedOrFluorescent)
    } else if cratio < 0.25 {
      Some(LightSource::Sunlight)
    } else {
      Some(LightSource::Incandescent)
    }
  }
}

/// Derived quantities of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LightReading {
  pub lux: f32,
  pub color_temperature: f32,
  pub cratio: f32,
  /// Clear reached the saturation level; the other fields are zeroed.
  pub saturated: bool,
}

impl LightReading {
  pub fn new(d: &Data, atime_ms: f32, gain: Gain) -> Self {
    let saturation = calculate_saturation_ms(atime_ms).unwrap_or(0xFFFF);
    if d.c16() >= saturation {
      return Self { lux: 0.0, color_temperature: 0.0, cratio: 0.0, saturated: true };
    }
    let (r, g, b, c) = (d.r16(), d.g16(), d.b16(), d.c16());
    Self {
      lux: calculate_lux(r, g, b, c, atime_ms, gain),
      color_temperature: calculate_color_temperature(r, g, b, c),
      cratio: calculate_cratio(r, g, b, c),
      saturated: false,
    }
  }

  pub fn light_source(&self) -> Option<LightSource> {
    if self.saturated {
      return None;
    }
    LightSource::classify(self.cratio)
  }
}

impl Data {
  pub fn lux(&self, atime_ms: f32, gain: Gain) -> f32 {
    calculate_lux(self.r16(), self.g16(), self.b16(), self.c16(), atime_ms, gain)
  }

  pub fn color_temperature(&self) -> f32 {
    calculate_color_temperature(self.r16(), self.g16(), self.b16(), self.c16())
  }

  pub fn cratio(&self) -> f32 {
    calculate_cratio(self.r16(), self.g16(), self.b16(), self.c16())
  }

  /// Clear reached `saturation` (see [`calculate_saturation`]).
  pub fn is_saturated(&self, saturation: u16) -> bool {
    self.c16() >= saturation
  }
}

/// 256-entry gamma correction lookup, built once and reused per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable([u8; 256]);

impl GammaTable {
  /// `table[i] = floor((i / 255) ^ gamma * 255)`
  pub fn new(gamma: f32) -> Self {
    let mut table = [0u8; 256];
    for (i, v) in table.iter_mut().enumerate() {
      *v = (libm::powf(i as f32 / 255.0, gamma) * 255.0) as u8;
    }
    Self(table)
  }

  #[inline]
  pub fn apply(&self, v: u8) -> u8 {
    self.0[v as usize]
  }

  pub fn as_array(&self) -> &[u8; 256] {
    &self.0
  }
}

impl Default for GammaTable {
  fn default() -> Self {
    GammaTable::new(2.2)
  }
}

impl core::ops::Index<u8> for GammaTable {
  type Output = u8;

  fn index(&self, v: u8) -> &u8 {
    &self.0[v as usize]
  }
}
