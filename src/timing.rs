//! Integration (ATIME) and wait (WTIME) time configuration.
//!
//! Both registers encode a duration as `2.4 ms * (256 - code)`. WTIME can
//! additionally be stretched 12x through `CONFIG.WLONG`.
//!
//! | Register | Range (ms) |
//! |---|---|
//! | ATIME | 2.4 - 614.4 |
//! | WTIME | 2.4 - 614.4 |
//! | WTIME + WLONG | 28.8 - 7372.8 |
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I, D, C>(mut rgb: tcs3472x::Tcs3472x<I, D, C>)
//! # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs, C: tcs3472x::Clock {
//! rgb.set_atime(154.0).await.ok();
//! rgb.set_wtime(1000.0).await.ok(); // encoded with WLONG set
//! if let Ok((code, wlong)) = rgb.get_wtime_raw().await {
//!   assert!(wlong);
//! }
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, Clock, Error, Tcs3472x};

/// Duration of one ATIME/WTIME step in ms.
pub const STEP_MS: f32 = 2.4;
/// WLONG multiplier.
pub const WLONG_FACTOR: f32 = 12.0;

pub const ATIME_MIN_MS: f32 = 2.4;
pub const ATIME_MAX_MS: f32 = 614.4;
pub const WTIME_MIN_MS: f32 = 2.4;
pub const WTIME_MAX_MS: f32 = 614.4;
pub const WTIME_LONG_MIN_MS: f32 = 28.8;
pub const WTIME_LONG_MAX_MS: f32 = 7372.8;

/// Reconstruction errors closer than this are a tie (f32 step products are inexact).
const TIE_EPSILON_MS: f32 = 1e-3;

/// ATIME code to integration time in ms.
#[inline]
pub fn atime_to_ms(code: u8) -> f32 {
  STEP_MS * (256 - code as u16) as f32
}

/// Integration time in ms to the nearest ATIME code, saturating at the register bounds.
///
/// Returns `None` for non-finite input.
pub fn ms_to_atime(ms: f32) -> Option<u8> {
  if !ms.is_finite() {
    return None;
  }
  let steps = libm::roundf(ms / STEP_MS) as i32;
  Some((256 - steps).clamp(0, 0xFF) as u8)
}

/// WTIME code plus WLONG flag to wait time in ms.
#[inline]
pub fn wtime_to_ms(code: u8, wlong: bool) -> f32 {
  atime_to_ms(code) * if wlong { WLONG_FACTOR } else { 1.0 }
}

/// Wait time in ms to the `(code, wlong)` pair that reproduces it most closely.
///
/// The input is clamped to `[2.4, 7372.8]`. When the normal and long encodings
/// are equally close (within 1 µs) the normal one wins. Returns `None` for
/// non-finite input.
pub fn ms_to_wtime(ms: f32) -> Option<(u8, bool)> {
  if !ms.is_finite() {
    return None;
  }
  let ms = ms.clamp(WTIME_MIN_MS, WTIME_LONG_MAX_MS);
  let normal = ms_to_atime(ms)?;
  let long = ms_to_atime(ms / WLONG_FACTOR)?;

  let normal_err = libm::fabsf(wtime_to_ms(normal, false) - ms);
  let long_err = libm::fabsf(wtime_to_ms(long, true) - ms);
  Some(if long_err + TIE_EPSILON_MS < normal_err { (long, true) } else { (normal, false) })
}

#[inline]
pub(crate) fn in_range(ms: f32, min: f32, max: f32) -> bool {
  ms.is_finite() && ms >= min && ms <= max
}

impl<I, D, C, E, const N: usize> Tcs3472x<I, D, C, N>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
{
  /// Read the raw ATIME code.
  pub async fn get_atime_raw(&mut self) -> Result<u8, Error<E>> {
    self.read_u8(Reg::Atime).await
  }

  /// Read the integration time in ms.
  pub async fn get_atime(&mut self) -> Result<f32, Error<E>> {
    Ok(atime_to_ms(self.get_atime_raw().await?))
  }

  pub async fn set_atime_raw(&mut self, code: u8) -> Result<(), Error<E>> {
    self.write_u8(Reg::Atime, code).await
  }

  /// Set the integration time in ms (2.4 - 614.4). Anything else, NaN included,
  /// is rejected with [`Error::InvalidParameter`] and nothing is written.
  pub async fn set_atime(&mut self, ms: f32) -> Result<(), Error<E>> {
    let code = validated_atime(ms).ok_or(Error::InvalidParameter)?;
    self.set_atime_raw(code).await
  }

  /// Read the raw WTIME code and the WLONG flag.
  pub async fn get_wtime_raw(&mut self) -> Result<(u8, bool), Error<E>> {
    let code = self.read_u8(Reg::Wtime).await?;
    let cfg: ConfigReg = self.read(Reg::Config).await?;
    Ok((code, cfg.wlong))
  }

  /// Read the wait time in ms, WLONG applied.
  pub async fn get_wtime(&mut self) -> Result<f32, Error<E>> {
    let (code, wlong) = self.get_wtime_raw().await?;
    Ok(wtime_to_ms(code, wlong))
  }

  /// Write WTIME, then CONFIG.WLONG.
  pub async fn set_wtime_raw(&mut self, code: u8, wlong: bool) -> Result<(), Error<E>> {
    self.write_u8(Reg::Wtime, code).await?;
    self.write(Reg::Config, ConfigReg { wlong }).await
  }

  /// Set the wait time in ms (2.4 - 7372.8), choosing WLONG as needed.
  pub async fn set_wtime(&mut self, ms: f32) -> Result<(), Error<E>> {
    let (code, wlong) = validated_wtime(ms).ok_or(Error::InvalidParameter)?;
    self.set_wtime_raw(code, wlong).await
  }
}

pub(crate) fn validated_atime(ms: f32) -> Option<u8> {
  if !in_range(ms, ATIME_MIN_MS, ATIME_MAX_MS) {
    warn!("ATIME out of range [2.4 - 614.4]: {}", ms);
    return None;
  }
  ms_to_atime(ms)
}

pub(crate) fn validated_wtime(ms: f32) -> Option<(u8, bool)> {
  if !in_range(ms, WTIME_MIN_MS, WTIME_LONG_MAX_MS) {
    warn!("WTIME out of range [2.4 - 7372.8]: {}", ms);
    return None;
  }
  ms_to_wtime(ms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct ConfigReg {
  #[skip(1)]
  #[bits(1)]
  pub wlong: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn atime_code_round_trip() {
    for code in 0..=255u8 {
      assert_eq!(ms_to_atime(atime_to_ms(code)), Some(code), "code {code}");
    }
  }

  #[test]
  fn atime_grid_is_exact() {
    for steps in 1..=256u16 {
      let ms = STEP_MS * steps as f32;
      let code = ms_to_atime(ms).unwrap();
      assert_eq!(atime_to_ms(code), ms, "{ms} ms");
    }
  }

  #[test]
  fn atime_bounds() {
    assert_eq!(atime_to_ms(0xFF), 2.4);
    assert_eq!(atime_to_ms(0x00), 614.4);
    assert_eq!(ms_to_atime(0.0), Some(0xFF));
    assert_eq!(ms_to_atime(10_000.0), Some(0x00));
    assert_eq!(ms_to_atime(f32::NAN), None);
    assert_eq!(ms_to_atime(f32::INFINITY), None);
  }

  #[test]
  fn atime_rounds_to_nearest() {
    // 100 ms / 2.4 = 41.67 steps
    assert_eq!(ms_to_atime(100.0), Some(214));
    // 101 ms / 2.4 = 42.08 steps
    assert_eq!(ms_to_atime(101.0), Some(214));
  }

  #[test]
  fn wtime_long_multiplier() {
    assert_eq!(wtime_to_ms(0xFF, false), 2.4);
    assert_eq!(wtime_to_ms(0xFF, true), 2.4 * 12.0);
    assert_eq!(wtime_to_ms(0x00, false), 614.4);
    assert!(libm::fabsf(wtime_to_ms(0x00, true) - WTIME_LONG_MAX_MS) < 1e-3);
  }

  #[test]
  fn wtime_tie_prefers_normal() {
    // 28.8 ms: 12 normal steps or 1 long step
    assert_eq!(ms_to_wtime(28.8), Some((244, false)));
    // 432 ms: 2.4 * 180 rounds above 15 * 28.8 in f32
    assert_eq!(ms_to_wtime(432.0), Some((76, false)));
    assert_eq!(ms_to_wtime(489.6), Some((52, false)));
  }

  #[test]
  fn every_long_step_within_normal_range_encodes_normal() {
    for k in 1..=21u16 {
      let ms = wtime_to_ms((256 - k) as u8, true);
      let (code, wlong) = ms_to_wtime(ms).unwrap();
      assert!(!wlong, "{k} long steps ({ms} ms) -> ({code}, {wlong})");
      assert_eq!(code, (256 - 12 * k) as u8, "{ms} ms");
    }
  }

  #[test]
  fn wtime_beyond_normal_range_uses_long() {
    assert_eq!(ms_to_wtime(7372.8), Some((0x00, true)));
    assert_eq!(ms_to_wtime(1000.0), Some((221, true)));
  }

  #[test]
  fn wtime_clamps_and_rejects_non_finite() {
    assert_eq!(ms_to_wtime(0.1), Some((0xFF, false)));
    assert_eq!(ms_to_wtime(100_000.0), Some((0x00, true)));
    assert_eq!(ms_to_wtime(f32::NAN), None);
    assert_eq!(ms_to_wtime(f32::NEG_INFINITY), None);
  }

  #[test]
  fn wtime_grid_reproduces_duration() {
    for wlong in [false, true] {
      for code in 0..=255u8 {
        let ms = wtime_to_ms(code, wlong);
        let (c, l) = ms_to_wtime(ms).unwrap();
        assert!(libm::fabsf(wtime_to_ms(c, l) - ms) < 1e-3, "{ms} ms -> ({c}, {l})");
      }
    }
  }

  #[test]
  fn range_validation() {
    assert!(validated_atime(1.2).is_none());
    assert!(validated_atime(666.6).is_none());
    assert!(validated_atime(f32::NAN).is_none());
    assert_eq!(validated_atime(614.4), Some(0));
    assert!(validated_wtime(1.2).is_none());
    assert!(validated_wtime(9876.5).is_none());
    assert_eq!(validated_wtime(7372.8), Some((0, true)));
  }
}
