//! Clear-channel threshold interrupt.
//!
//! When `ENABLE.AIEN` is set the chip asserts INT once the Clear count has
//! been outside `[low, high]` for the configured number of cycles. The
//! interrupt latches until [`Tcs3472x::clear_interrupt`] is issued.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I, D, C>(mut rgb: tcs3472x::Tcs3472x<I, D, C>)
//! # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs, C: tcs3472x::Clock {
//! use tcs3472x::{Persistence, Threshold};
//!
//! rgb.set_interrupt_threshold(Threshold { low: 100, high: 40_000 }).await.ok();
//! rgb.set_persistence(Persistence::Cycle5).await.ok();
//! rgb.set_interrupt_enabled(true).await.ok();
//!
//! if rgb.get_status().await.map(|s| s.aint).unwrap_or(false) {
//!   rgb.clear_interrupt().await.ok();
//! }
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, Clock, Enable, Error, Persistence, Tcs3472x};

/// Clear-channel interrupt window (`AILTL..AIHTH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Threshold {
  pub low: u16,
  pub high: u16,
}

impl From<[u8; 4]> for Threshold {
  fn from(b: [u8; 4]) -> Self {
    Self { low: u16::from_le_bytes([b[0], b[1]]), high: u16::from_le_bytes([b[2], b[3]]) }
  }
}

impl From<Threshold> for [u8; 4] {
  fn from(t: Threshold) -> Self {
    let [l0, l1] = t.low.to_le_bytes();
    let [h0, h1] = t.high.to_le_bytes();
    [l0, l1, h0, h1]
  }
}

impl<I, D, C, E, const N: usize> Tcs3472x<I, D, C, N>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
{
  pub async fn get_persistence(&mut self) -> Result<Persistence, Error<E>> {
    let r: Pers = self.read(Reg::Pers).await?;
    Ok(r.apers)
  }

  /// Replace `PERS.APERS`, leaving the upper nibble as it is.
  pub async fn set_persistence(&mut self, apers: Persistence) -> Result<(), Error<E>> {
    let mut r: Pers = self.read(Reg::Pers).await?;
    r.apers = apers;
    self.write(Reg::Pers, r).await
  }

  /// `ENABLE.AIEN`
  pub async fn get_interrupt_enabled(&mut self) -> Result<bool, Error<E>> {
    let en: Enable = self.read(Reg::Enable).await?;
    Ok(en.aien)
  }

  /// Set or clear `ENABLE.AIEN`, leaving the other enable bits as they are.
  pub async fn set_interrupt_enabled(&mut self, enable: bool) -> Result<(), Error<E>> {
    let mut en: Enable = self.read(Reg::Enable).await?;
    en.aien = enable;
    self.write(Reg::Enable, en).await
  }

  pub async fn get_interrupt_threshold(&mut self) -> Result<Threshold, Error<E>> {
    self.read::<4, Threshold>(Reg::Ailtl).await
  }

  /// Write both thresholds in one transaction. `low > high` is rejected.
  pub async fn set_interrupt_threshold(&mut self, t: Threshold) -> Result<(), Error<E>> {
    if t.low > t.high {
      debug!("interrupt threshold low {} above high {}", t.low, t.high);
      return Err(Error::InvalidParameter);
    }
    self.write::<4, Threshold>(Reg::Ailtl, t).await
  }

  /// Clear the latched clear-channel interrupt.
  pub async fn clear_interrupt(&mut self) -> Result<(), Error<E>> {
    self.write_special(CLEAR_CHANNEL_INTERRUPT).await
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct Pers {
  #[bits(4)]
  pub apers: Persistence,
  #[bits(4)]
  pub reserved: u8,
}
