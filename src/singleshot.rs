use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, timing::*, Clock, Data, Enable, Error, Gain, State, Tcs3472x};

impl<I, D, C, E, const N: usize> Tcs3472x<I, D, C, N>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
{
  /// Take one RGBC measurement with the gain and ATIME already on the chip.
  ///
  /// Powers the chip and enables RGBC, waits one integration time, then polls
  /// `STATUS.AVALID` every millisecond. Gives up with [`Error::Timeout`] one
  /// second after the expected completion. The sample is returned directly and
  /// not stored; RGBC is left enabled so [`start_periodic`](Self::start_periodic)
  /// may follow.
  pub async fn measure_singleshot(&mut self) -> Result<Data, Error<E>> {
    self.ensure_idle()?;
    self.state = State::Singleshot;
    let res = self.singleshot().await;
    self.state = State::Idle;
    res
  }

  /// Write gain and ATIME, then take one measurement.
  pub async fn measure_singleshot_with(&mut self, gain: Gain, atime_ms: f32) -> Result<Data, Error<E>> {
    self.ensure_idle()?;
    let atime = validated_atime(atime_ms).ok_or(Error::InvalidParameter)?;
    self.set_gain(gain).await?;
    self.set_atime_raw(atime).await?;
    self.measure_singleshot().await
  }

  async fn singleshot(&mut self) -> Result<Data, Error<E>> {
    let integration = libm::ceilf(self.get_atime().await?) as u32;

    let mut en: Enable = self.read(Reg::Enable).await?;
    let settle = if en.pon { 0 } else { POWER_ON_SETTLE_MS };
    en.pon = true;
    en.aen = true;
    self.write(Reg::Enable, en).await?;

    let deadline = self.clock.now_ms() + integration as u64 + SINGLESHOT_TIMEOUT_MARGIN_MS;
    self.delay.delay_ms(integration + settle).await;
    loop {
      if self.is_data_ready().await? {
        return self.read_measurement().await;
      }
      if self.clock.now_ms() > deadline {
        warn!("single-shot measurement timed out after {} ms", integration as u64 + SINGLESHOT_TIMEOUT_MARGIN_MS);
        return Err(Error::Timeout);
      }
      self.delay.delay_ms(1).await;
    }
  }

  fn ensure_idle(&mut self) -> Result<(), Error<E>> {
    self.clear_abandoned_singleshot();
    if self.state == State::Periodic {
      debug!("single-shot rejected, periodic measurement active");
      return Err(Error::Busy);
    }
    Ok(())
  }
}
