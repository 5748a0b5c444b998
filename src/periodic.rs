//! Continuous RGBC measurement.
//!
//! Periodic mode runs integration and wait cycles back to back on the chip.
//! [`Tcs3472x::update`] is meant to be called from the application loop: it
//! touches the bus only once the polling interval (`ceil(ATIME + WTIME)`) has
//! elapsed, and never waits.

use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, timing::*, Clock, Enable, Error, Gain, State, Tcs3472x};

impl<I, D, C, E, const N: usize> Tcs3472x<I, D, C, N>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
{
  /// Start periodic measurement with the gain and timing already on the chip.
  pub async fn start_periodic(&mut self) -> Result<(), Error<E>> {
    self.ensure_stopped()?;

    let atime = self.get_atime().await?;
    let wtime = self.get_wtime().await?;

    let mut en: Enable = self.read(Reg::Enable).await?;
    let settle = !en.pon;
    en.pon = true;
    en.aen = true;
    en.wen = true;
    self.write(Reg::Enable, en).await?;

    self.state = State::Periodic;
    self.latest = None;
    self.updated = false;
    self.interval = libm::ceilf(atime + wtime) as u32;
    debug!("periodic measurement started, interval {} ms", self.interval);

    if settle {
      self.delay.delay_ms(POWER_ON_SETTLE_MS).await;
    }
    Ok(())
  }

  /// Write gain, ATIME and WTIME, then start periodic measurement.
  ///
  /// Both durations are validated before anything is written. A bus failure
  /// part way leaves the configuration indeterminate.
  pub async fn start_periodic_with(&mut self, gain: Gain, atime_ms: f32, wtime_ms: f32) -> Result<(), Error<E>> {
    self.ensure_stopped()?;

    let atime = validated_atime(atime_ms).ok_or(Error::InvalidParameter)?;
    let (wtime, wlong) = validated_wtime(wtime_ms).ok_or(Error::InvalidParameter)?;

    self.set_atime_raw(atime).await?;
    self.set_wtime_raw(wtime, wlong).await?;
    self.set_gain(gain).await?;
    self.start_periodic().await
  }

  /// Stop periodic measurement. With `power_off` the oscillator is turned off
  /// as well.
  pub async fn stop_periodic(&mut self, power_off: bool) -> Result<(), Error<E>> {
    let mut en: Enable = self.read(Reg::Enable).await?;
    en.aen = false;
    en.pon = !power_off;
    self.write(Reg::Enable, en).await?;

    self.state = State::Idle;
    debug!("periodic measurement stopped");
    Ok(())
  }

  /// Poll for a new periodic sample.
  ///
  /// Does nothing unless periodic mode is active. The status register is read
  /// once the polling interval has passed since the last stored sample, or
  /// right away with `force`. Returns whether a sample was stored.
  pub async fn update(&mut self, force: bool) -> Result<bool, Error<E>> {
    self.updated = false;
    self.clear_abandoned_singleshot();
    if self.state != State::Periodic {
      return Ok(false);
    }

    let now = self.clock.now_ms();
    let due = match self.latest {
      None => true,
      Some(at) => now.saturating_sub(at) >= self.interval as u64,
    };
    if !(force || due) || !self.is_data_ready().await? {
      return Ok(false);
    }

    let d = self.read_measurement().await?;
    self.samples.push(d);
    self.latest = Some(now);
    self.updated = true;
    trace!("sample stored at {} ms, {} available", now, self.samples.available());
    Ok(true)
  }

  /// Whether the last [`update`](Self::update) stored a sample.
  pub fn updated(&self) -> bool {
    self.updated
  }

  /// Clock reading of the last stored sample.
  pub fn updated_millis(&self) -> Option<u64> {
    self.latest
  }

  /// Polling interval in ms, valid while periodic mode is active.
  pub fn interval(&self) -> u32 {
    self.interval
  }

  pub fn in_periodic(&self) -> bool {
    self.state == State::Periodic
  }

  fn ensure_stopped(&mut self) -> Result<(), Error<E>> {
    self.clear_abandoned_singleshot();
    if self.state == State::Periodic {
      debug!("periodic measurement already running");
      return Err(Error::AlreadyRunning);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::{testing::*, Error, Gain, State};

  #[tokio::test]
  async fn start_enables_power_rgbc_and_wait() {
    let (mut rgb, dev) = driver::<1>();
    rgb.start_periodic().await.unwrap();
    assert_eq!(dev.reg(0x00), 0x0B);
    assert!(rgb.in_periodic());
    // power was off: settle delay applied
    assert_eq!(dev.now_ms(), 3);
    // reset values: ATIME = WTIME = 0xFF
    assert_eq!(rgb.interval(), 5);
  }

  #[tokio::test]
  async fn start_skips_settle_when_powered() {
    let (mut rgb, dev) = driver::<1>();
    dev.set(0x00, 0x01);
    rgb.start_periodic().await.unwrap();
    assert_eq!(dev.now_ms(), 0);
    assert_eq!(dev.reg(0x00), 0x0B);
  }

  #[tokio::test]
  async fn start_keeps_interrupt_enable() {
    let (mut rgb, dev) = driver::<1>();
    dev.set(0x00, 0x10);
    rgb.start_periodic().await.unwrap();
    assert_eq!(dev.reg(0x00), 0x1B);
  }

  #[tokio::test]
  async fn start_while_running_is_rejected_without_writes() {
    let (mut rgb, dev) = driver::<1>();
    rgb.start_periodic().await.unwrap();
    dev.clear_writes();

    assert!(matches!(rgb.start_periodic().await, Err(Error::AlreadyRunning)));
    assert!(matches!(rgb.start_periodic_with(Gain::X1, 24.0, 24.0).await, Err(Error::AlreadyRunning)));
    assert_eq!(rgb.state(), State::Periodic);
    assert!(dev.writes().is_empty());
  }

  #[tokio::test]
  async fn start_with_invalid_timing_writes_nothing() {
    let (mut rgb, dev) = driver::<1>();
    let cases = [(0.5, 24.0), (700.0, 24.0), (f32::NAN, 24.0), (24.0, 0.0), (24.0, 8000.0), (24.0, f32::NAN)];
    for (atime, wtime) in cases {
      assert!(matches!(rgb.start_periodic_with(Gain::X4, atime, wtime).await, Err(Error::InvalidParameter)));
    }
    assert!(dev.writes().is_empty());
    assert_eq!(rgb.state(), State::Idle);
  }

  #[tokio::test]
  async fn start_with_writes_configuration_in_order() {
    let (mut rgb, dev) = driver::<1>();
    rgb.start_periodic_with(Gain::X60, 2.4, 1000.0).await.unwrap();
    assert_eq!(
      dev.writes(),
      [(0x81, vec![0xFF]), (0x83, vec![221]), (0x8D, vec![0x02]), (0x8F, vec![0x03]), (0x80, vec![0x0B])]
    );
    // ceil(2.4 + 35 * 2.4 * 12)
    assert_eq!(rgb.interval(), 1011);
  }

  #[tokio::test]
  async fn update_is_a_no_op_when_idle() {
    let (mut rgb, dev) = driver::<1>();
    dev.set(0x13, 0x01);
    assert!(!rgb.update(true).await.unwrap());
    assert!(!rgb.updated());
    assert_eq!(dev.transactions(), 0);
  }

  #[tokio::test]
  async fn update_respects_polling_interval() {
    let (mut rgb, dev) = driver::<4>();
    rgb.start_periodic_with(Gain::X4, 24.0, 24.0).await.unwrap();
    assert_eq!(rgb.interval(), 48);
    dev.set(0x13, 0x01);
    dev.set_channels(1000, 100, 200, 300);

    assert!(rgb.update(false).await.unwrap());
    assert!(rgb.updated());
    let first = rgb.updated_millis().unwrap();

    dev.advance_ms(10);
    let before = dev.transactions();
    assert!(!rgb.update(false).await.unwrap());
    assert!(!rgb.updated());
    assert_eq!(dev.transactions(), before);

    assert!(rgb.update(true).await.unwrap());
    assert_eq!(rgb.updated_millis(), Some(first + 10));

    dev.advance_ms(48);
    assert!(rgb.update(false).await.unwrap());
    assert_eq!(rgb.available(), 3);
  }

  #[tokio::test]
  async fn update_waits_for_valid_data() {
    let (mut rgb, dev) = driver::<1>();
    rgb.start_periodic().await.unwrap();
    assert!(!rgb.update(false).await.unwrap());
    assert!(rgb.is_empty());
    assert_eq!(rgb.updated_millis(), None);

    dev.set(0x13, 0x01);
    assert!(rgb.update(false).await.unwrap());
    assert_eq!(rgb.available(), 1);
  }

  #[tokio::test]
  async fn buffer_fill_discard_flush() {
    let (mut rgb, dev) = driver::<4>();
    rgb.set_config(crate::Config { stored_size: 4, start_periodic: true, ..Default::default() });
    rgb.begin().await.unwrap();
    dev.set(0x13, 0x01);
    dev.set_channels(1000, 500, 250, 125);

    for _ in 0..4 {
      assert!(rgb.update(true).await.unwrap());
    }
    assert!(rgb.is_full());
    assert_eq!(rgb.available(), 4);
    assert_eq!(rgb.r8(), 127);

    rgb.discard();
    rgb.discard();
    assert_eq!(rgb.available(), 2);

    rgb.flush();
    assert_eq!(rgb.available(), 0);
    assert_eq!((rgb.r8(), rgb.g8(), rgb.b8(), rgb.rgb565()), (0, 0, 0, 0));
  }

  #[tokio::test]
  async fn full_buffer_drops_oldest() {
    let (mut rgb, dev) = driver::<2>();
    rgb.set_config(crate::Config { stored_size: 2, ..Default::default() });
    rgb.begin().await.unwrap();
    dev.set(0x13, 0x01);
    for c in [10, 20, 30] {
      dev.set_channels(c, 0, 0, 0);
      rgb.update(true).await.unwrap();
    }
    assert_eq!(rgb.available(), 2);
    assert_eq!(rgb.oldest().map(|d| d.c16()), Some(20));
  }

  #[tokio::test]
  async fn stop_clears_rgbc_and_power() {
    let (mut rgb, dev) = driver::<1>();
    rgb.start_periodic().await.unwrap();

    rgb.stop_periodic(false).await.unwrap();
    assert_eq!(dev.reg(0x00) & 0x03, 0x01);
    assert_eq!(rgb.state(), State::Idle);

    rgb.start_periodic().await.unwrap();
    rgb.stop_periodic(true).await.unwrap();
    assert_eq!(dev.reg(0x00) & 0x03, 0x00);
    assert!(!rgb.in_periodic());
  }

  #[tokio::test]
  async fn stop_failure_keeps_state() {
    let (mut rgb, dev) = driver::<1>();
    rgb.start_periodic().await.unwrap();
    dev.fail(true);
    assert!(matches!(rgb.stop_periodic(true).await, Err(Error::I2c(FakeError))));
    assert!(rgb.in_periodic());
  }
}
