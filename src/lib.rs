#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]
//!
//! ## Module Organization
//!
//! - [`timing`]: ATIME/WTIME encoding and configuration
//! - [`photometry`]: lux, color temperature, saturation, CRATIO and gamma
//! - [`data`]: raw samples and their 8-bit / packed representations
//! - [`calibration`]: black/white point remapping
//! - [`buffer`]: the bounded sample store owned by the driver
//! - [`interrupt`]: threshold interrupt configuration
//!
//! ## Basic Usage
//!
//! ```no_run
//! # async fn example<I, D>(i2c: I, delay: D, millis: impl FnMut() -> u64) -> Result<(), tcs3472x::Error<I::Error>>
//! # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs {
//! use tcs3472x::{DeviceProfile, Tcs3472x};
//!
//! let mut rgb: Tcs3472x<_, _, _, 8> = Tcs3472x::new(i2c, delay, millis, DeviceProfile::TCS34725);
//! rgb.begin().await?;
//!
//! loop {
//!   if rgb.update(false).await? {
//!     let (r, g, b) = (rgb.r8(), rgb.g8(), rgb.b8());
//!     # let _ = (r, g, b);
//!     rgb.discard();
//!   }
//! }
//! # }
//! ```

mod fmt;

use embedded_hal_async::{delay::DelayNs, i2c::*};

pub mod buffer;
pub mod calibration;
pub mod data;
mod defs;
pub mod interrupt;
mod periodic;
pub mod photometry;
pub(crate) mod rw;
mod singleshot;
#[cfg(test)]
mod testing;
pub mod timing;
mod types;

pub use buffer::SampleBuffer;
pub use calibration::Calibration;
pub use data::Data;
pub use interrupt::Threshold;
pub use types::*;

use defs::*;

/// Bus address of every TCS3472x variant.
pub const DEFAULT_ADDRESS: u8 = ADDR_I2C;

/// Driver error type.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I2C communication error
  I2c(E),
  /// The ID register does not match the configured profile
  InvalidChipId(u8),
  /// Out-of-range or non-finite argument, rejected before any register write
  InvalidParameter,
  /// Periodic measurement is already active
  AlreadyRunning,
  /// Single-shot requested while periodic measurement is active
  Busy,
  /// Single-shot result did not become valid in time
  Timeout,
  /// Register contents could not be decoded
  Data,
}

/// Monotonic millisecond time source.
///
/// Any `FnMut() -> u64` closure is a clock. Wraparound is not handled.
pub trait Clock {
  fn now_ms(&mut self) -> u64;
}

impl<F: FnMut() -> u64> Clock for F {
  fn now_ms(&mut self) -> u64 {
    self()
  }
}

/// Measurement state of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
  #[default]
  Idle,
  /// RGBC and wait cycles run continuously, sampled by [`Tcs3472x::update`].
  Periodic,
  /// A single-shot measurement is in flight.
  Singleshot,
}

/// Settings applied by [`Tcs3472x::begin`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
  /// Start periodic measurement from `begin`.
  pub start_periodic: bool,
  /// Integration time (2.4 - 614.4 ms).
  pub atime_ms: f32,
  /// Wait time (2.4 - 7372.8 ms).
  pub wtime_ms: f32,
  pub gain: Gain,
  /// Samples kept by the driver, clamped to `1..=N`.
  pub stored_size: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self { start_periodic: true, atime_ms: 614.4, wtime_ms: 2.4, gain: Gain::X4, stored_size: 1 }
  }
}

/// TCS3472x device driver instance.
///
/// Owns the I2C bus, the delay provider and a millisecond clock. The last
/// `N` periodic samples are kept in an internal [`SampleBuffer`].
///
/// # Type Parameters
///
/// - `I`: I2C implementation (must implement `embedded_hal_async::i2c::I2c`)
/// - `D`: Delay provider (must implement `embedded_hal_async::delay::DelayNs`)
/// - `C`: Millisecond [`Clock`]
/// - `N`: Sample buffer slots
pub struct Tcs3472x<I, D, C, const N: usize = 1> {
  i2c: I,
  delay: D,
  clock: C,
  address: u8,
  profile: DeviceProfile,
  config: Config,
  state: State,
  latest: Option<u64>,
  interval: u32,
  updated: bool,
  samples: SampleBuffer<N>,
}

impl<I, D, C, E, const N: usize> Tcs3472x<I, D, C, N>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
{
  /// Create a driver for the given chip variant with the default [`Config`].
  pub fn new(i2c: I, delay: D, clock: C, profile: DeviceProfile) -> Self {
    let config = Config::default();
    Self {
      i2c,
      delay,
      clock,
      address: ADDR_I2C,
      profile,
      config,
      state: State::Idle,
      latest: None,
      interval: 0,
      updated: false,
      samples: SampleBuffer::with_capacity(config.stored_size),
    }
  }

  /// Use a non-standard bus address (e.g. behind a translator).
  pub fn with_address(mut self, address: u8) -> Self {
    self.address = address;
    self
  }

  /// Replace the default configuration and size the sample buffer for it.
  pub fn with_config(mut self, config: Config) -> Self {
    self.samples.set_capacity(config.stored_size);
    self.config = config;
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Replace the configuration. Takes effect on the next [`begin`](Self::begin).
  pub fn set_config(&mut self, config: Config) {
    self.config = config;
  }

  pub fn profile(&self) -> &DeviceProfile {
    &self.profile
  }

  /// Current measurement state. A single-shot future dropped before it
  /// completes leaves [`State::Singleshot`] reported until the next driver
  /// operation.
  pub fn state(&self) -> State {
    self.state
  }

  /// Only one operation runs at a time, so a `Singleshot` seen on entry
  /// belongs to a dropped measurement.
  pub(crate) fn clear_abandoned_singleshot(&mut self) {
    if self.state == State::Singleshot {
      debug!("abandoned single-shot measurement cleared");
      self.state = State::Idle;
    }
  }

  /// Give back the bus, delay and clock.
  pub fn release(self) -> (I, D, C) {
    (self.i2c, self.delay, self.clock)
  }

  /// Verify the chip identity and apply the configuration.
  ///
  /// The sample buffer is resized to `stored_size` if it differs, then the ID
  /// register is checked against the profile. With `start_periodic` set the
  /// configured gain and timing are written and periodic measurement starts.
  pub async fn begin(&mut self) -> Result<(), Error<E>> {
    self.clear_abandoned_singleshot();
    let size = self.config.stored_size.clamp(1, N.max(1));
    if self.samples.capacity() != size {
      self.samples.set_capacity(size);
    }

    let id = self.get_id().await?;
    if id != self.profile.chip_id {
      error!("{} not found, ID register reads {}", self.profile.name, id);
      return Err(Error::InvalidChipId(id));
    }

    if self.config.start_periodic {
      let Config { gain, atime_ms, wtime_ms, .. } = self.config;
      self.start_periodic_with(gain, atime_ms, wtime_ms).await?;
    }
    Ok(())
  }

  /// Read the ID register (`0x44` for TCS34725, `0x4D` for TCS34727).
  pub async fn get_id(&mut self) -> Result<u8, Error<E>> {
    let r: ChipId = self.read(Reg::Id).await?;
    Ok(r.id)
  }

  pub async fn get_status(&mut self) -> Result<Status, Error<E>> {
    self.read(Reg::Status).await
  }

  /// `STATUS.AVALID`: an RGBC cycle completed since RGBC was enabled.
  pub async fn is_data_ready(&mut self) -> Result<bool, Error<E>> {
    Ok(self.get_status().await?.avalid)
  }

  /// Read Clear, Red, Green and Blue in one burst.
  pub async fn read_measurement(&mut self) -> Result<Data, Error<E>> {
    let mut raw = [0u8; 8];
    self.read_bytes(Reg::Cdatal, &mut raw).await?;
    Ok(Data::new(raw))
  }

  pub async fn get_gain(&mut self) -> Result<Gain, Error<E>> {
    let r: Control = self.read(Reg::Control).await?;
    Ok(r.gain)
  }

  pub async fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
    self.write(Reg::Control, Control { gain }).await
  }

  // ---------------------
  // Stored sample access
  // ---------------------
  pub fn samples(&self) -> &SampleBuffer<N> {
    &self.samples
  }

  pub fn oldest(&self) -> Option<&Data> {
    self.samples.oldest()
  }

  pub fn available(&self) -> usize {
    self.samples.available()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn is_full(&self) -> bool {
    self.samples.is_full()
  }

  pub fn discard(&mut self) {
    self.samples.discard()
  }

  pub fn flush(&mut self) {
    self.samples.flush()
  }

  /// Red of the oldest sample, `0` when nothing is stored.
  pub fn r8(&self) -> u8 {
    self.oldest().map_or(0, Data::r8)
  }

  pub fn g8(&self) -> u8 {
    self.oldest().map_or(0, Data::g8)
  }

  pub fn b8(&self) -> u8 {
    self.oldest().map_or(0, Data::b8)
  }

  pub fn rgb565(&self) -> u16 {
    self.oldest().map_or(0, Data::rgb565)
  }

  pub fn rgb888(&self) -> u32 {
    self.oldest().map_or(0, Data::rgb888)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct ChipId {
  pub id: u8,
}

/// `STATUS` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Status {
  /// RGBC data valid
  pub avalid: bool,
  /// RGBC clear channel interrupt pending
  #[skip(3)]
  pub aint: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct Enable {
  /// Oscillator on
  pub pon: bool,
  /// RGBC ADC on
  pub aen: bool,
  /// Wait timer on
  #[skip(1)]
  pub wen: bool,
  /// Clear channel interrupt on
  pub aien: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct Control {
  #[bits(2)]
  pub gain: Gain,
}
