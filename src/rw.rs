use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::*, Clock, Error, Tcs3472x};

/// Single-byte transfers address one register, anything longer walks the map.
#[inline]
fn access_for(len: usize) -> Access {
  if len > 1 {
    Access::AutoIncrement
  } else {
    Access::Repeated
  }
}

impl<I, D, C, E, const N: usize> Tcs3472x<I, D, C, N>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
{
  pub(crate) async fn read<const M: usize, T: TryFrom<[u8; M]>>(&mut self, reg: Reg) -> Result<T, Error<E>> {
    let mut b = [0u8; M];
    self.read_bytes(reg, &mut b).await?;
    TryFrom::try_from(b).map_err(|_| Error::Data)
  }

  pub(crate) async fn read_u8(&mut self, reg: Reg) -> Result<u8, Error<E>> {
    let mut b = [0u8; 1];
    self.read_bytes(reg, &mut b).await?;
    Ok(b[0])
  }

  pub(crate) async fn read_bytes(&mut self, reg: Reg, buf: &mut [u8]) -> Result<(), Error<E>> {
    let cmd = command(reg, access_for(buf.len()));
    self.i2c.write_read(self.address, &[cmd], buf).await.map_err(Error::I2c)
  }

  pub(crate) async fn write<const M: usize, T: TryInto<[u8; M]>>(&mut self, reg: Reg, v: T) -> Result<(), Error<E>> {
    let b = v.try_into().map_err(|_| Error::Data)?;
    self.write_bytes(reg, &b).await
  }

  pub(crate) async fn write_u8(&mut self, reg: Reg, value: u8) -> Result<(), Error<E>> {
    self.write_bytes(reg, &[value]).await
  }

  pub(crate) async fn write_bytes(&mut self, reg: Reg, data: &[u8]) -> Result<(), Error<E>> {
    debug_assert!(data.len() <= 8, "write_bytes buffer too small");
    let mut buf = [0u8; 9];
    let len = 1 + data.len();
    buf[0] = command(reg, access_for(data.len()));
    buf[1..len].copy_from_slice(data);
    self.i2c.write(self.address, &buf[..len]).await.map_err(Error::I2c)
  }

  /// Issue a bare special-function command byte.
  pub(crate) async fn write_special(&mut self, cmd: u8) -> Result<(), Error<E>> {
    self.i2c.write(self.address, &[cmd]).await.map_err(Error::I2c)
  }
}
