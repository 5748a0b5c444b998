//! In-memory TCS3472x register file for driver tests.

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use embedded_hal_async::{delay::DelayNs, i2c};

use crate::{defs::*, Clock, Config, DeviceProfile, Tcs3472x};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeError;

impl i2c::Error for FakeError {
  fn kind(&self) -> i2c::ErrorKind {
    i2c::ErrorKind::Other
  }
}

#[derive(Debug)]
struct Registers {
  map: [u8; 32],
  pointer: u8,
  auto_increment: bool,
  /// `(command byte, payload)` of every write that changed state
  writes: Vec<(u8, Vec<u8>)>,
  last_command: Option<u8>,
  transactions: usize,
  fail: bool,
}

impl Registers {
  fn new() -> Self {
    let mut map = [0u8; 32];
    map[Reg::Atime as usize] = 0xFF;
    map[Reg::Wtime as usize] = 0xFF;
    map[Reg::Id as usize] = TCS34725_CHIP_ID;
    Self { map, pointer: 0, auto_increment: false, writes: Vec::new(), last_command: None, transactions: 0, fail: false }
  }

  fn write(&mut self, bytes: &[u8]) {
    let Some((&cmd, payload)) = bytes.split_first() else {
      return;
    };
    let Some((addr, access)) = decode_command(cmd) else {
      return;
    };
    self.last_command = Some(cmd);
    if access == Access::Special as u8 {
      if cmd == CLEAR_CHANNEL_INTERRUPT {
        self.map[Reg::Status as usize] &= !0x10;
      }
      self.writes.push((cmd, Vec::new()));
      return;
    }

    self.pointer = addr;
    self.auto_increment = access == Access::AutoIncrement as u8;
    if payload.is_empty() {
      return;
    }
    for &b in payload {
      self.map[self.pointer as usize] = b;
      self.advance();
    }
    self.writes.push((cmd, payload.to_vec()));
  }

  fn read(&mut self, buf: &mut [u8]) {
    for b in buf {
      *b = self.map[self.pointer as usize];
      self.advance();
    }
  }

  fn advance(&mut self) {
    if self.auto_increment {
      self.pointer = (self.pointer + 1) & 0x1F;
    }
  }
}

/// Bus half of the fake: handed to the driver.
pub(crate) struct FakeBus {
  regs: Rc<RefCell<Registers>>,
}

impl i2c::ErrorType for FakeBus {
  type Error = FakeError;
}

impl i2c::I2c for FakeBus {
  async fn transaction(&mut self, address: u8, operations: &mut [i2c::Operation<'_>]) -> Result<(), Self::Error> {
    let mut regs = self.regs.borrow_mut();
    regs.transactions += 1;
    if regs.fail || address != ADDR_I2C {
      return Err(FakeError);
    }
    for op in operations {
      match op {
        i2c::Operation::Write(bytes) => regs.write(bytes),
        i2c::Operation::Read(buf) => regs.read(buf),
      }
    }
    Ok(())
  }
}

/// Delay that only advances the shared fake time. While stalled every delay
/// suspends once before completing.
pub(crate) struct FakeDelay {
  now_ns: Rc<Cell<u64>>,
  stall: Rc<Cell<bool>>,
}

impl FakeDelay {
  async fn elapse(&mut self, ns: u64) {
    if self.stall.get() {
      tokio::task::yield_now().await;
    }
    self.now_ns.set(self.now_ns.get() + ns);
  }
}

impl DelayNs for FakeDelay {
  async fn delay_ns(&mut self, ns: u32) {
    self.elapse(ns as u64).await;
  }

  async fn delay_ms(&mut self, ms: u32) {
    self.elapse(ms as u64 * 1_000_000).await;
  }
}

pub(crate) struct FakeClock {
  now_ns: Rc<Cell<u64>>,
}

impl Clock for FakeClock {
  fn now_ms(&mut self) -> u64 {
    self.now_ns.get() / 1_000_000
  }
}

/// Test half of the fake: inspects and drives the register file.
pub(crate) struct Device {
  regs: Rc<RefCell<Registers>>,
  now_ns: Rc<Cell<u64>>,
  stall: Rc<Cell<bool>>,
}

impl Device {
  pub fn reg(&self, addr: u8) -> u8 {
    self.regs.borrow().map[addr as usize]
  }

  pub fn set(&self, addr: u8, value: u8) {
    self.regs.borrow_mut().map[addr as usize] = value;
  }

  pub fn registers(&self) -> [u8; 32] {
    self.regs.borrow().map
  }

  pub fn set_channels(&self, c: u16, r: u16, g: u16, b: u16) {
    let mut regs = self.regs.borrow_mut();
    for (i, v) in [c, r, g, b].into_iter().enumerate() {
      let at = Reg::Cdatal as usize + 2 * i;
      regs.map[at..at + 2].copy_from_slice(&v.to_le_bytes());
    }
  }

  pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
    self.regs.borrow().writes.clone()
  }

  pub fn clear_writes(&self) {
    self.regs.borrow_mut().writes.clear();
  }

  /// Most recent command byte, including the address phase of reads.
  pub fn last_command(&self) -> Option<u8> {
    self.regs.borrow().last_command
  }

  pub fn transactions(&self) -> usize {
    self.regs.borrow().transactions
  }

  pub fn fail(&self, fail: bool) {
    self.regs.borrow_mut().fail = fail;
  }

  pub fn now_ms(&self) -> u64 {
    self.now_ns.get() / 1_000_000
  }

  pub fn advance_ms(&self, ms: u64) {
    self.now_ns.set(self.now_ns.get() + ms * 1_000_000);
  }

  pub fn stall_delays(&self, stall: bool) {
    self.stall.set(stall);
  }
}

/// Driver wired to a fresh fake TCS34725 with room for `N` samples and
/// auto-start disabled.
pub(crate) fn driver<const N: usize>() -> (Tcs3472x<FakeBus, FakeDelay, FakeClock, N>, Device) {
  let regs = Rc::new(RefCell::new(Registers::new()));
  let now_ns = Rc::new(Cell::new(0));
  let stall = Rc::new(Cell::new(false));
  let rgb = Tcs3472x::new(
    FakeBus { regs: regs.clone() },
    FakeDelay { now_ns: now_ns.clone(), stall: stall.clone() },
    FakeClock { now_ns: now_ns.clone() },
    DeviceProfile::TCS34725,
  )
  .with_config(Config { start_periodic: false, stored_size: N, ..Config::default() });
  (rgb, Device { regs, now_ns, stall })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn auto_increment_walks_the_map() {
    let mut regs = Registers::new();
    regs.write(&[command(Reg::Ailtl, Access::AutoIncrement), 1, 2, 3, 4]);
    assert_eq!(&regs.map[0x04..0x08], &[1, 2, 3, 4]);

    regs.write(&[command(Reg::Ailtl, Access::AutoIncrement)]);
    let mut buf = [0u8; 4];
    regs.read(&mut buf);
    assert_eq!(buf, [1, 2, 3, 4]);
  }

  #[test]
  fn repeated_access_stays_on_register() {
    let mut regs = Registers::new();
    regs.write(&[command(Reg::Id, Access::Repeated)]);
    let mut buf = [0u8; 3];
    regs.read(&mut buf);
    assert_eq!(buf, [TCS34725_CHIP_ID; 3]);
    assert!(regs.writes.is_empty());
  }
}
