mod registers;

pub use registers::{Register, CHIP_ID};

use crate::interface::Interface;
use crate::models::Model;

/// `LowLevel` is a low-level interface to EVE controllers which matches
/// the primitive operations used in Programmers Guides for the various
/// EVE controllers.
///
/// This is slightly higher-level than the `Interface` trait, providing
/// size-specific memory accesses, but it knows about the memory map of a
/// model only so far as to find its registers.
///
/// All multi-byte values are little-endian on the wire, as EVE requires.
pub struct LowLevel<M: Model, I: Interface> {
    raw: I,
    _model: core::marker::PhantomData<M>,
}

impl<M: Model, I: Interface> LowLevel<M, I> {
    pub fn new(ei: I) -> Self {
        Self {
            raw: ei,
            _model: core::marker::PhantomData,
        }
    }

    pub fn reg_addr(&self, reg: Register) -> u32 {
        M::reg_addr(reg)
    }

    pub fn wr8(&mut self, addr: u32, v: u8) -> Result<(), I::Error> {
        self.raw.write(addr, &[v])
    }

    pub fn wr16(&mut self, addr: u32, v: u16) -> Result<(), I::Error> {
        self.raw.write(addr, &v.to_le_bytes())
    }

    pub fn wr32(&mut self, addr: u32, v: u32) -> Result<(), I::Error> {
        self.raw.write(addr, &v.to_le_bytes())
    }

    pub fn wr8s(&mut self, addr: u32, v: &[u8]) -> Result<(), I::Error> {
        self.raw.write(addr, v)
    }

    pub fn rd8(&mut self, addr: u32) -> Result<u8, I::Error> {
        let mut data: [u8; 1] = [0; 1];
        self.raw.read(addr, &mut data)?;
        Ok(data[0])
    }

    pub fn rd16(&mut self, addr: u32) -> Result<u16, I::Error> {
        let mut data: [u8; 2] = [0; 2];
        self.raw.read(addr, &mut data)?;
        Ok(u16::from_le_bytes(data))
    }

    pub fn rd32(&mut self, addr: u32) -> Result<u32, I::Error> {
        let mut data: [u8; 4] = [0; 4];
        self.raw.read(addr, &mut data)?;
        Ok(u32::from_le_bytes(data))
    }

    pub fn rd8s(&mut self, addr: u32, into: &mut [u8]) -> Result<(), I::Error> {
        self.raw.read(addr, into)
    }

    pub fn borrow_interface<'a>(&'a mut self) -> &'a mut I {
        &mut self.raw
    }

    pub fn take_interface(self) -> I {
        self.raw
    }
}
