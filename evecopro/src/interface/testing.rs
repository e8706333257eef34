//! A simulated EVE chip for use in tests.

extern crate std;

use super::Interface;
use crate::low_level::{Register, CHIP_ID};
use crate::models::Model;
use std::collections::{HashMap, VecDeque};
use std::vec::Vec;

/// A test double for `trait Interface`, available only in test mode.
///
/// It models the chip's memory as a sparse map, records every transaction,
/// and collects everything appended to the command ring (through either the
/// FIFO register or the ring memory) so tests can compare whole command
/// streams. Reads of particular addresses can be scripted to return a
/// sequence of values before falling back to memory.
pub(crate) struct FakeChip<M: Model> {
    mem: HashMap<u32, u8>,
    scripts: HashMap<u32, VecDeque<u32>>,
    calls: Vec<Call>,
    cmd_bytes: Vec<u8>,
    writing: Option<(u32, Vec<u8>)>,
    reading: Option<u32>,

    // When set, reads of REG_CMD_READ report whatever was last published
    // in REG_CMD_WRITE, as if the coprocessor instantly consumed all
    // commands.
    pub drain: bool,

    // When set, appending to the command ring fails and nothing reaches it.
    pub fail_cmd_writes: bool,

    _model: core::marker::PhantomData<M>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Write(u32, Vec<u8>),
    Read(u32, usize),
}

impl<M: Model> FakeChip<M> {
    pub fn new() -> Self {
        let mut ret = Self {
            mem: HashMap::new(),
            scripts: HashMap::new(),
            calls: Vec::new(),
            cmd_bytes: Vec::new(),
            writing: None,
            reading: None,
            drain: true,
            fail_cmd_writes: false,
            _model: core::marker::PhantomData,
        };
        ret.set_mem(M::reg_addr(Register::ID), &[CHIP_ID]);
        if !M::STREAM_FOLLOWS_CURSOR {
            ret.set_mem(crate::models::Ft81x::REG_CMDB_SPACE, &4092_u32.to_le_bytes());
        }
        ret
    }

    /// Copies some data into the fake memory without considering it
    /// to be a logged operation.
    pub fn set_mem(&mut self, addr: u32, buf: &[u8]) {
        for (i, v) in buf.iter().enumerate() {
            self.mem.insert(addr + i as u32, *v);
        }
    }

    pub fn set_reg(&mut self, reg: Register, v: u32) {
        self.set_mem(M::reg_addr(reg), &v.to_le_bytes());
    }

    pub fn mem(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| *self.mem.get(&(addr + i as u32)).unwrap_or(&0))
            .collect()
    }

    /// Arranges for the next reads of the given address to return the
    /// given values, in order, before reverting to the memory contents.
    pub fn script_reads(&mut self, addr: u32, values: &[u32]) {
        let queue = self.scripts.entry(addr).or_insert_with(VecDeque::new);
        queue.extend(values.iter().copied());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.clone()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.cmd_bytes.clear();
    }

    /// All of the command words appended to the ring so far, in order.
    pub fn cmd_words(&self) -> Vec<u32> {
        self.cmd_bytes
            .chunks(4)
            .map(|c| {
                let mut word: [u8; 4] = [0; 4];
                word[..c.len()].copy_from_slice(c);
                u32::from_le_bytes(word)
            })
            .collect()
    }

    /// Writes that targeted the given register, in order.
    pub fn writes_to(&self, reg: Register) -> Vec<Vec<u8>> {
        let addr = M::reg_addr(reg);
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(a, data) if *a == addr => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, addr: u32) -> usize {
        self.calls
            .iter()
            .filter(|c| match c {
                Call::Read(a, _) => *a == addr,
                _ => false,
            })
            .count()
    }

    fn is_cmd_fifo(addr: u32) -> bool {
        !M::STREAM_FOLLOWS_CURSOR && addr == crate::models::Ft81x::REG_CMDB_WRITE
    }

    fn is_cmd_ram(addr: u32) -> bool {
        addr >= M::RAM_CMD && addr < M::RAM_CMD + crate::models::CMD_RING_LEN as u32
    }
}

impl<M: Model> Interface for FakeChip<M> {
    type Error = ();

    fn begin_write(&mut self, addr: u32) -> Result<(), ()> {
        assert!(self.writing.is_none(), "write began inside another write");
        assert!(self.reading.is_none(), "write began inside a read");
        self.writing = Some((addr, Vec::new()));
        Ok(())
    }

    fn continue_write(&mut self, v: &[u8]) -> Result<(), ()> {
        let (addr, data) = self.writing.as_mut().expect("write without begin_write");
        let start = *addr + data.len() as u32;
        if self.fail_cmd_writes && (Self::is_cmd_fifo(*addr) || Self::is_cmd_ram(start)) {
            return Err(());
        }
        data.extend_from_slice(v);
        let addr = *addr;
        if Self::is_cmd_fifo(addr) {
            self.cmd_bytes.extend_from_slice(v);
        } else {
            if Self::is_cmd_ram(start) {
                self.cmd_bytes.extend_from_slice(v);
            }
            self.set_mem(start, v);
        }
        Ok(())
    }

    fn end_write(&mut self) -> Result<(), ()> {
        let (addr, data) = self.writing.take().expect("end_write without begin_write");
        self.calls.push(Call::Write(addr, data));
        Ok(())
    }

    fn begin_read(&mut self, addr: u32) -> Result<(), ()> {
        assert!(self.writing.is_none(), "read began inside a write");
        self.reading = Some(addr);
        Ok(())
    }

    fn continue_read(&mut self, into: &mut [u8]) -> Result<(), ()> {
        let addr = self.reading.expect("read without begin_read");
        self.calls.push(Call::Read(addr, into.len()));
        if let Some(v) = self.scripts.get_mut(&addr).and_then(|q| q.pop_front()) {
            let bytes = v.to_le_bytes();
            for (i, b) in into.iter_mut().enumerate() {
                *b = if i < 4 { bytes[i] } else { 0 };
            }
            return Ok(());
        }
        let src = if self.drain && addr == M::reg_addr(Register::CMD_READ) {
            M::reg_addr(Register::CMD_WRITE)
        } else {
            addr
        };
        let data = self.mem(src, into.len());
        into.copy_from_slice(&data);
        Ok(())
    }

    fn end_read(&mut self) -> Result<(), ()> {
        self.reading.take().expect("end_read without begin_read");
        Ok(())
    }
}

/// A clock that advances by a fixed step each time it's read.
#[derive(Debug, Clone)]
pub(crate) struct StepClock {
    now: u64,
    step: u64,
}

impl StepClock {
    pub fn new(step: u64) -> Self {
        Self { now: 0, step: step }
    }
}

impl crate::clock::Clock for StepClock {
    fn now_ms(&mut self) -> u64 {
        self.now += self.step;
        self.now
    }
}
