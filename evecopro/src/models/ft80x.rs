use super::Model;
use crate::interface::Interface;
use crate::low_level::{LowLevel, Register};

/// Model type representing the first generation of EVE, the FT800 and
/// FT801.
///
/// These have no command FIFO register, so command words are written
/// straight into the ring memory at the host's cursor and the cursor is
/// published by writing `REG_CMD_WRITE`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ft80x;

const RAM_REG: u32 = 0x102400;

impl Model for Ft80x {
    const NAME: &'static str = "FT80x";
    const RAM_G_LEN: u32 = 256 * 1024;
    const RAM_CMD: u32 = 0x108000;
    const MAX_DATA_CHUNK: u16 = 3600;
    const STREAM_FOLLOWS_CURSOR: bool = true;
    const HAS_SETFONT2: bool = false;
    const HAS_VERTEX_FORMAT: bool = false;
    const HAS_LARGE_BITMAPS: bool = false;
    const FAULT_MESSAGE_ADDR: Option<u32> = None;

    fn reg_addr(reg: Register) -> u32 {
        RAM_REG
            + match reg {
                Register::ID => 0x000,
                Register::CPURESET => 0x01c,
                Register::DLSWAP => 0x050,
                Register::INT_FLAGS => 0x098,
                Register::INT_EN => 0x09c,
                Register::INT_MASK => 0x0a0,
                Register::CMD_READ => 0x0e4,
                Register::CMD_WRITE => 0x0e8,
                Register::CMD_DL => 0x0ec,
                Register::TOUCH_TAG => 0x118,
            }
    }

    fn command_stream_addr(cursor: u16) -> u32 {
        Self::RAM_CMD + (cursor & (super::CMD_RING_LEN - 1)) as u32
    }

    fn read_free_space<I: Interface>(
        ll: &mut LowLevel<Self, I>,
        cursor: u16,
    ) -> Result<u16, I::Error> {
        let read = ll.rd16(Self::reg_addr(Register::CMD_READ))?;
        Ok(super::ring_free_space(cursor, read & 0xfff))
    }

    fn publish_cursor<I: Interface>(
        ll: &mut LowLevel<Self, I>,
        cursor: u16,
    ) -> Result<(), I::Error> {
        ll.wr16(Self::reg_addr(Register::CMD_WRITE), cursor)
    }
}
