use super::Model;
use crate::interface::Interface;
use crate::low_level::{LowLevel, Register};

/// Model type representing the second generation of EVE and later: the
/// FT810 through FT813 and the BT815 through BT818.
///
/// These append to the command ring through the `REG_CMDB_WRITE` FIFO
/// register and report free space in `REG_CMDB_SPACE`, so the chip keeps
/// `REG_CMD_WRITE` up to date by itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ft81x;

const RAM_REG: u32 = 0x302000;
const REG_CMDB_SPACE: u32 = RAM_REG + 0x574;
const REG_CMDB_WRITE: u32 = RAM_REG + 0x578;

impl Model for Ft81x {
    const NAME: &'static str = "FT81x";
    const RAM_G_LEN: u32 = 1024 * 1024;
    const RAM_CMD: u32 = 0x308000;
    const MAX_DATA_CHUNK: u16 = 4000;
    const STREAM_FOLLOWS_CURSOR: bool = false;
    const HAS_SETFONT2: bool = true;
    const HAS_VERTEX_FORMAT: bool = true;
    const HAS_LARGE_BITMAPS: bool = true;
    const FAULT_MESSAGE_ADDR: Option<u32> = Some(0x309800);

    fn reg_addr(reg: Register) -> u32 {
        RAM_REG
            + match reg {
                Register::ID => 0x000,
                Register::CPURESET => 0x020,
                Register::DLSWAP => 0x054,
                Register::INT_FLAGS => 0x0a8,
                Register::INT_EN => 0x0ac,
                Register::INT_MASK => 0x0b0,
                Register::CMD_READ => 0x0f8,
                Register::CMD_WRITE => 0x0fc,
                Register::CMD_DL => 0x100,
                Register::TOUCH_TAG => 0x12c,
            }
    }

    fn command_stream_addr(_cursor: u16) -> u32 {
        REG_CMDB_WRITE
    }

    fn read_free_space<I: Interface>(
        ll: &mut LowLevel<Self, I>,
        _cursor: u16,
    ) -> Result<u16, I::Error> {
        Ok(ll.rd16(REG_CMDB_SPACE)? & 0xfff)
    }

    fn publish_cursor<I: Interface>(
        _ll: &mut LowLevel<Self, I>,
        _cursor: u16,
    ) -> Result<(), I::Error> {
        // Writes through REG_CMDB_WRITE are visible to the coprocessor as
        // soon as they arrive.
        Ok(())
    }
}

#[cfg(test)]
impl Ft81x {
    pub(crate) const REG_CMDB_SPACE: u32 = REG_CMDB_SPACE;
    pub(crate) const REG_CMDB_WRITE: u32 = REG_CMDB_WRITE;
}
