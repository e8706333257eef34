//! Compile-time descriptions of the EVE chip generations this crate can
//! drive.
//!
//! The two generations differ in where their registers live and, more
//! importantly, in how the host appends to the coprocessor's command ring:
//! the first generation exposes the ring only as RAM, so the host must track
//! the write cursor itself and compute the free space from the read cursor,
//! while the second generation has a FIFO register that appends to the ring
//! and a register reporting the free space directly.

mod ft80x;
mod ft81x;

pub use ft80x::Ft80x;
pub use ft81x::Ft81x;

use crate::interface::Interface;
use crate::low_level::{LowLevel, Register};

/// Size in bytes of the coprocessor's circular command buffer, which is the
/// same for all models so far.
pub const CMD_RING_LEN: u16 = 4096;

/// Base address of general-purpose main memory, which is the same for all
/// models so far.
pub const RAM_G: u32 = 0x000000;

/// Implemented by types that represent the characteristics of different
/// generations of EVE.
///
/// Although the Rust compiler would allow implementations of this elsewhere,
/// this trait is intended only for implementation inside this crate and its
/// requirements are subject to change in future, even in minor releases.
///
/// This type is typically implemented on empty types to represent that
/// models are a compile-time-only construct used to represent the
/// differences between models through monomorphization, and they have no
/// presence at runtime.
pub trait Model: Sized {
    const NAME: &'static str;

    /// Length of main memory, starting at [`RAM_G`](RAM_G).
    const RAM_G_LEN: u32;

    /// Base address of the command ring as it appears in the memory map.
    const RAM_CMD: u32;

    /// The largest number of payload bytes to write in one go before
    /// checking for buffer space again. Always a multiple of four.
    const MAX_DATA_CHUNK: u16;

    /// True if command words are written to the ring memory directly at the
    /// cursor, in which case a write burst must be restarted at the base of
    /// the ring once the cursor wraps.
    const STREAM_FOLLOWS_CURSOR: bool;

    /// True if the model understands `CMD_SETFONT2`. Models without it
    /// use `CMD_SETFONT` instead.
    const HAS_SETFONT2: bool;

    /// True if the model understands the `VERTEX_FORMAT` display list
    /// command. Models without it always use 1/16 pixel coordinates.
    const HAS_VERTEX_FORMAT: bool;

    /// True if the model understands `BITMAP_LAYOUT_H` and `BITMAP_SIZE_H`,
    /// which extend bitmap strides and sizes beyond 1023 and 511.
    const HAS_LARGE_BITMAPS: bool;

    /// Address of the coprocessor fault message, if the model reports one.
    const FAULT_MESSAGE_ADDR: Option<u32>;

    fn reg_addr(reg: Register) -> u32;

    /// The address to begin a write burst at in order to append command
    /// words at the given cursor.
    fn command_stream_addr(cursor: u16) -> u32;

    /// Returns the number of bytes the host may currently append to the
    /// command ring, given the host's own write cursor.
    ///
    /// A result that is not a multiple of four means that host and chip no
    /// longer agree about the ring's state.
    fn read_free_space<I: Interface>(
        ll: &mut LowLevel<Self, I>,
        cursor: u16,
    ) -> Result<u16, I::Error>;

    /// Tells the chip that all command words up to the given cursor are
    /// ready to be executed.
    fn publish_cursor<I: Interface>(ll: &mut LowLevel<Self, I>, cursor: u16)
        -> Result<(), I::Error>;
}

/// Free space in a ring whose read pointer is `read` when the host's write
/// cursor is at `cursor`. One word always stays unused so that a full ring
/// can be told apart from an empty one.
pub(crate) const fn ring_free_space(cursor: u16, read: u16) -> u16 {
    (CMD_RING_LEN - 4) - (cursor.wrapping_sub(read) & (CMD_RING_LEN - 1))
}
