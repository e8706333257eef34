/// Represents one of the registers in the register file of an EVE device
/// that the command-stream engine interacts with.
///
/// The offsets of these registers differ between chip generations, so this
/// type only names the register. Use [`Model::reg_addr`](crate::models::Model::reg_addr)
/// to find where a particular model keeps it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(non_camel_case_types)]
pub enum Register {
    ID,
    CPURESET,
    DLSWAP,
    INT_FLAGS,
    INT_EN,
    INT_MASK,
    CMD_READ,
    CMD_WRITE,
    CMD_DL,
    TOUCH_TAG,
}

/// The value always found in `REG_ID` once an EVE chip has booted.
pub const CHIP_ID: u8 = 0x7c;
