/// Implementations of `Interface` serve as adapters between the interface
/// this library expects and a specific physical implementation of that
/// interface, such as a SPI bus.
///
/// The main library contains no implementations of this trait, in order to
/// make the library portable across systems big and small. Other crates,
/// including some with the name prefix `evecopro`, take on additional
/// dependencies in order to bind this library to specific systems/hardware.
///
/// The methods are shaped around EVE's memory-access transactions: a write
/// begins by sending a three-byte address header and then continues with any
/// number of data bytes until the transaction ends, and likewise for reads.
/// Writes into RAM advance the chip-side address with each byte, while
/// writes into the command FIFO register `REG_CMDB_WRITE` append to the
/// command ring regardless of how many bytes are sent.
pub trait Interface {
    type Error;

    fn begin_write(&mut self, addr: u32) -> Result<(), Self::Error>;
    fn continue_write(&mut self, v: &[u8]) -> Result<(), Self::Error>;
    fn end_write(&mut self) -> Result<(), Self::Error>;

    fn begin_read(&mut self, addr: u32) -> Result<(), Self::Error>;
    fn continue_read(&mut self, into: &mut [u8]) -> Result<(), Self::Error>;
    fn end_read(&mut self) -> Result<(), Self::Error>;

    /// Writes all of the given bytes in a single transaction starting at
    /// the given address.
    fn write(&mut self, addr: u32, v: &[u8]) -> Result<(), Self::Error> {
        self.begin_write(addr)?;
        let result = self.continue_write(v);
        self.end_write()?;
        result
    }

    /// Fills the given buffer in a single transaction starting at the given
    /// address.
    fn read(&mut self, addr: u32, into: &mut [u8]) -> Result<(), Self::Error> {
        self.begin_read(addr)?;
        let result = self.continue_read(into);
        self.end_read()?;
        result
    }

    /// Write the three bytes needed to form a "write memory" header
    /// for the address into the given bytes. This is a helper for
    /// physical implementations that need to construct a message
    /// buffer to transmit to the real chip, e.g. via SPI.
    fn build_write_header(&self, addr: u32, into: &mut [u8; 3]) {
        into[0] = (((addr >> 16) & 0b00111111) | 0b10000000) as u8;
        into[1] = (addr >> 8) as u8;
        into[2] = (addr >> 0) as u8;
    }

    /// Write the four bytes needed to form a "read memory" header
    /// for the address into the given bytes. This is a helper for
    /// physical implementations that need to construct a message
    /// buffer to transmit to the real chip, e.g. via SPI.
    fn build_read_header(&self, addr: u32, into: &mut [u8; 4]) {
        into[0] = ((addr >> 16) & 0b00111111) as u8;
        into[1] = (addr >> 8) as u8;
        into[2] = (addr >> 0) as u8;
        into[3] = 0; // "dummy byte", per the datasheet
    }
}

/// Mask representing the bits of a u32 that contribute to a valid address
/// in EVE's 22-bit memory map.
pub const ADDRESS_MASK: u32 = 0x003fffff;

// We use std in test mode only, so we can do dynamic allocation in the
// simulated chip.
#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    use super::*;

    struct HeaderOnly;

    impl Interface for HeaderOnly {
        type Error = ();

        fn begin_write(&mut self, _: u32) -> Result<(), ()> {
            Ok(())
        }
        fn continue_write(&mut self, _: &[u8]) -> Result<(), ()> {
            Ok(())
        }
        fn end_write(&mut self) -> Result<(), ()> {
            Ok(())
        }
        fn begin_read(&mut self, _: u32) -> Result<(), ()> {
            Ok(())
        }
        fn continue_read(&mut self, _: &mut [u8]) -> Result<(), ()> {
            Ok(())
        }
        fn end_read(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_header() {
        let mut into: [u8; 3] = [0; 3];
        HeaderOnly.build_write_header(0x302578, &mut into);
        assert_eq!(into, [0xb0, 0x25, 0x78]);
    }

    #[test]
    fn test_read_header() {
        let mut into: [u8; 4] = [0xff; 4];
        HeaderOnly.build_read_header(0x3020f8, &mut into);
        assert_eq!(into, [0x30, 0x20, 0xf8, 0x00]);
    }
}
