#![no_std]

use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::digital::v2::OutputPin;
use evecopro::interface::Interface;

/// `HALSPIInterface` is an implementation of `evecopro::Interface` that
/// commincates over SPI using the `embedded-hal` SPI and GPIO (for
/// "chip select") traits.
///
/// Each memory transaction holds chip select asserted from its address
/// header to its end, so a whole burst of coprocessor commands goes out
/// under one assertion.
pub struct HALSPIInterface<SPI, CS>
where
    SPI: Transfer<u8>,
    CS: OutputPin,
{
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> HALSPIInterface<SPI, CS>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
{
    /// Create a new EVE interface in terms of the given SPI bus and CS
    /// signal implementations.
    ///
    /// The given CS implementation must be a digital output pin which will be
    /// set to low to assert chip select, or high to unassert it, reflecting
    /// the physical characteristics of the CS pin on EVE IC packages.
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi: spi, cs: cs }
    }

    /// Returns the SPI bus and CS pin, for reuse elsewhere.
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn spi_select(&mut self) -> Result<(), <Self as Interface>::Error> {
        <Self as Interface>::Error::cs_result(self.cs.set_low())
    }

    fn spi_unselect(&mut self) -> Result<(), <Self as Interface>::Error> {
        <Self as Interface>::Error::cs_result(self.cs.set_high())
    }

    fn spi_write(&mut self, words: &[u8]) -> Result<(), <Self as Interface>::Error> {
        let r = self.spi.write(words);
        <Self as Interface>::Error::spi_write_result(r)
    }

    fn spi_transfer<'w>(
        &mut self,
        words: &'w mut [u8],
    ) -> Result<&'w [u8], <Self as Interface>::Error> {
        let r = self.spi.transfer(words);
        <Self as Interface>::Error::spi_transfer_result(r)
    }

    // Sends an address header with chip select asserted, releasing chip
    // select again if the header couldn't be sent.
    fn begin_transaction(&mut self, header: &[u8]) -> Result<(), <Self as Interface>::Error> {
        self.spi_select()?;
        let result = self.spi_write(header);
        if result.is_err() {
            // The write error is the more interesting one to report.
            let _ = self.spi_unselect();
        }
        result
    }
}

impl<SPI, CS> Interface for HALSPIInterface<SPI, CS>
where
    SPI: Transfer<u8> + Write<u8>,
    CS: OutputPin,
{
    type Error = HALSPIError<<SPI as Write<u8>>::Error, <SPI as Transfer<u8>>::Error, CS::Error>;

    fn begin_write(&mut self, addr: u32) -> Result<(), Self::Error> {
        let mut addr_words: [u8; 3] = [0; 3];
        self.build_write_header(addr, &mut addr_words);
        self.begin_transaction(&addr_words)
    }

    fn continue_write(&mut self, v: &[u8]) -> Result<(), Self::Error> {
        self.spi_write(v)
    }

    fn end_write(&mut self) -> Result<(), Self::Error> {
        self.spi_unselect()
    }

    fn begin_read(&mut self, addr: u32) -> Result<(), Self::Error> {
        let mut addr_words: [u8; 4] = [0; 4];
        self.build_read_header(addr, &mut addr_words);
        self.begin_transaction(&addr_words)
    }

    fn continue_read(&mut self, into: &mut [u8]) -> Result<(), Self::Error> {
        // EVE ignores what we send while it's responding, so the buffer's
        // current contents are as good as anything.
        self.spi_transfer(into)?;
        Ok(())
    }

    fn end_read(&mut self) -> Result<(), Self::Error> {
        self.spi_unselect()
    }
}

#[derive(Debug)]
pub enum HALSPIError<SPIWriteError, SPITransferError, CSError> {
    SPIWrite(SPIWriteError),
    SPITransfer(SPITransferError),
    CS(CSError),
}

impl<SPIWriteError, SPITransferError, CSError>
    HALSPIError<SPIWriteError, SPITransferError, CSError>
{
    fn spi_write_result<T>(r: Result<T, SPIWriteError>) -> Result<T, Self> {
        match r {
            Ok(v) => Ok(v),
            Err(e) => Err(Self::SPIWrite(e)),
        }
    }

    fn spi_transfer_result<T>(r: Result<T, SPITransferError>) -> Result<T, Self> {
        match r {
            Ok(v) => Ok(v),
            Err(e) => Err(Self::SPITransfer(e)),
        }
    }

    fn cs_result<T>(r: Result<T, CSError>) -> Result<T, Self> {
        match r {
            Ok(v) => Ok(v),
            Err(e) => Err(Self::CS(e)),
        }
    }
}
