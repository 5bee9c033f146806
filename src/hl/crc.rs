use embedded_hal::spi;

use crate::{command::Command, ll::Register, Error, Mfrc522, Ready};

impl<SPI> Mfrc522<SPI, Ready>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Computes the CRC_A of `data` on the CRC coprocessor
    ///
    /// Returns the two CRC bytes in the order they are appended to a frame,
    /// low byte first. If the coprocessor doesn't finish within
    /// [`Config::crc_budget`] checks, [`Error::CrcPending`] is returned and
    /// the result registers are left unread.
    ///
    /// [`Config::crc_budget`]: crate::Config::crc_budget
    pub fn calculate_crc(&mut self, data: &[u8]) -> Result<[u8; 2], Error<SPI>> {
        self.execute(Command::CalcCrc, data)?;

        let low = self.ll.read(Register::CrcResultL)?;
        let high = self.ll.read(Register::CrcResultH)?;

        Ok([low, high])
    }
}
