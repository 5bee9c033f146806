use byte::BytesExt as _;
use embedded_hal::{delay::DelayNs, spi};
use log::{debug, trace};

use crate::{
    command::{picc, RequestMode},
    configs::RxGain,
    frame::{Atqa, Uid},
    ll::{tx_control, Register},
    Error, Mfrc522, ProtocolError, Ready,
};

/// Bit length of an ATQA
const ATQA_BITS: usize = 16;

/// BitFraming value for a short frame, which sends 7 bits of its only byte
const SHORT_FRAME: u8 = 0x07;

impl<SPI> Mfrc522<SPI, Ready>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Asks the cards in the field to answer
    ///
    /// Sends REQA or WUPA as a 7-bit short frame. Succeeds only if exactly
    /// 16 bits come back, which is what an ATQA is.
    pub fn request(&mut self, mode: RequestMode) -> Result<Atqa, Error<SPI>> {
        self.ll.write(Register::BitFraming, SHORT_FRAME)?;

        let frame = self.transceive(&[mode as u8])?;
        if frame.bit_len() != ATQA_BITS {
            debug!("request answered with {} bits", frame.bit_len());
            return Err(ProtocolError::UnexpectedBitCount {
                expected: ATQA_BITS,
                actual: frame.bit_len(),
            }
            .into());
        }

        let atqa: Atqa = frame
            .bytes()
            .read(&mut 0)
            .map_err(|_| ProtocolError::IncompleteFrame)?;
        trace!("ATQA {:?}", atqa);

        Ok(atqa)
    }

    /// Reads the UID of the card that answered the last request
    ///
    /// Runs anti-collision on cascade level 1 only, so 7 and 10 byte UIDs
    /// come back as their first cascade level.
    pub fn anticollision(&mut self) -> Result<Uid, Error<SPI>> {
        self.ll.write(Register::BitFraming, 0x00)?;

        let frame = self.transceive(&[picc::ANTICOLL_CL1, picc::NVB_NO_UID])?;

        let uid: byte::Result<Uid> = frame.bytes().read(&mut 0);
        match uid {
            Ok(uid) => {
                debug!("anti-collision returned UID {}", uid);
                Ok(uid)
            }
            Err(byte::Error::BadInput { .. }) => {
                debug!("UID check byte mismatch in {:?}", frame);
                Err(ProtocolError::Bcc.into())
            }
            Err(_) => Err(ProtocolError::IncompleteFrame.into()),
        }
    }

    /// Puts the card in the field to sleep
    ///
    /// A halted card only answers WUPA. The card doesn't acknowledge a halt,
    /// so whatever comes back from it is ignored; only errors that point at
    /// the link or the transceiver are returned.
    pub fn halt(&mut self) -> Result<(), Error<SPI>> {
        self.ll.write(Register::BitFraming, 0x00)?;

        let [crc_low, crc_high] = self.calculate_crc(&[picc::HALT, 0x00])?;
        match self.transceive(&[picc::HALT, 0x00, crc_low, crc_high]) {
            Ok(_) => Ok(()),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                trace!("halt answered with {:?}", error);
                Ok(())
            }
        }
    }

    /// Switches the antenna drivers on, unless they already are
    pub fn antenna_on(&mut self) -> Result<(), Error<SPI>> {
        let tx_control = self.ll.read(Register::TxControl)?;
        if tx_control & tx_control::TX_RF_EN != tx_control::TX_RF_EN {
            self.ll.write(Register::TxControl, tx_control | tx_control::TX_RF_EN)?;
        }

        Ok(())
    }

    /// Switches the antenna drivers off
    pub fn antenna_off(&mut self) -> Result<(), Error<SPI>> {
        self.ll.clear_bits(Register::TxControl, tx_control::TX_RF_EN)?;

        Ok(())
    }

    /// Reads the chip's version register
    ///
    /// 0x91 and 0x92 are MFRC522 versions 1.0 and 2.0; clones report other
    /// values.
    pub fn version(&mut self) -> Result<u8, Error<SPI>> {
        Ok(self.ll.read(Register::Version)?)
    }

    /// Sets the receiver gain and remembers it for [`Mfrc522::reset`]
    pub fn set_antenna_gain(&mut self, gain: RxGain) -> Result<(), Error<SPI>> {
        self.ll.write(Register::RfCfg, gain.rf_cfg_register())?;
        self.config.rx_gain = Some(gain);

        Ok(())
    }

    /// Soft resets the chip and programs the configuration again
    ///
    /// The antenna is switched back on afterwards.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<SPI>> {
        self.configure(delay)?;
        self.antenna_on()
    }
}
