use embedded_hal::spi;
use log::{debug, error, trace};

use crate::{
    command::Command,
    frame::{Frame, FIFO_SIZE},
    ll::{bit_framing, com_ien, com_irq, control, div_irq, fifo_level, Register},
    poll, Error, Mfrc522, ProtocolError, Ready,
};

/// Interrupts routed to the IRQ pin during a command, inverted
const IRQ_ENABLE: u8 = com_ien::IRQ_INV
    | com_ien::TX
    | com_ien::RX
    | com_ien::IDLE
    | com_ien::LO_ALERT
    | com_ien::ERR
    | com_ien::TIMER;

/// Flags that end the wait for a Transceive
const DONE: u8 = com_irq::RX | com_irq::IDLE | com_irq::TIMER;

/// Error register bits that mean the exchange failed
const EXCHANGE_ERRORS: u8 = 0x1f;

/// Where a command signals that it's finished, and how often to look
#[derive(Copy, Clone, Debug)]
struct Completion {
    register: Register,
    flags: u8,
    budget: u16,
}

impl<SPI> Mfrc522<SPI, Ready>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Runs `command` on the transceiver with `data` loaded into the FIFO
    ///
    /// What the driver waits for depends on the command:
    ///
    /// - [`Command::Transceive`] waits for a reception, idle or timer flag
    ///   in ComIrq, at most [`Config::transceive_budget`] times. The card's
    ///   answer is read back from the FIFO.
    /// - [`Command::CalcCrc`] waits for the CRC flag in DivIrq, at most
    ///   [`Config::crc_budget`] times, and returns an empty frame. The result
    ///   is in the CrcResult registers. Running out of checks gives
    ///   [`Error::CrcPending`].
    /// - [`Command::SoftReset`] waits for the idle flag in ComIrq. The chip
    ///   loses its configuration, [`Mfrc522::reset`] programs it again.
    /// - [`Command::Idle`] doesn't wait.
    ///
    /// For a Transceive, the caller sets up BitFraming first, it decides how
    /// many bits of the last byte are sent.
    ///
    /// [`Config::transceive_budget`]: crate::Config::transceive_budget
    /// [`Config::crc_budget`]: crate::Config::crc_budget
    pub fn execute(&mut self, command: Command, data: &[u8]) -> Result<Frame, Error<SPI>> {
        trace!("executing {:?} with {} bytes", command, data.len());

        self.ll.write(Register::ComIEn, IRQ_ENABLE)?;
        self.ll.write(Register::ComIrq, !com_irq::SET1)?;
        if command == Command::CalcCrc {
            self.ll.write(Register::DivIrq, div_irq::CRC)?;
        }
        self.ll.set_bits(Register::FifoLevel, fifo_level::FLUSH_BUFFER)?;

        self.ll.write(Register::Command, Command::Idle.value())?;
        for &byte in data {
            self.ll.write(Register::FifoData, byte)?;
        }

        self.ll.write(Register::Command, command.value())?;
        if command == Command::Transceive {
            self.ll.set_bits(Register::BitFraming, bit_framing::START_SEND)?;
        }

        let completion = match self.completion(command) {
            Some(completion) => completion,
            None => return Ok(Frame::new(0, 0)),
        };

        let ll = &mut self.ll;
        let waited = poll::bounded(completion.budget, || {
            let flags = ll.read(completion.register).map_err(nb::Error::Other)?;
            if flags & completion.flags != 0 {
                Ok(flags)
            } else {
                Err(nb::Error::WouldBlock)
            }
        });

        if command == Command::Transceive {
            self.ll.clear_bits(Register::BitFraming, bit_framing::START_SEND)?;
        }

        let flags = match waited {
            Ok(flags) => flags,
            Err(nb::Error::WouldBlock) if command == Command::CalcCrc => {
                error!("CRC coprocessor still busy after {} checks", completion.budget);
                return Err(Error::CrcPending);
            }
            Err(nb::Error::WouldBlock) => {
                debug!("{:?} didn't complete after {} checks", command, completion.budget);
                return Err(Error::Timeout);
            }
            Err(nb::Error::Other(error)) => return Err(Error::Spi(error)),
        };

        if command != Command::Transceive {
            return Ok(Frame::new(0, 0));
        }

        let errors = self.ll.read(Register::Error)? & EXCHANGE_ERRORS;
        if let Some(error) = ProtocolError::from_error_register(errors) {
            debug!("{:?} failed: {:?}", command, error);
            return Err(error.into());
        }

        if flags & IRQ_ENABLE & com_irq::TIMER != 0 {
            return Err(ProtocolError::TimerExpired.into());
        }

        self.read_fifo()
    }

    /// Sends `data` to the card and returns its answer
    pub fn transceive(&mut self, data: &[u8]) -> Result<Frame, Error<SPI>> {
        self.execute(Command::Transceive, data)
    }

    fn completion(&self, command: Command) -> Option<Completion> {
        match command {
            Command::Idle => None,
            Command::CalcCrc => Some(Completion {
                register: Register::DivIrq,
                flags: div_irq::CRC,
                budget: self.config.crc_budget,
            }),
            Command::Transceive => Some(Completion {
                register: Register::ComIrq,
                flags: DONE,
                budget: self.config.transceive_budget,
            }),
            Command::SoftReset => Some(Completion {
                register: Register::ComIrq,
                flags: com_irq::IDLE,
                budget: self.config.transceive_budget,
            }),
        }
    }

    fn read_fifo(&mut self) -> Result<Frame, Error<SPI>> {
        let level = self.ll.read(Register::FifoLevel)? & fifo_level::LEVEL;
        let valid_bits = self.ll.read(Register::Control)? & control::RX_LAST_BITS;

        let count = (level as usize).min(FIFO_SIZE);
        let mut frame = Frame::new(valid_bits, Frame::bit_len_for(count, valid_bits));

        // The FIFO still hands out a byte when it reports none
        if count == 0 {
            debug!("FIFO reports no data, reading one byte anyway");
        }
        for _ in 0..count.max(1) {
            frame.push(self.ll.read(Register::FifoData)?);
        }

        trace!("received {:?}", frame);

        Ok(frame)
    }
}
