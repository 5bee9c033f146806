//! A simulated MFRC522 behind an `SpiDevice`, for tests
//!
//! Registers without side effects are plain memory. The FIFO, the interrupt
//! flag registers, the CRC coprocessor and the Transceive command behave
//! like the real chip closely enough for the driver: a transmission starts
//! when StartSend goes high, and the card's answer comes from a queue of
//! scripted [`Response`]s.

use std::collections::VecDeque;

use embedded_hal::{
    delay::DelayNs,
    spi::{ErrorKind, ErrorType, Operation, SpiDevice},
};

use crate::{
    command::Command,
    ll::{bit_framing, com_irq, div_irq, fifo_level, Register},
    Config, Mfrc522, Ready,
};

/// What `FifoData` reads as once the FIFO is empty
pub const GARBAGE: u8 = 0xee;

/// What the simulated card does after a transmission
#[derive(Clone, Debug)]
pub enum Response {
    /// The card answers with `bytes`, of which the last holds `last_bits`
    /// valid bits. `level` overrides what FifoLevel reports.
    Frame {
        bytes: Vec<u8>,
        last_bits: u8,
        level: Option<u8>,
    },
    /// Reception completes with these Error register bits set
    Error(u8),
    /// No card answers; the transceiver's timer fires
    Silent,
    /// The transceiver never raises a flag
    Hang,
}

impl Response {
    pub fn frame(bytes: &[u8], last_bits: u8) -> Self {
        Response::Frame {
            bytes: bytes.to_vec(),
            last_bits,
            level: None,
        }
    }

    pub fn with_level(bytes: &[u8], level: u8, last_bits: u8) -> Self {
        Response::Frame {
            bytes: bytes.to_vec(),
            last_bits,
            level: Some(level),
        }
    }
}

/// A frame the simulated transceiver sent to the card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sent {
    pub bytes: Vec<u8>,
    pub last_bits: u8,
}

pub struct Transceiver {
    registers: [u8; 64],
    tx_fifo: Vec<u8>,
    rx_fifo: VecDeque<u8>,
    level_override: Option<u8>,
    command: u8,
    responses: VecDeque<Response>,
    sent: Vec<Sent>,
    com_irq_reads: usize,
    div_irq_reads: usize,
    soft_resets: usize,
    /// The CRC coprocessor never finishes
    pub crc_stuck: bool,
    /// Every SPI transaction fails
    pub broken_link: bool,
}

impl Transceiver {
    pub fn new() -> Self {
        let mut registers = [0; 64];
        registers[Register::Version.address() as usize] = 0x92;
        registers[Register::TxControl.address() as usize] = 0x80;

        Transceiver {
            registers,
            tx_fifo: Vec::new(),
            rx_fifo: VecDeque::new(),
            level_override: None,
            command: Command::Idle.value(),
            responses: VecDeque::new(),
            sent: Vec::new(),
            com_irq_reads: 0,
            div_irq_reads: 0,
            soft_resets: 0,
            crc_stuck: false,
            broken_link: false,
        }
    }

    /// Queue the card's answer to the next transmission
    ///
    /// With nothing queued, the card stays silent.
    pub fn respond(&mut self, response: Response) -> &mut Self {
        self.responses.push_back(response);
        self
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.registers[reg.address() as usize]
    }

    pub fn set_register(&mut self, reg: Register, value: u8) {
        self.registers[reg.address() as usize] = value;
    }

    pub fn sent(&self) -> &[Sent] {
        &self.sent
    }

    pub fn com_irq_reads(&self) -> usize {
        self.com_irq_reads
    }

    pub fn div_irq_reads(&self) -> usize {
        self.div_irq_reads
    }

    pub fn soft_resets(&self) -> usize {
        self.soft_resets
    }

    fn read(&mut self, reg: Register) -> u8 {
        match reg {
            Register::ComIrq => {
                self.com_irq_reads += 1;
                self.register(reg)
            }
            Register::DivIrq => {
                self.div_irq_reads += 1;
                self.register(reg)
            }
            Register::FifoData => self.rx_fifo.pop_front().unwrap_or(GARBAGE),
            Register::FifoLevel => self
                .level_override
                .unwrap_or(self.rx_fifo.len() as u8),
            _ => self.register(reg),
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            Register::Command => {
                self.command = value & 0x0f;
                self.set_register(reg, self.command);
                self.run_command();
            }
            Register::ComIrq => {
                let flags = value & !com_irq::SET1;
                let current = self.register(reg);
                if value & com_irq::SET1 != 0 {
                    self.set_register(reg, current | flags);
                } else {
                    self.set_register(reg, current & !flags);
                }
            }
            Register::DivIrq => {
                let flags = value & !div_irq::SET2;
                let current = self.register(reg);
                if value & div_irq::SET2 != 0 {
                    self.set_register(reg, current | flags);
                } else {
                    self.set_register(reg, current & !flags);
                }
            }
            Register::FifoData => self.tx_fifo.push(value),
            Register::FifoLevel => {
                if value & fifo_level::FLUSH_BUFFER != 0 {
                    self.tx_fifo.clear();
                    self.rx_fifo.clear();
                    self.level_override = None;
                }
            }
            Register::BitFraming => {
                let was_sending = self.register(reg) & bit_framing::START_SEND != 0;
                self.set_register(reg, value);

                let start = value & bit_framing::START_SEND != 0;
                if start && !was_sending && self.command == Command::Transceive.value() {
                    self.transmit();
                }
            }
            _ => self.set_register(reg, value),
        }
    }

    fn run_command(&mut self) {
        if self.command == Command::SoftReset.value() {
            self.soft_resets += 1;
            self.command = Command::Idle.value();
            self.tx_fifo.clear();
            self.rx_fifo.clear();
            // Reset value, IdleIRq and HiAlertIRq
            self.set_register(Register::ComIrq, 0x14);
            self.set_register(Register::DivIrq, 0);
        } else if self.command == Command::CalcCrc.value() && !self.crc_stuck {
            let preset = match self.register(Register::Mode) & 0x03 {
                0b00 => 0x0000,
                0b01 => 0x6363,
                0b10 => 0xa671,
                _ => 0xffff,
            };
            let [low, high] = crc_with_preset(preset, &self.tx_fifo).to_le_bytes();
            self.tx_fifo.clear();
            self.set_register(Register::CrcResultL, low);
            self.set_register(Register::CrcResultH, high);
            let flags = self.register(Register::DivIrq);
            self.set_register(Register::DivIrq, flags | div_irq::CRC);
        }
    }

    fn transmit(&mut self) {
        self.sent.push(Sent {
            bytes: std::mem::take(&mut self.tx_fifo),
            last_bits: self.register(Register::BitFraming) & bit_framing::TX_LAST_BITS,
        });
        self.set_register(Register::Error, 0);

        let irq = self.register(Register::ComIrq);
        match self.responses.pop_front().unwrap_or(Response::Silent) {
            Response::Frame {
                bytes,
                last_bits,
                level,
            } => {
                self.rx_fifo = bytes.into_iter().collect();
                self.level_override = level;
                let control = self.register(Register::Control) & !0x07;
                self.set_register(Register::Control, control | (last_bits & 0x07));
                self.set_register(Register::ComIrq, irq | com_irq::TX | com_irq::RX);
            }
            Response::Error(bits) => {
                self.set_register(Register::Error, bits);
                self.set_register(
                    Register::ComIrq,
                    irq | com_irq::TX | com_irq::RX | com_irq::ERR,
                );
            }
            Response::Silent => {
                self.set_register(Register::ComIrq, irq | com_irq::TX | com_irq::TIMER);
            }
            Response::Hang => {}
        }
    }
}

impl ErrorType for Transceiver {
    type Error = ErrorKind;
}

impl SpiDevice<u8> for Transceiver {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
        if self.broken_link {
            return Err(ErrorKind::Other);
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    assert_eq!(bytes.len(), 2, "register writes are two bytes");
                    assert_eq!(bytes[0] & 0x81, 0, "bad write address byte");
                    let reg = Register::from_address(bytes[0] >> 1).expect("unknown register");
                    self.write(reg, bytes[1]);
                }
                Operation::TransferInPlace(bytes) => {
                    assert_eq!(bytes.len(), 2, "register reads are two bytes");
                    assert_eq!(bytes[0] & 0x81, 0x80, "bad read address byte");
                    let reg = Register::from_address((bytes[0] >> 1) & 0x3f)
                        .expect("unknown register");
                    bytes[0] = 0;
                    bytes[1] = self.read(reg);
                }
                _ => panic!("unexpected SPI operation"),
            }
        }

        Ok(())
    }
}

/// CRC_A from ISO/IEC 14443-3, annex B: preset 0x6363, reflected 0x8408
pub fn crc_a(data: &[u8]) -> u16 {
    crc_with_preset(0x6363, data)
}

/// The CRC_A polynomial, starting from `preset`
pub fn crc_with_preset(preset: u16, data: &[u8]) -> u16 {
    data.iter().fold(preset, |crc, &byte| {
        let mut bt = byte ^ (crc & 0xff) as u8;
        bt ^= bt << 4;
        let bt = bt as u16;
        (crc >> 8) ^ (bt << 8) ^ (bt << 3) ^ (bt >> 4)
    })
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// An initialized driver on top of `sim`
pub fn ready(sim: Transceiver) -> Mfrc522<Transceiver, Ready> {
    ready_with(sim, Config::default())
}

pub fn ready_with(sim: Transceiver, config: Config) -> Mfrc522<Transceiver, Ready> {
    Mfrc522::new(sim)
        .init(&mut NoDelay, config)
        .expect("simulated MFRC522 failed to initialize")
}

#[test]
fn crc_a_reference_values() {
    assert_eq!(crc_a(&[0x50, 0x00]).to_le_bytes(), [0x57, 0xcd]);
    assert_eq!(crc_a(&[]), 0x6363);
    assert_eq!(crc_with_preset(0xffff, &[]), 0xffff);
}
