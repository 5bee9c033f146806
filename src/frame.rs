//! Frames exchanged with a card, and what the driver decodes from them

use core::fmt;

use byte::{check_len, TryRead};

#[cfg(feature = "defmt")]
use defmt::Format;

/// Size of the MFRC522's FIFO buffer in bytes
pub const FIFO_SIZE: usize = 64;

/// A frame received from a card
///
/// Cards may answer with frames that don't end on a byte boundary, so next to
/// the bytes a frame records how many bits of its last byte are valid.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Frame {
    buffer: [u8; FIFO_SIZE],
    len: usize,
    valid_bits: u8,
    bit_len: usize,
}

impl Frame {
    /// Creates an empty frame that will report `bit_len` bits in total
    pub(crate) fn new(valid_bits: u8, bit_len: usize) -> Self {
        Frame {
            buffer: [0; FIFO_SIZE],
            len: 0,
            valid_bits,
            bit_len,
        }
    }

    /// Appends a byte; bytes past the FIFO size are dropped
    pub(crate) fn push(&mut self, byte: u8) {
        if self.len < FIFO_SIZE {
            self.buffer[self.len] = byte;
            self.len += 1;
        }
    }

    /// Number of bits that make up a frame of `byte_count` bytes whose last
    /// byte holds `valid_bits` bits (0 means all 8)
    ///
    /// An empty frame has no bits, whatever `valid_bits` says.
    pub fn bit_len_for(byte_count: usize, valid_bits: u8) -> usize {
        match (byte_count, valid_bits & 0x07) {
            (0, _) => 0,
            (n, 0) => n * 8,
            (n, bits) => (n - 1) * 8 + bits as usize,
        }
    }

    /// The received bytes, in order
    pub fn bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Number of received bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no byte was received
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of valid bits in the last byte, 0 meaning all of them
    pub fn valid_bits(&self) -> u8 {
        self.valid_bits
    }

    /// Total number of valid bits in the frame
    ///
    /// This is what the transceiver reported, which is not always
    /// `len() * 8`: a FIFO that reports zero bytes still hands out one byte
    /// of garbage, while the bit length stays 0.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Frame {{ bits: {}, data: 0x", self.bit_len)?;
        for byte in self.bytes() {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, " }}")
    }
}

#[cfg(feature = "defmt")]
impl Format for Frame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Frame {{ bits: {}, data: {=[u8]:x} }}", self.bit_len, self.bytes())
    }
}

/// Answer to a request, sent by every card that wakes up
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atqa {
    bytes: [u8; 2],
}

impl Atqa {
    /// The two ATQA bytes, as received
    pub fn bytes(&self) -> &[u8; 2] {
        &self.bytes
    }
}

impl<'a> TryRead<'a> for Atqa {
    fn try_read(bytes: &'a [u8], _: ()) -> byte::Result<(Self, usize)> {
        check_len(bytes, 2)?;

        Ok((
            Atqa {
                bytes: [bytes[0], bytes[1]],
            },
            2,
        ))
    }
}

/// A single size (4 byte) card UID together with its check byte
///
/// The check byte (BCC) is the XOR of the four UID bytes. A `Uid` read from a
/// card always satisfies that; nothing checks whether the UID is unique.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uid {
    bytes: [u8; 4],
    bcc: u8,
}

impl Uid {
    /// Creates a UID and computes its check byte
    pub fn new(bytes: [u8; 4]) -> Self {
        Uid {
            bcc: Self::checksum(&bytes),
            bytes,
        }
    }

    /// XOR of the four UID bytes
    pub fn checksum(bytes: &[u8; 4]) -> u8 {
        bytes.iter().fold(0, |acc, byte| acc ^ byte)
    }

    /// The four UID bytes
    pub fn bytes(&self) -> &[u8; 4] {
        &self.bytes
    }

    /// The check byte
    pub fn bcc(&self) -> u8 {
        self.bcc
    }

    /// The UID bytes followed by the check byte, as the card sent them
    pub fn to_bytes(&self) -> [u8; 5] {
        let [b0, b1, b2, b3] = self.bytes;
        [b0, b1, b2, b3, self.bcc]
    }

    /// The UID as a big endian number
    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.bytes)
    }
}

impl From<Uid> for [u8; 5] {
    fn from(uid: Uid) -> Self {
        uid.to_bytes()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl<'a> TryRead<'a> for Uid {
    fn try_read(bytes: &'a [u8], _: ()) -> byte::Result<(Self, usize)> {
        check_len(bytes, 5)?;

        let uid = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if Uid::checksum(&uid) != bytes[4] {
            return Err(byte::Error::BadInput {
                err: "UID check byte mismatch",
            });
        }

        Ok((
            Uid {
                bytes: uid,
                bcc: bytes[4],
            },
            5,
        ))
    }
}
