//! Configuration structs for the reader
//!
//! The [`Config`] is passed to [`Mfrc522::init`] and stays with the driver
//! afterwards; the poll budgets in it bound every wait the driver does.
//!
//! [`Mfrc522::init`]: ../hl/struct.Mfrc522.html#method.init

#[cfg(feature = "defmt")]
use defmt::Format;

/// Reader configuration
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Settings for the transceiver's internal timer, which bounds how long
    /// the receiver waits for a card to answer.
    pub timer: TimerConfig,
    /// Force a 100% ASK modulation independent of the ModGsP setting.
    ///
    /// Defaults to `true`. Many cards don't answer without it.
    pub tx_force_100_ask: bool,
    /// Preset value of the CRC coprocessor.
    pub crc_preset: CrcPreset,
    /// Receiver gain. `None` leaves the chip's reset value alone.
    pub rx_gain: Option<RxGain>,
    /// How many times the interrupt flags are checked while waiting for a
    /// card to answer before the exchange is reported as timed out.
    pub transceive_budget: u16,
    /// How many times the CRC flag is checked before the CRC coprocessor is
    /// considered stuck. Should stay well below `transceive_budget`, there's
    /// no card round trip involved.
    pub crc_budget: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timer: TimerConfig::default(),
            tx_force_100_ask: true,
            crc_preset: CrcPreset::default(),
            rx_gain: None,
            transceive_budget: 2000,
            crc_budget: 255,
        }
    }
}

impl Config {
    /// Value for the Mode register
    ///
    /// TxWaitRF and PolMFin are always set, the low two bits select the CRC
    /// preset.
    pub fn mode_register(&self) -> u8 {
        0x3c | self.crc_preset as u8
    }

    /// Value for the TxAuto register
    pub fn tx_auto_register(&self) -> u8 {
        if self.tx_force_100_ask {
            0x40
        } else {
            0x00
        }
    }
}

/// Internal timer settings
///
/// The timer runs at `13.56 MHz / (2 * prescaler + 1)` and fires after
/// `reload` ticks. The defaults give roughly 25 ms, which is the longest a
/// card takes to answer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerConfig {
    /// Start the timer automatically at the end of every transmission
    pub auto_start: bool,
    /// 12-bit prescaler
    pub prescaler: u16,
    /// 16-bit reload value
    pub reload: u16,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            auto_start: true,
            prescaler: 0x0a9,
            reload: 0x03e8,
        }
    }
}

impl TimerConfig {
    /// Value for the TMode register: TAuto and the prescaler's high nibble
    pub fn t_mode_register(&self) -> u8 {
        ((self.auto_start as u8) << 7) | ((self.prescaler >> 8) as u8 & 0x0f)
    }

    /// Value for the TPrescaler register: the prescaler's low byte
    pub fn t_prescaler_register(&self) -> u8 {
        self.prescaler as u8
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Preset value for the CRC coprocessor
pub enum CrcPreset {
    /// 0x0000
    X0000 = 0b00,
    /// 0x6363, as ISO/IEC 14443-3 requires for type A cards
    #[default]
    X6363 = 0b01,
    /// 0xA671
    XA671 = 0b10,
    /// 0xFFFF
    XFFFF = 0b11,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Receiver gain, RxGain bits of the RfCfg register
pub enum RxGain {
    /// 18 dB
    Db18 = 0b000,
    /// 23 dB
    Db23 = 0b001,
    /// 33 dB
    Db33 = 0b100,
    /// 38 dB
    Db38 = 0b101,
    /// 43 dB
    Db43 = 0b110,
    /// 48 dB
    Db48 = 0b111,
}

impl RxGain {
    /// Value for the RfCfg register
    pub fn rf_cfg_register(self) -> u8 {
        (self as u8) << 4
    }
}
