use embedded_hal::{delay::DelayNs, digital::OutputPin, spi};
use log::{debug, warn};

use crate::{command::Command, ll, ll::Register, Config, Error, Mfrc522, Ready, Uninitialized};

/// How long the MFRC522 needs to come back after a reset
const RESET_SETTLE_MS: u32 = 50;

impl<SPI> Mfrc522<SPI, Uninitialized> {
    /// Create a new instance of `Mfrc522`
    ///
    /// Requires the SPI device the MFRC522 is connected to.
    pub fn new(spi: SPI) -> Self {
        Mfrc522 {
            ll: ll::Mfrc522::new(spi),
            config: Config::default(),
            state: Uninitialized,
        }
    }

    /// Pulse the MFRC522's reset line
    ///
    /// Holds NRSTPD low, then high, for 50 ms each. Only needed if the reset
    /// line is wired to the host; [`Mfrc522::init`] does a soft reset anyway.
    pub fn hard_reset<RST, D>(&mut self, reset: &mut RST, delay: &mut D) -> Result<(), RST::Error>
    where
        RST: OutputPin,
        D: DelayNs,
    {
        reset.set_low()?;
        delay.delay_ms(RESET_SETTLE_MS);
        reset.set_high()?;
        delay.delay_ms(RESET_SETTLE_MS);

        Ok(())
    }
}

impl<SPI> Mfrc522<SPI, Uninitialized>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Initialize the MFRC522
    ///
    /// Soft resets the chip, checks that something answering like an MFRC522
    /// is on the bus, programs the timer, modulation and CRC preset from
    /// `config`, and switches the antenna on.
    pub fn init<D: DelayNs>(
        mut self,
        delay: &mut D,
        config: Config,
    ) -> Result<Mfrc522<SPI, Ready>, Error<SPI>> {
        self.config = config;
        self.configure(delay)?;

        let mut mfrc522 = Mfrc522 {
            ll: self.ll,
            config: self.config,
            state: Ready,
        };
        mfrc522.antenna_on()?;

        Ok(mfrc522)
    }
}

impl<SPI, State> Mfrc522<SPI, State>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Soft reset followed by programming the configuration
    pub(super) fn configure<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<SPI>> {
        self.ll.write(Register::Command, Command::SoftReset.value())?;
        delay.delay_ms(RESET_SETTLE_MS);

        // 0x00 and 0xff are what a floating or shorted MISO line reads as
        let version = self.ll.read(Register::Version)?;
        if version == 0x00 || version == 0xff {
            warn!("no MFRC522 found, version register reads {:#04x}", version);
            return Err(Error::InitializationFailed { version });
        }
        debug!("MFRC522 version {:#04x}", version);

        let config = self.config;
        let [reload_h, reload_l] = config.timer.reload.to_be_bytes();

        self.ll.write(Register::TMode, config.timer.t_mode_register())?;
        self.ll.write(Register::TPrescaler, config.timer.t_prescaler_register())?;
        self.ll.write(Register::TReloadL, reload_l)?;
        self.ll.write(Register::TReloadH, reload_h)?;
        self.ll.write(Register::TxAuto, config.tx_auto_register())?;
        self.ll.write(Register::Mode, config.mode_register())?;

        if let Some(gain) = config.rx_gain {
            self.ll.write(Register::RfCfg, gain.rf_cfg_register())?;
        }

        Ok(())
    }
}
