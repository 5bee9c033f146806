//! The "is there a card, and which one" loop
//!
//! A [`CardSession`] runs request, anti-collision and halt in sequence on a
//! ready driver. One poll looks like this:
//!
//! ``` text
//! Idle --request--> Detected --anticollision--> Identified --halt--> Idle
//! ```
//!
//! Any failure before `Identified` goes straight back to `Idle` and reports
//! no card. Once a UID is read, the card is halted and the UID reported,
//! whatever the halt does.

use embedded_hal::{delay::DelayNs, spi};
use log::{debug, warn};

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::{command::RequestMode, frame::Uid, time::Clock, Error, Mfrc522, Ready};

/// Where a [`CardSession`] is in its poll cycle
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum SessionState {
    /// No card is being talked to
    Idle,
    /// A card answered the request
    Detected,
    /// The card's UID is known
    Identified,
}

/// Polls for cards with a ready driver
pub struct CardSession<SPI> {
    reader: Mfrc522<SPI, Ready>,
    state: SessionState,
    reached: SessionState,
    mode: RequestMode,
}

impl<SPI> CardSession<SPI> {
    /// Creates a session that wakes cards with REQA
    ///
    /// Cards halted by a previous poll stay asleep until they leave the
    /// field, so a card held against the reader is reported once.
    pub fn new(reader: Mfrc522<SPI, Ready>) -> Self {
        Self::with_request_mode(reader, RequestMode::ReqIdl)
    }

    /// Creates a session that wakes cards with the given request
    ///
    /// With [`RequestMode::ReqAll`] halted cards are woken up again, and a
    /// card held against the reader is reported on every poll.
    pub fn with_request_mode(reader: Mfrc522<SPI, Ready>, mode: RequestMode) -> Self {
        CardSession {
            reader,
            state: SessionState::Idle,
            reached: SessionState::Idle,
            mode,
        }
    }

    /// Where the session is in its poll cycle
    ///
    /// Always `Idle` between polls.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The furthest state the last poll got to
    ///
    /// `Identified` after a poll that read a UID, `Detected` if a card
    /// answered the request but anti-collision failed, `Idle` if nothing
    /// answered.
    pub fn last_reached(&self) -> SessionState {
        self.reached
    }

    /// The driver the session runs on
    pub fn reader(&mut self) -> &mut Mfrc522<SPI, Ready> {
        &mut self.reader
    }

    /// Gives back the driver
    pub fn release(self) -> Mfrc522<SPI, Ready> {
        self.reader
    }

    fn enter(&mut self, state: SessionState) {
        if self.state != state {
            debug!("session {:?} -> {:?}", self.state, state);
            self.state = state;
        }
        if state != SessionState::Idle {
            self.reached = state;
        }
    }
}

impl<SPI> CardSession<SPI>
where
    SPI: spi::SpiDevice<u8>,
{
    /// Looks for a card once
    ///
    /// Returns the card's UID, or `None` if no card answered. Errors are
    /// logged and reported as no card; use [`CardSession::try_poll_for_card`]
    /// to tell a broken reader from an empty field.
    pub fn poll_for_card(&mut self) -> Option<Uid> {
        match self.try_poll_for_card() {
            Ok(uid) => uid,
            Err(error) => {
                warn!("polling for a card failed: {:?}", error);
                None
            }
        }
    }

    /// Looks for a card once, returning errors that point at the reader
    ///
    /// Timeouts and protocol errors mean no card and give `Ok(None)`. SPI
    /// errors and a stuck CRC coprocessor are returned, except during the
    /// halt: by then the UID is known and is reported anyway.
    pub fn try_poll_for_card(&mut self) -> Result<Option<Uid>, Error<SPI>> {
        let result = self.poll_cycle();
        self.enter(SessionState::Idle);
        result
    }

    fn poll_cycle(&mut self) -> Result<Option<Uid>, Error<SPI>> {
        self.reached = SessionState::Idle;

        match self.reader.request(self.mode) {
            Ok(_) => self.enter(SessionState::Detected),
            Err(error) if error.is_fatal() => return Err(error),
            Err(_) => return Ok(None),
        }

        let uid = match self.reader.anticollision() {
            Ok(uid) => uid,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                debug!("card answered the request but not anti-collision: {:?}", error);
                return Ok(None);
            }
        };
        self.enter(SessionState::Identified);

        if let Err(error) = self.reader.halt() {
            warn!("halting card {} failed: {:?}", uid, error);
        }

        Ok(Some(uid))
    }

    /// Polls for a card until one shows up or `timeout_ms` passed
    ///
    /// Waits `interval_ms` between polls. Errors that point at the reader end
    /// the wait early.
    pub fn wait_for_card<C, D>(
        &mut self,
        clock: &mut C,
        delay: &mut D,
        timeout_ms: u32,
        interval_ms: u32,
    ) -> Result<Option<Uid>, Error<SPI>>
    where
        C: Clock,
        D: DelayNs,
    {
        let start = clock.now();

        loop {
            if let Some(uid) = self.try_poll_for_card()? {
                return Ok(Some(uid));
            }

            if clock.now().duration_since(start) >= timeout_ms {
                debug!("no card within {} ms", timeout_ms);
                return Ok(None);
            }

            delay.delay_ms(interval_ms);
        }
    }
}
