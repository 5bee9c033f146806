//! Time-related types based on a wrapping millisecond clock

#[cfg(feature = "defmt")]
use defmt::Format;

/// A monotonic millisecond clock
///
/// The counter is free to wrap around at `u32::MAX`. Compare readings with
/// [`Instant::duration_since`], never with `<` or `>`.
pub trait Clock {
    /// Returns the current time in milliseconds
    fn now_ms(&mut self) -> u32;

    /// Returns the current time as an [`Instant`]
    fn now(&mut self) -> Instant {
        Instant::new(self.now_ms())
    }
}

/// Represents an instant in time
///
/// Internally uses the raw 32-bit millisecond count of the [`Clock`] it came
/// from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Instant(u32);

impl Instant {
    /// Creates a new instance of `Instant`
    pub fn new(millis: u32) -> Self {
        Instant(millis)
    }

    /// Returns the raw millisecond count
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Returns the number of milliseconds passed between the two `Instant`s
    ///
    /// Assumes that `&self` represents a later time than the argument
    /// `earlier`. Please make sure that this is the case, as this method has no
    /// way of knowing (the counter wraps, so comparing the numerical values
    /// doesn't tell anything about order). The result is correct as long as
    /// less than 2^32 ms passed.
    ///
    /// # Example
    ///
    /// ``` rust
    /// use mfrc522_ng::time::Instant;
    ///
    /// let before = Instant::new(u32::MAX - 4);
    /// let after  = Instant::new(5);
    ///
    /// assert_eq!(after.duration_since(before), 10);
    /// ```
    pub fn duration_since(&self, earlier: Instant) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Returns the instant `millis` milliseconds later
    pub fn add_millis(&self, millis: u32) -> Instant {
        Instant(self.0.wrapping_add(millis))
    }
}
