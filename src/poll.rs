//! Iteration-bounded polling
//!
//! The MFRC522 signals completion through flag registers, and the driver busy
//! waits on them. Instead of a wall-clock deadline, every wait in this crate
//! gives up after a fixed number of checks. The checks use `nb` semantics:
//! `WouldBlock` means "not yet", anything else ends the wait.

/// Calls `check` until it stops returning `WouldBlock`, at most `budget` times
///
/// Returns the first `Ok` or `Other` error `check` produces. If `check` still
/// blocks after `budget` calls, `nb::Error::WouldBlock` is returned, which
/// callers report as their own timeout. A budget of zero never calls `check`.
pub fn bounded<T, E, F>(budget: u16, mut check: F) -> nb::Result<T, E>
where
    F: FnMut() -> nb::Result<T, E>,
{
    for _ in 0..budget {
        match check() {
            Err(nb::Error::WouldBlock) => continue,
            result => return result,
        }
    }

    Err(nb::Error::WouldBlock)
}
