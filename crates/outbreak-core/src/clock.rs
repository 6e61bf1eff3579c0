//! Turn clock.
//!
//! The day counter is the single source of truth for how many turns have
//! resolved. It starts at 0 and advances exactly once at the start of each
//! turn, so the first resolved turn is day 1.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Day counter would overflow.
    #[error("day counter overflow: cannot advance beyond u64::MAX")]
    Overflow,
}

/// Day counter with checked advancement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnClock {
    day: u64,
}

impl TurnClock {
    /// A clock at day 0.
    pub const fn new() -> Self {
        Self { day: 0 }
    }

    /// A clock at an arbitrary day.
    pub const fn from_day(day: u64) -> Self {
        Self { day }
    }

    /// Turns resolved so far.
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// Advance by one day and return the new day number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] at `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.day = self.day.checked_add(1).ok_or(ClockError::Overflow)?;
        Ok(self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_and_counts_up() {
        let mut clock = TurnClock::new();
        assert_eq!(clock.day(), 0);
        assert_eq!(clock.advance().ok(), Some(1));
        assert_eq!(clock.advance().ok(), Some(2));
        assert_eq!(clock.day(), 2);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = TurnClock::from_day(u64::MAX);
        assert!(matches!(clock.advance(), Err(ClockError::Overflow)));
        assert_eq!(clock.day(), u64::MAX);
    }
}
