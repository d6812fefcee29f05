//! Clock port: the controller's idea of local time.

use chrono::Timelike;

/// Source of the local hour used for night-window decisions.
pub trait Clock: Send + Sync + 'static {
    /// Current local hour, 0–23.
    fn local_hour(&self) -> u8;
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_hour(&self) -> u8 {
        // hour() is always < 24
        u8::try_from(chrono::Local::now().hour()).unwrap_or_default()
    }
}

/// Clock frozen at a given hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u8);

impl Clock for FixedClock {
    fn local_hour(&self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_report_hour_within_day() {
        assert!(SystemClock.local_hour() < 24);
    }

    #[test]
    fn should_report_fixed_hour() {
        assert_eq!(FixedClock(22).local_hour(), 22);
    }
}
