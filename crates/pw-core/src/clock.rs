//! Wall-clock sources and the time arithmetic shared by the recorder.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeDelta, Utc};

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle while the
/// recorder owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Starts the clock at a whole number of unix seconds.
    pub fn at_unix(secs: i64) -> Self {
        Self::new(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Converts a timestamp to fractional unix seconds with microsecond resolution.
#[expect(
    clippy::cast_precision_loss,
    reason = "unix seconds fit comfortably in an f64 mantissa"
)]
pub fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_micros()) / 1_000_000.0
}

/// Rounds `value` to `digits` decimal places. Negative `digits` round to
/// tens, hundreds and so on.
///
/// Digit counts past what an `f64` can resolve leave `value` untouched;
/// rounding to more tens than any `f64` holds gives zero.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if digits >= 0 {
        let factor = 10_f64.powi(digits);
        let scaled = value * factor;
        if !scaled.is_finite() {
            return value;
        }
        scaled.round() / factor
    } else {
        let factor = 10_f64.powi(digits.saturating_neg());
        if !factor.is_finite() {
            return 0.0;
        }
        (value / factor).round() * factor
    }
}

/// Formats fractional unix seconds as `YYYY-MM-DD HH:MM:SS.ffff`.
///
/// The fraction is rounded to four places and carries into the seconds, so
/// the text always agrees with the number it was built from.
#[expect(
    clippy::cast_possible_truncation,
    reason = "unix time in ten-thousandths of a second fits an i64"
)]
pub fn readable(unix: f64, local: bool) -> String {
    let ticks = (unix * 10_000.0).round() as i64;
    let fraction = ticks.rem_euclid(10_000);
    let time = DateTime::from_timestamp(ticks.div_euclid(10_000), 0).unwrap_or_default();
    let base = if local {
        time.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    } else {
        time.format("%Y-%m-%d %H:%M:%S").to_string()
    };
    format!("{base}.{fraction:04}")
}
