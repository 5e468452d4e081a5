//! Time source
//!
//! Every expiry and rotation decision reads the time through a [`Clock`], so
//! the state machine can be driven deterministically in tests.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time
pub trait Clock: Send + Sync {
	/// Current UTC time
	fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Manually driven clock
///
/// Clones share the same instant.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sessionkit_sessions::clock::{Clock, ManualClock};
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let clock = ManualClock::new(start);
/// clock.advance_secs(90);
/// assert_eq!((clock.now() - start).num_seconds(), 90);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
	now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
	/// Create a clock frozen at `start`
	pub fn new(start: DateTime<Utc>) -> Self {
		Self {
			now: Arc::new(Mutex::new(start)),
		}
	}

	/// Jump to `instant`
	pub fn set(&self, instant: DateTime<Utc>) {
		*self.now.lock() = instant;
	}

	/// Move forward by `delta`
	pub fn advance(&self, delta: TimeDelta) {
		let mut now = self.now.lock();
		*now += delta;
	}

	/// Move forward by whole seconds
	pub fn advance_secs(&self, secs: i64) {
		self.advance(TimeDelta::seconds(secs));
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new(Utc::now())
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock()
	}
}
