//! Session records
//!
//! A [`SessionRecord`] is what the storage backend persists under a session
//! ID: user data, flash data, and the bookkeeping the state machine needs to
//! decide whether the session is still trusted.

use crate::flash::FlashStore;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Session ID type
pub type SessionId = String;

/// User data of a session
pub type SessionData = HashMap<String, Value>;

/// Why a stored record was not accepted for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
	/// The record carries no agent fingerprint
	MissingAgent,
	/// The request's user agent differs from the one the record was created with
	AgentMismatch,
	/// The record's expiry is in the past
	Expired,
	/// The ID was rotated away and the session it moved to no longer exists
	Superseded,
}

impl fmt::Display for RejectionReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let reason = match self {
			Self::MissingAgent => "missing agent fingerprint",
			Self::AgentMismatch => "agent mismatch",
			Self::Expired => "expired",
			Self::Superseded => "superseded",
		};
		f.write_str(reason)
	}
}

/// Persisted session state
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, Utc};
/// use sessionkit_sessions::record::SessionRecord;
///
/// let now = Utc::now();
/// let record = SessionRecord::new("Mozilla/5.0", now, TimeDelta::hours(2), TimeDelta::minutes(5));
///
/// assert!(record.is_valid("Mozilla/5.0", now));
/// assert!(!record.is_valid("curl/8.0", now));
/// assert!(!record.rotation_due(now));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
	/// Instant after which the record is no longer accepted
	pub expiry: DateTime<Utc>,
	/// User agent captured when the record was created
	#[serde(default)]
	pub agent_fingerprint: Option<String>,
	/// Instant after which the session ID must be rotated
	pub regeneration_deadline: DateTime<Utc>,
	/// Set on the copy left behind under a rotated-away ID
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub retired_at: Option<DateTime<Utc>>,
	/// ID the session moved to when this copy was retired
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub successor: Option<SessionId>,
	#[serde(default)]
	pub data: SessionData,
	#[serde(default)]
	pub flash: FlashStore,
}

impl SessionRecord {
	/// Create a fresh record for `agent`
	pub fn new(
		agent: impl Into<String>,
		now: DateTime<Utc>,
		lifetime: TimeDelta,
		regenerate_after: TimeDelta,
	) -> Self {
		Self {
			expiry: offset(now, lifetime),
			agent_fingerprint: Some(agent.into()),
			regeneration_deadline: offset(now, regenerate_after),
			retired_at: None,
			successor: None,
			data: SessionData::new(),
			flash: FlashStore::new(),
		}
	}

	/// Reason the record must be rejected for a request from `agent` at `now`
	///
	/// A record whose expiry equals `now` is still accepted.
	pub fn rejection(&self, agent: &str, now: DateTime<Utc>) -> Option<RejectionReason> {
		match self.agent_fingerprint.as_deref() {
			None => Some(RejectionReason::MissingAgent),
			Some(stored) if stored != agent => Some(RejectionReason::AgentMismatch),
			Some(_) if self.expiry < now => Some(RejectionReason::Expired),
			Some(_) => None,
		}
	}

	/// Whether the record is trusted for a request from `agent` at `now`
	pub fn is_valid(&self, agent: &str, now: DateTime<Utc>) -> bool {
		self.rejection(agent, now).is_none()
	}

	/// Slide the expiry to `now + lifetime`
	pub fn touch(&mut self, now: DateTime<Utc>, lifetime: TimeDelta) {
		self.expiry = offset(now, lifetime);
	}

	/// Whether the session ID is due for rotation
	///
	/// Retired copies are never rotated again.
	pub fn rotation_due(&self, now: DateTime<Utc>) -> bool {
		!self.is_retired() && self.regeneration_deadline < now
	}

	/// Push the rotation deadline to `now + interval`
	pub fn reset_regeneration(&mut self, now: DateTime<Utc>, interval: TimeDelta) {
		self.regeneration_deadline = offset(now, interval);
	}

	/// Turn this record into the copy left behind under a rotated-away ID
	///
	/// The expiry is clipped so the old ID resolves for at most `grace`.
	/// Requests arriving with the old ID are forwarded to `successor`.
	pub fn retire(
		&mut self,
		now: DateTime<Utc>,
		grace: TimeDelta,
		successor: impl Into<SessionId>,
	) {
		self.retired_at = Some(now);
		self.successor = Some(successor.into());
		self.expiry = self.expiry.min(offset(now, grace));
	}

	/// Make a retired copy a live record again, expiring at `now + lifetime`
	pub fn reinstate(&mut self, now: DateTime<Utc>, lifetime: TimeDelta) {
		self.retired_at = None;
		self.successor = None;
		self.touch(now, lifetime);
	}

	pub fn is_retired(&self) -> bool {
		self.retired_at.is_some()
	}

	/// Whether the record has outlived its expiry at `now`
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expiry < now
	}

	/// Drop all user and flash data
	pub fn clear(&mut self) {
		self.data.clear();
		self.flash.clear();
	}
}

/// Convert a settings value in seconds into a time delta, saturating
pub(crate) fn seconds(secs: u64) -> TimeDelta {
	i64::try_from(secs)
		.ok()
		.and_then(TimeDelta::try_seconds)
		.unwrap_or(TimeDelta::MAX)
}

fn offset(now: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
	now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
