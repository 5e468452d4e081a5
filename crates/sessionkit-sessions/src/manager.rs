//! Session lifecycle state machine
//!
//! [`SessionManager::start`] runs once per request and always hands back a
//! valid, persisted [`Session`]:
//!
//! 1. **create or resume**: configure the transport, then load the record for
//!    the client's session ID or allocate a new one
//! 2. **validate**: reject the record if the user agent changed or it expired;
//!    otherwise slide its expiry
//! 3. on success, **rotate if due**: move the record to a new ID once the
//!    regeneration deadline has passed, leaving a retired copy under the old
//!    ID for the rotation grace window
//! 4. on failure, **destroy** the record and create a fresh one
//! 5. **flash sweep** then **flash mark**
//! 6. persist the record and send the ID back through the transport
//!
//! Flash aging runs after validation and rotation so that phase transitions
//! are applied to the record that survives the request.
//!
//! ## Why the old ID survives rotation
//!
//! Browsers routinely send a second request with the old cookie before the
//! response carrying the new one arrives (double submit, back button,
//! parallel asset requests). Deleting the old record outright would log those
//! clients out. The retired copy resolves for `rotation_grace_seconds` and
//! points at the ID the session moved to: a request carrying the old ID is
//! forwarded to the live record and is sent the new ID, so a late response
//! can never put the old cookie back. The retired copy never slides its
//! expiry and is never rotated again. If the live record is gone (e.g. after
//! logout) the old ID is rejected. Setting the grace to zero deletes the old
//! record instead.

use crate::analytics::{
	DestroyReason, LoggerAnalytics, SessionAnalytics, SessionEvent, redact_id,
};
use crate::backends::{SessionBackend, is_valid_session_id};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::record::{RejectionReason, SessionId, SessionRecord, seconds};
use crate::session::Session;
use crate::transport::{CookieParams, SessionTransport};
use chrono::{DateTime, TimeDelta, Utc};
use sessionkit_conf::SessionSettings;
use std::sync::Arc;

/// Session manager
///
/// Cheap to clone; clones share the backend, settings, clock and analytics.
///
/// # Examples
///
/// ```rust
/// use sessionkit_conf::SessionSettings;
/// use sessionkit_sessions::backends::InMemorySessionBackend;
/// use sessionkit_sessions::manager::SessionManager;
/// use sessionkit_sessions::transport::MemoryTransport;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = SessionSettings::default();
/// let manager = SessionManager::new(InMemorySessionBackend::from_settings(&settings), settings);
///
/// // Request 1: no cookie yet
/// let mut request = MemoryTransport::new("Mozilla/5.0");
/// let mut session = manager.start(&mut request).await?;
/// session.set("user_id", 42)?;
/// session.set_flash("notice", "Welcome back")?;
/// session.save().await?;
///
/// // Request 2: the browser sends the cookie it was given
/// let mut request = request.next_request();
/// let session = manager.start(&mut request).await?;
/// assert_eq!(session.get::<i64>("user_id")?, Some(42));
/// assert_eq!(session.flash::<String>("notice")?.as_deref(), Some("Welcome back"));
/// # Ok(())
/// # }
/// ```
pub struct SessionManager<B> {
	pub(crate) backend: Arc<B>,
	pub(crate) settings: Arc<SessionSettings>,
	pub(crate) clock: Arc<dyn Clock>,
	pub(crate) analytics: Arc<dyn SessionAnalytics>,
}

impl<B> Clone for SessionManager<B> {
	fn clone(&self) -> Self {
		Self {
			backend: Arc::clone(&self.backend),
			settings: Arc::clone(&self.settings),
			clock: Arc::clone(&self.clock),
			analytics: Arc::clone(&self.analytics),
		}
	}
}

impl<B: SessionBackend> SessionManager<B> {
	/// Create a manager using the wall clock and tracing analytics
	pub fn new(backend: B, settings: SessionSettings) -> Self {
		Self {
			backend: Arc::new(backend),
			settings: Arc::new(settings),
			clock: Arc::new(SystemClock),
			analytics: Arc::new(LoggerAnalytics::new()),
		}
	}

	/// Replace the time source
	pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
		self.clock = Arc::new(clock);
		self
	}

	/// Replace the analytics sink
	pub fn with_analytics<A: SessionAnalytics + 'static>(mut self, analytics: A) -> Self {
		self.analytics = Arc::new(analytics);
		self
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub fn settings(&self) -> &SessionSettings {
		&self.settings
	}

	/// Run the per-request initialization protocol
	///
	/// Never returns an invalid session: rejected records are destroyed and
	/// replaced. Backend failures are returned as errors.
	pub async fn start<T: SessionTransport>(&self, transport: &mut T) -> Result<Session<B>> {
		let now = self.clock.now();
		let agent = transport.user_agent().unwrap_or_default().to_string();

		let (mut id, mut record) = match self.create_or_resume(transport, &agent, now).await? {
			Resumed::Existing(id, record) => match self.accept(id, record, &agent, now).await? {
				Accepted::Valid {
					id,
					record,
					forwarded,
				} => {
					self.record(SessionEvent::Resumed {
						session_id: id.clone(),
						retired: forwarded,
						timestamp: now,
					})
					.await;
					(id, record)
				}
				Accepted::Rejected { id, reason } => {
					self.record(SessionEvent::Rejected {
						session_id: id.clone(),
						reason,
						timestamp: now,
					})
					.await;
					self.destroy_id(&id, transport, DestroyReason::Rejected(reason), now)
						.await?;
					self.create(&agent, now).await
				}
			},
			Resumed::Created(id, record) => (id, record),
		};

		self.rotate_if_due(&mut id, &mut record, now).await?;

		let swept = record.flash.sweep();
		let marked = record.flash.mark();
		if swept + marked > 0 {
			self.record(SessionEvent::FlashAged {
				session_id: id.clone(),
				swept,
				marked,
				timestamp: now,
			})
			.await;
		}

		self.backend.store(&id, &record).await?;
		transport.set_id(&id);

		Ok(Session::new(self.clone(), id, record))
	}

	/// Configure the transport and load or allocate the record
	async fn create_or_resume<T: SessionTransport>(
		&self,
		transport: &mut T,
		agent: &str,
		now: DateTime<Utc>,
	) -> Result<Resumed> {
		transport.set_params(CookieParams::from_settings(&self.settings));
		transport.set_name(&self.settings.session_name);

		if let Some(id) = transport.current_id() {
			if !is_valid_session_id(&id) {
				tracing::debug!(len = id.len(), "Ignoring malformed session id");
			} else if let Some(record) = self.backend.load(&id).await? {
				return Ok(Resumed::Existing(id, record));
			}
		}

		let (id, record) = self.create(agent, now).await;
		Ok(Resumed::Created(id, record))
	}

	/// Allocate a fresh record; it is persisted at the end of `start`
	async fn create(&self, agent: &str, now: DateTime<Utc>) -> (SessionId, SessionRecord) {
		let id = self.backend.generate_id();
		let record = SessionRecord::new(agent, now, self.lifetime(), self.regenerate_interval());
		self.record(SessionEvent::Created {
			session_id: id.clone(),
			timestamp: now,
		})
		.await;
		(id, record)
	}

	/// Validate the loaded record, forwarding retired copies to their successor
	///
	/// A rejection always names the ID the client presented.
	async fn accept(
		&self,
		id: SessionId,
		mut record: SessionRecord,
		agent: &str,
		now: DateTime<Utc>,
	) -> Result<Accepted> {
		if let Err(reason) = self.validate(&mut record, agent, now) {
			return Ok(Accepted::Rejected { id, reason });
		}

		let mut current = (id.clone(), record);
		for _ in 0..MAX_FORWARDS {
			if !current.1.is_retired() {
				return Ok(Accepted::Valid {
					forwarded: current.0 != id,
					id: current.0,
					record: current.1,
				});
			}

			let Some(successor) = current.1.successor.take() else {
				break;
			};
			let Some(mut next) = self.backend.load(&successor).await? else {
				break;
			};
			if let Err(reason) = self.validate(&mut next, agent, now) {
				return Ok(Accepted::Rejected { id, reason });
			}
			tracing::debug!(
				from = %redact_id(&current.0),
				to = %redact_id(&successor),
				"Forwarding rotated session id"
			);
			current = (successor, next);
		}

		Ok(Accepted::Rejected {
			id,
			reason: RejectionReason::Superseded,
		})
	}

	/// Accept the record for this request and slide its expiry
	///
	/// Retired copies keep their clipped expiry.
	fn validate(
		&self,
		record: &mut SessionRecord,
		agent: &str,
		now: DateTime<Utc>,
	) -> std::result::Result<(), RejectionReason> {
		if let Some(reason) = record.rejection(agent, now) {
			return Err(reason);
		}
		if !record.is_retired() {
			record.touch(now, self.lifetime());
		}
		Ok(())
	}

	/// Move the record to a new ID once its regeneration deadline has passed
	///
	/// Returns whether the ID changed.
	async fn rotate_if_due(
		&self,
		id: &mut SessionId,
		record: &mut SessionRecord,
		now: DateTime<Utc>,
	) -> Result<bool> {
		if !record.rotation_due(now) {
			return Ok(false);
		}

		let new_id = self.backend.generate_id();
		let grace = seconds(self.settings.rotation_grace_seconds);
		let mut retired = record.clone();
		retired.retire(now, grace, new_id.clone());

		record.reset_regeneration(now, self.regenerate_interval());
		record.touch(now, self.lifetime());

		self.backend.store(&new_id, record).await?;
		if grace > TimeDelta::zero() {
			self.backend.store(id, &retired).await?;
		} else {
			self.backend.destroy(id).await?;
		}

		let old_id = std::mem::replace(id, new_id);
		self.record(SessionEvent::Rotated {
			old_session_id: old_id,
			new_session_id: id.clone(),
			timestamp: now,
		})
		.await;

		Ok(true)
	}

	/// Remove the record under `id` and detach it from the client
	pub(crate) async fn destroy_id<T: SessionTransport>(
		&self,
		id: &str,
		transport: &mut T,
		reason: DestroyReason,
		now: DateTime<Utc>,
	) -> Result<()> {
		self.backend.destroy(id).await?;
		transport.clear_id();
		self.record(SessionEvent::Destroyed {
			session_id: id.to_string(),
			reason,
			timestamp: now,
		})
		.await;
		Ok(())
	}

	pub(crate) async fn record(&self, event: SessionEvent) {
		self.analytics.record_event(event).await;
	}

	pub(crate) fn now(&self) -> DateTime<Utc> {
		self.clock.now()
	}

	pub(crate) fn lifetime(&self) -> TimeDelta {
		seconds(self.settings.expiry_seconds)
	}

	pub(crate) fn regenerate_interval(&self) -> TimeDelta {
		seconds(self.settings.regenerate_seconds)
	}

}

/// Longest chain of rotated-away IDs followed for one request
const MAX_FORWARDS: usize = 4;

enum Resumed {
	Existing(SessionId, SessionRecord),
	Created(SessionId, SessionRecord),
}

enum Accepted {
	Valid {
		id: SessionId,
		record: SessionRecord,
		forwarded: bool,
	},
	Rejected {
		id: SessionId,
		reason: RejectionReason,
	},
}
