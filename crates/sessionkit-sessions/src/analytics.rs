//! Session lifecycle analytics
//!
//! The session manager reports every state transition as a [`SessionEvent`]
//! to a [`SessionAnalytics`] sink. [`LoggerAnalytics`] writes them through
//! `tracing` and is what the manager uses unless told otherwise.
//!
//! ## Example
//!
//! ```rust
//! use sessionkit_sessions::analytics::{CompositeAnalytics, LoggerAnalytics, NoopAnalytics};
//!
//! let mut composite = CompositeAnalytics::new();
//! composite.add(LoggerAnalytics::new());
//! composite.add(NoopAnalytics);
//! assert_eq!(composite.len(), 2);
//! ```

use crate::record::RejectionReason;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod logger;
pub use logger::LoggerAnalytics;

/// Why a session was destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyReason {
	/// The application ended the session (e.g. logout)
	Explicit,
	/// The stored record failed validation and was replaced
	Rejected(RejectionReason),
}

/// Session event for analytics
#[derive(Debug, Clone)]
pub enum SessionEvent {
	/// A new record was allocated
	Created {
		session_id: String,
		timestamp: DateTime<Utc>,
	},
	/// An existing record was loaded and accepted
	///
	/// `retired` is set when the client presented a rotated-away ID.
	Resumed {
		session_id: String,
		retired: bool,
		timestamp: DateTime<Utc>,
	},
	/// A stored record failed validation
	Rejected {
		session_id: String,
		reason: RejectionReason,
		timestamp: DateTime<Utc>,
	},
	/// The session ID was rotated on schedule; the old ID stays resolvable
	Rotated {
		old_session_id: String,
		new_session_id: String,
		timestamp: DateTime<Utc>,
	},
	/// The session ID was cycled on demand; the old ID was removed
	Cycled {
		old_session_id: String,
		new_session_id: String,
		timestamp: DateTime<Utc>,
	},
	/// A session was destroyed
	Destroyed {
		session_id: String,
		reason: DestroyReason,
		timestamp: DateTime<Utc>,
	},
	/// Flash entries changed phase during initialization
	FlashAged {
		session_id: String,
		swept: usize,
		marked: usize,
		timestamp: DateTime<Utc>,
	},
}

/// Session analytics trait
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use sessionkit_sessions::analytics::{SessionAnalytics, SessionEvent};
///
/// struct CountRotations(std::sync::atomic::AtomicUsize);
///
/// #[async_trait]
/// impl SessionAnalytics for CountRotations {
///     async fn record_event(&self, event: SessionEvent) {
///         if let SessionEvent::Rotated { .. } = event {
///             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait SessionAnalytics: Send + Sync {
	/// Record a session event
	async fn record_event(&self, event: SessionEvent);
}

/// Analytics sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

#[async_trait]
impl SessionAnalytics for NoopAnalytics {
	async fn record_event(&self, _event: SessionEvent) {}
}

/// Composite analytics backend
///
/// Forwards each event to every registered backend in order.
#[derive(Clone, Default)]
pub struct CompositeAnalytics {
	backends: Vec<Arc<dyn SessionAnalytics>>,
}

impl CompositeAnalytics {
	/// Create a new composite analytics backend
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an analytics backend
	pub fn add<A: SessionAnalytics + 'static>(&mut self, analytics: A) {
		self.backends.push(Arc::new(analytics));
	}

	pub fn len(&self) -> usize {
		self.backends.len()
	}

	pub fn is_empty(&self) -> bool {
		self.backends.is_empty()
	}
}

#[async_trait]
impl SessionAnalytics for CompositeAnalytics {
	async fn record_event(&self, event: SessionEvent) {
		for backend in &self.backends {
			backend.record_event(event.clone()).await;
		}
	}
}

/// Shorten a session ID for logs
///
/// Full IDs are bearer credentials and are never logged.
pub(crate) fn redact_id(id: &str) -> String {
	let prefix: String = id.chars().take(8).collect();
	format!("{}…", prefix)
}
