//! Tracing-based logger analytics

use super::{SessionAnalytics, SessionEvent, redact_id};
use async_trait::async_trait;

/// Logger analytics backend
///
/// Logs session events using the `tracing` crate. Session IDs are truncated.
#[derive(Debug, Clone, Default)]
pub struct LoggerAnalytics;

impl LoggerAnalytics {
	/// Create a new logger analytics backend
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl SessionAnalytics for LoggerAnalytics {
	async fn record_event(&self, event: SessionEvent) {
		match event {
			SessionEvent::Created {
				session_id,
				timestamp,
			} => {
				tracing::info!(
					session_id = %redact_id(&session_id),
					timestamp = %timestamp,
					"Session created"
				);
			}
			SessionEvent::Resumed {
				session_id,
				retired,
				timestamp,
			} => {
				tracing::debug!(
					session_id = %redact_id(&session_id),
					retired = retired,
					timestamp = %timestamp,
					"Session resumed"
				);
			}
			SessionEvent::Rejected {
				session_id,
				reason,
				timestamp,
			} => {
				tracing::warn!(
					session_id = %redact_id(&session_id),
					reason = %reason,
					timestamp = %timestamp,
					"Session rejected"
				);
			}
			SessionEvent::Rotated {
				old_session_id,
				new_session_id,
				timestamp,
			} => {
				tracing::info!(
					old_session_id = %redact_id(&old_session_id),
					new_session_id = %redact_id(&new_session_id),
					timestamp = %timestamp,
					"Session id rotated"
				);
			}
			SessionEvent::Cycled {
				old_session_id,
				new_session_id,
				timestamp,
			} => {
				tracing::info!(
					old_session_id = %redact_id(&old_session_id),
					new_session_id = %redact_id(&new_session_id),
					timestamp = %timestamp,
					"Session id cycled"
				);
			}
			SessionEvent::Destroyed {
				session_id,
				reason,
				timestamp,
			} => {
				tracing::info!(
					session_id = %redact_id(&session_id),
					reason = ?reason,
					timestamp = %timestamp,
					"Session destroyed"
				);
			}
			SessionEvent::FlashAged {
				session_id,
				swept,
				marked,
				timestamp,
			} => {
				tracing::trace!(
					session_id = %redact_id(&session_id),
					swept = swept,
					marked = marked,
					timestamp = %timestamp,
					"Flash data aged"
				);
			}
		}
	}
}
