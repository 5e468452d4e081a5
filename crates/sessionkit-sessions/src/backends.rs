//! Session storage backends
//!
//! The session manager treats storage as an injected collaborator: anything
//! implementing [`SessionBackend`] can hold session records. Two backends are
//! provided:
//!
//! - [`InMemorySessionBackend`]: records kept in process memory
//! - [`FileSessionBackend`] (feature `file-backend`): one file per session
//!
//! Both encode records through a [`Serializer`](crate::serialization::Serializer)
//! and prefix stored keys with the configured `session_key` namespace.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeDelta, Utc};
//! use sessionkit_sessions::backends::{InMemorySessionBackend, SessionBackend};
//! use sessionkit_sessions::record::SessionRecord;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemorySessionBackend::new();
//! let id = backend.generate_id();
//! let record = SessionRecord::new("agent", Utc::now(), TimeDelta::hours(2), TimeDelta::minutes(5));
//!
//! backend.store(&id, &record).await?;
//! assert!(backend.exists(&id).await?);
//!
//! let new_id = backend.regenerate_id(&id).await?;
//! assert!(!backend.exists(&id).await?);
//! assert_eq!(backend.load(&new_id).await?, Some(record));
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SessionError};
use crate::record::{SessionId, SessionRecord};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub use memory::InMemorySessionBackend;

#[cfg(feature = "file-backend")]
pub mod file;
#[cfg(feature = "file-backend")]
pub use file::FileSessionBackend;

/// Longest session ID accepted from a client
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Session backend trait
///
/// Implementations must make single-record reads and writes atomic; no
/// cross-record transactions are required.
#[async_trait]
pub trait SessionBackend: Send + Sync {
	/// Create a new, unused session ID
	fn generate_id(&self) -> SessionId {
		Uuid::new_v4().simple().to_string()
	}

	/// Load the record stored under `id`
	async fn load(&self, id: &str) -> Result<Option<SessionRecord>>;

	/// Store `record` under `id`, replacing any previous record
	async fn store(&self, id: &str, record: &SessionRecord) -> Result<()>;

	/// Remove the record stored under `id`; removing a missing record succeeds
	async fn destroy(&self, id: &str) -> Result<()>;

	/// Check if a record exists under `id`
	async fn exists(&self, id: &str) -> Result<bool> {
		Ok(self.load(id).await?.is_some())
	}

	/// Move the record under `old_id` to a freshly generated ID
	///
	/// The old mapping is removed only after the record is stored under the
	/// new ID.
	async fn regenerate_id(&self, old_id: &str) -> Result<SessionId> {
		let record = self
			.load(old_id)
			.await?
			.ok_or_else(|| SessionError::NotFound(old_id.to_string()))?;

		let new_id = self.generate_id();
		self.store(&new_id, &record).await?;
		self.destroy(old_id).await?;

		Ok(new_id)
	}
}

/// Whether `id` is acceptable as a session ID
///
/// IDs arrive from clients, so only short ASCII alphanumeric strings (plus `-`
/// and `_`) are allowed.
///
/// # Examples
///
/// ```
/// use sessionkit_sessions::backends::is_valid_session_id;
///
/// assert!(is_valid_session_id("3f2b9c0d4e5f"));
/// assert!(!is_valid_session_id("../../etc/passwd"));
/// assert!(!is_valid_session_id(""));
/// ```
pub fn is_valid_session_id(id: &str) -> bool {
	!id.is_empty()
		&& id.len() <= MAX_SESSION_ID_LEN
		&& id
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
