//! In-memory session backend
//!
//! Records are encoded and kept in a process-local map. Sessions are lost when
//! the process exits.

use super::SessionBackend;
use crate::error::Result;
use crate::record::SessionRecord;
use crate::serialization::{JsonSerializer, Serializer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sessionkit_conf::SessionSettings;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory session backend
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use sessionkit_conf::SessionSettings;
/// use sessionkit_sessions::backends::InMemorySessionBackend;
///
/// let backend = InMemorySessionBackend::from_settings(&SessionSettings::default());
/// assert_eq!(backend.namespace(), "__cgit_session_");
/// assert!(backend.is_empty());
/// ```
#[derive(Clone)]
pub struct InMemorySessionBackend {
	entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
	namespace: String,
	serializer: JsonSerializer,
}

impl InMemorySessionBackend {
	/// Create a backend without a key namespace
	pub fn new() -> Self {
		Self::with_namespace("")
	}

	/// Create a backend that prefixes every stored key with `namespace`
	pub fn with_namespace(namespace: impl Into<String>) -> Self {
		Self {
			entries: Arc::new(RwLock::new(HashMap::new())),
			namespace: namespace.into(),
			serializer: JsonSerializer,
		}
	}

	/// Create a backend namespaced by `settings.session_key`
	pub fn from_settings(settings: &SessionSettings) -> Self {
		Self::with_namespace(settings.session_key.clone())
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Number of stored records, including expired ones not yet purged
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Session IDs currently stored
	pub fn ids(&self) -> Vec<String> {
		self.entries
			.read()
			.keys()
			.filter_map(|key| key.strip_prefix(self.namespace.as_str()))
			.map(str::to_string)
			.collect()
	}

	/// Remove every record whose expiry is before `now`
	///
	/// Records that no longer decode are removed as well. Returns the number of
	/// removed records.
	pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();
		entries.retain(|_, bytes| {
			self.serializer
				.deserialize::<SessionRecord>(bytes)
				.map(|record| !record.is_expired(now))
				.unwrap_or(false)
		});
		let removed = before - entries.len();
		if removed > 0 {
			tracing::debug!(removed, "Purged expired sessions from memory");
		}
		removed
	}

	fn key(&self, id: &str) -> String {
		format!("{}{}", self.namespace, id)
	}
}

impl Default for InMemorySessionBackend {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl SessionBackend for InMemorySessionBackend {
	async fn load(&self, id: &str) -> Result<Option<SessionRecord>> {
		let bytes = self.entries.read().get(&self.key(id)).cloned();
		match bytes {
			Some(bytes) => Ok(Some(self.serializer.deserialize(&bytes)?)),
			None => Ok(None),
		}
	}

	async fn store(&self, id: &str, record: &SessionRecord) -> Result<()> {
		let bytes = self.serializer.serialize(record)?;
		self.entries.write().insert(self.key(id), bytes);
		Ok(())
	}

	async fn destroy(&self, id: &str) -> Result<()> {
		self.entries.write().remove(&self.key(id));
		Ok(())
	}

	async fn exists(&self, id: &str) -> Result<bool> {
		Ok(self.entries.read().contains_key(&self.key(id)))
	}
}
