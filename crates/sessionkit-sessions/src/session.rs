//! Per-request session context
//!
//! A [`Session`] is what [`SessionManager::start`](crate::manager::SessionManager::start)
//! returns: the validated record plus the ID it lives under. Reads and writes
//! go to the in-memory copy; [`Session::save`] writes it back.
//!
//! Flash data written with [`Session::set_flash`] is readable with
//! [`Session::flash`] on the *next* request only, unless
//! [`Session::keep_flash`] is called during that request.

use crate::analytics::{DestroyReason, SessionEvent};
use crate::backends::SessionBackend;
use crate::error::{Result, SessionError};
use crate::manager::SessionManager;
use crate::record::{SessionData, SessionId, SessionRecord};
use crate::serialization::SerializationError;
use crate::transport::SessionTransport;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Session for the current request
pub struct Session<B: SessionBackend> {
	manager: SessionManager<B>,
	id: Option<SessionId>,
	record: SessionRecord,
	modified: bool,
}

impl<B: SessionBackend> Session<B> {
	pub(crate) fn new(manager: SessionManager<B>, id: SessionId, record: SessionRecord) -> Self {
		Self {
			manager,
			id: Some(id),
			record,
			modified: false,
		}
	}

	/// Current session ID; `None` once the session has been destroyed
	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	pub fn record(&self) -> &SessionRecord {
		&self.record
	}

	/// Whether data changed since the session was started or last saved
	pub fn is_modified(&self) -> bool {
		self.modified
	}

	/// Raw value stored under `key`
	pub fn get_value(&self, key: &str) -> Option<&Value> {
		self.record.data.get(key)
	}

	/// Value stored under `key`, decoded as `T`
	///
	/// # Examples
	///
	/// ```rust
	/// # use sessionkit_conf::SessionSettings;
	/// # use sessionkit_sessions::backends::InMemorySessionBackend;
	/// # use sessionkit_sessions::manager::SessionManager;
	/// # use sessionkit_sessions::transport::MemoryTransport;
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// # let manager = SessionManager::new(InMemorySessionBackend::new(), SessionSettings::default());
	/// let mut session = manager.start(&mut MemoryTransport::new("agent")).await?;
	/// session.set("cart", vec![3, 5, 8])?;
	///
	/// assert_eq!(session.get::<Vec<u32>>("cart")?, Some(vec![3, 5, 8]));
	/// assert_eq!(session.get::<String>("missing")?, None);
	/// assert!(session.get::<String>("cart").is_err());
	/// # Ok(())
	/// # }
	/// ```
	pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
		self.record
			.data
			.get(key)
			.map(|value| decode(key, value))
			.transpose()
	}

	/// All user data
	pub fn get_all(&self) -> &SessionData {
		&self.record.data
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.record.data.contains_key(key)
	}

	/// Store `value` under `key`
	pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
		let value = encode(value)?;
		self.record.data.insert(key.into(), value);
		self.modified = true;
		Ok(())
	}

	/// Store every pair of `entries`
	///
	/// Nothing is stored if any value fails to encode.
	pub fn set_many<I, K, T>(&mut self, entries: I) -> Result<()>
	where
		I: IntoIterator<Item = (K, T)>,
		K: Into<String>,
		T: Serialize,
	{
		let encoded = entries
			.into_iter()
			.map(|(key, value)| Ok((key.into(), encode(value)?)))
			.collect::<Result<Vec<_>>>()?;
		if !encoded.is_empty() {
			self.record.data.extend(encoded);
			self.modified = true;
		}
		Ok(())
	}

	/// Remove `key`, returning its previous value
	pub fn unset(&mut self, key: &str) -> Option<Value> {
		let removed = self.record.data.remove(key);
		self.modified |= removed.is_some();
		removed
	}

	/// Remove every key in `keys`; returns how many were present
	pub fn unset_many<I, K>(&mut self, keys: I) -> usize
	where
		I: IntoIterator<Item = K>,
		K: AsRef<str>,
	{
		keys.into_iter()
			.filter(|key| self.unset(key.as_ref()).is_some())
			.count()
	}

	/// Store `value` for the next request
	///
	/// Replaces any flash entry under `key`, whatever its phase.
	pub fn set_flash<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<()> {
		let value = encode(value)?;
		self.record.flash.set(key, value);
		self.modified = true;
		Ok(())
	}

	/// Store every pair of `entries` for the next request
	pub fn set_flash_many<I, K, T>(&mut self, entries: I) -> Result<()>
	where
		I: IntoIterator<Item = (K, T)>,
		K: Into<String>,
		T: Serialize,
	{
		let encoded = entries
			.into_iter()
			.map(|(key, value)| Ok((key.into(), encode(value)?)))
			.collect::<Result<Vec<_>>>()?;
		for (key, value) in encoded {
			self.record.flash.set(key, value);
			self.modified = true;
		}
		Ok(())
	}

	/// Flash value set by the previous request, decoded as `T`
	///
	/// Values set during this request are not visible until the next one.
	pub fn flash<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
		self.record
			.flash
			.get(key)
			.map(|value| decode(key, value))
			.transpose()
	}

	/// Raw flash value set by the previous request
	pub fn flash_value(&self, key: &str) -> Option<&Value> {
		self.record.flash.get(key)
	}

	/// Carry the flash value under `key` over to the next request
	///
	/// Returns `false` if there is no readable flash value under `key`.
	pub fn keep_flash(&mut self, key: &str) -> bool {
		let kept = self.record.flash.keep(key);
		self.modified |= kept;
		kept
	}

	/// Persist the record under the current ID
	///
	/// Does nothing for a destroyed session.
	pub async fn save(&mut self) -> Result<()> {
		let Some(id) = self.id.as_deref() else {
			return Ok(());
		};
		self.manager.backend.store(id, &self.record).await?;
		self.modified = false;
		Ok(())
	}

	/// End the session
	///
	/// Clears all data, removes the stored record and tells the client to
	/// forget its ID. Start a new session through the manager if one is needed.
	pub async fn destroy<T: SessionTransport>(&mut self, transport: &mut T) -> Result<()> {
		self.record.clear();
		self.modified = false;
		let Some(id) = self.id.take() else {
			return Ok(());
		};
		let now = self.manager.now();
		self.manager
			.destroy_id(&id, transport, DestroyReason::Explicit, now)
			.await
	}

	/// Move the session to a fresh ID immediately, e.g. after login
	///
	/// Unlike scheduled rotation, the old ID stops resolving at once.
	/// Pending changes are saved under the new ID.
	pub async fn cycle_id<T: SessionTransport>(&mut self, transport: &mut T) -> Result<&str> {
		let old_id = self
			.id
			.clone()
			.ok_or_else(|| SessionError::NotFound("session was destroyed".to_string()))?;
		let now = self.manager.now();

		self.manager.backend.store(&old_id, &self.record).await?;
		let new_id = self.manager.backend.regenerate_id(&old_id).await?;

		self.record.reinstate(now, self.manager.lifetime());
		self.record
			.reset_regeneration(now, self.manager.regenerate_interval());
		self.manager.backend.store(&new_id, &self.record).await?;
		self.modified = false;
		transport.set_id(&new_id);

		self.manager
			.record(SessionEvent::Cycled {
				old_session_id: old_id,
				new_session_id: new_id.clone(),
				timestamp: now,
			})
			.await;

		Ok(self.id.insert(new_id).as_str())
	}
}

fn encode<T: Serialize>(value: T) -> Result<Value> {
	serde_json::to_value(value).map_err(|e| SessionError::from(SerializationError::from(e)))
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
	serde_json::from_value(value.clone()).map_err(|source| {
		SerializationError::TypeMismatch {
			key: key.to_string(),
			source,
		}
		.into()
	})
}
