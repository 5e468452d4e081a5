//! File session backend
//!
//! Each session is one file named `<namespace><id>.json` inside the session
//! directory. Writes go to a temporary file that is then renamed over the
//! target, so a reader never observes a half-written record.

use super::{SessionBackend, is_valid_session_id};
use crate::error::{Result, SessionError};
use crate::record::SessionRecord;
use crate::serialization::{JsonSerializer, Serializer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sessionkit_conf::SessionSettings;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// File session backend
///
/// # Examples
///
/// ```rust,no_run
/// use sessionkit_conf::SessionSettings;
/// use sessionkit_sessions::backends::FileSessionBackend;
///
/// let backend = FileSessionBackend::from_settings("/var/lib/app/sessions", &SessionSettings::default());
/// assert_eq!(backend.namespace(), "__cgit_session_");
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionBackend {
	dir: PathBuf,
	namespace: String,
	serializer: JsonSerializer,
}

impl FileSessionBackend {
	/// Store sessions in `dir`, created on first write
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self::with_namespace(dir, "")
	}

	/// Store sessions in `dir` with file names prefixed by `namespace`
	pub fn with_namespace(dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
		Self {
			dir: dir.into(),
			namespace: namespace.into(),
			serializer: JsonSerializer,
		}
	}

	/// Store sessions in `dir`, namespaced by `settings.session_key`
	pub fn from_settings(dir: impl Into<PathBuf>, settings: &SessionSettings) -> Self {
		Self::with_namespace(dir, settings.session_key.clone())
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	/// Delete every session file whose record expired before `now`
	///
	/// Only `<namespace><id>.json` files with a well-formed ID are considered.
	/// Files that do not decode are left in place with a warning. Returns the
	/// number of deleted files.
	pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
		let mut dir = match fs::read_dir(&self.dir).await {
			Ok(dir) => dir,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(e.into()),
		};

		let suffix = format!(".{}", self.serializer.name());
		let mut removed = 0;
		while let Some(entry) = dir.next_entry().await? {
			let name = entry.file_name();
			let Some(name) = name.to_str() else {
				continue;
			};
			let is_session_file = name
				.strip_prefix(self.namespace.as_str())
				.and_then(|rest| rest.strip_suffix(suffix.as_str()))
				.is_some_and(is_valid_session_id);
			if !is_session_file {
				continue;
			}

			let path = entry.path();
			let bytes = match fs::read(&path).await {
				Ok(bytes) => bytes,
				Err(e) if e.kind() == ErrorKind::NotFound => continue,
				Err(e) => return Err(e.into()),
			};
			let record = match self.serializer.deserialize::<SessionRecord>(&bytes) {
				Ok(record) => record,
				Err(e) => {
					tracing::warn!(
						path = %path.display(),
						error = %e,
						"Skipping undecodable session file"
					);
					continue;
				}
			};

			if record.is_expired(now) {
				remove_if_present(&path).await?;
				removed += 1;
			}
		}

		if removed > 0 {
			tracing::debug!(removed, dir = %self.dir.display(), "Purged expired session files");
		}
		Ok(removed)
	}

	fn path(&self, id: &str) -> Result<PathBuf> {
		if !is_valid_session_id(id) {
			return Err(SessionError::InvalidId(id.to_string()));
		}
		Ok(self
			.dir
			.join(format!("{}{}.{}", self.namespace, id, self.serializer.name())))
	}
}

async fn remove_if_present(path: &Path) -> Result<()> {
	match fs::remove_file(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e.into()),
	}
}

#[async_trait]
impl SessionBackend for FileSessionBackend {
	async fn load(&self, id: &str) -> Result<Option<SessionRecord>> {
		let path = self.path(id)?;
		match fs::read(&path).await {
			Ok(bytes) => Ok(Some(self.serializer.deserialize(&bytes)?)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn store(&self, id: &str, record: &SessionRecord) -> Result<()> {
		let path = self.path(id)?;
		let bytes = self.serializer.serialize(record)?;

		fs::create_dir_all(&self.dir).await?;
		let tmp = self.dir.join(format!(
			".{}{}.{}.tmp",
			self.namespace,
			id,
			Uuid::new_v4().simple()
		));
		fs::write(&tmp, &bytes).await?;
		if let Err(e) = fs::rename(&tmp, &path).await {
			let _ = fs::remove_file(&tmp).await;
			return Err(e.into());
		}
		Ok(())
	}

	async fn destroy(&self, id: &str) -> Result<()> {
		let path = self.path(id)?;
		remove_if_present(&path).await
	}

	async fn exists(&self, id: &str) -> Result<bool> {
		let path = self.path(id)?;
		Ok(fs::try_exists(&path).await?)
	}
}
