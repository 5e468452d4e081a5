//! Serialization of session records at the storage boundary
//!
//! Backends never persist Rust values directly: every record passes through a
//! [`Serializer`], so a record that cannot be encoded or decoded is rejected at
//! the boundary instead of leaking into request handling.
//!
//! ## Example
//!
//! ```rust
//! use sessionkit_sessions::serialization::{JsonSerializer, Serializer};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let serializer = JsonSerializer;
//!
//! let bytes = serializer.serialize(&json!({ "user_id": 42 }))?;
//! let restored: serde_json::Value = serializer.deserialize(&bytes)?;
//! assert_eq!(restored["user_id"], 42);
//! # Ok(())
//! # }
//! ```

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Serialization errors
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SerializationError {
	/// JSON serialization error
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// A stored value does not have the requested type
	#[error("Value for key {key:?} has an unexpected type: {source}")]
	TypeMismatch {
		key: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Serializer trait for storage formats
pub trait Serializer: Send + Sync {
	/// Serialize data to bytes
	fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, SerializationError>;

	/// Deserialize bytes to data
	fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError>;

	/// Short format name, used as the file extension by the file backend
	fn name(&self) -> &'static str;
}

/// JSON serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
	fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, SerializationError> {
		Ok(serde_json::to_vec(data)?)
	}

	fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError> {
		Ok(serde_json::from_slice(bytes)?)
	}

	fn name(&self) -> &'static str {
		"json"
	}
}
