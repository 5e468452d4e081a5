//! Session error type

use crate::serialization::SerializationError;
use thiserror::Error;

/// Session errors
///
/// Storage failures are fatal for the request being initialized: the manager
/// never falls back to an unpersisted session.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("Backend error: {0}")]
	BackendError(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	SerializationError(#[from] SerializationError),
	#[error("Session not found: {0}")]
	NotFound(String),
	#[error("Invalid session id: {0:?}")]
	InvalidId(String),
	#[error("Transport error: {0}")]
	Transport(String),
}

/// Result alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
