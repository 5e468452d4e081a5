//! # sessionkit
//!
//! Server-side session lifecycle management for web applications.
//!
//! sessionkit loads or creates a session on every request, binds it to the
//! client's user agent, expires it after a sliding idle window, rotates its
//! identifier on a fixed interval, and carries flash data across exactly one
//! request boundary.
//!
//! ## Feature Flags
//!
//! ### Presets
//!
//! - `minimal` - Session state machine with the in-memory backend
//! - `full` (default) - All features enabled
//!
//! ### Fine-grained Control
//!
//! - `conf` - TOML and environment settings loader
//! - `http-transport` - Cookie transport over `http::HeaderMap`
//! - `file-backend` - One-file-per-session storage
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "full")]
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sessionkit::prelude::*;
//!
//! let settings = SessionSettings::from_toml_str(
//!     r#"
//!     [session]
//!     session_name = "app"
//!     "#,
//! )?;
//! let manager = SessionManager::new(InMemorySessionBackend::from_settings(&settings), settings);
//!
//! let mut request = MemoryTransport::new("Mozilla/5.0");
//! let mut session = manager.start(&mut request).await?;
//! session.set("user_id", 42)?;
//! session.save().await?;
//!
//! assert_eq!(request.name(), Some("app"));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "full"))]
//! # fn main() {}
//! ```

#[cfg(feature = "conf")]
pub use sessionkit_conf as conf;

#[cfg(feature = "sessions")]
pub use sessionkit_sessions as sessions;

#[cfg(feature = "conf")]
pub use sessionkit_conf::{SessionSettings, SettingsError};

#[cfg(feature = "sessions")]
pub use sessionkit_sessions::{
	Session, SessionBackend, SessionError, SessionManager, SessionRecord, SessionTransport,
};

/// Commonly used types
pub mod prelude {
	#[cfg(feature = "conf")]
	pub use sessionkit_conf::SessionSettings;

	#[cfg(feature = "sessions")]
	pub use sessionkit_sessions::{
		InMemorySessionBackend, MemoryTransport, Session, SessionBackend, SessionError,
		SessionManager, SessionTransport,
	};

	#[cfg(feature = "file-backend")]
	pub use sessionkit_sessions::FileSessionBackend;

	#[cfg(feature = "http-transport")]
	pub use sessionkit_sessions::HttpTransport;
}
