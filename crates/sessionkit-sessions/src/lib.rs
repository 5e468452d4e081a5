//! # sessionkit-sessions
//!
//! Server-side session lifecycle management with flash data.
//!
//! ## Features
//!
//! - **Create or resume**: a session is loaded from the client's session ID or
//!   allocated fresh on every request
//! - **Validation**: sessions are bound to the user agent that created them and
//!   expire after a sliding idle window
//! - **ID rotation**: the session ID is replaced on a fixed interval while the
//!   data is preserved; the old ID stays resolvable for a short grace window
//! - **Flash data**: values that survive exactly one request after the one that
//!   set them, with opt-in retention
//! - **Pluggable storage**: in-memory and file backends behind [`SessionBackend`]
//! - **Pluggable transport**: cookie handling behind [`SessionTransport`]
//!
//! ## Quick Start
//!
//! ```rust
//! use sessionkit_conf::SessionSettings;
//! use sessionkit_sessions::{InMemorySessionBackend, MemoryTransport, SessionManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SessionSettings::default();
//! let manager = SessionManager::new(InMemorySessionBackend::from_settings(&settings), settings);
//!
//! let mut request = MemoryTransport::new("Mozilla/5.0");
//! let mut session = manager.start(&mut request).await?;
//! session.set_flash("notice", "Profile updated")?;
//! session.save().await?;
//!
//! let mut request = request.next_request();
//! let session = manager.start(&mut request).await?;
//! assert_eq!(session.flash::<String>("notice")?.as_deref(), Some("Profile updated"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`manager`]: the per-request initialization state machine
//! - [`session`]: the per-request session context handed to application code
//! - [`record`]: the persisted record and its validation rules
//! - [`flash`]: flash entry phases and aging
//! - [`backends`]: storage backends
//! - [`transport`]: session ID transport (cookies)
//! - [`analytics`]: lifecycle events, logged through `tracing` by default
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `http-transport` | enabled | Cookie transport over `http::HeaderMap` |
//! | `file-backend` | enabled | One-file-per-session storage backend |

pub mod analytics;
pub mod backends;
pub mod clock;
pub mod error;
pub mod flash;
pub mod manager;
pub mod record;
pub mod serialization;
pub mod session;
pub mod transport;

pub use analytics::{LoggerAnalytics, SessionAnalytics, SessionEvent};
pub use backends::{InMemorySessionBackend, SessionBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, SessionError};
pub use flash::{FlashPhase, FlashStore};
pub use manager::SessionManager;
pub use record::{RejectionReason, SessionData, SessionId, SessionRecord};
pub use session::Session;
pub use transport::{CookieParams, MemoryTransport, SessionTransport};

#[cfg(feature = "file-backend")]
pub use backends::FileSessionBackend;
#[cfg(feature = "http-transport")]
pub use transport::HttpTransport;
