//! Session ID transport
//!
//! The session manager does not know about cookies. It talks to a
//! [`SessionTransport`], which reports the client's session ID and user agent
//! and carries the resulting ID back to the client.
//!
//! [`HttpTransport`] (feature `http-transport`) implements this over
//! `http::HeaderMap` cookies.

use crate::record::SessionId;
use sessionkit_conf::SessionSettings;

#[cfg(feature = "http-transport")]
pub mod cookie;
#[cfg(feature = "http-transport")]
pub use cookie::HttpTransport;

/// Cookie attributes the manager configures on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieParams {
	/// Cookie lifetime in seconds
	pub lifetime: u64,
	pub path: String,
	/// Cookie domain; `None` lets the transport decide
	pub domain: Option<String>,
	pub secure: bool,
	pub http_only: bool,
}

impl CookieParams {
	pub fn from_settings(settings: &SessionSettings) -> Self {
		Self {
			lifetime: settings.expiry_seconds,
			path: settings.cookie_path.clone(),
			domain: settings.cookie_domain.clone(),
			secure: settings.secure,
			http_only: settings.http_only,
		}
	}
}

/// Carrier for the session ID between client and server
pub trait SessionTransport {
	/// The request's user agent, if it sent one
	fn user_agent(&self) -> Option<&str>;

	/// Session ID presented by the client under the configured name
	fn current_id(&self) -> Option<SessionId>;

	/// Configure the cookie attributes used when sending the ID back
	fn set_params(&mut self, params: CookieParams);

	/// Configure the name the ID is carried under
	fn set_name(&mut self, name: &str);

	/// Send `id` back to the client
	fn set_id(&mut self, id: &str);

	/// Tell the client to forget its session ID
	fn clear_id(&mut self);
}

/// Transport that records what the manager did, for tests and non-HTTP callers
///
/// # Examples
///
/// ```
/// use sessionkit_sessions::transport::{MemoryTransport, SessionTransport};
///
/// let mut transport = MemoryTransport::new("test-agent");
/// assert_eq!(transport.current_id(), None);
///
/// transport.set_id("abc");
/// assert_eq!(transport.issued_id(), Some("abc"));
///
/// // The next request carries the ID that was issued
/// let next = transport.next_request();
/// assert_eq!(next.current_id().as_deref(), Some("abc"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
	user_agent: Option<String>,
	incoming_id: Option<SessionId>,
	name: Option<String>,
	params: Option<CookieParams>,
	issued: Option<SessionId>,
	cleared: bool,
}

impl MemoryTransport {
	/// Request from `user_agent` without a session ID
	pub fn new(user_agent: impl Into<String>) -> Self {
		Self {
			user_agent: Some(user_agent.into()),
			..Self::default()
		}
	}

	/// Request without a user agent header
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Present `id` as the client's session ID
	pub fn with_id(mut self, id: impl Into<SessionId>) -> Self {
		self.incoming_id = Some(id.into());
		self
	}

	/// Replace the user agent
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	/// A follow-up request from the same client
	///
	/// Carries the ID issued by this request, or no ID if it was cleared.
	pub fn next_request(&self) -> Self {
		let incoming_id = if self.cleared && self.issued.is_none() {
			None
		} else {
			self.issued.clone().or_else(|| self.incoming_id.clone())
		};
		Self {
			user_agent: self.user_agent.clone(),
			incoming_id,
			..Self::default()
		}
	}

	/// ID most recently sent back to the client
	pub fn issued_id(&self) -> Option<&str> {
		self.issued.as_deref()
	}

	/// Whether the client was told to forget its ID and no new ID followed
	pub fn is_cleared(&self) -> bool {
		self.cleared && self.issued.is_none()
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn params(&self) -> Option<&CookieParams> {
		self.params.as_ref()
	}
}

impl SessionTransport for MemoryTransport {
	fn user_agent(&self) -> Option<&str> {
		self.user_agent.as_deref()
	}

	fn current_id(&self) -> Option<SessionId> {
		self.incoming_id.clone()
	}

	fn set_params(&mut self, params: CookieParams) {
		self.params = Some(params);
	}

	fn set_name(&mut self, name: &str) {
		self.name = Some(name.to_string());
	}

	fn set_id(&mut self, id: &str) {
		self.issued = Some(id.to_string());
	}

	fn clear_id(&mut self) {
		self.issued = None;
		self.cleared = true;
	}
}
