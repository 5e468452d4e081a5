//! Cookie transport over `http` headers

use super::{CookieParams, SessionTransport};
use crate::error::{Result, SessionError};
use crate::record::SessionId;
use ::http::header::{COOKIE, HOST, SET_COOKIE, USER_AGENT};
use ::http::{HeaderMap, HeaderValue};
use sessionkit_conf::SessionSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outgoing {
	Set(SessionId),
	Clear,
}

/// Session transport backed by request and response headers
///
/// Reads the session cookie, `User-Agent` and `Host` from the request headers
/// and renders the `Set-Cookie` header for the response. When no cookie domain
/// is configured, the request host (without port) is used, provided it is a
/// plain hostname or a bracketed IPv6 literal. Until the manager configures
/// it, the transport uses the cookie name and attributes of
/// [`SessionSettings::default`].
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use http::header::{COOKIE, USER_AGENT};
/// use sessionkit_sessions::transport::{HttpTransport, SessionTransport};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(COOKIE, "theme=dark; session=abc123".parse().unwrap());
/// headers.insert(USER_AGENT, "Mozilla/5.0".parse().unwrap());
///
/// let mut transport = HttpTransport::from_headers(&headers);
/// transport.set_name("session");
/// assert_eq!(transport.current_id().as_deref(), Some("abc123"));
/// assert_eq!(transport.user_agent(), Some("Mozilla/5.0"));
///
/// transport.set_id("def456");
/// let cookie = transport.set_cookie_header().unwrap();
/// assert!(cookie.starts_with("session=def456"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
	cookies: Vec<(String, String)>,
	user_agent: Option<String>,
	host: Option<String>,
	name: String,
	params: CookieParams,
	outgoing: Option<Outgoing>,
}

impl HttpTransport {
	/// Capture what the transport needs from the request headers
	pub fn from_headers(headers: &HeaderMap) -> Self {
		let cookies = headers
			.get_all(COOKIE)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(';'))
			.filter_map(|pair| {
				let (name, value) = pair.trim().split_once('=')?;
				Some((name.trim().to_string(), value.trim().to_string()))
			})
			.collect();

		let user_agent = headers
			.get(USER_AGENT)
			.and_then(|value| value.to_str().ok())
			.map(str::to_string);

		let host = headers
			.get(HOST)
			.and_then(|value| value.to_str().ok())
			.map(host_without_port)
			.filter(|host| is_cookie_domain(host));

		let defaults = SessionSettings::default();
		Self {
			cookies,
			user_agent,
			host,
			params: CookieParams::from_settings(&defaults),
			name: defaults.session_name,
			outgoing: None,
		}
	}

	/// `Set-Cookie` value for the response, if the session ID changed hands
	pub fn set_cookie_header(&self) -> Option<String> {
		let (value, max_age) = match self.outgoing.as_ref()? {
			Outgoing::Set(id) => (id.as_str(), self.params.lifetime),
			Outgoing::Clear => ("", 0),
		};

		let mut parts = vec![format!("{}={}", self.name, value)];

		parts.push(format!("Path={}", self.params.path));

		if let Some(domain) = self.params.domain.as_ref().or(self.host.as_ref()) {
			parts.push(format!("Domain={}", domain));
		}

		if self.params.http_only {
			parts.push("HttpOnly".to_string());
		}

		if self.params.secure {
			parts.push("Secure".to_string());
		}

		parts.push(format!("Max-Age={}", max_age));

		Some(parts.join("; "))
	}

	/// Append the `Set-Cookie` header to `headers`, if there is one
	pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
		if let Some(cookie) = self.set_cookie_header() {
			let value = HeaderValue::from_str(&cookie).map_err(|e| {
				SessionError::Transport(format!("Failed to create cookie header: {}", e))
			})?;
			headers.append(SET_COOKIE, value);
		}
		Ok(())
	}
}

impl SessionTransport for HttpTransport {
	fn user_agent(&self) -> Option<&str> {
		self.user_agent.as_deref()
	}

	fn current_id(&self) -> Option<SessionId> {
		self.cookies
			.iter()
			.find(|(name, _)| *name == self.name)
			.map(|(_, value)| value.clone())
	}

	fn set_params(&mut self, params: CookieParams) {
		self.params = params;
	}

	fn set_name(&mut self, name: &str) {
		self.name = name.to_string();
	}

	fn set_id(&mut self, id: &str) {
		self.outgoing = Some(Outgoing::Set(id.to_string()));
	}

	fn clear_id(&mut self) {
		self.outgoing = Some(Outgoing::Clear);
	}
}

fn host_without_port(host: &str) -> String {
	let host = host.trim();
	if let Some(rest) = host.strip_prefix('[') {
		// IPv6 literal
		return match rest.split_once(']') {
			Some((addr, _)) => format!("[{}]", addr),
			None => host.to_string(),
		};
	}
	host.split(':').next().unwrap_or(host).to_string()
}

/// Whether a request host can be echoed into the `Domain` attribute
fn is_cookie_domain(host: &str) -> bool {
	if let Some(addr) = host.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
		return !addr.is_empty()
			&& addr
				.bytes()
				.all(|b| b.is_ascii_hexdigit() || b == b':' || b == b'.');
	}
	!host.is_empty()
		&& host
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn headers(pairs: &[(::http::header::HeaderName, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			map.append(name.clone(), HeaderValue::from_str(value).unwrap());
		}
		map
	}

	fn params() -> CookieParams {
		CookieParams {
			lifetime: 3600,
			path: "/app".to_string(),
			domain: None,
			secure: true,
			http_only: true,
		}
	}

	#[rstest]
	fn test_reads_named_cookie() {
		let mut transport =
			HttpTransport::from_headers(&headers(&[(COOKIE, "a=1; sid=xyz; b=2")]));

		assert_eq!(transport.current_id(), None);
		transport.set_name("sid");
		assert_eq!(transport.current_id().as_deref(), Some("xyz"));
	}

	#[rstest]
	fn test_reads_cookie_across_multiple_headers() {
		let transport = HttpTransport::from_headers(&headers(&[
			(COOKIE, "theme=dark"),
			(COOKIE, "session=abc"),
		]));

		assert_eq!(transport.current_id().as_deref(), Some("abc"));
	}

	#[rstest]
	fn test_missing_headers() {
		let transport = HttpTransport::from_headers(&HeaderMap::new());

		assert_eq!(transport.current_id(), None);
		assert_eq!(transport.user_agent(), None);
		assert_eq!(transport.set_cookie_header(), None);
	}

	#[rstest]
	fn test_set_cookie_uses_host_as_domain() {
		// Arrange
		let mut transport = HttpTransport::from_headers(&headers(&[(HOST, "shop.example.com:8443")]));
		transport.set_params(params());

		// Act
		transport.set_id("abc");

		// Assert
		assert_eq!(
			transport.set_cookie_header().unwrap(),
			"session=abc; Path=/app; Domain=shop.example.com; HttpOnly; Secure; Max-Age=3600"
		);
	}

	#[rstest]
	fn test_configured_domain_wins_over_host() {
		let mut transport = HttpTransport::from_headers(&headers(&[(HOST, "shop.example.com")]));
		transport.set_params(CookieParams {
			domain: Some("example.com".to_string()),
			secure: false,
			http_only: false,
			..params()
		});

		transport.set_id("abc");

		assert_eq!(
			transport.set_cookie_header().unwrap(),
			"session=abc; Path=/app; Domain=example.com; Max-Age=3600"
		);
	}

	#[rstest]
	fn test_clear_expires_cookie() {
		let mut transport = HttpTransport::from_headers(&HeaderMap::new());
		transport.set_params(params());
		transport.set_name("sid");

		transport.clear_id();

		assert_eq!(
			transport.set_cookie_header().unwrap(),
			"sid=; Path=/app; HttpOnly; Secure; Max-Age=0"
		);
	}

	#[rstest]
	fn test_apply_appends_set_cookie() {
		let mut transport = HttpTransport::from_headers(&HeaderMap::new());
		transport.set_id("abc");
		let mut response = HeaderMap::new();

		transport.apply(&mut response).unwrap();

		let cookie = response.get(SET_COOKIE).unwrap().to_str().unwrap();
		assert!(cookie.starts_with("session=abc; Path=/"));
	}

	#[rstest]
	#[case("example.com", "example.com")]
	#[case("example.com:8080", "example.com")]
	#[case("[::1]:8080", "[::1]")]
	#[case("127.0.0.1:3000", "127.0.0.1")]
	fn test_host_without_port(#[case] host: &str, #[case] expected: &str) {
		assert_eq!(host_without_port(host), expected);
	}

	#[rstest]
	#[case::attribute_injection("evil.com;Secure")]
	#[case::space("evil.com Secure")]
	#[case::comma("a.com,b.com")]
	#[case::unterminated_ipv6("[::1")]
	#[case::ipv6_garbage("[::1;x]")]
	fn test_unsafe_host_is_not_echoed(#[case] host: &str) {
		// Arrange
		let mut transport = HttpTransport::from_headers(&headers(&[(HOST, host)]));
		transport.set_params(params());

		// Act
		transport.set_id("abc");

		// Assert
		assert_eq!(
			transport.set_cookie_header().unwrap(),
			"session=abc; Path=/app; HttpOnly; Secure; Max-Age=3600"
		);
	}

	#[rstest]
	#[case("shop-1.example.com", true)]
	#[case("[::1]", true)]
	#[case("[2001:db8::1]", true)]
	#[case("", false)]
	#[case("[]", false)]
	#[case("evil.com;Secure", false)]
	fn test_is_cookie_domain(#[case] host: &str, #[case] expected: bool) {
		assert_eq!(is_cookie_domain(host), expected);
	}

	#[rstest]
	fn test_defaults_follow_settings() {
		let defaults = SessionSettings::default();
		let cookie = format!("{}=abc", defaults.session_name);
		let mut transport = HttpTransport::from_headers(&headers(&[(COOKIE, cookie.as_str())]));

		transport.set_id("def");

		assert_eq!(transport.current_id().as_deref(), Some("abc"));
		assert_eq!(
			transport.set_cookie_header().unwrap(),
			format!(
				"{}=def; Path={}; HttpOnly; Max-Age={}",
				defaults.session_name, defaults.cookie_path, defaults.expiry_seconds
			)
		);
	}
}
