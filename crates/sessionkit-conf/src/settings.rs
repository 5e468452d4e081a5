//! Session settings
//!
//! [`SessionSettings`] is the configuration surface recognised by the session
//! manager: cookie attributes, expiry and rotation intervals, and the storage
//! namespace.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Prefix used by [`SessionSettings::with_env_overrides`]
pub const DEFAULT_ENV_PREFIX: &str = "SESSIONKIT_";

/// Upper bound for every duration setting (ten years)
const MAX_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Error type for loading and validating settings
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid value for environment variable {key}: {value:?}")]
	InvalidEnv { key: String, value: String },

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

/// Session settings
///
/// # Examples
///
/// ```
/// use sessionkit_conf::SessionSettings;
///
/// let settings = SessionSettings::default();
/// assert_eq!(settings.session_key, "__cgit_session_");
/// assert_eq!(settings.session_name, "session");
/// assert!(settings.http_only);
/// assert!(!settings.secure);
/// assert_eq!(settings.expiry_seconds, 7200);
/// assert_eq!(settings.regenerate_seconds, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
	/// Namespace prepended to every session ID in the storage backend
	pub session_key: String,
	/// Mark the session cookie HttpOnly
	pub http_only: bool,
	/// Mark the session cookie Secure (set when serving over TLS)
	pub secure: bool,
	/// Sliding session lifetime in seconds
	pub expiry_seconds: u64,
	/// Interval in seconds after which the session ID is rotated
	pub regenerate_seconds: u64,
	/// Cookie name carrying the session ID; alphanumeric only
	pub session_name: String,
	/// Cookie path
	pub cookie_path: String,
	/// Cookie domain; when unset the transport uses the request host
	pub cookie_domain: Option<String>,
	/// How long a rotated-away ID stays resolvable, in seconds
	pub rotation_grace_seconds: u64,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			session_key: "__cgit_session_".to_string(),
			http_only: true,
			secure: false,
			expiry_seconds: 7200,
			regenerate_seconds: 300,
			session_name: "session".to_string(),
			cookie_path: "/".to_string(),
			cookie_domain: None,
			rotation_grace_seconds: 60,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
	#[serde(default)]
	session: SessionSettings,
}

impl SessionSettings {
	/// Parse settings from the `[session]` table of a TOML document
	///
	/// Missing keys keep their defaults. The result is validated.
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		let file: SettingsFile = toml::from_str(source)?;
		file.session.validate()?;
		Ok(file.session)
	}

	/// Read and parse a TOML settings file
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let content = fs::read_to_string(path)?;
		Self::from_toml_str(&content)
	}

	/// Overlay values from the process environment
	///
	/// Variables are named after the fields, upper-cased, behind `prefix`
	/// (`SESSIONKIT_EXPIRY_SECONDS`, `SESSIONKIT_SECURE`, ...).
	pub fn with_env_overrides(self, prefix: &str) -> Result<Self, SettingsError> {
		self.with_overrides(prefix, std::env::vars())
	}

	/// Overlay values from an arbitrary variable source
	///
	/// # Examples
	///
	/// ```
	/// use sessionkit_conf::SessionSettings;
	///
	/// let vars = vec![
	///     ("APP_SECURE".to_string(), "on".to_string()),
	///     ("APP_EXPIRY_SECONDS".to_string(), "900".to_string()),
	///     ("OTHER_SECURE".to_string(), "off".to_string()),
	/// ];
	/// let settings = SessionSettings::default().with_overrides("APP_", vars).unwrap();
	/// assert!(settings.secure);
	/// assert_eq!(settings.expiry_seconds, 900);
	/// ```
	pub fn with_overrides<I>(mut self, prefix: &str, vars: I) -> Result<Self, SettingsError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		for (key, value) in vars {
			let Some(name) = key.strip_prefix(prefix) else {
				continue;
			};

			match name.to_lowercase().as_str() {
				"session_key" => self.session_key = value,
				"http_only" => self.http_only = parse_bool(&key, &value)?,
				"secure" => self.secure = parse_bool(&key, &value)?,
				"expiry_seconds" => self.expiry_seconds = parse_seconds(&key, &value)?,
				"regenerate_seconds" => self.regenerate_seconds = parse_seconds(&key, &value)?,
				"session_name" => self.session_name = value,
				"cookie_path" => self.cookie_path = value,
				"cookie_domain" => {
					let trimmed = value.trim();
					self.cookie_domain = (!trimmed.is_empty()).then(|| trimmed.to_string());
				}
				"rotation_grace_seconds" => {
					self.rotation_grace_seconds = parse_seconds(&key, &value)?
				}
				_ => {}
			}
		}

		self.validate()?;
		Ok(self)
	}

	/// Check the settings for values the session manager cannot work with
	///
	/// # Examples
	///
	/// ```
	/// use sessionkit_conf::SessionSettings;
	///
	/// let mut settings = SessionSettings::default();
	/// assert!(settings.validate().is_ok());
	///
	/// settings.session_name = "my-session".to_string();
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.session_name.is_empty()
			|| !self.session_name.chars().all(|c| c.is_ascii_alphanumeric())
		{
			return Err(SettingsError::Invalid(format!(
				"session_name must be non-empty and alphanumeric, got {:?}",
				self.session_name
			)));
		}

		if !self.cookie_path.starts_with('/') {
			return Err(SettingsError::Invalid(format!(
				"cookie_path must start with '/', got {:?}",
				self.cookie_path
			)));
		}

		for (name, value) in [
			("expiry_seconds", self.expiry_seconds),
			("regenerate_seconds", self.regenerate_seconds),
		] {
			if value == 0 || value > MAX_SECONDS {
				return Err(SettingsError::Invalid(format!(
					"{} must be between 1 and {}, got {}",
					name, MAX_SECONDS, value
				)));
			}
		}

		if self.rotation_grace_seconds > MAX_SECONDS {
			return Err(SettingsError::Invalid(format!(
				"rotation_grace_seconds must not exceed {}, got {}",
				MAX_SECONDS, self.rotation_grace_seconds
			)));
		}

		if self.regenerate_seconds > self.expiry_seconds {
			return Err(SettingsError::Invalid(format!(
				"regenerate_seconds ({}) must not exceed expiry_seconds ({})",
				self.regenerate_seconds, self.expiry_seconds
			)));
		}

		Ok(())
	}

	/// Session lifetime
	pub fn expiry(&self) -> Duration {
		Duration::from_secs(self.expiry_seconds)
	}

	/// Interval between ID rotations
	pub fn regenerate_interval(&self) -> Duration {
		Duration::from_secs(self.regenerate_seconds)
	}

	/// Window during which a rotated-away ID still resolves
	pub fn rotation_grace(&self) -> Duration {
		Duration::from_secs(self.rotation_grace_seconds)
	}
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		_ => Err(SettingsError::InvalidEnv {
			key: key.to_string(),
			value: value.to_string(),
		}),
	}
}

fn parse_seconds(key: &str, value: &str) -> Result<u64, SettingsError> {
	value
		.trim()
		.parse::<u64>()
		.map_err(|_| SettingsError::InvalidEnv {
			key: key.to_string(),
			value: value.to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_defaults_are_valid() {
		// Arrange
		let settings = SessionSettings::default();

		// Act
		let result = settings.validate();

		// Assert
		assert!(result.is_ok());
		assert_eq!(settings.cookie_path, "/");
		assert_eq!(settings.cookie_domain, None);
		assert_eq!(settings.rotation_grace_seconds, 60);
	}

	#[rstest]
	fn test_from_toml_str_keeps_defaults_for_missing_keys() {
		// Arrange
		let source = r#"
			[session]
			secure = true
			cookie_domain = "example.com"
		"#;

		// Act
		let settings = SessionSettings::from_toml_str(source).unwrap();

		// Assert
		assert!(settings.secure);
		assert_eq!(settings.cookie_domain.as_deref(), Some("example.com"));
		assert_eq!(settings.expiry_seconds, 7200);
		assert_eq!(settings.session_name, "session");
	}

	#[rstest]
	fn test_from_toml_str_without_session_table() {
		let settings = SessionSettings::from_toml_str("").unwrap();
		assert_eq!(settings, SessionSettings::default());
	}

	#[rstest]
	fn test_from_toml_str_rejects_bad_syntax() {
		let result = SessionSettings::from_toml_str("[session\nsecure = ");
		assert!(matches!(result, Err(SettingsError::Toml(_))));
	}

	#[rstest]
	fn test_from_toml_str_validates() {
		let result = SessionSettings::from_toml_str("[session]\nregenerate_seconds = 9000");
		assert!(matches!(result, Err(SettingsError::Invalid(_))));
	}

	#[rstest]
	fn test_from_file() {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[session]\nsession_name = \"shop\"\nhttp_only = false").unwrap();

		// Act
		let settings = SessionSettings::from_file(file.path()).unwrap();

		// Assert
		assert_eq!(settings.session_name, "shop");
		assert!(!settings.http_only);
	}

	#[rstest]
	fn test_from_file_missing() {
		let result = SessionSettings::from_file("/nonexistent/sessionkit.toml");
		assert!(matches!(result, Err(SettingsError::Io(_))));
	}

	#[rstest]
	#[case("true", true)]
	#[case("1", true)]
	#[case("YES", true)]
	#[case("on", true)]
	#[case("false", false)]
	#[case("0", false)]
	#[case("no", false)]
	#[case("Off", false)]
	fn test_override_bool_spellings(#[case] raw: &str, #[case] expected: bool) {
		let settings = SessionSettings::default()
			.with_overrides("T_", vars(&[("T_SECURE", raw)]))
			.unwrap();
		assert_eq!(settings.secure, expected);
	}

	#[rstest]
	fn test_override_all_fields() {
		// Arrange
		let source = vars(&[
			("T_SESSION_KEY", "__app_"),
			("T_HTTP_ONLY", "false"),
			("T_EXPIRY_SECONDS", "600"),
			("T_REGENERATE_SECONDS", "60"),
			("T_SESSION_NAME", "sid"),
			("T_COOKIE_PATH", "/app"),
			("T_COOKIE_DOMAIN", "example.org"),
			("T_ROTATION_GRACE_SECONDS", "5"),
			("UNRELATED", "x"),
		]);

		// Act
		let settings = SessionSettings::default()
			.with_overrides("T_", source)
			.unwrap();

		// Assert
		assert_eq!(settings.session_key, "__app_");
		assert!(!settings.http_only);
		assert_eq!(settings.expiry_seconds, 600);
		assert_eq!(settings.regenerate_seconds, 60);
		assert_eq!(settings.session_name, "sid");
		assert_eq!(settings.cookie_path, "/app");
		assert_eq!(settings.cookie_domain.as_deref(), Some("example.org"));
		assert_eq!(settings.rotation_grace_seconds, 5);
	}

	#[rstest]
	fn test_override_empty_domain_clears_it() {
		let mut base = SessionSettings::default();
		base.cookie_domain = Some("example.com".to_string());

		let settings = base
			.with_overrides("T_", vars(&[("T_COOKIE_DOMAIN", "  ")]))
			.unwrap();

		assert_eq!(settings.cookie_domain, None);
	}

	#[rstest]
	#[case("T_SECURE", "maybe")]
	#[case("T_EXPIRY_SECONDS", "-5")]
	#[case("T_REGENERATE_SECONDS", "soon")]
	fn test_override_rejects_unparseable(#[case] key: &str, #[case] value: &str) {
		let result = SessionSettings::default().with_overrides("T_", vars(&[(key, value)]));
		match result {
			Err(SettingsError::InvalidEnv { key: k, value: v }) => {
				assert_eq!(k, key);
				assert_eq!(v, value);
			}
			other => panic!("expected InvalidEnv, got {:?}", other),
		}
	}

	#[rstest]
	#[case("")]
	#[case("my-session")]
	#[case("sess id")]
	fn test_validate_rejects_bad_session_name(#[case] name: &str) {
		let settings = SessionSettings {
			session_name: name.to_string(),
			..SessionSettings::default()
		};
		assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
	}

	#[rstest]
	fn test_validate_rejects_zero_expiry() {
		let settings = SessionSettings {
			expiry_seconds: 0,
			..SessionSettings::default()
		};
		assert!(settings.validate().is_err());
	}

	#[rstest]
	fn test_validate_rejects_relative_cookie_path() {
		let settings = SessionSettings {
			cookie_path: "app".to_string(),
			..SessionSettings::default()
		};
		assert!(settings.validate().is_err());
	}

	#[rstest]
	fn test_duration_accessors() {
		let settings = SessionSettings::default();
		assert_eq!(settings.expiry(), Duration::from_secs(7200));
		assert_eq!(settings.regenerate_interval(), Duration::from_secs(300));
		assert_eq!(settings.rotation_grace(), Duration::from_secs(60));
	}
}
