//! # sessionkit-conf
//!
//! Settings for the sessionkit session manager.
//!
//! Settings are layered in priority order: environment variables > TOML file >
//! built-in defaults. Every field has a default, so an empty file (or no file at
//! all) yields a working configuration.
//!
//! ## Example
//!
//! ```rust
//! use sessionkit_conf::SessionSettings;
//!
//! let settings = SessionSettings::from_toml_str(
//!     r#"
//!     [session]
//!     session_name = "app"
//!     expiry_seconds = 3600
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.session_name, "app");
//! assert_eq!(settings.expiry_seconds, 3600);
//! assert_eq!(settings.regenerate_seconds, 300);
//! ```

pub mod settings;

pub use settings::{DEFAULT_ENV_PREFIX, SessionSettings, SettingsError};
