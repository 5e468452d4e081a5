//! End-to-end tests over `http` headers
//!
//! Each request is a `HeaderMap`; the `Set-Cookie` header of one response is
//! turned into the `Cookie` header of the next request, the way a browser would.

#![cfg(all(feature = "http-transport", feature = "file-backend"))]


use fixtures::*;
use http::HeaderMap;
use http::header::{COOKIE, HOST, SET_COOKIE, USER_AGENT};
use rstest::rstest;
use sessionkit_conf::SessionSettings;
use sessionkit_sessions::backends::{FileSessionBackend, SessionBackend};
use sessionkit_sessions::clock::ManualClock;
use sessionkit_sessions::manager::SessionManager;
use sessionkit_sessions::transport::HttpTransport;

fn request_headers(cookie: Option<&str>) -> HeaderMap {
	let mut headers = HeaderMap::new();
	headers.insert(USER_AGENT, AGENT.parse().unwrap());
	headers.insert(HOST, "shop.example.com:8080".parse().unwrap());
	if let Some(cookie) = cookie {
		headers.insert(COOKIE, cookie.parse().unwrap());
	}
	headers
}

/// `name=value` pair of a `Set-Cookie` header
fn cookie_pair(response: &HeaderMap) -> String {
	let set_cookie = response.get(SET_COOKIE).unwrap().to_str().unwrap();
	set_cookie.split(';').next().unwrap().to_string()
}

#[rstest]
#[tokio::test]
async fn test_cookie_round_trip_with_file_backend() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let settings = SessionSettings {
		session_name: "shop".to_string(),
		secure: true,
		..SessionSettings::default()
	};
	let backend = FileSessionBackend::from_settings(dir.path(), &settings);
	let clock = ManualClock::new(epoch());
	let manager = SessionManager::new(backend.clone(), settings).with_clock(clock.clone());

	// Act: first request, no cookie
	let mut transport = HttpTransport::from_headers(&request_headers(None));
	let mut session = manager.start(&mut transport).await.unwrap();
	session.set("user_id", 42).unwrap();
	session.set_flash("notice", "Signed in").unwrap();
	session.save().await.unwrap();
	let mut response = HeaderMap::new();
	transport.apply(&mut response).unwrap();

	// Assert
	let set_cookie = response.get(SET_COOKIE).unwrap().to_str().unwrap();
	let id = session.id().unwrap();
	assert_eq!(
		set_cookie,
		format!("shop={id}; Path=/; Domain=shop.example.com; HttpOnly; Secure; Max-Age=7200")
	);
	assert!(backend.exists(id).await.unwrap());

	// Act: second request sends the cookie back
	clock.advance_secs(10);
	let cookie = format!("theme=dark; {}", cookie_pair(&response));
	let mut transport = HttpTransport::from_headers(&request_headers(Some(&cookie)));
	let session = manager.start(&mut transport).await.unwrap();

	// Assert
	assert_eq!(session.get::<i64>("user_id").unwrap(), Some(42));
	assert_eq!(
		session.flash::<String>("notice").unwrap().as_deref(),
		Some("Signed in")
	);
}

#[rstest]
#[tokio::test]
async fn test_logout_expires_cookie() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let settings = SessionSettings::default();
	let backend = FileSessionBackend::from_settings(dir.path(), &settings);
	let manager = SessionManager::new(backend.clone(), settings);
	let mut transport = HttpTransport::from_headers(&request_headers(None));
	let mut session = manager.start(&mut transport).await.unwrap();
	let id = session.id().unwrap().to_string();

	// Act
	session.destroy(&mut transport).await.unwrap();
	let mut response = HeaderMap::new();
	transport.apply(&mut response).unwrap();

	// Assert
	let set_cookie = response.get(SET_COOKIE).unwrap().to_str().unwrap();
	assert!(set_cookie.starts_with("session=; "));
	assert!(set_cookie.ends_with("Max-Age=0"));
	assert!(!backend.exists(&id).await.unwrap());
}

#[rstest]
#[tokio::test]
async fn test_rotation_reissues_cookie() {
	// Arrange
	let dir = tempfile::tempdir().unwrap();
	let settings = SessionSettings::default();
	let backend = FileSessionBackend::from_settings(dir.path(), &settings);
	let clock = ManualClock::new(epoch());
	let manager = SessionManager::new(backend, settings).with_clock(clock.clone());
	let mut transport = HttpTransport::from_headers(&request_headers(None));
	manager.start(&mut transport).await.unwrap();
	let mut response = HeaderMap::new();
	transport.apply(&mut response).unwrap();
	let first_cookie = cookie_pair(&response);

	// Act
	clock.advance_secs(301);
	let mut transport = HttpTransport::from_headers(&request_headers(Some(&first_cookie)));
	manager.start(&mut transport).await.unwrap();
	let mut response = HeaderMap::new();
	transport.apply(&mut response).unwrap();

	// Assert
	assert_ne!(cookie_pair(&response), first_cookie);
}
