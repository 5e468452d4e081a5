//! Session Property-Based Tests
//!
//! Properties that must hold for any agent string and any request timing.
//!
//! # Properties Tested
//!
//! - Validation is idempotent inside the expiry window
//! - A different user agent is always rejected
//! - Sliding expiry keeps a continuously used session alive
//! - Flash values are readable in exactly one later request
//! - Client-supplied IDs outside the allowed alphabet never reach storage

use chrono::{TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use sessionkit_conf::SessionSettings;
use sessionkit_sessions::backends::{InMemorySessionBackend, is_valid_session_id};
use sessionkit_sessions::clock::ManualClock;
use sessionkit_sessions::flash::FlashStore;
use sessionkit_sessions::manager::SessionManager;
use sessionkit_sessions::record::SessionRecord;
use sessionkit_sessions::transport::MemoryTransport;

// =============================================================================
// Strategy Definitions
// =============================================================================

/// Strategy for generating user agent strings, including the empty one
fn agent_strategy() -> impl Strategy<Value = String> {
	prop::string::string_regex("[ -~]{0,80}").expect("Valid regex for agent")
}

/// Strategy for offsets inside a 7200s expiry window
fn offset_strategy() -> impl Strategy<Value = i64> {
	0i64..=7200
}

fn runtime() -> tokio::runtime::Runtime {
	tokio::runtime::Builder::new_current_thread()
		.build()
		.expect("Runtime should build")
}

// =============================================================================
// Property Tests - Validation
// =============================================================================

proptest! {
	/// Property: two validations inside the expiry window both succeed
	#[test]
	fn test_validation_is_idempotent(
		agent in agent_strategy(),
		first in offset_strategy(),
		second in offset_strategy(),
	) {
		let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let record = SessionRecord::new(
			agent.clone(),
			start,
			TimeDelta::seconds(7200),
			TimeDelta::seconds(300),
		);

		prop_assert!(record.is_valid(&agent, start + TimeDelta::seconds(first)));
		prop_assert!(record.is_valid(&agent, start + TimeDelta::seconds(second)));
	}

	/// Property: any other agent string is rejected
	#[test]
	fn test_agent_mismatch_always_rejected(
		agent in agent_strategy(),
		other in agent_strategy(),
		offset in offset_strategy(),
	) {
		prop_assume!(agent != other);
		let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let record = SessionRecord::new(
			agent,
			start,
			TimeDelta::seconds(7200),
			TimeDelta::seconds(300),
		);

		prop_assert!(!record.is_valid(&other, start + TimeDelta::seconds(offset)));
	}

	/// Property: a session used at least once per expiry window keeps its data
	#[test]
	fn test_sliding_expiry_keeps_session(
		gaps in prop::collection::vec(1i64..=7200, 1..8),
	) {
		let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
		let manager = SessionManager::new(InMemorySessionBackend::new(), SessionSettings::default())
			.with_clock(clock.clone());

		runtime().block_on(async {
			let mut transport = MemoryTransport::new("agent");
			let mut session = manager.start(&mut transport).await.unwrap();
			session.set("user_id", 99).unwrap();
			session.save().await.unwrap();

			for gap in gaps {
				clock.advance_secs(gap);
				transport = transport.next_request();
				let session = manager.start(&mut transport).await.unwrap();
				prop_assert_eq!(session.get::<i64>("user_id").unwrap(), Some(99));
			}
			Ok(())
		})?;
	}

	/// Property: after N request boundaries a flash value was readable exactly once
	#[test]
	fn test_flash_readable_exactly_once(boundaries in 1usize..10) {
		let mut flash = FlashStore::new();
		flash.set("notice", serde_json::json!("hi"));

		let mut reads = 0;
		for _ in 0..boundaries {
			flash.sweep();
			flash.mark();
			if flash.get("notice").is_some() {
				reads += 1;
			}
		}

		prop_assert_eq!(reads, 1);
	}

	/// Property: malformed client IDs are replaced, never looked up or stored
	#[test]
	fn test_malformed_ids_never_stored(id in ".{0,200}") {
		prop_assume!(!is_valid_session_id(&id));
		let backend = InMemorySessionBackend::new();
		let manager = SessionManager::new(backend.clone(), SessionSettings::default());

		let issued = runtime().block_on(async {
			let mut transport = MemoryTransport::new("agent").with_id(id.clone());
			manager.start(&mut transport).await.unwrap().id().unwrap().to_string()
		});

		prop_assert_ne!(&issued, &id);
		prop_assert_eq!(backend.ids(), vec![issued]);
	}
}
