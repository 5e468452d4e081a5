//! Flash data
//!
//! Flash values live for one request cycle after the one that set them:
//!
//! | request | action            | `get("msg")` |
//! |---------|-------------------|--------------|
//! | N       | `set("msg", ..)`  | `None`       |
//! | N + 1   |                   | `Some(..)`   |
//! | N + 2   |                   | `None`       |
//!
//! Each entry carries its [`FlashPhase`]. At the start of every request the
//! session manager runs [`FlashStore::sweep`] (drop `Old` entries) and then
//! [`FlashStore::mark`] (promote `New` entries to `Old`). Reading never
//! deletes: an `Old` value stays readable for the whole request it was
//! promoted into. [`FlashStore::keep`] re-arms an `Old` value as `New` so it
//! survives one more cycle.
//!
//! Running `mark` before `sweep` would delete values before they are ever
//! read, so the order is fixed inside the manager.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Visibility phase of a flash entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashPhase {
	/// Set during the current request; readable from the next one
	New,
	/// Readable during the current request; swept at the start of the next one
	Old,
}

/// A flash value and its phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashEntry {
	pub phase: FlashPhase,
	pub value: Value,
}

/// Flash entries of one session, keyed by user key
///
/// A single map keyed by user key means a key is never `New` and `Old` at the
/// same time.
///
/// # Examples
///
/// ```
/// use sessionkit_sessions::flash::FlashStore;
/// use serde_json::json;
///
/// let mut flash = FlashStore::new();
/// flash.set("notice", json!("Saved"));
/// assert_eq!(flash.get("notice"), None);
///
/// // next request
/// flash.sweep();
/// flash.mark();
/// assert_eq!(flash.get("notice"), Some(&json!("Saved")));
///
/// // request after that
/// flash.sweep();
/// flash.mark();
/// assert_eq!(flash.get("notice"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlashStore {
	entries: HashMap<String, FlashEntry>,
}

impl FlashStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Set a value, visible from the next request
	pub fn set(&mut self, key: impl Into<String>, value: Value) {
		self.entries.insert(
			key.into(),
			FlashEntry {
				phase: FlashPhase::New,
				value,
			},
		);
	}

	/// Value promoted into the current request, if any
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.entries
			.get(key)
			.filter(|entry| entry.phase == FlashPhase::Old)
			.map(|entry| &entry.value)
	}

	/// Re-arm the current value for one more request
	///
	/// Returns `false` when there is no value visible in this request.
	///
	/// # Examples
	///
	/// ```
	/// use sessionkit_sessions::flash::FlashStore;
	/// use serde_json::json;
	///
	/// let mut flash = FlashStore::new();
	/// assert!(!flash.keep("notice"));
	///
	/// flash.set("notice", json!("Saved"));
	/// flash.sweep();
	/// flash.mark();
	/// assert!(flash.keep("notice"));
	/// ```
	pub fn keep(&mut self, key: &str) -> bool {
		match self.entries.get_mut(key) {
			Some(entry) if entry.phase == FlashPhase::Old => {
				entry.phase = FlashPhase::New;
				true
			}
			_ => false,
		}
	}

	/// Remove every `Old` entry, returning how many were removed
	pub fn sweep(&mut self) -> usize {
		let before = self.entries.len();
		self.entries.retain(|_, entry| entry.phase != FlashPhase::Old);
		before - self.entries.len()
	}

	/// Promote every `New` entry to `Old`, returning how many were promoted
	pub fn mark(&mut self) -> usize {
		let mut promoted = 0;
		for entry in self.entries.values_mut() {
			if entry.phase == FlashPhase::New {
				entry.phase = FlashPhase::Old;
				promoted += 1;
			}
		}
		promoted
	}

	/// Phase of the entry under `key`
	pub fn phase(&self, key: &str) -> Option<FlashPhase> {
		self.entries.get(key).map(|entry| entry.phase)
	}

	/// Iterate over all entries regardless of phase
	pub fn iter(&self) -> impl Iterator<Item = (&str, &FlashEntry)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}
