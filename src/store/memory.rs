//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{CredentialStore, PersistedValue, StoreError, StoreSlot},
};

type SlotMap = Arc<RwLock<HashMap<StoreSlot, PersistedValue>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotMap);
impl MemoryStore {
	/// Returns the raw entry for `slot`, including expired values.
	pub fn entry(&self, slot: StoreSlot) -> Option<PersistedValue> {
		self.0.read().get(&slot).cloned()
	}

	/// Inserts a raw entry, bypassing the slot lifetime. Useful for seeding expired values.
	pub fn insert_entry(&self, slot: StoreSlot, value: PersistedValue) {
		self.0.write().insert(slot, value);
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self, slot: StoreSlot) -> Result<Option<String>, StoreError> {
		let now = OffsetDateTime::now_utc();
		let mut guard = self.0.write();

		match guard.get(&slot) {
			Some(entry) if entry.is_live_at(now) => Ok(Some(entry.value.clone())),
			Some(_) => {
				guard.remove(&slot);

				Ok(None)
			},
			None => Ok(None),
		}
	}

	fn set(&self, slot: StoreSlot, value: &str) -> Result<(), StoreError> {
		let entry = PersistedValue::for_slot(slot, value, OffsetDateTime::now_utc());

		self.0.write().insert(slot, entry);

		Ok(())
	}

	fn clear(&self, slot: StoreSlot) -> Result<(), StoreError> {
		self.0.write().remove(&slot);

		Ok(())
	}

	fn get_or_insert_with(
		&self,
		slot: StoreSlot,
		make: &dyn Fn() -> String,
	) -> Result<String, StoreError> {
		let now = OffsetDateTime::now_utc();
		let mut guard = self.0.write();

		if let Some(entry) =
			guard.get(&slot).filter(|e| e.is_live_at(now) && !e.value.trim().is_empty())
		{
			return Ok(entry.value.clone());
		}

		let entry = PersistedValue::for_slot(slot, make(), now);
		let value = entry.value.clone();

		guard.insert(slot, entry);

		Ok(value)
	}
}
