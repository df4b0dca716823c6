//! JSON-file [`CredentialStore`] for desktop and CLI hosts that outlive a single process.
//!
//! The file holds one object keyed by [`StoreSlot::key`], mirroring how a browser keeps the same
//! values in local storage:
//!
//! ```json
//! { "accessToken": { "value": "T1", "expires_at": "..." }, "browserFingerprint": { ... } }
//! ```

// std
use std::{
	fs,
	io::{self, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{CredentialStore, PersistedValue, StoreError, StoreSlot},
};

type Entries = BTreeMap<String, PersistedValue>;

/// Writes the whole object back to disk after every mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	entries: Arc<RwLock<Entries>>,
}
impl FileStore {
	/// Loads `path`, starting empty when the file is missing or blank.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();
		let entries = match fs::read(&path) {
			Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Entries::new(),
			Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("{} is not a credential file: {e}", path.display()),
			})?,
			Err(e) if e.kind() == io::ErrorKind::NotFound => Entries::new(),
			Err(e) => return Err(io_failure("read", &path, e)),
		};

		Ok(Self { path, entries: Arc::new(RwLock::new(entries)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Replaces the file atomically: write a sibling temp file, then rename over the original.
	fn flush(&self, entries: &Entries) -> Result<(), StoreError> {
		let json = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::Serialization {
			message: format!("Credential entries could not be encoded: {e}"),
		})?;
		let staging = self.path.with_extension("tmp");

		if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|e| io_failure("create", dir, e))?;
		}

		let mut file = fs::File::create(&staging).map_err(|e| io_failure("create", &staging, e))?;

		file.write_all(&json)
			.and_then(|()| file.sync_all())
			.map_err(|e| io_failure("write", &staging, e))?;
		fs::rename(&staging, &self.path).map_err(|e| io_failure("replace", &self.path, e))
	}
}
impl CredentialStore for FileStore {
	fn get(&self, slot: StoreSlot) -> Result<Option<String>, StoreError> {
		let mut entries = self.entries.write();
		let live = match entries.get(slot.key()) {
			None => return Ok(None),
			Some(entry) => entry.is_live_at(OffsetDateTime::now_utc()),
		};

		if live {
			return Ok(entries.get(slot.key()).map(|entry| entry.value.clone()));
		}

		entries.remove(slot.key());
		self.flush(&entries)?;

		Ok(None)
	}

	fn set(&self, slot: StoreSlot, value: &str) -> Result<(), StoreError> {
		let mut entries = self.entries.write();
		let entry = PersistedValue::for_slot(slot, value, OffsetDateTime::now_utc());

		entries.insert(slot.key().to_owned(), entry);

		self.flush(&entries)
	}

	fn clear(&self, slot: StoreSlot) -> Result<(), StoreError> {
		let mut entries = self.entries.write();

		match entries.remove(slot.key()) {
			Some(_) => self.flush(&entries),
			None => Ok(()),
		}
	}

	fn get_or_insert_with(
		&self,
		slot: StoreSlot,
		make: &dyn Fn() -> String,
	) -> Result<String, StoreError> {
		let now = OffsetDateTime::now_utc();
		let mut entries = self.entries.write();

		if let Some(entry) =
			entries.get(slot.key()).filter(|e| e.is_live_at(now) && !e.value.trim().is_empty())
		{
			return Ok(entry.value.clone());
		}

		let entry = PersistedValue::for_slot(slot, make(), now);
		let value = entry.value.clone();

		entries.insert(slot.key().to_owned(), entry);
		self.flush(&entries)?;

		Ok(value)
	}
}

fn io_failure(action: &str, path: &Path, e: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	struct TempFile(PathBuf);
	impl TempFile {
		fn new(tag: &str) -> Self {
			let name = format!(
				"admin_gateway_{tag}_{}_{}.json",
				process::id(),
				OffsetDateTime::now_utc().unix_timestamp_nanos(),
			);

			Self(env::temp_dir().join(name))
		}
	}
	impl Drop for TempFile {
		fn drop(&mut self) {
			let _ = fs::remove_file(&self.0);
		}
	}

	#[test]
	fn values_survive_reopening() {
		let file = TempFile::new("reopen");
		let store = FileStore::open(&file.0).expect("Missing file should open empty.");

		store.set(StoreSlot::AccessToken, "T1").expect("Token write should succeed.");
		store.set(StoreSlot::Fingerprint, "fp-1").expect("Fingerprint write should succeed.");

		let reopened = FileStore::open(&file.0).expect("Written file should reopen.");

		assert_eq!(
			reopened.get(StoreSlot::AccessToken).expect("Read should succeed."),
			Some("T1".into())
		);
		assert_eq!(
			reopened.get(StoreSlot::Fingerprint).expect("Read should succeed."),
			Some("fp-1".into())
		);

		reopened.clear(StoreSlot::AccessToken).expect("Clear should succeed.");

		let reopened = FileStore::open(&file.0).expect("Written file should reopen.");

		assert_eq!(reopened.get(StoreSlot::AccessToken).expect("Read should succeed."), None);
	}

	#[test]
	fn file_is_keyed_by_slot_name() {
		let file = TempFile::new("keys");
		let store = FileStore::open(&file.0).expect("Missing file should open empty.");

		store.set(StoreSlot::Fingerprint, "fp-1").expect("Fingerprint write should succeed.");

		let raw: serde_json::Value =
			serde_json::from_slice(&fs::read(&file.0).expect("File should exist after a write."))
				.expect("File should hold JSON.");

		assert_eq!(raw["browserFingerprint"]["value"], "fp-1");
		assert!(raw.get("accessToken").is_none());
	}

	#[test]
	fn get_or_insert_keeps_the_first_value() {
		let file = TempFile::new("insert");
		let store = FileStore::open(&file.0).expect("Missing file should open empty.");
		let first = store
			.get_or_insert_with(StoreSlot::Fingerprint, &|| "fp-1".into())
			.expect("First insert should succeed.");
		let second = store
			.get_or_insert_with(StoreSlot::Fingerprint, &|| "fp-2".into())
			.expect("Lookup should succeed.");

		assert_eq!(first, "fp-1");
		assert_eq!(second, "fp-1");

		let reopened = FileStore::open(&file.0).expect("Written file should reopen.");

		assert_eq!(
			reopened.get(StoreSlot::Fingerprint).expect("Read should succeed."),
			Some("fp-1".into())
		);
	}

	#[test]
	fn corrupted_file_is_reported() {
		let file = TempFile::new("corrupt");

		fs::write(&file.0, b"not json").expect("Fixture write should succeed.");

		let err = FileStore::open(&file.0).expect_err("Corrupted file should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}
}
