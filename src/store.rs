//! Persistence adapter for client-side credentials and built-in backends.
//!
//! The gateway, the refresh coordinator, and the guards only see [`CredentialStore`]; whether
//! values live in memory or on disk is a backend concern. Slots mirror what a browser keeps in
//! its cookie jar and local storage: a short-lived access token and a long-lived fingerprint.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Fingerprint},
};

/// Named locations a [`CredentialStore`] can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreSlot {
	/// Bearer token mirrored from the session.
	AccessToken,
	/// Device fingerprint.
	Fingerprint,
}
impl StoreSlot {
	const ACCESS_TOKEN_TTL: Duration = Duration::days(7);

	/// Returns the stable key used by persistent backends.
	pub const fn key(self) -> &'static str {
		match self {
			StoreSlot::AccessToken => "accessToken",
			StoreSlot::Fingerprint => "browserFingerprint",
		}
	}

	/// Lifetime applied when a value is written, if the slot expires.
	pub const fn ttl(self) -> Option<Duration> {
		match self {
			StoreSlot::AccessToken => Some(Self::ACCESS_TOKEN_TTL),
			StoreSlot::Fingerprint => None,
		}
	}
}

/// Value held in a slot together with its optional expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedValue {
	/// Stored string.
	pub value: String,
	/// Instant after which the value reads as absent.
	pub expires_at: Option<OffsetDateTime>,
}
impl PersistedValue {
	/// Builds a value for `slot` written at `now`, applying the slot's lifetime.
	pub fn for_slot(slot: StoreSlot, value: impl Into<String>, now: OffsetDateTime) -> Self {
		Self { value: value.into(), expires_at: slot.ttl().map(|ttl| now + ttl) }
	}

	/// Whether the value is still readable at `now`.
	pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|deadline| now < deadline)
	}
}

/// Storage backend contract for client-side credentials.
///
/// Reads are synchronous so guards can evaluate them on every navigation. Backends drop
/// expired values on read.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the live value for `slot`, if any.
	fn get(&self, slot: StoreSlot) -> Result<Option<String>, StoreError>;

	/// Writes `value` into `slot`, replacing any previous value.
	fn set(&self, slot: StoreSlot, value: &str) -> Result<(), StoreError>;

	/// Removes whatever `slot` holds.
	fn clear(&self, slot: StoreSlot) -> Result<(), StoreError>;

	/// Returns the live, non-blank value for `slot`, writing `make()` first when there is none.
	///
	/// The read and the write happen atomically, so concurrent callers all observe the value
	/// written by whichever of them got there first.
	fn get_or_insert_with(
		&self,
		slot: StoreSlot,
		make: &dyn Fn() -> String,
	) -> Result<String, StoreError>;
}
impl<'s> dyn CredentialStore + 's {
	/// Returns the persisted, unexpired, non-blank access token.
	pub fn access_token(&self) -> Result<Option<AccessToken>, StoreError> {
		Ok(self
			.get(StoreSlot::AccessToken)?
			.map(AccessToken::new)
			.filter(|token| !token.is_blank()))
	}

	/// Persists the access token for the slot's lifetime.
	pub fn set_access_token(&self, token: &AccessToken) -> Result<(), StoreError> {
		self.set(StoreSlot::AccessToken, token.expose())
	}

	/// Drops the persisted access token.
	pub fn clear_access_token(&self) -> Result<(), StoreError> {
		self.clear(StoreSlot::AccessToken)
	}

	/// Returns the persisted fingerprint, generating and saving one on first use.
	pub fn fingerprint_or_create(&self) -> Result<Fingerprint, StoreError> {
		let generate = || Fingerprint::generate().as_str().to_owned();

		self.get_or_insert_with(StoreSlot::Fingerprint, &generate).map(Fingerprint::new)
	}

	/// Overwrites the fingerprint with a server-issued hash.
	pub fn save_server_fingerprint(&self, hash: &str) -> Result<(), StoreError> {
		if hash.trim().is_empty() {
			return Ok(());
		}

		self.set(StoreSlot::Fingerprint, hash)
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Storage(_)));
		assert!(gateway_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn access_token_slot_expires_after_a_week() {
		let now = time::macros::datetime!(2025-11-10 12:00 UTC);
		let value = PersistedValue::for_slot(StoreSlot::AccessToken, "T1", now);

		assert!(value.is_live_at(now + Duration::days(6)));
		assert!(!value.is_live_at(now + Duration::days(7)));
	}

	#[test]
	fn fingerprint_slot_never_expires() {
		let now = time::macros::datetime!(2025-11-10 12:00 UTC);
		let value = PersistedValue::for_slot(StoreSlot::Fingerprint, "fp", now);

		assert_eq!(value.expires_at, None);
		assert!(value.is_live_at(now + Duration::days(3650)));
	}

	#[test]
	fn concurrent_first_use_agrees_on_one_fingerprint() {
		let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
		let seen = std::thread::scope(|scope| {
			let workers: Vec<_> = (0..8)
				.map(|_| {
					scope.spawn(|| {
						store.fingerprint_or_create().expect("Fingerprint creation should succeed.")
					})
				})
				.collect();

			workers
				.into_iter()
				.map(|worker| worker.join().expect("Worker thread should not panic."))
				.collect::<Vec<_>>()
		});

		assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
	}

	#[test]
	fn fingerprint_is_created_once_and_reused() {
		let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
		let first = store.fingerprint_or_create().expect("Fingerprint creation should succeed.");
		let second = store.fingerprint_or_create().expect("Fingerprint lookup should succeed.");

		assert_eq!(first, second);

		store.save_server_fingerprint("server-hash").expect("Server hash should be saved.");

		let third = store.fingerprint_or_create().expect("Fingerprint lookup should succeed.");

		assert_eq!(third.as_str(), "server-hash");
	}
}
