//! Device fingerprint binding refresh calls to this client.

// self
use crate::_prelude::*;

/// Stable client identifier sent as `X-Client-Fingerprint`.
///
/// Generated once as a random UUID and persisted; the backend may later issue a hash that
/// replaces it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);
impl Fingerprint {
	/// Wraps an existing identifier.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Generates a fresh random identifier.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4().to_string())
	}

	/// Returns the identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Fingerprint {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for Fingerprint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Fingerprint({})", self.0)
	}
}
impl Display for Fingerprint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
