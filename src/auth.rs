//! Auth-domain identity records, credentials, and device fingerprints.

pub mod fingerprint;
pub mod identity;
pub mod secret;

pub use fingerprint::*;
pub use identity::*;
pub use secret::*;
