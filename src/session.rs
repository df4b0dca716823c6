//! Process-wide session state and its access handle.
//!
//! [`SessionHandle`] is cloned into every component that needs the session. Anyone holding it
//! may read; writes are crate-private and reserved for the login, restore, refresh, and logout
//! handlers, each of which replaces the credentials wholesale.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Role, UserDto},
};

/// Lifecycle status of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	/// Nothing has been attempted yet.
	#[default]
	Idle,
	/// A session restore is in progress.
	Checking,
	/// Token and identity are both present.
	Authenticated,
	/// Signed out or restore failed.
	Anonymous,
}
impl SessionStatus {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionStatus::Idle => "idle",
			SessionStatus::Checking => "checking",
			SessionStatus::Authenticated => "authenticated",
			SessionStatus::Anonymous => "anonymous",
		}
	}
}
impl Display for SessionStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Snapshot of the session.
///
/// `status == Authenticated` holds exactly when both `access_token` and `user` are present;
/// the writer methods on [`SessionHandle`] are the only way to change these fields together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
	access_token: Option<AccessToken>,
	user: Option<UserDto>,
	status: SessionStatus,
}
impl Session {
	/// Current bearer token.
	pub fn access_token(&self) -> Option<&AccessToken> {
		self.access_token.as_ref()
	}

	/// Signed-in identity.
	pub fn user(&self) -> Option<&UserDto> {
		self.user.as_ref()
	}

	/// Lifecycle status.
	pub fn status(&self) -> SessionStatus {
		self.status
	}

	/// Whether the session is authenticated.
	pub fn is_authenticated(&self) -> bool {
		self.status == SessionStatus::Authenticated
	}

	/// Role of the signed-in user; anonymous sessions read as [`Role::User`].
	pub fn role(&self) -> Role {
		self.user.as_ref().map(|user| user.role).unwrap_or_default()
	}
}

/// Shared handle to the single session record.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle(Arc<RwLock<Session>>);
impl SessionHandle {
	/// Returns a copy of the current session.
	pub fn snapshot(&self) -> Session {
		self.0.read().clone()
	}

	/// Returns the current status.
	pub fn status(&self) -> SessionStatus {
		self.0.read().status
	}

	/// Returns the current bearer token.
	pub fn access_token(&self) -> Option<AccessToken> {
		self.0.read().access_token.clone()
	}

	/// Returns the signed-in identity.
	pub fn user(&self) -> Option<UserDto> {
		self.0.read().user.clone()
	}

	/// Installs fresh credentials and marks the session authenticated.
	pub(crate) fn set_credentials(&self, access_token: AccessToken, user: UserDto) {
		let mut session = self.0.write();

		session.access_token = Some(access_token);
		session.user = Some(user);
		session.status = SessionStatus::Authenticated;
	}

	/// Marks a restore as in progress without touching credentials.
	pub(crate) fn set_checking(&self) {
		let mut session = self.0.write();

		// An authenticated session stays authenticated while it is re-validated.
		if session.status != SessionStatus::Authenticated {
			session.status = SessionStatus::Checking;
		}
	}

	/// Drops credentials and marks the session anonymous.
	pub(crate) fn clear(&self) {
		let mut session = self.0.write();

		session.access_token = None;
		session.user = None;
		session.status = SessionStatus::Anonymous;
	}
}
