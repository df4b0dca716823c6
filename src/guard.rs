//! Navigation guards and role-gated sections.
//!
//! Guards are stateless: every decision is computed from the session and the persisted token
//! at the moment of navigation.

// self
use crate::{
	_prelude::*,
	auth::Role,
	session::SessionHandle,
	store::CredentialStore,
};

/// Public entry point for anonymous users.
pub const LOGIN_ROUTE: &str = "/login";
/// Default view for authenticated users.
pub const HOME_ROUTE: &str = "/";

/// Result of evaluating a guard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
	/// Navigation may proceed.
	Allow,
	/// Navigation must be replaced by another route.
	Redirect {
		/// Route to navigate to instead.
		to: String,
		/// Destination to resume after login, when redirecting to the login page.
		from: Option<String>,
	},
}
impl GuardDecision {
	/// Whether navigation may proceed.
	pub fn is_allowed(&self) -> bool {
		matches!(self, GuardDecision::Allow)
	}
}

/// Whether a usable token exists in the session or, failing that, in the store.
///
/// A store that cannot be read counts as holding no token.
pub fn has_valid_token(session: &SessionHandle, store: &dyn CredentialStore) -> bool {
	if session.access_token().is_some_and(|token| !token.is_blank()) {
		return true;
	}

	matches!(store.access_token(), Ok(Some(_)))
}

/// Guard for views that need a signed-in user.
///
/// Redirects to [`LOGIN_ROUTE`] and carries `intended` so the login page can send the user back.
pub fn require_authenticated(
	session: &SessionHandle,
	store: &dyn CredentialStore,
	intended: &str,
) -> GuardDecision {
	if has_valid_token(session, store) {
		GuardDecision::Allow
	} else {
		GuardDecision::Redirect { to: LOGIN_ROUTE.into(), from: Some(intended.into()) }
	}
}

/// Guard for public views such as the login page; signed-in users go to [`HOME_ROUTE`].
pub fn require_anonymous(session: &SessionHandle, store: &dyn CredentialStore) -> GuardDecision {
	if has_valid_token(session, store) {
		GuardDecision::Redirect { to: HOME_ROUTE.into(), from: None }
	} else {
		GuardDecision::Allow
	}
}

/// Guard for a role-gated section; authenticated users without access go to [`HOME_ROUTE`].
pub fn require_section(
	session: &SessionHandle,
	store: &dyn CredentialStore,
	section: Section,
) -> GuardDecision {
	match require_authenticated(session, store, section.route()) {
		GuardDecision::Allow if can_access(session.snapshot().role(), section) =>
			GuardDecision::Allow,
		GuardDecision::Allow => GuardDecision::Redirect { to: HOME_ROUTE.into(), from: None },
		redirect => redirect,
	}
}

/// Where to go after a successful login.
///
/// Only same-origin absolute paths are honored; anything else, including the login page
/// itself (with or without a query or fragment), resolves to [`HOME_ROUTE`].
pub fn post_login_destination(from: Option<&str>) -> &str {
	let Some(target) = from else {
		return HOME_ROUTE;
	};
	// Browsers read `//host` and `/\host` as protocol-relative URLs.
	let same_origin =
		target.starts_with('/') && !matches!(target.as_bytes().get(1), Some(b'/' | b'\\'));
	let route = target.split(['?', '#']).next().unwrap_or(target);

	if same_origin && route.trim_end_matches('/') != LOGIN_ROUTE { target } else { HOME_ROUTE }
}

/// Navigable sections of the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
	/// Landing dashboard.
	Dashboard,
	/// Vacancy management.
	Vacancies,
	/// Company user management.
	Users,
	/// Company management.
	Companies,
	/// Events calendar.
	Events,
	/// Own profile.
	Profile,
	/// Sign-out action.
	Logout,
}
impl Section {
	/// Menu order.
	pub const ALL: [Section; 7] = [
		Section::Dashboard,
		Section::Vacancies,
		Section::Users,
		Section::Companies,
		Section::Events,
		Section::Profile,
		Section::Logout,
	];

	/// Menu key.
	pub const fn key(self) -> &'static str {
		match self {
			Section::Dashboard => "dashboard",
			Section::Vacancies => "vacancies",
			Section::Users => "users",
			Section::Companies => "companies",
			Section::Events => "events",
			Section::Profile => "profile",
			Section::Logout => "logout",
		}
	}

	/// Route the section navigates to.
	pub const fn route(self) -> &'static str {
		match self {
			Section::Dashboard => HOME_ROUTE,
			Section::Vacancies => "/vacancies",
			Section::Users => "/users",
			Section::Companies => "/companies",
			Section::Events => "/events",
			Section::Profile => "/profile",
			Section::Logout => LOGIN_ROUTE,
		}
	}
}
impl Display for Section {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.key())
	}
}

/// Whether `role` may open `section`.
pub fn can_access(role: Role, section: Section) -> bool {
	match section {
		Section::Users => matches!(role, Role::Admin | Role::CompanyManager),
		Section::Companies => role == Role::Admin,
		_ => true,
	}
}

/// Menu entries visible to `role`, in display order.
pub fn navigation_for(role: Role) -> Vec<Section> {
	Section::ALL.into_iter().filter(|section| can_access(role, *section)).collect()
}
