//! Identity records returned by the auth endpoints.

// self
use crate::_prelude::*;

/// Console-wide role attached to every user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Full access, including company management.
	Admin,
	/// Company-scoped manager allowed to administer users.
	CompanyManager,
	/// Regular user; also used for unknown role labels.
	#[default]
	#[serde(other)]
	User,
}
impl Role {
	/// Returns the wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Role::Admin => "admin",
			Role::CompanyManager => "company_manager",
			Role::User => "user",
		}
	}
}
impl Display for Role {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Role assignable when a company registers one of its users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyUserRole {
	/// Company administrator.
	Admin,
	/// Recruiter managing vacancies.
	#[default]
	Recruiter,
}

/// Kind of account behind a user record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
	/// Employee of a company.
	Company,
	/// Job candidate.
	Candidate,
}

/// UI locales supported by the console.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
	/// English.
	#[default]
	En,
	/// Russian.
	Ru,
	/// Armenian.
	Hy,
}
impl Locale {
	/// Returns the language tag sent in `Accept-Language`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Locale::En => "en",
			Locale::Ru => "ru",
			Locale::Hy => "hy",
		}
	}
}
impl Display for Locale {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Locale {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let tag = s.trim().to_ascii_lowercase();

		// Regional variants such as `ru-RU` map onto their base language.
		match tag.split(['-', '_']).next().unwrap_or_default() {
			"en" => Ok(Locale::En),
			"ru" => Ok(Locale::Ru),
			"hy" => Ok(Locale::Hy),
			_ => Err(format!("unsupported locale `{s}`")),
		}
	}
}

/// Minimal company reference embedded in user records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRef {
	/// Company identifier.
	pub id: String,
	/// Display name.
	pub name: String,
}

/// Company details returned by `/auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDto {
	/// Company identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Default locale label.
	#[serde(default)]
	pub default_locale: Option<String>,
	/// Activity status label.
	#[serde(default)]
	pub status: Option<String>,
}

/// Identity record for the signed-in user.
///
/// Replaced wholesale on login and refresh; never patched in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
	/// User identifier.
	pub id: String,
	/// Login email.
	pub email: String,
	/// Console role.
	#[serde(default)]
	pub role: Role,
	/// Account kind, when the backend reports one.
	#[serde(default)]
	pub user_type: Option<UserType>,
	/// Owning company identifier.
	#[serde(default)]
	pub company_id: Option<String>,
	/// Job title inside the company.
	#[serde(default)]
	pub position: Option<String>,
	/// Preferred language label.
	#[serde(default)]
	pub language: Option<String>,
	/// Embedded company reference.
	#[serde(default)]
	pub company: Option<CompanyRef>,
}
impl UserDto {
	/// Returns the company identifier from either the flat field or the embedded reference.
	pub fn company_ref_id(&self) -> Option<&str> {
		self.company_id.as_deref().or_else(|| self.company.as_ref().map(|c| c.id.as_str()))
	}
}
