//! `/auth/*` bindings: login, session restore, identity lookups, logout, and user registration.
//!
//! Login, restore, and logout are the session writers alongside the refresh coordinator; every
//! other binding only reads.

// crates.io
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CompanyDto, CompanyUserRole, Locale, UserDto, UserType},
	error::ValidationError,
	gateway::{ApiRequest, Gateway},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::SessionStatus,
};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/auth/login";
/// Current-user endpoint used for session restore.
pub const CURRENT_PATH: &str = "/auth/current";
/// Extended identity endpoint.
pub const ME_PATH: &str = "/auth/me";
/// Logout endpoint.
pub const LOGOUT_PATH: &str = "/auth/logout";
/// Company user registration endpoint.
pub const REGISTER_COMPANY_USER_PATH: &str = "/auth/register/company-user";

/// Credentials entered in the login form.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginForm {
	/// Login email.
	pub email: String,
	/// Plain-text password.
	pub password: String,
	/// Whether the backend should issue a long-lived refresh cookie.
	pub remember: bool,
}
impl LoginForm {
	/// Creates a form with `remember` enabled, matching the form's initial state.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into(), remember: true }
	}

	/// Overrides the remember flag.
	pub fn with_remember(mut self, remember: bool) -> Self {
		self.remember = remember;

		self
	}

	/// Checks the form locally before anything is sent.
	pub fn validate(&self) -> Result<(), ValidationError> {
		validate_email(&self.email)?;

		if self.password.is_empty() {
			return Err(ValidationError::Required { field: "password" });
		}

		Ok(())
	}
}
impl Debug for LoginForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginForm")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("remember", &self.remember)
			.finish()
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload<'a> {
	email: &'a str,
	password: &'a str,
	language: &'a str,
	remember_user: bool,
	fingerprint: &'a str,
}

/// `data` of a successful login.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	/// Issued bearer token.
	pub access_token: AccessToken,
	/// Signed-in identity.
	pub user: UserDto,
	/// Server-issued fingerprint replacing the local one.
	#[serde(default)]
	pub fingerprint_hash: Option<String>,
}

/// `data` of `/auth/current`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CurrentResponse {
	/// Identity bound to the presented token.
	pub user: UserDto,
}

/// `data` of `/auth/me`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
	/// Account kind.
	pub user_type: UserType,
	/// Identity record.
	pub user: UserDto,
	/// Company details for company accounts.
	#[serde(default)]
	pub company: Option<CompanyDto>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutPayload<'a> {
	refresh_token: &'a str,
}

/// Body of `/auth/register/company-user`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterCompanyUser {
	/// New user's email.
	pub email: String,
	/// Initial password.
	pub password: String,
	/// Role inside the company.
	pub role: CompanyUserRole,
	/// Job title.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub position: Option<String>,
	/// Preferred language.
	pub language: Locale,
}
impl RegisterCompanyUser {
	/// Checks the payload locally before anything is sent.
	pub fn validate(&self) -> Result<(), ValidationError> {
		validate_email(&self.email)?;

		if self.password.is_empty() {
			return Err(ValidationError::Required { field: "password" });
		}

		Ok(())
	}
}
impl Debug for RegisterCompanyUser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterCompanyUser")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("role", &self.role)
			.field("position", &self.position)
			.field("language", &self.language)
			.finish()
	}
}

/// `data` of a successful company user registration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredCompanyUser {
	/// New user identifier.
	pub id: String,
	/// New user's email.
	pub email: String,
	/// Assigned role.
	pub role: CompanyUserRole,
	/// Job title.
	#[serde(default)]
	pub position: Option<String>,
	/// Preferred language.
	pub language: Locale,
	/// Owning company.
	pub company_id: String,
}

impl<C> Gateway<C>
where
	C: ApiHttpClient,
{
	/// Signs in with `form` and installs the returned credentials.
	///
	/// Validation failures return before any request and leave the session untouched, as do
	/// backend rejections; use [`Error::display_message`] for the inline form message.
	pub async fn login(&self, form: &LoginForm) -> Result<LoginResponse> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<LoginResponse> = span
			.instrument(async {
				form.validate()?;

				let fingerprint = self.store().fingerprint_or_create()?;
				let payload = LoginPayload {
					email: form.email.trim(),
					password: &form.password,
					language: self.locale().as_str(),
					remember_user: form.remember,
					fingerprint: fingerprint.as_str(),
				};
				// A 401 here means bad credentials, not an expired token.
				let request = ApiRequest::post(LOGIN_PATH).with_json(&payload)?.without_reauth();
				let data: LoginResponse = self.send(request).await?;

				if let Some(hash) = data.fingerprint_hash.as_deref() {
					self.store().save_server_fingerprint(hash)?;
				}

				self.store().set_access_token(&data.access_token)?;
				self.session().set_credentials(data.access_token.clone(), data.user.clone());

				Ok(data)
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}

	/// Rebuilds the session from the session or persisted token.
	///
	/// Without a token the session goes straight to anonymous. Otherwise the status is
	/// `Checking` while `/auth/current` runs (refreshing if the token expired); any failure
	/// clears the session and the persisted token before the error is returned.
	pub async fn restore_session(&self) -> Result<SessionStatus> {
		const KIND: FlowKind = FlowKind::Restore;

		let span = FlowSpan::new(KIND, "restore_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<SessionStatus> = span
			.instrument(async {
				let token = match self.session().access_token() {
					Some(token) => Some(token),
					None => self.store().access_token()?,
				};
				let Some(token) = token else {
					self.session().clear();

					return Ok(SessionStatus::Anonymous);
				};

				self.session().set_checking();

				match self.current().await {
					Ok(current) => {
						// A refresh during the call may have rotated the token.
						let token = match self.session().access_token() {
							Some(rotated) => rotated,
							None => self.store().access_token()?.unwrap_or(token),
						};

						self.session().set_credentials(token, current.user);

						Ok(SessionStatus::Authenticated)
					},
					Err(err) => {
						self.session().clear();
						self.store().clear_access_token()?;

						Err(err)
					},
				}
			})
			.await;

		obs::record_flow_result(KIND, &result);

		result
	}

	/// Fetches the identity bound to the current token.
	pub async fn current(&self) -> Result<CurrentResponse> {
		self.send(ApiRequest::get(CURRENT_PATH)).await
	}

	/// Fetches the extended identity, including company details.
	pub async fn me(&self) -> Result<MeResponse> {
		self.send(ApiRequest::get(ME_PATH)).await
	}

	/// Signs out on the server and locally.
	///
	/// The local session and persisted token are cleared even when the server call fails; that
	/// failure is still returned.
	pub async fn logout(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let server: Result<()> = span
			.instrument(async {
				let fingerprint = self.store().fingerprint_or_create()?;
				let request = ApiRequest::patch(LOGOUT_PATH)
					.with_json(&LogoutPayload { refresh_token: fingerprint.as_str() })?;

				self.send::<IgnoredAny>(request).await.map(|_| ())
			})
			.await;

		self.session().clear();

		let local = self.store().clear_access_token().map_err(Error::from);
		let result = server.and(local);

		obs::record_flow_result(KIND, &result);

		result
	}

	/// Registers a user under the signed-in company.
	pub async fn register_company_user(
		&self,
		payload: &RegisterCompanyUser,
	) -> Result<RegisteredCompanyUser> {
		payload.validate()?;

		let request = ApiRequest::post(REGISTER_COMPANY_USER_PATH).with_json(payload)?;

		self.send(request).await
	}
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
	let email = email.trim();

	if email.is_empty() {
		return Err(ValidationError::Required { field: "email" });
	}

	let Some((local, domain)) = email.split_once('@') else {
		return Err(ValidationError::InvalidEmail);
	};
	let plausible = !local.is_empty()
		&& !domain.contains('@')
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !email.chars().any(char::is_whitespace);

	if plausible { Ok(()) } else { Err(ValidationError::InvalidEmail) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_form_validation_covers_required_and_format() {
		assert_eq!(LoginForm::new("a@b.com", "x").validate(), Ok(()));
		assert_eq!(
			LoginForm::new("  ", "x").validate(),
			Err(ValidationError::Required { field: "email" })
		);
		assert_eq!(LoginForm::new("a@b", "x").validate(), Err(ValidationError::InvalidEmail));
		assert_eq!(LoginForm::new("a b@c.com", "x").validate(), Err(ValidationError::InvalidEmail));
		assert_eq!(
			LoginForm::new("a@b.com", "").validate(),
			Err(ValidationError::Required { field: "password" })
		);
	}

	#[test]
	fn login_form_debug_redacts_password() {
		let form = LoginForm::new("a@b.com", "hunter2");

		assert!(!format!("{form:?}").contains("hunter2"));
	}

	#[test]
	fn login_payload_uses_backend_field_names() {
		let payload = LoginPayload {
			email: "a@b.com",
			password: "x",
			language: "en",
			remember_user: true,
			fingerprint: "fp",
		};
		let value = serde_json::to_value(&payload).expect("Payload should serialize.");

		assert_eq!(
			value,
			serde_json::json!({
				"email": "a@b.com",
				"password": "x",
				"language": "en",
				"rememberUser": true,
				"fingerprint": "fp",
			})
		);
	}

	#[test]
	fn registration_payload_omits_missing_position() {
		let payload = RegisterCompanyUser {
			email: "r@acme.io".into(),
			password: "secret".into(),
			role: CompanyUserRole::Recruiter,
			position: None,
			language: Locale::Ru,
		};
		let value = serde_json::to_value(&payload).expect("Payload should serialize.");

		assert_eq!(
			value,
			serde_json::json!({
				"email": "r@acme.io",
				"password": "secret",
				"role": "recruiter",
				"language": "ru",
			})
		);
	}
}
