//! Startup configuration for the gateway.
//!
//! Values are read once, either from the process environment via [`ClientConfig::from_env`] or
//! from any lookup function via [`ClientConfig::from_lookup`]. Every variable is required; a
//! missing or malformed value is a fatal startup error.

// self
use crate::{_prelude::*, auth::Locale, error::ConfigError};

/// Deployment environment tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
	/// Developer machine.
	#[default]
	Local,
	/// Pre-production.
	Staging,
	/// Production.
	Prod,
}
impl AppEnv {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			AppEnv::Local => "local",
			AppEnv::Staging => "staging",
			AppEnv::Prod => "prod",
		}
	}
}
impl FromStr for AppEnv {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.trim() {
			"local" => Ok(AppEnv::Local),
			"staging" => Ok(AppEnv::Staging),
			"prod" => Ok(AppEnv::Prod),
			other => Err(format!("expected local, staging or prod, got `{other}`")),
		}
	}
}

/// Gateway configuration.
///
/// Build with [`ClientConfig::new`] and the `with_*` setters, or load it from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Absolute backend base URL.
	pub api_base_url: Url,
	/// Path prefix prepended to every endpoint, normalized to `/segment` or empty.
	pub api_prefix: String,
	/// Deployment environment tag.
	pub app_env: AppEnv,
	/// Locale used for `Accept-Language` until the UI picks another one.
	pub default_locale: Locale,
}
impl ClientConfig {
	/// Base URL variable.
	pub const API_BASE_URL: &'static str = "API_BASE_URL";
	/// Prefix variable.
	pub const API_PREFIX: &'static str = "API_PREFIX";
	/// Environment tag variable.
	pub const APP_ENV: &'static str = "APP_ENV";
	/// Default locale variable.
	pub const DEFAULT_LOCALE: &'static str = "DEFAULT_LOCALE";

	/// Creates a configuration with the local environment tag and English locale.
	pub fn new(api_base_url: Url, api_prefix: impl AsRef<str>) -> Self {
		Self {
			api_base_url,
			api_prefix: normalize_prefix(api_prefix.as_ref()),
			app_env: AppEnv::default(),
			default_locale: Locale::default(),
		}
	}

	/// Overrides the environment tag.
	pub fn with_app_env(mut self, app_env: AppEnv) -> Self {
		self.app_env = app_env;

		self
	}

	/// Overrides the default locale.
	pub fn with_default_locale(mut self, locale: Locale) -> Self {
		self.default_locale = locale;

		self
	}

	/// Loads the configuration from the process environment.
	///
	/// # Required env vars
	/// - `API_BASE_URL`: absolute backend URL
	/// - `API_PREFIX`: path prefix such as `/api`
	/// - `APP_ENV`: `local`, `staging`, or `prod`
	/// - `DEFAULT_LOCALE`: `en`, `ru`, or `hy`
	///
	/// # Errors
	///
	/// Returns [`ConfigError::MissingVar`] or [`ConfigError::InvalidVar`] for the first variable
	/// that is absent or unusable.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads the configuration through an arbitrary lookup function.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let require = |name: &'static str| {
			lookup(name)
				.filter(|value| !value.trim().is_empty())
				.ok_or(ConfigError::MissingVar { name })
		};
		let raw_base = require(Self::API_BASE_URL)?;
		let api_base_url = Url::parse(raw_base.trim()).map_err(|e| ConfigError::InvalidVar {
			name: Self::API_BASE_URL,
			reason: e.to_string(),
		})?;

		if api_base_url.cannot_be_a_base() {
			return Err(ConfigError::InvalidVar {
				name: Self::API_BASE_URL,
				reason: "URL cannot be used as a base".into(),
			});
		}

		let api_prefix = require(Self::API_PREFIX)?;
		let app_env = require(Self::APP_ENV)?
			.parse::<AppEnv>()
			.map_err(|reason| ConfigError::InvalidVar { name: Self::APP_ENV, reason })?;
		let default_locale = require(Self::DEFAULT_LOCALE)?
			.parse::<Locale>()
			.map_err(|reason| ConfigError::InvalidVar { name: Self::DEFAULT_LOCALE, reason })?;

		Ok(Self::new(api_base_url, api_prefix)
			.with_app_env(app_env)
			.with_default_locale(default_locale))
	}

	/// Resolves an endpoint path (e.g. `/auth/login`) to `base + prefix + path`.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.api_base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');
		let joined = format!("{base}{}/{path}", self.api_prefix);

		Url::parse(&joined).map_err(|source| ConfigError::InvalidPath { path: path.into(), source })
	}
}

fn normalize_prefix(prefix: &str) -> String {
	let trimmed = prefix.trim().trim_matches('/');

	if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}
