//! Request descriptors handed to the gateway.

// crates.io
use http::Method;
// self
use crate::{_prelude::*, error::ConfigError};

/// Describes one backend call: method, endpoint path, query pairs, and optional JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Endpoint path relative to the configured prefix, e.g. `/vacancies`.
	pub path: String,
	/// Query pairs appended in order.
	pub query: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<serde_json::Value>,
	/// Whether a 401 triggers the refresh-and-retry protocol.
	pub reauth: bool,
}
impl ApiRequest {
	/// Creates a request without query or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None, reauth: true }
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends a query pair when `value` is present and non-empty.
	pub fn with_optional_query(self, key: impl Into<String>, value: Option<&str>) -> Self {
		match value.filter(|v| !v.is_empty()) {
			Some(value) => self.with_query(key, value),
			None => self,
		}
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_value(body)?);

		Ok(self)
	}

	/// Disables the refresh-and-retry protocol; a 401 is returned as-is.
	pub fn without_reauth(mut self) -> Self {
		self.reauth = false;

		self
	}
}
