//! Gateway-level error types shared across requests, refresh cycles, and stores.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Form input rejected before any request was sent.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Explicit refresh cycle failed; the session has been cleared.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Backend answered with a non-success status other than an unrecoverable 401.
	#[error(transparent)]
	Api(ApiError),
	/// Backend kept rejecting the credentials after the refresh protocol ran.
	#[error("Request is unauthorized: {response}")]
	Unauthorized {
		/// Response that triggered the failure.
		response: ApiError,
		/// Refresh failure, when the refresh cycle itself failed.
		#[source]
		refresh: Option<RefreshError>,
	},
	/// Successful response body could not be decoded.
	#[error("Response body from {path} could not be decoded.")]
	Decode {
		/// Request path that produced the body.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(response) | Self::Unauthorized { response, .. } => Some(response.status),
			Self::Refresh(RefreshError::Rejected { status }) => Some(*status),
			_ => None,
		}
	}

	/// Returns a message suitable for inline display next to a form.
	///
	/// Prefers the backend's `message` field and falls back to the error's own text.
	pub fn display_message(&self) -> String {
		match self {
			Self::Api(response) | Self::Unauthorized { response, .. } =>
				response.message.clone().unwrap_or_else(|| self.to_string()),
			_ => self.to_string(),
		}
	}
}

/// Non-success HTTP response surfaced to the calling UI unit.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Backend returned HTTP {status}{}.", message_suffix(.message))]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// `message` field extracted from the response body, when present.
	pub message: Option<String>,
	/// Raw response body for callers that need more detail.
	pub body: String,
}
impl ApiError {
	/// Builds an error from a status and raw body, extracting the `message` field if the body is
	/// a JSON object carrying one.
	pub fn from_body(status: u16, body: &[u8]) -> Self {
		#[derive(Deserialize)]
		struct MessageBody {
			message: Option<String>,
		}

		let message = serde_json::from_slice::<MessageBody>(body)
			.ok()
			.and_then(|parsed| parsed.message)
			.filter(|message| !message.trim().is_empty());

		Self { status, message, body: String::from_utf8_lossy(body).into_owned() }
	}

	/// Whether the status is an authorization failure.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}

fn message_suffix(message: &Option<String>) -> String {
	message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Failures raised by the refresh cycle.
///
/// Every waiter attached to a refresh observes a clone of the same value.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the request with HTTP {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
	},
	/// Refresh endpoint returned no body.
	#[error("Refresh failed: empty response.")]
	EmptyResponse,
	/// Refresh endpoint returned a payload without an access token.
	#[error("Refresh failed: no access token.")]
	MissingAccessToken,
	/// Refresh payload carried no user and no identity was cached.
	#[error("Refresh failed: no user identity.")]
	MissingUser,
	/// Refresh payload could not be decoded.
	#[error("Refresh response could not be decoded: {message}.")]
	Decode {
		/// Parser message.
		message: String,
	},
	/// Refresh call failed before a response arrived.
	#[error("Refresh request failed: {message}.")]
	Transport {
		/// Transport message.
		message: String,
	},
	/// Refreshed credentials could not be persisted.
	#[error("Refreshed credentials could not be persisted: {message}.")]
	Storage {
		/// Store message.
		message: String,
	},
}

/// Form-level validation failures; recovered locally and never touch the session.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A required field was empty.
	#[error("The {field} field is required.")]
	Required {
		/// Field name.
		field: &'static str,
	},
	/// The email field is not a plausible address.
	#[error("The email address is invalid.")]
	InvalidEmail,
	/// An identifier cannot be used as a path segment.
	#[error("The {field} value `{value}` is not a valid identifier.")]
	InvalidIdentifier {
		/// Field name.
		field: &'static str,
		/// Rejected value.
		value: String,
	},
	/// Salary range is inverted.
	#[error("The salary lower bound exceeds the upper bound.")]
	SalaryRange,
}

/// Configuration and validation failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Required environment variable is absent or empty.
	#[error("Missing env: {name}.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Invalid value for {name}: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// A request path could not be joined onto the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures: no response arrived.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
