//! Transport primitives for backend calls.
//!
//! [`ApiHttpClient`] is the gateway's only dependency on an HTTP stack. Requests and responses
//! are plain [`http`] values with byte bodies, so alternative transports (or test doubles) only
//! need to move bytes; header construction, envelope decoding, and the refresh protocol stay in
//! the gateway.

// self
use crate::_prelude::*;

/// Outbound request handed to the transport.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Response returned by the transport, with the body fully buffered.
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a, E> = Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing backend calls.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared between
/// the gateway and the pending refresh operation, and the futures they return must be `Send`
/// so waiters can resume on any executor thread.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Dispatches `request` and buffers the full response.
	///
	/// Non-success statuses are returned as responses, never as errors; only failures that
	/// prevent a response from arriving map to [`Self::TransportError`].
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client keeps a cookie jar: the backend issues its refresh cookie on login and
/// expects it back on `POST /auth/refresh`. Bring a custom [`ReqwestClient`] through
/// [`ReqwestHttpClient::with_client`] only if it enables `cookie_store` as well.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with a cookie store enabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().cookie_store(true).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = self.0.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut buffered = HttpResponse::new(response.bytes().await?.to_vec());

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok(buffered)
		})
	}
}
