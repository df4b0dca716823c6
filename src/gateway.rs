//! Authenticated request gateway.
//!
//! [`Gateway::send`] attaches the bearer token, locale, and fingerprint headers, dispatches the
//! call, and unwraps the `{ success, data }` envelope. A 401 runs the shared refresh cycle
//! (see [`refresh`]) and retries the original request exactly once with the new token; if the
//! refresh fails the session is cleared and the original 401 is returned together with the
//! refresh cause. A 401 that arrives after a cycle settled during the request's flight takes
//! that cycle's outcome instead of starting another one.

pub mod refresh;

mod request;

pub use refresh::*;
pub use request::*;

// crates.io
use http::{
	HeaderValue, StatusCode,
	header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Locale},
	config::ClientConfig,
	error::{ApiError, ConfigError, TransportError},
	http::{ApiHttpClient, HttpRequest, HttpResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, RefreshTransition},
	session::SessionHandle,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Header carrying the device fingerprint.
pub const FINGERPRINT_HEADER: &str = "x-client-fingerprint";

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Wraps every backend call with credentials and the refresh-and-retry protocol.
///
/// Cloning is cheap; clones share the transport, session handle, store, and refresh
/// coordinator, so concurrent requests from any clone collapse onto one refresh call.
pub struct Gateway<C>
where
	C: ApiHttpClient,
{
	inner: Arc<GatewayInner<C>>,
}
impl<C> Gateway<C>
where
	C: ApiHttpClient,
{
	/// Creates a gateway over the caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		session: SessionHandle,
		store: Arc<dyn CredentialStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let locale = RwLock::new(config.default_locale);

		Self {
			inner: Arc::new(GatewayInner {
				http_client: http_client.into(),
				config,
				session,
				store,
				locale,
				refresh: RefreshCoordinator::default(),
			}),
		}
	}

	/// Configuration the gateway was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.inner.config
	}

	/// Session handle shared with the rest of the application.
	pub fn session(&self) -> &SessionHandle {
		&self.inner.session
	}

	/// Persistence adapter used for tokens and fingerprints.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.inner.store
	}

	/// Refresh coordinator state and counters.
	pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
		&self.inner.refresh
	}

	/// Locale currently sent as `Accept-Language`.
	pub fn locale(&self) -> Locale {
		*self.inner.locale.read()
	}

	/// Switches the locale sent with subsequent requests.
	pub fn set_locale(&self, locale: Locale) {
		*self.inner.locale.write() = locale;
	}

	/// Sends `request` and returns the envelope's `data` decoded as `T`.
	///
	/// A missing `data` field decodes as JSON `null`, so `()` and `Option<_>` targets accept
	/// bodiless responses.
	pub async fn send<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send_raw(&request).await?;

		decode_envelope(&request.path, response.status(), response.body())
	}

	/// Sends `request` through the refresh-and-retry protocol and returns the successful raw
	/// response.
	pub async fn send_raw(&self, request: &ApiRequest) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.inner.dispatch_with_reauth(request)).await;

		obs::record_flow_result(KIND, &result);

		result
	}

	/// Forces a refresh cycle, joining one that is already pending.
	///
	/// On failure the session has been cleared and the cause is returned as
	/// [`Error::Refresh`].
	pub async fn refresh(&self) -> Result<AccessToken> {
		Ok(self.inner.refresh_shared(None).await?)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a gateway backed by a cookie-enabled reqwest client.
	pub fn new(
		config: ClientConfig,
		session: SessionHandle,
		store: Arc<dyn CredentialStore>,
	) -> Result<Self> {
		Ok(Self::with_http_client(config, session, store, ReqwestHttpClient::new()?))
	}
}
impl<C> Clone for Gateway<C>
where
	C: ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self { inner: Arc::clone(&self.inner) }
	}
}
impl<C> Debug for Gateway<C>
where
	C: ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.inner.config)
			.field("session_status", &self.inner.session.status())
			.field("refresh", &self.inner.refresh)
			.finish()
	}
}

pub(crate) struct GatewayInner<C>
where
	C: ApiHttpClient,
{
	http_client: Arc<C>,
	config: ClientConfig,
	session: SessionHandle,
	store: Arc<dyn CredentialStore>,
	locale: RwLock<Locale>,
	refresh: RefreshCoordinator,
}
impl<C> GatewayInner<C>
where
	C: ApiHttpClient,
{
	/// Session token, falling back to the persisted one when the session holds none.
	fn current_token(&self) -> Result<Option<AccessToken>> {
		match self.session.access_token() {
			Some(token) => Ok(Some(token)),
			None => Ok(self.store.access_token()?),
		}
	}

	async fn dispatch_with_reauth(self: &Arc<Self>, request: &ApiRequest) -> Result<HttpResponse> {
		let used = self.current_token()?;
		let generation = self.refresh.generation();
		let response = self.dispatch(request, used.as_ref()).await?;

		if response.status() != StatusCode::UNAUTHORIZED || !request.reauth {
			return ensure_success(response);
		}

		let original = ApiError::from_body(response.status().as_u16(), response.body());
		let current = self.session.access_token();
		let retry_token = match (used, current) {
			// Another caller already rotated the token this request was sent with.
			(Some(used), Some(current)) if used != current => {
				obs::report_refresh(RefreshTransition::Rotated, None);

				current
			},
			_ => match self.refresh_shared(Some(generation)).await {
				Ok(token) => token,
				Err(refresh) => {
					return Err(Error::Unauthorized { response: original, refresh: Some(refresh) });
				},
			},
		};
		let retried = self.dispatch(request, Some(&retry_token)).await?;

		if retried.status() == StatusCode::UNAUTHORIZED {
			return Err(Error::Unauthorized {
				response: ApiError::from_body(retried.status().as_u16(), retried.body()),
				refresh: None,
			});
		}

		ensure_success(retried)
	}

	/// Builds the outbound request with headers and hands it to the transport.
	async fn dispatch(
		&self,
		request: &ApiRequest,
		token: Option<&AccessToken>,
	) -> Result<HttpResponse> {
		let http_request = self.build_request(request, token)?;

		self.http_client
			.execute(http_request)
			.await
			.map_err(|e| Error::from(TransportError::network(e)))
	}

	fn build_request(
		&self,
		request: &ApiRequest,
		token: Option<&AccessToken>,
	) -> Result<HttpRequest> {
		let mut url = self.config.endpoint(&request.path)?;

		if !request.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &request.query {
				pairs.append_pair(key, value);
			}
		}

		let fingerprint = self.store.fingerprint_or_create()?;
		let locale = *self.locale.read();
		let mut builder = http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.header(ACCEPT, "application/json")
			.header(ACCEPT_LANGUAGE, locale.as_str())
			.header(FINGERPRINT_HEADER, header_value(fingerprint.as_str())?);

		if let Some(token) = token {
			builder = builder.header(AUTHORIZATION, header_value(&token.bearer())?);
		}

		let body = match &request.body {
			Some(body) => {
				builder = builder.header(CONTENT_TYPE, "application/json");

				serde_json::to_vec(body).map_err(ConfigError::from)?
			},
			None => Vec::new(),
		};

		Ok(builder.body(body).map_err(ConfigError::from)?)
	}
}

fn header_value(raw: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(raw).map_err(|e| Error::from(ConfigError::HttpRequest(e.into())))
}

fn ensure_success(response: HttpResponse) -> Result<HttpResponse> {
	if response.status().is_success() {
		Ok(response)
	} else {
		Err(Error::Api(ApiError::from_body(response.status().as_u16(), response.body())))
	}
}

#[derive(Deserialize)]
struct Envelope {
	#[serde(default)]
	success: Option<bool>,
	#[serde(default)]
	data: serde_json::Value,
}

/// Unwraps `{ success, data }` and decodes `data` as `T`, reporting the JSON path on failure.
fn decode_envelope<T>(path: &str, status: StatusCode, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let data = if body.iter().all(u8::is_ascii_whitespace) {
		serde_json::Value::Null
	} else {
		let mut de = serde_json::Deserializer::from_slice(body);
		let envelope: Envelope = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { path: path.into(), source })?;

		if envelope.success == Some(false) {
			return Err(Error::Api(ApiError::from_body(status.as_u16(), body)));
		}

		envelope.data
	};

	serde_path_to_error::deserialize(data)
		.map_err(|source| Error::Decode { path: path.into(), source })
}
