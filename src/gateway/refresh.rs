//! Shared refresh cycle: at most one `POST /auth/refresh` per batch of 401s, one outcome for
//! everyone.
//!
//! The coordinator is either idle (no pending operation) or refreshing (a [`Shared`] future
//! in the slot). The first caller whose request hit 401 fills the slot; later callers clone the
//! pending future and await the same outcome. The operation settles the coordinator itself as
//! its last step, before any waiter resumes: it empties the slot, bumps the generation, and
//! keeps the outcome.
//!
//! Requests record the generation before they are sent. A 401 observed after the generation
//! moved on was answered to credentials that a settled cycle already dealt with, so that caller
//! reuses the settled outcome instead of starting another cycle.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use futures::future::{self, BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, UserDto},
	error::RefreshError,
	gateway::{ApiRequest, GatewayInner},
	http::{ApiHttpClient, HttpResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, RefreshTransition},
};

/// Outcome shared by every caller attached to one refresh cycle.
pub type RefreshOutcome = std::result::Result<AccessToken, RefreshError>;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Endpoint that exchanges the refresh cookie for a new access token.
pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Default)]
struct CoordinatorState {
	pending: Option<PendingRefresh>,
	generation: u64,
	settled: Option<RefreshOutcome>,
}

/// Deduplicates concurrent refresh attempts.
#[derive(Default)]
pub struct RefreshCoordinator {
	state: Mutex<CoordinatorState>,
	metrics: Arc<RefreshMetrics>,
}
impl RefreshCoordinator {
	/// Whether a refresh cycle is currently pending.
	pub fn is_refreshing(&self) -> bool {
		self.state.lock().pending.is_some()
	}

	/// Number of refresh cycles settled so far.
	pub fn generation(&self) -> u64 {
		self.state.lock().generation
	}

	/// Counters for refresh cycles run through this coordinator.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	/// Returns the operation whose outcome the caller should use.
	///
	/// Joins the pending cycle if there is one. Otherwise, when `observed` is an older generation
	/// than the current one, hands back the settled outcome; with `None` or an up-to-date
	/// generation, starts a cycle built by `start`. Every decision happens under a single lock
	/// acquisition; `start` only builds the future and must not poll it.
	fn join_or_start<F>(&self, observed: Option<u64>, start: F) -> PendingRefresh
	where
		F: FnOnce() -> BoxFuture<'static, RefreshOutcome>,
	{
		let mut state = self.state.lock();

		if let Some(existing) = state.pending.as_ref() {
			self.metrics.record_join();
			obs::report_refresh(RefreshTransition::Joined, None);

			return existing.clone();
		}
		let stale = observed.is_some_and(|observed| observed != state.generation);

		if let Some(settled) = state.settled.as_ref().filter(|_| stale) {
			self.metrics.record_reuse();
			obs::report_refresh(RefreshTransition::Reused, None);

			return future::ready(settled.clone()).boxed().shared();
		}

		let operation = start().shared();

		state.pending = Some(operation.clone());
		obs::report_refresh(RefreshTransition::Started, None);

		operation
	}

	fn settle(&self, outcome: &RefreshOutcome) {
		let mut state = self.state.lock();

		state.pending = None;
		state.generation += 1;
		state.settled = Some(outcome.clone());
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("RefreshCoordinator")
			.field("refreshing", &state.pending.is_some())
			.field("generation", &state.generation)
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Payload of a successful refresh.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	user: Option<UserDto>,
	#[serde(default)]
	fingerprint_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
	#[serde(default)]
	data: Option<RefreshData>,
}

impl<C> GatewayInner<C>
where
	C: ApiHttpClient,
{
	/// Runs or joins the shared refresh cycle and returns its outcome.
	///
	/// `observed` is the generation recorded before the failed request was sent; `None` forces
	/// a cycle unless one is already pending.
	pub(crate) async fn refresh_shared(self: &Arc<Self>, observed: Option<u64>) -> RefreshOutcome {
		let inner = Arc::clone(self);
		let operation = self.refresh.join_or_start(observed, move || {
			async move {
				let outcome = inner.perform_refresh().await;

				inner.refresh.settle(&outcome);

				outcome
			}
			.boxed()
		});

		operation.await
	}

	async fn perform_refresh(&self) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "perform_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh.metrics.record_attempt();

		let outcome: RefreshOutcome = span
			.instrument(async {
				let request = ApiRequest::post(REFRESH_PATH).without_reauth();
				let token = self
					.current_token()
					.map_err(|e| RefreshError::Storage { message: e.to_string() })?;
				let response = self
					.dispatch(&request, token.as_ref())
					.await
					.map_err(|e| RefreshError::Transport { message: e.to_string() })?;

				self.apply_refresh_response(response)
			})
			.await;

		match &outcome {
			Ok(_) => {
				self.refresh.metrics.record_success();
				obs::report_refresh(RefreshTransition::Succeeded, None);
			},
			Err(err) => {
				self.session.clear();

				if let Err(store_err) = self.store.clear_access_token() {
					obs::trace_refresh(RefreshTransition::Failed, Some(&store_err));
				}

				self.refresh.metrics.record_failure();
				obs::report_refresh(RefreshTransition::Failed, Some(err));
			},
		}

		obs::record_flow_result(KIND, &outcome);

		outcome
	}

	fn apply_refresh_response(&self, response: HttpResponse) -> RefreshOutcome {
		let status = response.status();

		if !status.is_success() {
			return Err(RefreshError::Rejected { status: status.as_u16() });
		}

		let body = response.body();

		if body.iter().all(u8::is_ascii_whitespace) {
			return Err(RefreshError::EmptyResponse);
		}

		let envelope: RefreshEnvelope = serde_json::from_slice(body)
			.map_err(|e| RefreshError::Decode { message: e.to_string() })?;
		let data = envelope.data.ok_or(RefreshError::EmptyResponse)?;
		let token = data
			.access_token
			.map(AccessToken::new)
			.filter(|token| !token.is_blank())
			.ok_or(RefreshError::MissingAccessToken)?;
		// Some backends omit the user on refresh; the identity then stays as it was.
		let user = data.user.or_else(|| self.session.user()).ok_or(RefreshError::MissingUser)?;

		self.store
			.set_access_token(&token)
			.map_err(|e| RefreshError::Storage { message: e.to_string() })?;

		if let Some(hash) = data.fingerprint_hash.as_deref() {
			self.store
				.save_server_fingerprint(hash)
				.map_err(|e| RefreshError::Storage { message: e.to_string() })?;
		}

		self.session.set_credentials(token.clone(), user);

		Ok(token)
	}
}
