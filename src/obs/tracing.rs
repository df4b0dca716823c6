// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("admin_gateway.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Refresh coordinator transitions reported through [`report_refresh`](crate::obs::report_refresh).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshTransition {
	/// A caller started a new refresh cycle.
	Started,
	/// A caller attached to the pending cycle.
	Joined,
	/// The cycle settled successfully.
	Succeeded,
	/// The cycle failed and the session was cleared.
	Failed,
	/// A caller skipped refreshing because the token had already rotated.
	Rotated,
	/// A late caller took the outcome of a cycle that settled while its request was in flight.
	Reused,
}
impl RefreshTransition {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshTransition::Started => "started",
			RefreshTransition::Joined => "joined",
			RefreshTransition::Succeeded => "succeeded",
			RefreshTransition::Failed => "failed",
			RefreshTransition::Rotated => "rotated",
			RefreshTransition::Reused => "reused",
		}
	}
}

/// Emits an event for a refresh coordinator transition (when tracing is enabled).
///
/// Failures are logged at `warn`, everything else at `debug`.
pub fn trace_refresh(transition: RefreshTransition, detail: Option<&dyn Display>) {
	#[cfg(feature = "tracing")]
	{
		let detail = detail.map(ToString::to_string);
		let detail = detail.as_deref();

		if transition == RefreshTransition::Failed {
			tracing::warn!(transition = transition.as_str(), detail, "refresh cycle failed");
		} else {
			tracing::debug!(transition = transition.as_str(), detail, "refresh coordinator");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (transition, detail);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn trace_refresh_noop_without_tracing() {
		trace_refresh(RefreshTransition::Failed, Some(&"no token"));
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
