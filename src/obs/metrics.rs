// self
use crate::obs::{FlowKind, FlowOutcome, RefreshTransition};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"admin_gateway_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts refresh coordinator transitions as `admin_gateway_refresh_transition_total`.
pub fn record_refresh_transition(transition: RefreshTransition) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"admin_gateway_refresh_transition_total",
			"transition" => transition.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = transition;
	}
}
