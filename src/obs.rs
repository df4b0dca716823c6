//! Optional observability helpers for gateway flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `admin_gateway.flow` with the `flow` and
//!   `stage` (call site) fields, plus debug/warn events for refresh coordinator transitions.
//! - Enable `metrics` to increment the `admin_gateway_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and
//!   `admin_gateway_refresh_transition_total`, labeled by `transition`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Gateway flow kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Credential login.
	Login,
	/// Session restore from a persisted token.
	Restore,
	/// Shared refresh cycle.
	Refresh,
	/// Server + local logout.
	Logout,
	/// Any other authenticated request.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Restore => "restore",
			FlowKind::Refresh => "refresh",
			FlowKind::Logout => "logout",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a gateway helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records `Success`/`Failure` for a finished flow based on its result.
pub fn record_flow_result<T, E>(kind: FlowKind, result: &std::result::Result<T, E>) {
	match result {
		Ok(_) => record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => record_flow_outcome(kind, FlowOutcome::Failure),
	}
}

/// Reports a refresh coordinator transition to both the tracing and metrics backends.
pub fn report_refresh(transition: RefreshTransition, detail: Option<&dyn Display>) {
	trace_refresh(transition, detail);
	record_refresh_transition(transition);
}
