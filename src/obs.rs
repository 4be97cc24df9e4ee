//! Observability helpers for renewal checks.
//!
//! # Feature Flags
//!
//! - Spans named `token_keeper.renewal` carrying the `kind` (token kind) and `stage` (call site)
//!   fields are always emitted through `tracing`.
//! - Enable `metrics` to increment the `token_keeper_renewal_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each renewal attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenewalOutcome {
	/// A renewal call is about to be issued.
	Attempt,
	/// The transport returned a replacement token.
	Success,
	/// The transport call failed; the held token was kept.
	Failure,
}
impl RenewalOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RenewalOutcome::Attempt => "attempt",
			RenewalOutcome::Success => "success",
			RenewalOutcome::Failure => "failure",
		}
	}
}
impl Display for RenewalOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
