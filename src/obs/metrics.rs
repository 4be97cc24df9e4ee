//! Renewal counter export. The keeper records every attempt and its outcome here and in its own
//! [`RenewalMetrics`](crate::keeper::RenewalMetrics).

// self
use crate::{auth::TokenKind, obs::RenewalOutcome};

/// Records a renewal outcome via the global metrics recorder (when enabled).
pub fn record_renewal_outcome(kind: TokenKind, outcome: RenewalOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_keeper_renewal_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
