// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::auth::TokenKind;

/// Thread-safe renewal counters, one set per token kind.
#[derive(Debug, Default)]
pub struct RenewalMetrics {
	refresh: KindCounters,
	access: KindCounters,
}
impl RenewalMetrics {
	/// Returns the number of renewal calls issued for `kind`.
	pub fn attempts(&self, kind: TokenKind) -> u64 {
		self.counters(kind).attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals for `kind` that produced a new token.
	pub fn successes(&self, kind: TokenKind) -> u64 {
		self.counters(kind).success.load(Ordering::Relaxed)
	}

	/// Returns the number of renewals for `kind` the transport rejected or could not deliver.
	pub fn failures(&self, kind: TokenKind) -> u64 {
		self.counters(kind).failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self, kind: TokenKind) {
		self.counters(kind).attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self, kind: TokenKind) {
		self.counters(kind).success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self, kind: TokenKind) {
		self.counters(kind).failure.fetch_add(1, Ordering::Relaxed);
	}

	fn counters(&self, kind: TokenKind) -> &KindCounters {
		match kind {
			TokenKind::Refresh => &self.refresh,
			TokenKind::Access => &self.access,
		}
	}
}

#[derive(Debug, Default)]
struct KindCounters {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
