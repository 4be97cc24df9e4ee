//! Renewal thresholds and check periods.

// crates.io
use tokio::time::Instant;
// self
use crate::{_prelude::*, auth::TokenKind, error::ConfigError};

/// Remaining-lifetime cutoff below which a token is renewed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawThreshold", into = "RawThreshold")]
pub enum RenewalThreshold {
	/// Renew on every check regardless of the remaining lifetime.
	Always,
	/// Renew once less than this much lifetime remains.
	Within(Duration),
}
impl RenewalThreshold {
	/// Returns `true` when a token with `remaining` lifetime must be renewed.
	pub fn should_renew(self, remaining: Duration) -> bool {
		match self {
			Self::Always => true,
			Self::Within(threshold) => remaining < threshold,
		}
	}
}

/// Wire form of [`RenewalThreshold`]: the keyword `"always"` or whole seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawThreshold {
	Seconds(i64),
	Keyword(String),
}
impl TryFrom<RawThreshold> for RenewalThreshold {
	type Error = String;

	fn try_from(raw: RawThreshold) -> Result<Self, Self::Error> {
		match raw {
			RawThreshold::Seconds(secs) => Ok(Self::Within(Duration::seconds(secs))),
			RawThreshold::Keyword(word) if word.eq_ignore_ascii_case("always") => Ok(Self::Always),
			RawThreshold::Keyword(word) => Err(format!(
				"unknown renewal threshold `{word}`, expected `always` or whole seconds"
			)),
		}
	}
}
impl From<RenewalThreshold> for RawThreshold {
	fn from(threshold: RenewalThreshold) -> Self {
		match threshold {
			RenewalThreshold::Always => Self::Keyword("always".into()),
			RenewalThreshold::Within(window) => Self::Seconds(window.whole_seconds()),
		}
	}
}

/// Thresholds and periods used by [`TokenKeeper::arm`](crate::keeper::TokenKeeper::arm).
///
/// Deserializes from a partial document; missing fields keep their defaults. Periods are
/// expressed in whole seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
	/// Renewal threshold for the refresh token.
	pub refresh_threshold: RenewalThreshold,
	/// Renewal threshold for the access token.
	pub access_threshold: RenewalThreshold,
	/// How often the refresh token is re-evaluated.
	#[serde(with = "whole_seconds")]
	pub refresh_check_period: StdDuration,
	/// How often the access token is re-evaluated.
	#[serde(with = "whole_seconds")]
	pub access_check_period: StdDuration,
	/// Asks the service for long-lived sessions on every renewal.
	pub keep_logged_in: bool,
}
impl KeeperConfig {
	const DEFAULT_ACCESS_CHECK_PERIOD: StdDuration = StdDuration::from_secs(5 * 60);
	const DEFAULT_ACCESS_THRESHOLD: Duration = Duration::minutes(10);
	const DEFAULT_REFRESH_CHECK_PERIOD: StdDuration = StdDuration::from_secs(30 * 60);
	const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::hours(1);

	/// Overrides the refresh-token renewal threshold.
	pub fn with_refresh_threshold(mut self, threshold: RenewalThreshold) -> Self {
		self.refresh_threshold = threshold;

		self
	}

	/// Overrides the access-token renewal threshold.
	pub fn with_access_threshold(mut self, threshold: RenewalThreshold) -> Self {
		self.access_threshold = threshold;

		self
	}

	/// Overrides the refresh-token check period.
	pub fn with_refresh_check_period(mut self, period: StdDuration) -> Self {
		self.refresh_check_period = period;

		self
	}

	/// Overrides the access-token check period.
	pub fn with_access_check_period(mut self, period: StdDuration) -> Self {
		self.access_check_period = period;

		self
	}

	/// Overrides the keep-logged-in flag sent with renewals.
	pub fn with_keep_logged_in(mut self, keep_logged_in: bool) -> Self {
		self.keep_logged_in = keep_logged_in;

		self
	}

	/// Threshold for the given token kind.
	pub fn threshold(&self, kind: TokenKind) -> RenewalThreshold {
		match kind {
			TokenKind::Refresh => self.refresh_threshold,
			TokenKind::Access => self.access_threshold,
		}
	}

	/// Check period for the given token kind.
	pub fn check_period(&self, kind: TokenKind) -> StdDuration {
		match kind {
			TokenKind::Refresh => self.refresh_check_period,
			TokenKind::Access => self.access_check_period,
		}
	}

	/// Rejects periods the timers cannot run with: zero, or too large to add to the clock.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let now = Instant::now();

		for kind in [TokenKind::Refresh, TokenKind::Access] {
			let period = self.check_period(kind);

			if period.is_zero() {
				return Err(ConfigError::ZeroCheckPeriod { kind: kind.as_str() });
			}
			// The timer schedules its first tick one period out, and every tick after it.
			if now.checked_add(period).and_then(|first| first.checked_add(period)).is_none() {
				return Err(ConfigError::CheckPeriodOutOfRange {
					kind: kind.as_str(),
					secs: period.as_secs(),
				});
			}
		}

		Ok(())
	}
}
impl Default for KeeperConfig {
	fn default() -> Self {
		Self {
			refresh_threshold: RenewalThreshold::Within(Self::DEFAULT_REFRESH_THRESHOLD),
			access_threshold: RenewalThreshold::Within(Self::DEFAULT_ACCESS_THRESHOLD),
			refresh_check_period: Self::DEFAULT_REFRESH_CHECK_PERIOD,
			access_check_period: Self::DEFAULT_ACCESS_CHECK_PERIOD,
			keep_logged_in: false,
		}
	}
}

mod whole_seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(period: &StdDuration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(period.as_secs())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<StdDuration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(StdDuration::from_secs)
	}
}
