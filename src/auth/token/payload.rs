//! Decoded token payload and its expiry helpers.

// crates.io
use serde::{Deserializer, de::Error as _};
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// Claims carried in the middle segment of a compact token.
///
/// Only the fields the keeper reads are modelled; unknown fields are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
	/// Token discriminator emitted by the service (`"refresh"`, `"access"`, ...).
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Absolute expiry instant.
	///
	/// Accepted as an RFC 3339 string or as Unix seconds.
	#[serde(
		deserialize_with = "deserialize_instant",
		serialize_with = "time::serde::rfc3339::serialize"
	)]
	pub expires: OffsetDateTime,
	/// Subject identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Renewal counter, present on refresh tokens only.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub generation: Option<u64>,
}
impl TokenPayload {
	/// Remaining lifetime at `now`; negative once the token has expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires - now
	}

	/// Returns `true` once `now` reached the expiry instant.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInstant {
	Seconds(i64),
	Fractional(f64),
	Text(String),
}

fn deserialize_instant<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	match RawInstant::deserialize(deserializer)? {
		RawInstant::Seconds(secs) =>
			OffsetDateTime::from_unix_timestamp(secs).map_err(D::Error::custom),
		RawInstant::Fractional(secs) => {
			let nanos = (secs * 1_000_000_000.0) as i128;

			OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(D::Error::custom)
		},
		RawInstant::Text(raw) => OffsetDateTime::parse(&raw, &Rfc3339).map_err(D::Error::custom),
	}
}
