//! Compact token decoding without signature verification.
//!
//! The keeper only reads the decoded expiry as a local renewal heuristic, never as a trust
//! boundary, so [`decode`] fails soft: malformed input is logged and reported as `None` and the
//! caller skips the current check.

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::{_prelude::*, auth::TokenPayload};

/// Accepts both base64 alphabets once normalized to URL-safe, with or without padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new()
		.with_encode_padding(false)
		.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a token string could not be decoded.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The token does not contain a payload segment.
	#[error("Token has {found} dot-separated segment(s); at least 2 are required.")]
	SegmentCount {
		/// Number of segments found.
		found: usize,
	},
	/// The payload segment is not valid base64.
	#[error("Token payload is not valid base64.")]
	Base64(#[from] base64::DecodeError),
	/// The payload segment is not a JSON object with the expected claims.
	#[error("Token payload is not a valid claim set.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Decodes the payload of `token`, logging and swallowing any failure.
pub fn decode(token: &str) -> Option<TokenPayload> {
	match decode_payload(token) {
		Ok(payload) => Some(payload),
		Err(err) => {
			tracing::warn!(error = %err, "failed to decode token payload");

			None
		},
	}
}

/// Decodes the payload of `token`, reporting why decoding failed.
pub fn decode_payload(token: &str) -> Result<TokenPayload, DecodeError> {
	let mut segments = token.split('.');
	let found = token.split('.').count();
	let encoded = match (segments.next(), segments.next()) {
		(Some(_), Some(payload)) => payload,
		_ => return Err(DecodeError::SegmentCount { found }),
	};
	let normalized = encoded.replace('+', "-").replace('/', "_");
	let bytes = LENIENT_BASE64.decode(normalized)?;
	let de = &mut serde_json::Deserializer::from_slice(&bytes);

	Ok(serde_path_to_error::deserialize(de)?)
}
