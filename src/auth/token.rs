//! Refresh and access token newtypes.

pub mod payload;
pub mod secret;

// self
use crate::{
	_prelude::*,
	auth::token::{payload::TokenPayload, secret::Secret},
	decode,
};

/// Discriminates the two token kinds the keeper manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Long-lived credential proving identity.
	Refresh,
	/// Short-lived credential authorizing individual requests.
	Access,
}
impl TokenKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Refresh => "refresh",
			TokenKind::Access => "access",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Behavior shared by the opaque token newtypes.
pub trait Token
where
	Self: 'static + Clone + Debug + Send + Sync,
{
	/// Kind of token this type carries.
	const KIND: TokenKind;

	/// Returns the raw token string. Callers must avoid logging it.
	fn expose(&self) -> &str;

	/// Decodes the payload without verifying the signature.
	///
	/// Returns `None` when the token is malformed; see [`decode::decode`].
	fn decode(&self) -> Option<TokenPayload> {
		decode::decode(self.expose())
	}
}

/// Long-lived credential exchanged for access tokens and itself periodically renewed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(Secret);
impl RefreshToken {
	/// Wraps a raw refresh token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Secret::new(value))
	}

	/// Returns the redacted secret wrapper.
	pub fn secret(&self) -> &Secret {
		&self.0
	}
}
impl Token for RefreshToken {
	const KIND: TokenKind = TokenKind::Refresh;

	fn expose(&self) -> &str {
		self.0.expose()
	}
}
impl Debug for RefreshToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("RefreshToken").field(&"<redacted>").finish()
	}
}

/// Short-lived credential used to authorize individual requests.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(Secret);
impl AccessToken {
	/// Wraps a raw access token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Secret::new(value))
	}

	/// Returns the redacted secret wrapper.
	pub fn secret(&self) -> &Secret {
		&self.0
	}
}
impl Token for AccessToken {
	const KIND: TokenKind = TokenKind::Access;

	fn expose(&self) -> &str {
		self.0.expose()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AccessToken").field(&"<redacted>").finish()
	}
}
