//! Login and signup credential bundles.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, Secret, UserId},
};

/// Identifier and password pair presented to the login endpoint.
#[derive(Clone, Debug)]
pub struct Credentials {
	/// Login identifier.
	pub id: UserId,
	/// Plain-text password; transports decide how it is hashed on the wire.
	pub password: Secret,
}
impl Credentials {
	/// Validates `id` and wraps the password.
	pub fn new(id: impl AsRef<str>, password: impl Into<Secret>) -> Result<Self, IdentifierError> {
		Ok(Self { id: UserId::new(id)?, password: password.into() })
	}
}

/// Credentials plus the human-verification challenge response required at signup.
#[derive(Clone, Debug)]
pub struct SignupRequest {
	/// Identifier and password for the new account.
	pub credentials: Credentials,
	/// Response token produced by the challenge widget (e.g. reCAPTCHA).
	pub challenge_response: Secret,
}
impl SignupRequest {
	/// Bundles credentials with a challenge response.
	pub fn new(credentials: Credentials, challenge_response: impl Into<Secret>) -> Self {
		Self { credentials, challenge_response: challenge_response.into() }
	}
}
