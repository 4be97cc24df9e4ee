//! Contract between the keeper and the remote auth service.
//!
//! [`AuthTransport`] is the keeper's only dependency on the network. The crate ships
//! [`ReqwestAuthTransport`](crate::http::ReqwestAuthTransport) behind the `reqwest` feature;
//! tests and alternative stacks implement the trait directly.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials, RefreshToken, SignupRequest},
};

/// Boxed future returned by [`AuthTransport`] operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// The four operations the auth service exposes.
///
/// Implementations translate non-success responses into [`Error`] values; the keeper logs them
/// and retries on its next check.
pub trait AuthTransport
where
	Self: Send + Sync,
{
	/// Exchanges credentials for a refresh token.
	fn login(
		&self,
		credentials: Credentials,
		keep_logged_in: bool,
	) -> TransportFuture<'_, RefreshToken>;

	/// Creates an account and returns its first refresh token.
	fn signup(
		&self,
		request: SignupRequest,
		keep_logged_in: bool,
	) -> TransportFuture<'_, RefreshToken>;

	/// Exchanges a refresh token for a short-lived access token.
	fn fetch_access_token(&self, proof: RefreshProof) -> TransportFuture<'_, AccessToken>;

	/// Exchanges a refresh token for its successor.
	fn renew_refresh_token(&self, proof: RefreshProof) -> TransportFuture<'_, RefreshToken>;
}

/// Proof of identity presented to the renewal operations.
///
/// An explicit refresh token always takes precedence. Leaving it unset selects the ambient
/// mode, where the transport relies on credentials it already carries (session cookies set by an
/// earlier login). The keeper itself always sends an explicit token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshProof {
	/// Refresh token proving identity; `None` selects ambient credentials.
	pub refresh_token: Option<RefreshToken>,
	/// Asks the service to issue a long-lived session.
	pub keep_logged_in: bool,
}
impl RefreshProof {
	/// Proof backed by an explicit refresh token.
	pub fn token(refresh_token: RefreshToken) -> Self {
		Self { refresh_token: Some(refresh_token), keep_logged_in: false }
	}

	/// Proof backed only by ambient credentials held by the transport.
	pub fn ambient() -> Self {
		Self::default()
	}

	/// Overrides the keep-logged-in flag.
	pub fn with_keep_logged_in(mut self, keep_logged_in: bool) -> Self {
		self.keep_logged_in = keep_logged_in;

		self
	}
}
impl From<RefreshToken> for RefreshProof {
	fn from(refresh_token: RefreshToken) -> Self {
		Self::token(refresh_token)
	}
}

impl<T> AuthTransport for Arc<T>
where
	T: ?Sized + AuthTransport,
{
	fn login(
		&self,
		credentials: Credentials,
		keep_logged_in: bool,
	) -> TransportFuture<'_, RefreshToken> {
		(**self).login(credentials, keep_logged_in)
	}

	fn signup(
		&self,
		request: SignupRequest,
		keep_logged_in: bool,
	) -> TransportFuture<'_, RefreshToken> {
		(**self).signup(request, keep_logged_in)
	}

	fn fetch_access_token(&self, proof: RefreshProof) -> TransportFuture<'_, AccessToken> {
		(**self).fetch_access_token(proof)
	}

	fn renew_refresh_token(&self, proof: RefreshProof) -> TransportFuture<'_, RefreshToken> {
		(**self).renew_refresh_token(proof)
	}
}
