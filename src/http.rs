//! Reqwest-backed [`AuthTransport`] speaking the auth service's HTTP endpoints.
//!
//! Requests go to `{host}/login/`, `{host}/signup/`, `{host}/access-token/`, and
//! `{host}/refresh-token/`. Renewals present the refresh token in the `Authorization` header;
//! when a [`RefreshProof`] carries no token the header is omitted and the session cookies kept by
//! the client's cookie store prove identity instead. Any status other than 200 becomes
//! [`Error::Rejected`] with the message resolved through the current [`ErrorStrings`] table.

pub mod strings;

pub use strings::ErrorStrings;

// std
use std::fmt::Write as _;
// crates.io
use reqwest::{
	RequestBuilder, StatusCode,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials, RefreshToken, Secret, SignupRequest, Token},
	error::{ConfigError, TransientError, TransportError},
	transport::{AuthTransport, RefreshProof, TransportFuture},
};

const ACCESS_TOKEN_FIELD: &str = "access-token";
const KEEP_LOGGED_IN_PARAM: &str = "keep-logged-in";
const REFRESH_TOKEN_FIELD: &str = "refresh-token";

/// HTTP transport for the auth service.
///
/// Cloning is cheap; clones share the connection pool, cookie store, and message table.
#[derive(Clone)]
pub struct ReqwestAuthTransport {
	client: ReqwestClient,
	host: Url,
	strings: Arc<RwLock<ErrorStrings>>,
}
impl ReqwestAuthTransport {
	/// Builds a transport with its own cookie-enabled client.
	pub fn new(host: Url) -> Result<Self> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(client, host))
	}

	/// Wraps an existing client. Enable its cookie store to use ambient renewals.
	pub fn with_client(client: ReqwestClient, host: Url) -> Self {
		Self { client, host, strings: Default::default() }
	}

	/// Base URL every endpoint path is appended to.
	pub fn host(&self) -> &Url {
		&self.host
	}

	/// Snapshot of the message table used for rejected requests.
	pub fn strings(&self) -> ErrorStrings {
		self.strings.read().clone()
	}

	/// Replaces the message table.
	pub fn set_strings(&self, strings: ErrorStrings) {
		*self.strings.write() = strings;
	}

	/// Fetches `{host}/strings/{lang}.json` and installs it as the message table.
	///
	/// The current table is kept when the request fails.
	pub async fn load_strings(&self, lang: &str) -> Result<()> {
		let url = self.endpoint(&format!("/strings/{lang}.json"))?;
		let strings = self.send::<ErrorStrings>(self.client.get(url)).await?;

		tracing::debug!(lang, entries = strings.len(), "loaded localized error strings");
		self.set_strings(strings);

		Ok(())
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		let base = self.host.as_str().trim_end_matches('/');

		Url::parse(&format!("{base}{path}")).map_err(|e| ConfigError::from(e).into())
	}

	fn renewal_request(&self, path: &str, proof: &RefreshProof) -> Result<RequestBuilder> {
		let mut url = self.endpoint(path)?;

		if proof.keep_logged_in {
			url.query_pairs_mut().append_pair(KEEP_LOGGED_IN_PARAM, "true");
		}

		let request = self.client.get(url);

		Ok(match &proof.refresh_token {
			Some(token) => request.header(AUTHORIZATION, token.expose()),
			None => request,
		})
	}

	async fn send<R>(&self, request: RequestBuilder) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let response = request.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let is_json = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.contains("application/json"));
		let body = response.bytes().await.map_err(TransportError::from)?;

		if status != StatusCode::OK {
			return Err(self.rejection(status, is_json, &body));
		}

		let de = &mut serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(de).map_err(|source| {
			TransientError::ResponseParse { source, status: Some(status.as_u16()) }.into()
		})
	}

	async fn send_for_token(
		&self,
		request: RequestBuilder,
		field: &'static str,
	) -> Result<String> {
		let mut data = self.send::<HashMap<String, serde_json::Value>>(request).await?;

		match data.remove(field) {
			Some(serde_json::Value::String(token)) => Ok(token),
			_ => Err(TransientError::MissingField { field }.into()),
		}
	}

	fn rejection(&self, status: StatusCode, is_json: bool, body: &[u8]) -> Error {
		let reason = is_json
			.then(|| serde_json::from_slice::<ErrorBody>(body).ok())
			.flatten()
			.map(|body| body.reason)
			.unwrap_or_else(|| ErrorStrings::UNKNOWN_ERROR.to_owned());
		let message = self.strings.read().resolve(&reason).to_owned();

		tracing::debug!(
			status = status.as_u16(),
			reason = %reason,
			"auth service rejected the request"
		);

		Error::Rejected { reason, message, status: Some(status.as_u16()) }
	}
}
impl AuthTransport for ReqwestAuthTransport {
	fn login(
		&self,
		credentials: Credentials,
		keep_logged_in: bool,
	) -> TransportFuture<'_, RefreshToken> {
		Box::pin(async move {
			let url = self.endpoint("/login/")?;
			let body = CredentialBody {
				id: &credentials.id,
				password: hash_password(&credentials.password),
				g_response: None,
				keep_logged_in,
			};
			let token =
				self.send_for_token(self.client.post(url).json(&body), REFRESH_TOKEN_FIELD).await?;

			Ok(RefreshToken::new(token))
		})
	}

	fn signup(
		&self,
		request: SignupRequest,
		keep_logged_in: bool,
	) -> TransportFuture<'_, RefreshToken> {
		Box::pin(async move {
			let url = self.endpoint("/signup/")?;
			let body = CredentialBody {
				id: &request.credentials.id,
				password: hash_password(&request.credentials.password),
				g_response: Some(request.challenge_response.expose()),
				keep_logged_in,
			};
			let token =
				self.send_for_token(self.client.post(url).json(&body), REFRESH_TOKEN_FIELD).await?;

			Ok(RefreshToken::new(token))
		})
	}

	fn fetch_access_token(&self, proof: RefreshProof) -> TransportFuture<'_, AccessToken> {
		Box::pin(async move {
			let request = self.renewal_request("/access-token/", &proof)?;
			let token = self.send_for_token(request, ACCESS_TOKEN_FIELD).await?;

			Ok(AccessToken::new(token))
		})
	}

	fn renew_refresh_token(&self, proof: RefreshProof) -> TransportFuture<'_, RefreshToken> {
		Box::pin(async move {
			let request = self.renewal_request("/refresh-token/", &proof)?;
			let token = self.send_for_token(request, REFRESH_TOKEN_FIELD).await?;

			Ok(RefreshToken::new(token))
		})
	}
}
impl Debug for ReqwestAuthTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestAuthTransport").field("host", &self.host.as_str()).finish()
	}
}

#[derive(Serialize)]
struct CredentialBody<'a> {
	id: &'a str,
	password: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	g_response: Option<&'a str>,
	#[serde(rename = "keep-logged-in", skip_serializing_if = "is_false")]
	keep_logged_in: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
	reason: String,
}

fn is_false(value: &bool) -> bool {
	!*value
}

/// Lowercase hex SHA-256 of the password's UTF-8 bytes; the service never sees the plain text.
fn hash_password(password: &Secret) -> String {
	let digest = Sha256::digest(password.expose().as_bytes());

	digest.iter().fold(String::with_capacity(digest.len() * 2), |mut hex, byte| {
		let _ = write!(hex, "{byte:02x}");

		hex
	})
}
