//! Keeper-level error types shared across the transport, decoder, and scheduler.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; the next attempt may succeed.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The auth service refused the request.
	#[error("{message}")]
	Rejected {
		/// Machine-readable reason code reported by the service.
		reason: String,
		/// Localized, human-readable message resolved for `reason`.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An endpoint URL could not be derived from the configured host.
	#[error("Endpoint URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The login identifier failed validation.
	#[error("User identifier is invalid.")]
	InvalidUserId(#[from] crate::auth::IdentifierError),
	/// A periodic check was configured with a zero period.
	#[error("The {kind} token check period must be greater than zero.")]
	ZeroCheckPeriod {
		/// Token kind label.
		kind: &'static str,
	},
	/// A periodic check was configured with a period the timer clock cannot represent.
	#[error("The {kind} token check period of {secs}s is too large to schedule.")]
	CheckPeriodOutOfRange {
		/// Token kind label.
		kind: &'static str,
		/// Configured period in whole seconds.
		secs: u64,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}

/// Temporary failure variants (safe to retry on the next check).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// The service responded with a body that could not be parsed.
	#[error("Auth service returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// A successful response omitted the expected field.
	#[error("Auth service response is missing `{field}`.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the auth service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
