//! Localized messages for the reason codes the auth service reports.

// self
use crate::_prelude::*;

/// Reason code → human-readable message table, usually loaded per language from the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorStrings(HashMap<String, String>);
impl ErrorStrings {
	/// Reason code used when the service gives no usable reason.
	pub const UNKNOWN_ERROR: &'static str = "UNKNOWN_ERROR";

	const UNKNOWN_ERROR_MESSAGE: &'static str = "An unknown error has occurred.";

	/// Returns the message registered for `reason`, if any.
	pub fn get(&self, reason: &str) -> Option<&str> {
		self.0.get(reason).map(String::as_str)
	}

	/// Number of registered reason codes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no reason code is registered.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Registers or replaces the message for `reason`.
	pub fn insert(&mut self, reason: impl Into<String>, message: impl Into<String>) {
		self.0.insert(reason.into(), message.into());
	}

	/// Resolves `reason` to a message, falling back to the unknown-error text.
	pub fn resolve(&self, reason: &str) -> &str {
		self.get(reason)
			.or_else(|| self.get(Self::UNKNOWN_ERROR))
			.unwrap_or(Self::UNKNOWN_ERROR_MESSAGE)
	}
}
impl Default for ErrorStrings {
	fn default() -> Self {
		Self(HashMap::from([(Self::UNKNOWN_ERROR.into(), Self::UNKNOWN_ERROR_MESSAGE.into())]))
	}
}
impl FromIterator<(String, String)> for ErrorStrings {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		Self(iter.into_iter().collect())
	}
}
