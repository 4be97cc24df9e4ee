//! Client-side credential keeper: trade user credentials for a refresh token, trade the refresh
//! token for short-lived access tokens, and renew both in the background before they expire.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod decode;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod keeper;
pub mod obs;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use crate::{
		auth::{AccessToken, Credentials, RefreshToken, SignupRequest, Token},
		error::TransientError,
		transport::{AuthTransport, RefreshProof, TransportFuture},
	};

	/// Builds an unsigned compact token whose payload carries the provided claims.
	pub fn compact_token(kind: &str, expires: OffsetDateTime, generation: Option<u64>) -> String {
		let mut payload = serde_json::json!({
			"type": kind,
			"id": "tester",
			"expires": expires.unix_timestamp(),
		});

		if let Some(generation) = generation {
			payload["generation"] = generation.into();
		}

		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let body = URL_SAFE_NO_PAD.encode(payload.to_string());

		format!("{header}.{body}.signature")
	}

	/// Refresh token fixture that expires `lifetime` from now.
	pub fn refresh_token_expiring_in(lifetime: Duration, generation: u64) -> RefreshToken {
		RefreshToken::new(compact_token(
			"refresh",
			OffsetDateTime::now_utc() + lifetime,
			Some(generation),
		))
	}

	/// Access token fixture that expires `lifetime` from now.
	pub fn access_token_expiring_in(lifetime: Duration) -> AccessToken {
		AccessToken::new(compact_token("access", OffsetDateTime::now_utc() + lifetime, None))
	}

	/// Scripted [`AuthTransport`] that mints fresh tokens and counts every call.
	///
	/// Queued failures are consumed before any token is minted, which lets tests simulate
	/// rejected or unreachable renewals.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		logins: AtomicUsize,
		signups: AtomicUsize,
		access_fetches: AtomicUsize,
		refresh_renewals: AtomicUsize,
		failures: Mutex<VecDeque<Error>>,
		proofs: Mutex<Vec<RefreshProof>>,
		delay: Mutex<Option<StdDuration>>,
		refresh_delay: Mutex<Option<StdDuration>>,
	}
	impl ScriptedTransport {
		/// Queues an error returned by the next transport call.
		pub fn fail_next(&self, error: Error) {
			self.failures.lock().push_back(error);
		}

		/// Makes every renewal call wait for `delay` before resolving.
		pub fn delay_renewals(&self, delay: StdDuration) {
			*self.delay.lock() = Some(delay);
		}

		/// Makes only `renew_refresh_token` wait for `delay`, on top of any shared delay.
		pub fn delay_refresh_renewals(&self, delay: StdDuration) {
			*self.refresh_delay.lock() = Some(delay);
		}

		/// Number of `login` calls observed.
		pub fn logins(&self) -> usize {
			self.logins.load(Ordering::SeqCst)
		}

		/// Number of `signup` calls observed.
		pub fn signups(&self) -> usize {
			self.signups.load(Ordering::SeqCst)
		}

		/// Number of `fetch_access_token` calls observed.
		pub fn access_fetches(&self) -> usize {
			self.access_fetches.load(Ordering::SeqCst)
		}

		/// Number of `renew_refresh_token` calls observed.
		pub fn refresh_renewals(&self) -> usize {
			self.refresh_renewals.load(Ordering::SeqCst)
		}

		/// Proofs passed to the renewal calls, in call order.
		pub fn proofs(&self) -> Vec<RefreshProof> {
			self.proofs.lock().clone()
		}

		fn take_failure(&self) -> Result<()> {
			match self.failures.lock().pop_front() {
				Some(err) => Err(err),
				None => Ok(()),
			}
		}

		async fn pause(&self, extra: Option<StdDuration>) {
			let delay = *self.delay.lock();

			for delay in [delay, extra].into_iter().flatten() {
				tokio::time::sleep(delay).await;
			}
		}
	}
	impl AuthTransport for ScriptedTransport {
		fn login(&self, _: Credentials, _: bool) -> TransportFuture<'_, RefreshToken> {
			Box::pin(async move {
				let n = self.logins.fetch_add(1, Ordering::SeqCst) as u64;

				self.take_failure()?;

				Ok(refresh_token_expiring_in(Duration::days(7), n))
			})
		}

		fn signup(&self, _: SignupRequest, _: bool) -> TransportFuture<'_, RefreshToken> {
			Box::pin(async move {
				self.signups.fetch_add(1, Ordering::SeqCst);
				self.take_failure()?;

				Ok(refresh_token_expiring_in(Duration::days(7), 0))
			})
		}

		fn fetch_access_token(&self, proof: RefreshProof) -> TransportFuture<'_, AccessToken> {
			Box::pin(async move {
				let n = self.access_fetches.fetch_add(1, Ordering::SeqCst);

				self.proofs.lock().push(proof);
				self.pause(None).await;
				self.take_failure()?;

				// Lifetimes differ per call so every minted token is unique.
				Ok(access_token_expiring_in(Duration::minutes(30) + Duration::seconds(n as i64)))
			})
		}

		fn renew_refresh_token(&self, proof: RefreshProof) -> TransportFuture<'_, RefreshToken> {
			Box::pin(async move {
				let n = self.refresh_renewals.fetch_add(1, Ordering::SeqCst) as u64;
				let extra = *self.refresh_delay.lock();

				self.proofs.lock().push(proof.clone());
				self.pause(extra).await;
				self.take_failure()?;

				let generation = proof
					.refresh_token
					.as_ref()
					.and_then(|token| token.decode())
					.and_then(|payload| payload.generation)
					.ok_or(TransientError::MissingField { field: "generation" })?;

				Ok(refresh_token_expiring_in(
					Duration::days(7) + Duration::seconds(n as i64),
					generation + 1,
				))
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
