//! Dual-token refresh scheduler.
//!
//! [`TokenKeeper`] holds the current refresh and access tokens and renews each one through an
//! [`AuthTransport`] once its remaining lifetime drops below a threshold. Two independent tokio
//! tasks re-evaluate the tokens on their own periods; [`TokenKeeper::arm`] additionally runs one
//! eager pass so an already-expiring token is renewed before `arm` returns.
//!
//! Renewal is best effort. A failed renewal is logged and counted, the held token is kept, and
//! the next check retries. Nothing is propagated out of the timer tasks.

mod config;
mod metrics;

pub use config::*;
pub use metrics::RenewalMetrics;

// crates.io
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials, RefreshToken, SignupRequest, Token, TokenKind},
	obs::{self, RenewalOutcome, RenewalSpan},
	transport::{AuthTransport, RefreshProof, TransportFuture},
};

/// Callback invoked with the replacement token after a successful renewal.
pub type RenewalObserver<K> = Arc<dyn Fn(&K) + Send + Sync>;

/// Result of a single check of one token kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
	/// The check did not evaluate the token.
	Skipped(SkipReason),
	/// The token still has enough lifetime left.
	Fresh,
	/// The token was replaced and the observer (if any) notified.
	Renewed,
	/// The transport failed; the held token was kept.
	Failed,
}

/// Why a check was skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
	/// No token of the checked kind is held.
	MissingToken,
	/// An access token is held but no refresh token can prove identity for its renewal.
	MissingRefreshToken,
	/// The held token could not be decoded.
	Undecodable,
}

/// Keeps a refresh token and an access token alive by renewing them before they expire.
///
/// Cloning is not supported; share the keeper behind an [`Arc`] instead. Dropping the keeper
/// disarms it.
pub struct TokenKeeper<T>
where
	T: ?Sized + AuthTransport,
{
	shared: Arc<Shared<T>>,
	timers: Mutex<Option<Timers>>,
}
impl<T> TokenKeeper<T>
where
	T: 'static + ?Sized + AuthTransport,
{
	/// Creates a disarmed keeper that holds no tokens yet.
	pub fn new(transport: impl Into<Arc<T>>) -> Self {
		Self {
			shared: Arc::new(Shared {
				transport: transport.into(),
				refresh: Default::default(),
				access: Default::default(),
				metrics: Default::default(),
			}),
			timers: Default::default(),
		}
	}

	/// Seeds the refresh token.
	pub fn with_refresh_token(self, token: RefreshToken) -> Self {
		self.set_refresh_token(Some(token));

		self
	}

	/// Seeds the access token.
	pub fn with_access_token(self, token: AccessToken) -> Self {
		self.set_access_token(Some(token));

		self
	}

	/// Transport used for renewals.
	pub fn transport(&self) -> &Arc<T> {
		&self.shared.transport
	}

	/// Renewal counters for this keeper.
	pub fn metrics(&self) -> &RenewalMetrics {
		&self.shared.metrics
	}

	/// Currently held refresh token.
	pub fn refresh_token(&self) -> Option<RefreshToken> {
		self.shared.refresh.current()
	}

	/// Currently held access token.
	pub fn access_token(&self) -> Option<AccessToken> {
		self.shared.access.current()
	}

	/// Replaces (or clears) the held refresh token.
	pub fn set_refresh_token(&self, token: Option<RefreshToken>) {
		*self.shared.refresh.token.write() = token;
	}

	/// Replaces (or clears) the held access token.
	pub fn set_access_token(&self, token: Option<AccessToken>) {
		*self.shared.access.token.write() = token;
	}

	/// Registers the callback invoked after each successful refresh-token renewal.
	pub fn watch_refresh_token<F>(&self, observer: F)
	where
		F: 'static + Fn(&RefreshToken) + Send + Sync,
	{
		*self.shared.refresh.observer.write() = Some(Arc::new(observer));
	}

	/// Registers the callback invoked after each successful access-token renewal.
	pub fn watch_access_token<F>(&self, observer: F)
	where
		F: 'static + Fn(&AccessToken) + Send + Sync,
	{
		*self.shared.access.observer.write() = Some(Arc::new(observer));
	}

	/// Removes the refresh-token observer.
	pub fn unwatch_refresh_token(&self) {
		self.shared.refresh.observer.write().take();
	}

	/// Removes the access-token observer.
	pub fn unwatch_access_token(&self) {
		self.shared.access.observer.write().take();
	}

	/// Logs in and holds the returned refresh token.
	pub async fn login(
		&self,
		credentials: Credentials,
		keep_logged_in: bool,
	) -> Result<RefreshToken> {
		let token = self.shared.transport.login(credentials, keep_logged_in).await?;

		self.set_refresh_token(Some(token.clone()));

		Ok(token)
	}

	/// Signs up and holds the returned refresh token.
	pub async fn signup(
		&self,
		request: SignupRequest,
		keep_logged_in: bool,
	) -> Result<RefreshToken> {
		let token = self.shared.transport.signup(request, keep_logged_in).await?;

		self.set_refresh_token(Some(token.clone()));

		Ok(token)
	}

	/// Starts the periodic checks, replacing any previous ones.
	///
	/// Before returning, one check of the refresh token and then one of the access token run to
	/// completion. The first periodic check of each kind fires one full period later. Must be
	/// called from within a tokio runtime.
	pub async fn arm(&self, config: KeeperConfig) -> Result<()> {
		config.validate()?;
		self.disarm();
		self.shared.check_refresh(&config, "arm").await;
		self.shared.check_access(&config, "arm").await;

		let timers = Timers {
			refresh: spawn_periodic_check(Arc::clone(&self.shared), TokenKind::Refresh, config),
			access: spawn_periodic_check(Arc::clone(&self.shared), TokenKind::Access, config),
		};

		if let Some(previous) = self.timers.lock().replace(timers) {
			previous.cancel();
		}

		tracing::debug!(
			refresh_period = ?config.refresh_check_period,
			access_period = ?config.access_check_period,
			"token keeper armed"
		);

		Ok(())
	}

	/// Stops the periodic checks.
	///
	/// A renewal already in flight is not aborted and its result still lands.
	pub fn disarm(&self) {
		if let Some(timers) = self.timers.lock().take() {
			timers.cancel();

			tracing::debug!("token keeper disarmed");
		}
	}

	/// Returns `true` while periodic checks are scheduled.
	pub fn is_armed(&self) -> bool {
		self.timers.lock().is_some()
	}

	/// Runs one refresh-token check outside the timer schedule.
	pub async fn check_refresh_token(&self, config: &KeeperConfig) -> CheckOutcome {
		self.shared.check_refresh(config, "manual").await
	}

	/// Runs one access-token check outside the timer schedule.
	pub async fn check_access_token(&self, config: &KeeperConfig) -> CheckOutcome {
		self.shared.check_access(config, "manual").await
	}
}
impl<T> Drop for TokenKeeper<T>
where
	T: ?Sized + AuthTransport,
{
	fn drop(&mut self) {
		if let Some(timers) = self.timers.get_mut().take() {
			timers.cancel();
		}
	}
}
impl<T> Debug for TokenKeeper<T>
where
	T: ?Sized + AuthTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenKeeper")
			.field("refresh_token_set", &self.shared.refresh.token.read().is_some())
			.field("access_token_set", &self.shared.access.token.read().is_some())
			.field("armed", &self.timers.lock().is_some())
			.finish()
	}
}

/// State reachable from the timer tasks.
struct Shared<T>
where
	T: ?Sized,
{
	transport: Arc<T>,
	refresh: Slot<RefreshToken>,
	access: Slot<AccessToken>,
	metrics: RenewalMetrics,
}
impl<T> Shared<T>
where
	T: ?Sized + AuthTransport,
{
	async fn check_refresh(&self, config: &KeeperConfig, stage: &'static str) -> CheckOutcome {
		let span = RenewalSpan::new(TokenKind::Refresh, stage);

		span.instrument(async move {
			let _singleflight = self.refresh.guard.lock().await;
			let Some(current) = self.refresh.current() else {
				return CheckOutcome::Skipped(SkipReason::MissingToken);
			};
			let proof = RefreshProof::token(current.clone())
				.with_keep_logged_in(config.keep_logged_in);

			self.renew_if_due(&self.refresh, &current, proof, config, |proof| {
				self.transport.renew_refresh_token(proof)
			})
			.await
		})
		.await
	}

	async fn check_access(&self, config: &KeeperConfig, stage: &'static str) -> CheckOutcome {
		let span = RenewalSpan::new(TokenKind::Access, stage);

		span.instrument(async move {
			let _singleflight = self.access.guard.lock().await;
			let Some(current) = self.access.current() else {
				return CheckOutcome::Skipped(SkipReason::MissingToken);
			};
			let Some(refresh) = self.refresh.current() else {
				return CheckOutcome::Skipped(SkipReason::MissingRefreshToken);
			};
			let proof = RefreshProof::token(refresh).with_keep_logged_in(config.keep_logged_in);

			self.renew_if_due(&self.access, &current, proof, config, |proof| {
				self.transport.fetch_access_token(proof)
			})
			.await
		})
		.await
	}

	async fn renew_if_due<'a, K, F>(
		&'a self,
		slot: &Slot<K>,
		current: &K,
		proof: RefreshProof,
		config: &KeeperConfig,
		renew: F,
	) -> CheckOutcome
	where
		K: Token,
		F: FnOnce(RefreshProof) -> TransportFuture<'a, K>,
	{
		let Some(payload) = current.decode() else {
			return CheckOutcome::Skipped(SkipReason::Undecodable);
		};
		let remaining = payload.remaining_at(OffsetDateTime::now_utc());

		if !config.threshold(K::KIND).should_renew(remaining) {
			tracing::debug!(remaining = %remaining, "token still fresh");

			return CheckOutcome::Fresh;
		}

		self.metrics.record_attempt(K::KIND);
		obs::record_renewal_outcome(K::KIND, RenewalOutcome::Attempt);

		match renew(proof).await {
			Ok(renewed) => {
				*slot.token.write() = Some(renewed.clone());

				self.metrics.record_success(K::KIND);
				obs::record_renewal_outcome(K::KIND, RenewalOutcome::Success);
				tracing::info!(remaining = %remaining, "token renewed");

				// Clone the hook out so the lock is released before user code runs.
				let observer = slot.observer.read().clone();

				if let Some(observer) = observer {
					observer(&renewed);
				}

				CheckOutcome::Renewed
			},
			Err(err) => {
				self.metrics.record_failure(K::KIND);
				obs::record_renewal_outcome(K::KIND, RenewalOutcome::Failure);
				tracing::warn!(error = %err, "token renewal failed; keeping the current token");

				CheckOutcome::Failed
			},
		}
	}
}

/// Held token, its observer, and the guard serializing checks of that kind.
struct Slot<K> {
	token: RwLock<Option<K>>,
	observer: RwLock<Option<RenewalObserver<K>>>,
	guard: AsyncMutex<()>,
}
impl<K> Slot<K>
where
	K: Token,
{
	fn current(&self) -> Option<K> {
		self.token.read().clone()
	}
}
impl<K> Default for Slot<K> {
	fn default() -> Self {
		Self { token: RwLock::new(None), observer: RwLock::new(None), guard: AsyncMutex::new(()) }
	}
}

/// Cancellation handles of the two periodic checks.
struct Timers {
	refresh: CancellationToken,
	access: CancellationToken,
}
impl Timers {
	fn cancel(self) {
		self.refresh.cancel();
		self.access.cancel();
	}
}

fn spawn_periodic_check<T>(
	shared: Arc<Shared<T>>,
	kind: TokenKind,
	config: KeeperConfig,
) -> CancellationToken
where
	T: 'static + ?Sized + AuthTransport,
{
	let cancel = CancellationToken::new();
	let stop = cancel.clone();
	let period = config.check_period(kind);

	tokio::spawn(async move {
		let mut interval = tokio::time::interval_at(Instant::now() + period, period);

		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = stop.cancelled() => break,
				_ = interval.tick() => {}
			}

			match kind {
				TokenKind::Refresh => shared.check_refresh(&config, "interval").await,
				TokenKind::Access => shared.check_access(&config, "interval").await,
			};
		}

		tracing::debug!(kind = kind.as_str(), "periodic token check stopped");
	});

	cancel
}
