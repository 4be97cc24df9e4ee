#![cfg(feature = "reqwest")]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use token_keeper::{
	auth::{RefreshToken, Token, TokenKind},
	http::ReqwestAuthTransport,
	keeper::{KeeperConfig, RenewalThreshold, TokenKeeper},
	url::Url,
};

fn refresh_token(lifetime: Duration) -> RefreshToken {
	let payload = serde_json::json!({
		"type": "refresh",
		"id": "alice",
		"expires": (OffsetDateTime::now_utc() + lifetime).unix_timestamp(),
	});

	RefreshToken::new(format!(
		"{}.{}.sig",
		URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
		URL_SAFE_NO_PAD.encode(payload.to_string()),
	))
}

#[tokio::test]
async fn arming_renews_through_the_http_transport() {
	let server = MockServer::start_async().await;
	let seed = refresh_token(Duration::days(7));
	let seed_header = seed.expose().to_owned();
	let renewal = server
		.mock_async(move |when, then| {
			when.method(GET).path("/refresh-token/").header("authorization", seed_header);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"refresh-token\":\"renewed\"}");
		})
		.await;
	let host = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let transport = ReqwestAuthTransport::new(host).expect("Reqwest transport should build.");
	let keeper = TokenKeeper::<ReqwestAuthTransport>::new(transport).with_refresh_token(seed);
	let notified = Arc::new(AtomicUsize::new(0));
	let observed = Arc::clone(&notified);

	keeper.watch_refresh_token(move |token| {
		assert_eq!(token.expose(), "renewed");

		observed.fetch_add(1, Ordering::SeqCst);
	});
	keeper
		.arm(KeeperConfig::default().with_refresh_threshold(RenewalThreshold::Always))
		.await
		.expect("Arming with valid periods should succeed.");

	assert!(keeper.is_armed());

	keeper.disarm();
	renewal.assert_calls_async(1).await;

	assert_eq!(notified.load(Ordering::SeqCst), 1);
	assert_eq!(
		keeper.refresh_token().map(|token| token.expose().to_owned()).as_deref(),
		Some("renewed")
	);
	assert!(!keeper.is_armed());
}

#[tokio::test]
async fn rejected_renewals_keep_the_current_token() {
	let server = MockServer::start_async().await;
	let renewal = server
		.mock_async(|when, then| {
			when.method(GET).path("/refresh-token/");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"reason\":\"EXPIRED_TOKEN\"}");
		})
		.await;
	let host = Url::parse(&server.base_url()).expect("Mock server URL should parse.");
	let transport = ReqwestAuthTransport::new(host).expect("Reqwest transport should build.");
	let seed = refresh_token(Duration::minutes(5));
	let keeper =
		TokenKeeper::<ReqwestAuthTransport>::new(transport).with_refresh_token(seed.clone());

	keeper.arm(KeeperConfig::default()).await.expect("Arming should succeed.");
	keeper.disarm();
	renewal.assert_calls_async(1).await;

	assert_eq!(keeper.refresh_token(), Some(seed));
	assert_eq!(keeper.metrics().failures(TokenKind::Refresh), 1);
}
