//! Demonstrates logging in against a mock auth service and letting the keeper renew the access
//! token in the background.

// std
use std::time::Duration as StdDuration;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use token_keeper::{
	auth::{AccessToken, Credentials, Token},
	http::ReqwestAuthTransport,
	keeper::{KeeperConfig, RenewalThreshold, TokenKeeper},
	url::Url,
};

fn demo_token(kind: &str, lifetime: Duration) -> String {
	let payload = serde_json::json!({
		"type": kind,
		"id": "demo-user",
		"expires": (OffsetDateTime::now_utc() + lifetime).unix_timestamp(),
	});

	format!(
		"{}.{}.demo",
		URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
		URL_SAFE_NO_PAD.encode(payload.to_string())
	)
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let refresh = demo_token("refresh", Duration::days(7));
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/login/");
			then.status(200)
				.header("content-type", "application/json")
				.body(serde_json::json!({ "refresh-token": refresh }).to_string());
		})
		.await;
	let access_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/access-token/");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({ "access-token": demo_token("access", Duration::minutes(30)) })
					.to_string(),
			);
		})
		.await;
	let transport = ReqwestAuthTransport::new(Url::parse(&server.base_url())?)?;
	let keeper = TokenKeeper::<ReqwestAuthTransport>::new(transport);

	keeper.watch_access_token(|token| {
		println!("Access token renewed ({} bytes).", token.expose().len());
	});
	keeper.login(Credentials::new("demo-user", "hunter2")?, false).await?;
	// The keeper only renews tokens it already holds.
	keeper.set_access_token(Some(AccessToken::new(demo_token("access", Duration::seconds(30)))));
	keeper
		.arm(
			KeeperConfig::default()
				.with_access_threshold(RenewalThreshold::Always)
				.with_access_check_period(StdDuration::from_secs(1)),
		)
		.await?;
	tokio::time::sleep(StdDuration::from_millis(2_500)).await;
	keeper.disarm();

	login_mock.assert_async().await;

	println!("Access token fetched {} times.", access_mock.calls_async().await);

	Ok(())
}
