#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use token_keeper::{
	auth::{Credentials, RefreshToken, SignupRequest, Token},
	error::{Error, TransientError},
	http::{ErrorStrings, ReqwestAuthTransport},
	transport::{AuthTransport, RefreshProof},
	url::Url,
};

const HUNTER2_SHA256: &str = "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7";

fn transport(server: &MockServer) -> ReqwestAuthTransport {
	let host = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	ReqwestAuthTransport::new(host).expect("Reqwest transport should build.")
}

fn credentials() -> Credentials {
	Credentials::new("alice", "hunter2").expect("Credential fixture should be valid.")
}

#[tokio::test]
async fn login_posts_hashed_password_and_returns_refresh_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/login/")
				.json_body(json!({ "id": "alice", "password": HUNTER2_SHA256 }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"refresh-token\":\"refresh-1\"}");
		})
		.await;
	let token = transport(&server)
		.login(credentials(), false)
		.await
		.expect("Login against the mock should succeed.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "refresh-1");
}

#[tokio::test]
async fn signup_sends_challenge_response_and_keep_logged_in() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/signup/").json_body(json!({
				"id": "alice",
				"password": HUNTER2_SHA256,
				"g_response": "captcha-ok",
				"keep-logged-in": true,
			}));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"refresh-token\":\"refresh-signup\"}");
		})
		.await;
	let token = transport(&server)
		.signup(SignupRequest::new(credentials(), "captcha-ok"), true)
		.await
		.expect("Signup against the mock should succeed.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "refresh-signup");
}

#[tokio::test]
async fn renewals_present_the_refresh_token() {
	let server = MockServer::start_async().await;
	let access = server
		.mock_async(|when, then| {
			when.method(GET).path("/access-token/").header("authorization", "refresh-1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access-token\":\"access-1\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/refresh-token/")
				.header("authorization", "refresh-1")
				.query_param("keep-logged-in", "true");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"refresh-token\":\"refresh-2\"}");
		})
		.await;
	let transport = transport(&server);
	let proof = RefreshProof::token(RefreshToken::new("refresh-1"));
	let access_token = transport
		.fetch_access_token(proof.clone())
		.await
		.expect("Access token fetch should succeed.");
	let refresh_token = transport
		.renew_refresh_token(proof.with_keep_logged_in(true))
		.await
		.expect("Refresh token renewal should succeed.");

	access.assert_async().await;
	refresh.assert_async().await;

	assert_eq!(access_token.expose(), "access-1");
	assert_eq!(refresh_token.expose(), "refresh-2");
}

#[tokio::test]
async fn rejections_use_loaded_strings() {
	let server = MockServer::start_async().await;
	let strings = server
		.mock_async(|when, then| {
			when.method(GET).path("/strings/en.json");
			then.status(200).header("content-type", "application/json").body(
				"{\"UNKNOWN_ERROR\":\"Something went wrong.\",\"WRONG_PASSWORD\":\"Wrong password.\"}",
			);
		})
		.await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/login/");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"reason\":\"WRONG_PASSWORD\"}");
		})
		.await;
	let transport = transport(&server);

	transport.load_strings("en").await.expect("Loading strings should succeed.");
	strings.assert_async().await;

	let err = transport
		.login(credentials(), false)
		.await
		.expect_err("A 401 response must surface as an error.");

	login.assert_async().await;

	match err {
		Error::Rejected { reason, message, status } => {
			assert_eq!(reason, "WRONG_PASSWORD");
			assert_eq!(message, "Wrong password.");
			assert_eq!(status, Some(401));
		},
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn unknown_and_non_json_rejections_fall_back() {
	let server = MockServer::start_async().await;
	let _access = server
		.mock_async(|when, then| {
			when.method(GET).path("/access-token/");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"reason\":\"NOT_IN_TABLE\"}");
		})
		.await;
	let _refresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/refresh-token/");
			then.status(502).header("content-type", "text/html").body("<h1>Bad Gateway</h1>");
		})
		.await;
	let transport = transport(&server);
	let proof = RefreshProof::token(RefreshToken::new("refresh-1"));
	let unknown = transport
		.fetch_access_token(proof.clone())
		.await
		.expect_err("A 403 response must surface as an error.");
	let html = transport
		.renew_refresh_token(proof)
		.await
		.expect_err("A 502 response must surface as an error.");

	assert!(matches!(
		unknown,
		Error::Rejected { ref reason, ref message, status: Some(403) }
			if reason == "NOT_IN_TABLE" && message == "An unknown error has occurred."
	));
	assert!(matches!(
		html,
		Error::Rejected { ref reason, status: Some(502), .. } if reason == ErrorStrings::UNKNOWN_ERROR
	));
}

#[tokio::test]
async fn failed_string_loads_keep_the_current_table() {
	let server = MockServer::start_async().await;
	let _strings = server
		.mock_async(|when, then| {
			when.method(GET).path("/strings/xx.json");
			then.status(404);
		})
		.await;
	let transport = transport(&server);

	assert!(transport.load_strings("xx").await.is_err());
	assert_eq!(transport.strings(), ErrorStrings::default());
}

#[tokio::test]
async fn success_without_token_field_is_transient() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/refresh-token/");
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;
	let err = transport(&server)
		.renew_refresh_token(RefreshProof::token(RefreshToken::new("refresh-1")))
		.await
		.expect_err("A response without the token field must fail.");

	assert!(matches!(
		err,
		Error::Transient(TransientError::MissingField { field: "refresh-token" })
	));
}

#[tokio::test]
async fn ambient_renewals_reuse_session_cookies() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path("/login/");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "session=abc; Path=/")
				.body("{\"refresh-token\":\"refresh-1\"}");
		})
		.await;
	let access = server
		.mock_async(|when, then| {
			when.method(GET).path("/access-token/").header("cookie", "session=abc");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access-token\":\"access-cookie\"}");
		})
		.await;
	let transport = transport(&server);

	transport.login(credentials(), true).await.expect("Login should succeed.");

	let token = transport
		.fetch_access_token(RefreshProof::ambient())
		.await
		.expect("Cookie-backed access token fetch should succeed.");

	access.assert_async().await;

	assert_eq!(token.expose(), "access-cookie");
}
