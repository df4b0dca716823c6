#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use admin_gateway::{
	_preludet::*,
	api::{auth::LoginForm, vacancies::VacancyFilter},
	error::RefreshError,
	session::SessionStatus,
	store::{CredentialStore, MemoryStore, StoreSlot},
};

fn user_json() -> serde_json::Value {
	json!({ "id": "u1", "email": "admin@example.com", "role": "admin" })
}

fn vacancy_json(id: &str) -> serde_json::Value {
	json!({
		"id": id,
		"companyId": "c1",
		"createdById": "u1",
		"title": "Backend engineer",
		"jobType": "remote",
		"status": "active",
		"createdAt": "2025-01-01T00:00:00Z",
		"updatedAt": "2025-01-01T00:00:00Z",
	})
}

fn seed_token(store: &MemoryStore, token: &str) {
	store.set(StoreSlot::AccessToken, token).expect("Seeding the access token should succeed.");
}

fn stored_token(store: &MemoryStore) -> Option<String> {
	store.get(StoreSlot::AccessToken).expect("Reading the access token should succeed.")
}

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried() {
	let server = MockServer::start_async().await;
	let (gateway, store, session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T1");
			then.status(401).json_body(json!({ "success": false, "message": "Token expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({
				"success": true,
				"data": { "accessToken": "T2", "user": user_json() },
			}));
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/vacancies")
				.query_param("status", "active")
				.header("authorization", "Bearer T2");
			then.status(200).json_body(json!({
				"success": true,
				"data": { "vacancies": [vacancy_json("v1")] },
			}));
		})
		.await;
	let filter = VacancyFilter { status: Some("active".into()), ..Default::default() };
	let vacancies =
		gateway.list_vacancies(&filter).await.expect("Request should succeed after refresh.");

	rejected.assert_async().await;
	refresh.assert_async().await;
	accepted.assert_async().await;

	assert_eq!(vacancies.len(), 1);
	assert_eq!(vacancies[0].id, "v1");
	assert_eq!(session.status(), SessionStatus::Authenticated);
	assert_eq!(session.access_token().map(|token| token.expose().to_owned()), Some("T2".into()));
	assert_eq!(stored_token(&store), Some("T2".into()));
	assert!(!gateway.refresh_coordinator().is_refreshing());
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	const CALLERS: usize = 5;

	let server = MockServer::start_async().await;
	let (gateway, store, _session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T1");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).delay(std::time::Duration::from_millis(300)).json_body(json!({
				"success": true,
				"data": { "accessToken": "T2", "user": user_json() },
			}));
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T2");
			then.status(200).json_body(json!({ "success": true, "data": { "vacancies": [] } }));
		})
		.await;
	let filter = VacancyFilter::default();
	let results = futures::future::join_all(
		(0..CALLERS).map(|_| {
			let gateway = gateway.clone();
			let filter = filter.clone();

			async move { gateway.list_vacancies(&filter).await }
		}),
	)
	.await;

	for result in results {
		assert!(result.expect("Every caller should succeed after the shared refresh.").is_empty());
	}

	refresh.assert_calls_async(1).await;
	rejected.assert_calls_async(CALLERS).await;
	accepted.assert_calls_async(CALLERS).await;

	let metrics = gateway.refresh_coordinator().metrics();

	assert_eq!(metrics.attempts(), 1);
	assert_eq!(metrics.successes(), 1);
	assert!(!gateway.refresh_coordinator().is_refreshing());
}

#[tokio::test]
async fn failed_refresh_clears_credentials_and_reports_cause() {
	let server = MockServer::start_async().await;
	let (gateway, store, session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies");
			then.status(401).json_body(json!({ "success": false, "message": "Token expired" }));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(401).json_body(json!({ "success": false }));
		})
		.await;
	let err = gateway
		.list_vacancies(&VacancyFilter::default())
		.await
		.expect_err("Request should fail when the refresh is rejected.");

	refresh.assert_async().await;

	match err {
		Error::Unauthorized { response, refresh } => {
			assert_eq!(response.status, 401);
			assert_eq!(response.message.as_deref(), Some("Token expired"));
			assert_eq!(refresh, Some(RefreshError::Rejected { status: 401 }));
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(session.status(), SessionStatus::Anonymous);
	assert_eq!(stored_token(&store), None);
	assert_eq!(gateway.refresh_coordinator().metrics().failures(), 1);
	assert!(!gateway.refresh_coordinator().is_refreshing());
}

#[tokio::test]
async fn fast_refresh_failure_is_shared_by_late_callers() {
	const CALLERS: usize = 8;

	let server = MockServer::start_async().await;
	let (gateway, store, session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(401);
		})
		.await;
	let filter = VacancyFilter::default();
	let results = futures::future::join_all((0..CALLERS).map(|_| {
		let gateway = gateway.clone();
		let filter = filter.clone();

		async move { gateway.list_vacancies(&filter).await }
	}))
	.await;

	for result in results {
		match result.expect_err("Every caller should observe the refresh failure.") {
			Error::Unauthorized { refresh, .. } =>
				assert_eq!(refresh, Some(RefreshError::Rejected { status: 401 })),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	refresh.assert_calls_async(1).await;
	rejected.assert_calls_async(CALLERS).await;

	let metrics = gateway.refresh_coordinator().metrics();

	assert_eq!(metrics.attempts(), 1);
	assert_eq!(metrics.failures(), 1);
	assert_eq!(metrics.joined() + metrics.reused(), (CALLERS - 1) as u64);
	assert_eq!(session.status(), SessionStatus::Anonymous);
	assert_eq!(stored_token(&store), None);
}

#[tokio::test]
async fn retry_that_is_still_unauthorized_is_not_refreshed_again() {
	let server = MockServer::start_async().await;
	let (gateway, store, _session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	let first = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T1");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({
				"success": true,
				"data": { "accessToken": "T2", "user": user_json() },
			}));
		})
		.await;
	let retried = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T2");
			then.status(401).json_body(json!({ "success": false, "message": "Forbidden" }));
		})
		.await;
	let err = gateway
		.list_vacancies(&VacancyFilter::default())
		.await
		.expect_err("A second 401 should be returned to the caller.");

	first.assert_async().await;
	refresh.assert_async().await;
	retried.assert_async().await;

	match err {
		Error::Unauthorized { response, refresh } => {
			assert_eq!(response.message.as_deref(), Some("Forbidden"));
			assert_eq!(refresh, None);
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn rotated_token_is_retried_without_refreshing() {
	let server = MockServer::start_async().await;
	let (gateway, store, session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T1");
			then.status(401).delay(std::time::Duration::from_millis(300));
		})
		.await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).json_body(json!({
				"success": true,
				"data": { "accessToken": "T2", "user": user_json() },
			}));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/vacancies").header("authorization", "Bearer T2");
			then.status(200).json_body(json!({ "success": true, "data": { "vacancies": [] } }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200);
		})
		.await;
	let filter = VacancyFilter::default();
	let (listed, logged_in) = tokio::join!(gateway.list_vacancies(&filter), async {
		tokio::time::sleep(std::time::Duration::from_millis(50)).await;

		gateway.login(&LoginForm::new("admin@example.com", "secret")).await
	});

	logged_in.expect("Login should succeed while the request is in flight.");
	assert!(listed.expect("Request should succeed with the rotated token.").is_empty());

	stale.assert_async().await;
	login.assert_async().await;
	fresh.assert_async().await;
	refresh.assert_calls_async(0).await;

	assert_eq!(session.access_token().map(|token| token.expose().to_owned()), Some("T2".into()));
}

#[tokio::test]
async fn empty_refresh_responses_end_the_session() {
	for body in ["", r#"{"success":true,"data":null}"#] {
		let server = MockServer::start_async().await;
		let (gateway, store, session) = build_reqwest_test_gateway(&server.base_url());

		seed_token(&store, "T1");

		server
			.mock_async(|when, then| {
				when.method(POST).path("/api/auth/refresh");
				then.status(200).body(body);
			})
			.await;

		let err = gateway.refresh().await.expect_err("Empty refresh payload should fail.");

		assert!(
			matches!(err, Error::Refresh(RefreshError::EmptyResponse)),
			"Unexpected error for body {body:?}: {err:?}"
		);
		assert_eq!(session.status(), SessionStatus::Anonymous);
		assert_eq!(stored_token(&store), None);
	}
}

#[tokio::test]
async fn refresh_without_token_in_payload_fails() {
	let server = MockServer::start_async().await;
	let (gateway, store, session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200).json_body(json!({ "success": true, "data": { "user": user_json() } }));
		})
		.await;

	let err = gateway.refresh().await.expect_err("Refresh without a token should fail.");

	assert!(matches!(err, Error::Refresh(RefreshError::MissingAccessToken)));
	assert_eq!(session.status(), SessionStatus::Anonymous);
	assert_eq!(stored_token(&store), None);
}

#[tokio::test]
async fn non_auth_failures_pass_through_without_refresh() {
	let server = MockServer::start_async().await;
	let (gateway, store, _session) = build_reqwest_test_gateway(&server.base_url());

	seed_token(&store, "T1");

	server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/vacancies/v9");
			then.status(404).json_body(json!({ "success": false, "message": "Vacancy not found" }));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200);
		})
		.await;
	let err = gateway.archive_vacancy("v9").await.expect_err("Missing vacancy should fail.");

	refresh.assert_calls_async(0).await;

	assert_eq!(err.status(), Some(404));
	assert_eq!(err.display_message(), "Vacancy not found");
	assert_eq!(stored_token(&store), Some("T1".into()));
}

#[tokio::test]
async fn anonymous_requests_carry_locale_and_fingerprint_headers() {
	let server = MockServer::start_async().await;
	let (gateway, store, _session) = build_reqwest_test_gateway(&server.base_url());

	store.set(StoreSlot::Fingerprint, "fp-1").expect("Seeding the fingerprint should succeed.");
	gateway.set_locale(admin_gateway::auth::Locale::Ru);

	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/vacancies")
				.header("accept-language", "ru")
				.header("x-client-fingerprint", "fp-1");
			then.status(200).json_body(json!({ "success": true, "data": { "vacancies": [] } }));
		})
		.await;

	gateway
		.list_vacancies(&VacancyFilter::default())
		.await
		.expect("Anonymous request should succeed.");

	mock.assert_async().await;
}
