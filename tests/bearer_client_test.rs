// Integration tests for the bearer-token API client against a local HTTP server
use clima_auth::api_client::{ApiError, BearerClient};
use clima_auth::session::{SessionLifecycleManager, SessionStatus};
use clima_auth::settings::SessionSettings;
use clima_auth::testing::{MockOidcClient, RenewBehavior, TestFixtures};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn signed_in(client: MockOidcClient) -> (BearerClient, Arc<MockOidcClient>) {
    let client = Arc::new(client);
    let manager = TestFixtures::manager(client.clone());
    manager.initialize().await.unwrap();
    (BearerClient::new(manager), client)
}

#[tokio::test]
async fn test_get_json_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temperature": 21.5})))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _client) = signed_in(
        MockOidcClient::new().with_init(Ok(TestFixtures::silent_authenticated("T", 3600))),
    )
    .await;

    let body: serde_json::Value = api
        .get_json(&format!("{}/weather", server.uri()))
        .await
        .unwrap();
    assert_eq!(body["temperature"], 21.5);
}

#[tokio::test]
async fn test_unauthorized_response_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let (api, client) = signed_in(
        MockOidcClient::new().with_init(Ok(TestFixtures::silent_authenticated("T", 3600))),
    )
    .await;

    let result = api
        .get_json::<serde_json::Value>(&format!("{}/weather", server.uri()))
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(api.manager().status(), SessionStatus::Unauthenticated);
    assert!(api.manager().current_user().is_none());
    assert_eq!(client.logout_calls(), 1);

    // Signed out: the next call never reaches the server
    let result = api
        .get_json::<serde_json::Value>(&format!("{}/weather", server.uri()))
        .await;
    assert!(matches!(result, Err(ApiError::NotAuthenticated)));
}

#[tokio::test]
async fn test_other_error_status_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let (api, client) = signed_in(
        MockOidcClient::new().with_init(Ok(TestFixtures::silent_authenticated("T", 3600))),
    )
    .await;

    let result = api
        .get_json::<serde_json::Value>(&format!("{}/weather", server.uri()))
        .await;

    assert!(matches!(result, Err(ApiError::Status(503))));
    assert!(api.manager().is_authenticated());
    assert_eq!(client.logout_calls(), 0);
}

#[tokio::test]
async fn test_unauthorized_for_replaced_token_keeps_new_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    // T leaves the 30 s margin two seconds in; the scheduler renews it to
    // T2 while the request carrying T is still waiting for its answer
    let client = Arc::new(
        MockOidcClient::new()
            .with_init(Ok(TestFixtures::silent_authenticated("T", 32)))
            .with_renewal(RenewBehavior::Respond(Ok(TestFixtures::renewed("T2", 3600)))),
    );
    let manager = SessionLifecycleManager::new(
        TestFixtures::provider_settings(),
        SessionSettings::default(),
        client.clone(),
    );
    manager.initialize().await.unwrap();
    let api = BearerClient::new(manager.clone());

    let result = api
        .get_json::<serde_json::Value>(&format!("{}/weather", server.uri()))
        .await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(client.renew_calls(), 1);
    assert_eq!(client.logout_calls(), 0);
    assert_eq!(manager.status(), SessionStatus::Authenticated);
    assert_eq!(
        manager.get_valid_access_token().await.as_deref(),
        Some("T2")
    );
}
