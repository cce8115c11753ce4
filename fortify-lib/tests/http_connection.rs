//! Full HTTP stack against a local mock server.

use std::time::Duration;

use fortify_lib::FortifyClient;
use fortify_lib::auth::Credentials;
use fortify_lib::auth::TokenFactory;
use fortify_lib::error::ApiError;
use fortify_lib::error::AuthError;
use fortify_lib::error::Error;
use fortify_lib::transport::HttpConnection;
use fortify_lib::transport::RestConnection;
use fortify_lib::transport::RestRequest;
use fortify_lib::transport::RetryConfig;
use mockito::Matcher;
use mockito::Server;

fn client(server: &Server) -> FortifyClient {
    FortifyClient::builder()
        .url(server.url())
        .credentials(Credentials::password("jdoe", "secret").with_tenant("acme"))
        .retry_config(RetryConfig::no_retry())
        .page_size(2)
        .build()
        .unwrap()
}

fn token_mock(server: &mut Server) -> mockito::Mock {
    server
        .mock("POST", "/oauth/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "password".into()),
            Matcher::UrlEncoded("username".into(), "acme\\jdoe".into()),
            Matcher::UrlEncoded("password".into(), "secret".into()),
            Matcher::UrlEncoded("scope".into(), "api-tenant".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"tok-1","token_type":"bearer","expires_in":"3600"}"#)
}

#[tokio::test]
async fn test_token_then_paged_collection() {
    let mut server = Server::new_async().await;
    let token = token_mock(&mut server).expect(1).create_async().await;
    let first = server
        .mock("GET", "/api/v1/projectVersions")
        .match_header("authorization", "Bearer tok-1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "project.name:\"WebGoat\"".into()),
            Matcher::UrlEncoded("start".into(), "0".into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"count":3,"data":[{"id":1},{"id":2}]}"#)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/v1/projectVersions")
        .match_header("authorization", "Bearer tok-1")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"count":3,"data":[{"id":3}]}"#)
        .create_async()
        .await;

    let versions = client(&server)
        .application_versions()
        .application_name("WebGoat")
        .get_all()
        .await
        .unwrap();

    assert_eq!(versions.len(), 3);
    token.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_http_error_status() {
    let mut server = Server::new_async().await;
    let _token = token_mock(&mut server).create_async().await;
    let _missing = server
        .mock("GET", "/api/v1/projectVersions/999/issues")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"Application version not found","responseCode":404}"#)
        .create_async()
        .await;

    let err = client(&server).issues("999").get_all().await.unwrap_err();

    match err {
        Error::Api(ApiError::Http { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("Application version not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_credentials() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth/token")
        .with_status(401)
        .with_body(r#"{"error":"invalid_grant"}"#)
        .create_async()
        .await;

    let err = client(&server).query("/api/v1/projects").get_all().await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let mut server = Server::new_async().await;
    let _token = token_mock(&mut server).create_async().await;
    let _html = server
        .mock("GET", "/api/v1/projects")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>login</html>")
        .create_async()
        .await;

    let err = client(&server).query("/api/v1/projects").get_all().await.unwrap_err();

    assert!(matches!(err, Error::Api(ApiError::Parse { .. })));
}

#[tokio::test]
async fn test_rate_limit_without_retry() {
    let mut server = Server::new_async().await;
    let _limited = server
        .mock("GET", "/api/v1/projects")
        .with_status(429)
        .with_header("Retry-After", "7")
        .create_async()
        .await;

    let conn = HttpConnection::new(&server.url())
        .unwrap()
        .with_retry_config(RetryConfig::no_retry());
    let err = conn
        .execute(RestRequest::get(conn.base_target().path("api/v1/projects")))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RateLimit { retry_after: Some(d) } if d == Duration::from_secs(7)));
}

#[tokio::test]
async fn test_server_error_retried_then_reported() {
    let mut server = Server::new_async().await;
    let unavailable = server
        .mock("GET", "/api/v1/projects")
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let conn = HttpConnection::new(&server.url()).unwrap().with_retry_config(
        RetryConfig::default()
            .max_retries(2)
            .initial_delay(Duration::from_millis(5)),
    );
    let err = conn
        .execute(RestRequest::get(conn.base_target().path("api/v1/projects")))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(503));
    unavailable.assert_async().await;
}

#[tokio::test]
async fn test_non_transient_server_error_not_retried() {
    let mut server = Server::new_async().await;
    let not_implemented = server
        .mock("GET", "/api/v1/projects")
        .with_status(501)
        .expect(1)
        .create_async()
        .await;

    let conn = HttpConnection::new(&server.url()).unwrap().with_retry_config(
        RetryConfig::default()
            .max_retries(2)
            .initial_delay(Duration::from_millis(5)),
    );
    let err = conn
        .execute(RestRequest::get(conn.base_target().path("api/v1/projects")))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(501));
    not_implemented.assert_async().await;
}

#[tokio::test]
async fn test_token_factory_over_http() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/api/v3/oauth/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
            Matcher::UrlEncoded("client_id".into(), "key".into()),
            Matcher::UrlEncoded("client_secret".into(), "s3cr3t".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token":"abc","expires_in":21600}"#)
        .expect(1)
        .create_async()
        .await;

    let conn = HttpConnection::new(&server.url()).unwrap();
    let factory = TokenFactory::new(conn, Credentials::client_credentials("key", "s3cr3t"))
        .with_token_path("/api/v3/oauth/token");

    assert_eq!(factory.token().await.unwrap(), "abc");
    assert_eq!(factory.token().await.unwrap(), "abc");
    token.assert_async().await;
}
