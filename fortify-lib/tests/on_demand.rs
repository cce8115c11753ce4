//! Lazily loaded record properties.

mod common;

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::ScriptedConnection;
use fortify_lib::FortifyClient;
use fortify_lib::api::query::EntityQueryBuilder;
use fortify_lib::auth::StaticTokenProvider;
use fortify_lib::error::ApiError;
use fortify_lib::error::Error;
use fortify_lib::ondemand::OnDemandProperty;
use fortify_lib::transport::RestRequest;
use serde_json::Value;
use serde_json::json;

fn server() -> impl Fn(&RestRequest) -> Result<Value, Error> + Send + Sync + 'static {
    |request: &RestRequest| -> Result<Value, Error> {
        match request.target.path_str() {
            "/api/v1/projectVersions" => Ok(json!({
                "count": 4,
                "data": [
                    {"id": 10, "name": "1.0", "project": {"id": 1, "name": "WebGoat"}},
                    {"id": 11, "name": "2.0", "project": {"id": 1, "name": "WebGoat"}},
                    {"id": 20, "name": "main", "project": {"id": 2, "name": "Juice Shop"}},
                    {"id": 30, "name": "orphan"}
                ]
            })),
            "/api/v1/projects/1" => Ok(json!({
                "data": {"id": 1, "name": "WebGoat", "issueTemplateId": "t1"},
                "responseCode": 200
            })),
            "/api/v1/projects/2" => Ok(json!({"data": {"id": 2, "name": "Juice Shop"}, "responseCode": 200})),
            other => Err(ApiError::http(404, format!("no route for {}", other)).into()),
        }
    }
}

fn loads_of(conn: &ScriptedConnection, path: &str) -> usize {
    conn.requests().iter().filter(|r| r.target.path_str() == path).count()
}

#[tokio::test]
async fn test_nothing_loaded_until_read() {
    let conn = ScriptedConnection::new(server()).shared();
    let client = FortifyClient::from_transport(conn.clone(), Arc::new(StaticTokenProvider::new("t")));

    let versions = client.application_versions().on_demand_application().get_all().await.unwrap();

    assert_eq!(versions.len(), 4);
    assert_eq!(conn.request_count(), 1);
    assert!(versions[0].has_on_demand("application"));
}

#[tokio::test]
async fn test_same_uri_loaded_once_across_records() {
    let conn = ScriptedConnection::new(server()).shared();
    let client = FortifyClient::from_transport(conn.clone(), Arc::new(StaticTokenProvider::new("t")));

    let versions = client.application_versions().on_demand_application().get_all().await.unwrap();

    let first = versions[0].on_demand("application").await.unwrap().unwrap();
    let again = versions[0].on_demand("application").await.unwrap().unwrap();
    let sibling = versions[1].on_demand("application").await.unwrap().unwrap();
    let other = versions[2].on_demand("application").await.unwrap().unwrap();

    assert_eq!(first["name"], "WebGoat");
    assert_eq!(first, again);
    assert_eq!(first, sibling);
    assert_eq!(other["name"], "Juice Shop");
    assert_eq!(loads_of(&conn, "/api/v1/projects/1"), 1);
    assert_eq!(loads_of(&conn, "/api/v1/projects/2"), 1);
}

#[tokio::test]
async fn test_unresolvable_template_not_attached() {
    let conn = ScriptedConnection::new(server()).shared();
    let client = FortifyClient::from_transport(conn.clone(), Arc::new(StaticTokenProvider::new("t")));

    let versions = client.application_versions().on_demand_application().get_all().await.unwrap();

    let orphan = &versions[3];
    assert!(!orphan.has_on_demand("application"));
    assert_eq!(orphan.on_demand("application").await.unwrap(), None);
    assert_eq!(conn.request_count(), 1);
}

#[tokio::test]
async fn test_unique_record_gets_on_demand_property() {
    let conn = ScriptedConnection::new(|request| match request.target.path_str() {
        "/api/v1/projectVersions" => Ok(json!({"count": 1, "data": [{"id": 10, "project": {"id": 1}}]})),
        _ => Ok(json!({"data": {"id": 1, "name": "WebGoat"}})),
    })
    .shared();

    let version = EntityQueryBuilder::new(conn.clone(), "/api/v1/projectVersions")
        .on_demand("application", "/api/v1/projects/${project.id}")
        .get_unique()
        .await
        .unwrap()
        .unwrap();

    let application = version.on_demand("application").await.unwrap().unwrap();
    assert_eq!(application["name"], "WebGoat");
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let failures = AtomicUsize::new(0);
    let conn = ScriptedConnection::new(move |request| match request.target.path_str() {
        "/api/v1/projectVersions" => Ok(json!({"count": 1, "data": [{"id": 10, "project": {"id": 1}}]})),
        _ if failures.fetch_add(1, Ordering::SeqCst) == 0 => Err(ApiError::http(502, "bad gateway").into()),
        _ => Ok(json!({"data": {"id": 1, "name": "WebGoat"}})),
    })
    .shared();

    let versions = EntityQueryBuilder::new(conn.clone(), "/api/v1/projectVersions")
        .on_demand("application", "/api/v1/projects/${project.id}")
        .get_all()
        .await
        .unwrap();

    let err = versions[0].on_demand("application").await.unwrap_err();
    assert_eq!(err.status_code(), Some(502));

    let application = versions[0].on_demand("application").await.unwrap().unwrap();
    assert_eq!(application["name"], "WebGoat");
    assert_eq!(loads_of(&conn, "/api/v1/projects/1"), 2);
}

#[tokio::test]
async fn test_property_with_fields_and_bare_response() {
    let conn = ScriptedConnection::new(|request| match request.target.path_str() {
        "/api/v1/projectVersions" => Ok(json!({"count": 1, "data": [{"id": 10}]})),
        // Response without data envelope is returned as is
        _ => Ok(json!({"attributes": [1, 2]})),
    })
    .shared();

    let property = OnDemandProperty::new(conn.clone(), "attributes", "/api/v1/projectVersions/${id}/attributes")
        .with_fields(["id", "value"]);
    assert_eq!(
        property.uri_template(),
        "/api/v1/projectVersions/${id}/attributes?fields=id,value"
    );

    let versions = EntityQueryBuilder::new(conn.clone(), "/api/v1/projectVersions")
        .on_demand_property(property)
        .get_all()
        .await
        .unwrap();

    let attributes = versions[0].on_demand("attributes").await.unwrap().unwrap();
    assert_eq!(attributes, json!({"attributes": [1, 2]}));

    let request = conn.requests().pop().unwrap();
    assert_eq!(request.target.path_str(), "/api/v1/projectVersions/10/attributes");
    assert_eq!(request.target.get_query_param("fields"), Some("id,value"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_of_shared_uri_load_once() {
    let conn = ScriptedConnection::new(server())
        .with_delay(Duration::from_millis(50))
        .shared();
    let client = FortifyClient::from_transport(conn.clone(), Arc::new(StaticTokenProvider::new("t")));

    let versions = client.application_versions().on_demand_application().get_all().await.unwrap();
    let siblings = [versions[0].clone(), versions[1].clone()];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let record = siblings[i % 2].clone();
            tokio::spawn(async move { record.on_demand("application").await })
        })
        .collect();

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap().unwrap().unwrap());
    }

    assert_eq!(loads_of(&conn, "/api/v1/projects/1"), 1);
    assert_eq!(values[0]["name"], "WebGoat");
    assert!(values.iter().all(|value| *value == values[0]));
}
