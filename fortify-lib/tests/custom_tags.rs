//! Custom tag lookups and audit actions.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::ScriptedConnection;
use fortify_lib::FortifyClient;
use fortify_lib::api::IssueRef;
use fortify_lib::auth::StaticTokenProvider;
use fortify_lib::error::ApiError;
use fortify_lib::error::Error;
use fortify_lib::model::Record;
use fortify_lib::transport::Method;
use fortify_lib::transport::RequestBody;
use fortify_lib::transport::RestRequest;
use serde_json::Value;
use serde_json::json;

fn server(request: &RestRequest) -> Result<Value, Error> {
    match (request.method.as_str(), request.target.path_str()) {
        ("GET", "/api/v1/customTags") => Ok(json!({
            "count": 3,
            "data": [
                {"id": 1, "guid": "87f2364f-dcd4-49e6-861d-f8d3f351686b", "name": "Analysis"},
                {"id": 2, "guid": "fc6f3c8f-2a87-4b7f-9a8b-3f5b5a1c1a11", "name": "Auditor Status"},
                {"id": 3, "guid": "0d5b2b3c-5cda-4c5a-8d0a-6a3a9b3c2d10", "name": "Jira Ticket"}
            ]
        })),
        ("GET", "/api/v1/projectVersions/5/customTags") => Ok(json!({
            "count": 2,
            "data": [
                {"guid": "87f2364f-dcd4-49e6-861d-f8d3f351686b", "name": "Analysis"},
                {"guid": "0d5b2b3c-5cda-4c5a-8d0a-6a3a9b3c2d10", "name": "Jira Ticket"}
            ]
        })),
        ("GET", "/api/v1/projectVersions/6/customTags") => Ok(json!({"count": 0, "data": []})),
        ("POST", "/api/v1/projectVersions/5/issues/action") => Ok(json!({"data": {"message": "ok"}, "responseCode": 200})),
        (method, path) => Err(ApiError::http(404, format!("no route for {} {}", method, path)).into()),
    }
}

fn client() -> (FortifyClient, Arc<ScriptedConnection>) {
    let conn = ScriptedConnection::new(server).shared();
    let client = FortifyClient::from_transport(conn.clone(), Arc::new(StaticTokenProvider::new("t")));
    (client, conn)
}

fn requests_to(conn: &ScriptedConnection, path: &str) -> usize {
    conn.requests().iter().filter(|r| r.target.path_str() == path).count()
}

#[tokio::test]
async fn test_all_tags_loaded_once() {
    let (client, conn) = client();
    let api = client.custom_tags();

    assert_eq!(api.custom_tags().await.unwrap().len(), 3);
    assert_eq!(api.custom_tags().await.unwrap().len(), 3);
    api.custom_tag_guid("analysis").await.unwrap();
    api.custom_tag_name("x").await.unwrap();

    assert_eq!(requests_to(&conn, "/api/v1/customTags"), 1);
}

#[tokio::test]
async fn test_guid_lookup_is_case_insensitive() {
    let (client, _) = client();
    let api = client.custom_tags();

    assert_eq!(
        api.custom_tag_guid("AUDITOR status").await.unwrap().as_deref(),
        Some("fc6f3c8f-2a87-4b7f-9a8b-3f5b5a1c1a11")
    );
    assert_eq!(api.custom_tag_guid("Unknown").await.unwrap(), None);
}

#[tokio::test]
async fn test_name_lookup_is_exact() {
    let (client, _) = client();
    let api = client.custom_tags();

    assert_eq!(
        api.custom_tag_name("0d5b2b3c-5cda-4c5a-8d0a-6a3a9b3c2d10").await.unwrap().as_deref(),
        Some("Jira Ticket")
    );
    assert_eq!(api.custom_tag_name("0D5B2B3C-5CDA-4C5A-8D0A-6A3A9B3C2D10").await.unwrap(), None);
}

#[tokio::test]
async fn test_version_tags_cached_per_version() {
    let (client, conn) = client();
    let api = client.custom_tags();

    assert_eq!(
        api.version_custom_tag_names("5").await.unwrap(),
        vec!["Analysis".to_string(), "Jira Ticket".to_string()]
    );
    assert_eq!(
        api.version_custom_tag_guids("5").await.unwrap(),
        vec![
            "87f2364f-dcd4-49e6-861d-f8d3f351686b".to_string(),
            "0d5b2b3c-5cda-4c5a-8d0a-6a3a9b3c2d10".to_string()
        ]
    );
    assert!(api.version_custom_tags("6").await.unwrap().is_empty());

    assert_eq!(requests_to(&conn, "/api/v1/projectVersions/5/customTags"), 1);
    assert_eq!(requests_to(&conn, "/api/v1/projectVersions/6/customTags"), 1);
}

#[tokio::test]
async fn test_set_custom_tag_values() {
    let (client, conn) = client();
    let issue = Record::from_value(json!({"id": 1001, "revision": 3, "issueName": "SQL Injection"})).unwrap();
    let issues = [IssueRef::from_record(&issue).unwrap(), IssueRef::new(1002, 0)];

    client
        .custom_tags()
        .set_custom_tag_values("5", &[("analysis", "Exploitable"), ("Jira Ticket", "SEC-42")], &issues)
        .await
        .unwrap();

    let post = conn
        .requests()
        .into_iter()
        .find(|r| r.method == Method::POST)
        .unwrap();
    assert_eq!(post.target.path_str(), "/api/v1/projectVersions/5/issues/action");
    assert_eq!(
        post.body,
        Some(RequestBody::Json(json!({
            "type": "AUDIT_ISSUE",
            "values": {
                "issues": [{"id": 1001, "revision": 3}, {"id": 1002, "revision": 0}],
                "customTagAudit": [
                    {"customTagGuid": "87f2364f-dcd4-49e6-861d-f8d3f351686b", "textValue": "Exploitable"},
                    {"customTagGuid": "0d5b2b3c-5cda-4c5a-8d0a-6a3a9b3c2d10", "textValue": "SEC-42"}
                ]
            }
        })))
    );
}

#[tokio::test]
async fn test_unknown_tag_sends_nothing() {
    let (client, conn) = client();

    let err = client
        .custom_tags()
        .set_custom_tag_value("5", "Not A Tag", "x", &[IssueRef::new(1, 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Configuration(ref m) if m.contains("Not A Tag")));
    assert!(conn.requests().iter().all(|r| r.method == Method::GET));
}

#[tokio::test]
async fn test_version_id_stays_one_segment() {
    let (client, conn) = client();

    let err = client
        .custom_tags()
        .set_custom_tag_value("5/issues/action?x=1#", "Analysis", "x", &[IssueRef::new(1, 1)])
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));

    let post = conn.requests().into_iter().find(|r| r.method == Method::POST).unwrap();
    assert_eq!(
        post.target.path_str(),
        "/api/v1/projectVersions/5%2Fissues%2Faction%3Fx%3D1%23/issues/action"
    );
    assert!(post.target.query_params().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_loads_tags_once() {
    let conn = ScriptedConnection::new(server)
        .with_delay(Duration::from_millis(50))
        .shared();
    let client = FortifyClient::from_transport(conn.clone(), Arc::new(StaticTokenProvider::new("t")));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.custom_tags().custom_tags().await })
        })
        .collect();

    let mut lists = Vec::new();
    for handle in handles {
        lists.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(requests_to(&conn, "/api/v1/customTags"), 1);
    assert_eq!(lists[0].len(), 3);
    assert!(lists.iter().all(|list| Arc::ptr_eq(list, &lists[0])));
}
