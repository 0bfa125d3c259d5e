//! Resource client tests against a mock Cloud Deploy server

use std::sync::Arc;

use casper::errors::CasperError;
use casper::http::client::Options;
use casper::http::{
    AppFilter, Apps, Credentials, DeploymentFilter, Deployments, HttpClient, JobFilter, Jobs,
    ListQuery, ResourceClient,
};
use casper::joblog::{LogChannel, SocketIoChannel};
use ghost_models::{JobCommand, JobPayload, JobStatus, ModuleRef};
use httpmock::prelude::*;
use serde_json::json;

const AUTH: &str = "Basic YWxpY2U6czNjcmV0";

fn http_client(server: &MockServer) -> Arc<HttpClient> {
    Arc::new(
        HttpClient::new(
            Credentials::new(server.base_url(), "alice", "s3cret"),
            &Options::default(),
        )
        .unwrap(),
    )
}

fn app(id: &str, name: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "name": name,
        "env": "prod",
        "role": "webfront",
        "_etag": "e1",
        "_links": {"self": {"href": format!("apps/{}", id)}},
        "_version": 3,
        "_latest_version": 3
    })
}

#[tokio::test]
async fn test_list_clamps_page_size_and_strips_internal_fields() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/apps/")
                .header("authorization", AUTH)
                .query_param("max_results", "2")
                .query_param("page", "1")
                .query_param("sort", "-_updated");
            then.status(200).json_body(json!({
                "_items": [app("a1", "front"), app("a2", "back")],
                "_meta": {"max_results": 25, "total": 5, "page": 1},
                "_links": {"next": {"href": "apps?page=2"}}
            }));
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    let page = apps
        .list(&ListQuery::new(2, 1), &AppFilter::default())
        .await
        .unwrap();

    list.assert_async().await;
    assert_eq!(page.max_results, 2);
    assert_eq!(page.total, 5);
    assert!(!page.is_exhaustive());
    assert_eq!(page.summary("applications"), "Showing 2 on 5 applications - Page 1");
    for item in &page.items {
        assert!(item.get("_links").is_none());
        assert!(item.get("_version").is_none());
        assert!(item.get("_latest_version").is_none());
        assert!(item.get("_etag").is_some());
    }
}

#[tokio::test]
async fn test_small_collection_is_exhaustive() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/");
            then.status(200).json_body(json!({
                "_items": [app("a1", "front")],
                "_meta": {"max_results": 10, "total": 1, "page": 1}
            }));
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    let page = apps
        .list(&ListQuery::new(10, 1), &AppFilter::default())
        .await
        .unwrap();

    assert_eq!(page.max_results, 1);
    assert!(page.is_exhaustive());
    assert_eq!(page.summary("applications"), "Showing all the 1 applications");
}

#[tokio::test]
async fn test_list_sends_where_clause() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/apps/")
                .query_param("where", r#"{"env":"prod","name":{"$regex":"fr.*"}}"#);
            then.status(200).json_body(json!({
                "_items": [],
                "_meta": {"max_results": 10, "total": 0, "page": 1}
            }));
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    let filter = AppFilter {
        name: Some("fr.*".to_string()),
        env: Some("prod".to_string()),
        ..Default::default()
    };
    let page = apps.list(&ListQuery::new(10, 1), &filter).await.unwrap();

    list.assert_async().await;
    assert!(page.items.is_empty());
    assert_eq!(page.summary("applications"), "Showing all the 0 applications");
}

#[tokio::test]
async fn test_invalid_env_rejected_before_any_request() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/jobs/");
            then.status(200);
        })
        .await;

    let jobs = ResourceClient::<Jobs>::new(http_client(&server));
    let filter = JobFilter {
        env: Some("Prod Env".to_string()),
        ..Default::default()
    };
    let result = jobs.list(&ListQuery::default(), &filter).await;

    assert!(matches!(result, Err(CasperError::Validation(_))));
    assert_eq!(list.hits_async().await, 0);
}

#[test]
fn test_list_params_order_and_embedding() {
    let filter = JobFilter {
        status: Some(JobStatus::Started),
        ..Default::default()
    };
    let params = ResourceClient::<Jobs>::list_params(&ListQuery::new(5, 2), &filter).unwrap();
    assert_eq!(
        params,
        vec![
            ("max_results", "5".to_string()),
            ("page", "2".to_string()),
            ("sort", "-_updated".to_string()),
            ("where", r#"{"status":"started"}"#.to_string()),
            ("embedded", r#"{"app_id":1}"#.to_string()),
        ]
    );

    let params = ResourceClient::<Deployments>::list_params(
        &ListQuery::default(),
        &DeploymentFilter::default(),
    )
    .unwrap();
    assert_eq!(
        params,
        vec![
            ("max_results", "20".to_string()),
            ("page", "1".to_string()),
            ("sort", "-timestamp".to_string()),
            ("embedded", r#"{"app_id":1,"job_id":1}"#.to_string()),
        ]
    );
}

#[test]
fn test_explicit_sort_overrides_default() {
    let query = ListQuery::new(10, 1).sorted_by("name");
    let params = ResourceClient::<Apps>::list_params(&query, &AppFilter::default()).unwrap();
    assert_eq!(params[2], ("sort", "name".to_string()));
}

#[test]
fn test_zero_page_size_rejected() {
    let result =
        ResourceClient::<Apps>::list_params(&ListQuery::new(0, 1), &AppFilter::default());
    assert!(matches!(result, Err(CasperError::Validation(_))));
}

#[tokio::test]
async fn test_retrieve_strips_nested_internal_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/jobs/j1");
            then.status(200).json_body(json!({
                "_id": "j1",
                "status": "done",
                "_links": {"self": {"href": "jobs/j1"}},
                "app_id": {"_id": "a1", "name": "front", "_links": {}}
            }));
        })
        .await;

    let jobs = ResourceClient::<Jobs>::new(http_client(&server));
    let job = jobs.retrieve("j1").await.unwrap();

    assert!(job.get("_links").is_none());
    assert!(job.lookup(&["app_id", "_links"]).is_none());
    assert_eq!(job.lookup_str(&["app_id", "name"]), Some("front"));
    assert_eq!(job.job_status().unwrap(), JobStatus::Done);
}

#[tokio::test]
async fn test_retrieve_unknown_id_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/missing");
            then.status(404).body("not found");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/malformed");
            then.status(400).body("bad id");
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    assert!(matches!(
        apps.retrieve("missing").await,
        Err(CasperError::NotFound(_))
    ));
    assert!(matches!(
        apps.retrieve("malformed").await,
        Err(CasperError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/a1");
            then.status(503).body("maintenance");
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    match apps.retrieve("a1").await {
        Err(CasperError::Api { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreadable_body_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/");
            then.status(200).body("<html>proxy login</html>");
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    let result = apps.list(&ListQuery::default(), &AppFilter::default()).await;
    match result {
        Err(CasperError::Decode { url, .. }) => assert!(url.ends_with("/apps/")),
        other => panic!("expected a decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let http = Arc::new(
        HttpClient::new(
            Credentials::new("http://127.0.0.1:1", "alice", "s3cret"),
            &Options::default(),
        )
        .unwrap(),
    );
    let apps = ResourceClient::<Apps>::new(http);
    let result = apps.retrieve("a1").await;
    assert!(matches!(result, Err(CasperError::Transport { .. })));
}

#[tokio::test]
async fn test_submit_posts_payload_and_returns_id() {
    let server = MockServer::start_async().await;
    let mut payload = JobPayload::new(JobCommand::Deploy, "a1");
    payload.options = vec!["serial".to_string()];
    payload.modules = vec![ModuleRef::with_rev("api", "v2"), ModuleRef::new("worker")];

    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/jobs/")
                .header("authorization", AUTH)
                .json_body(json!({
                    "command": "deploy",
                    "app_id": "a1",
                    "options": ["serial"],
                    "modules": [{"name": "api", "rev": "v2"}, {"name": "worker"}]
                }));
            then.status(201).json_body(json!({
                "_id": "j42",
                "_status": "OK",
                "_links": {"self": {"href": "jobs/j42"}}
            }));
        })
        .await;

    let jobs = ResourceClient::<Jobs>::new(http_client(&server));
    let job_id = jobs.submit(&payload).await.unwrap();

    create.assert_async().await;
    assert_eq!(job_id, "j42");
}

#[tokio::test]
async fn test_fetch_log_returns_text() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/jobs/j1/logs");
            then.status(200).body("step 1\nstep 2\n");
        })
        .await;

    let jobs = ResourceClient::<Jobs>::new(http_client(&server));
    assert_eq!(jobs.fetch_log("j1").await.unwrap(), "step 1\nstep 2\n");
}

#[tokio::test]
async fn test_all_modules_taken_from_application() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/a1");
            then.status(200).json_body(json!({
                "_id": "a1",
                "modules": [{"name": "front", "git_repo": "x"}, {"name": "worker"}]
            }));
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    assert_eq!(apps.module_names("a1").await.unwrap(), vec!["front", "worker"]);
}

#[tokio::test]
async fn test_log_channel_probe() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/socket.io/")
                .query_param("EIO", "3")
                .query_param("transport", "polling");
            then.status(200).body("97:0{\"sid\":\"abc\"}");
        })
        .await;

    let channel = SocketIoChannel::new(http_client(&server));
    assert!(channel.available().await.unwrap());
    probe.assert_async().await;

    let other = MockServer::start_async().await;
    let channel = SocketIoChannel::new(http_client(&other));
    assert!(!channel.available().await.unwrap());
}

#[tokio::test]
async fn test_refused_upgrade_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/socket.io/");
            then.status(403).body("upgrade not allowed");
        })
        .await;

    let channel = SocketIoChannel::new(http_client(&server));
    match channel.open("j1").await {
        Err(CasperError::StreamUnavailable(reason)) => assert!(reason.contains("/socket.io/")),
        Err(other) => panic!("expected StreamUnavailable, got {:?}", other),
        Ok(_) => panic!("session opened against a plain HTTP server"),
    }
}

#[tokio::test]
async fn test_malformed_documents_report_their_url() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/apps/");
            then.status(200).json_body(json!({
                "_items": [app("a1", "front"), "not an application"],
                "_meta": {"max_results": 10, "total": 2, "page": 1}
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/jobs/j1");
            then.status(200).json_body(json!({"_id": "j1", "status": "exploded"}));
        })
        .await;

    let apps = ResourceClient::<Apps>::new(http_client(&server));
    match apps.list(&ListQuery::default(), &AppFilter::default()).await {
        Err(CasperError::Decode { url, reason }) => {
            assert_eq!(url, format!("{}/apps/", server.base_url()));
            assert!(reason.contains("expected an object"));
        }
        other => panic!("expected a decode error, got {:?}", other),
    }

    let jobs = ResourceClient::<Jobs>::new(http_client(&server));
    let err = jobs.status("j1").await.unwrap_err();
    assert!(matches!(&err, CasperError::Decode { url, .. } if url.ends_with("/jobs/j1")));
    assert!(!err.to_string().contains("from :"));
}
