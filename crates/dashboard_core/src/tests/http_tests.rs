use super::*;

use std::sync::Mutex as StdMutex;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::protocol::{ListParams, SortDirection};
use tokio::net::TcpListener;

const TOTAL_ACTIVITIES: u64 = 35;

#[derive(Clone, Default)]
struct Backend {
    list_queries: Arc<StdMutex<Vec<ListParams>>>,
    created: Arc<StdMutex<Vec<ActivityForm>>>,
    updated: Arc<StdMutex<Vec<(String, Value)>>>,
    deleted: Arc<StdMutex<Vec<String>>>,
}

impl Backend {
    fn list_queries(&self) -> Vec<ListParams> {
        self.list_queries.lock().expect("queries").clone()
    }
}

fn activity_json(n: u64) -> Value {
    json!({
        "id": format!("act-{n}"),
        "scheduledAt": format!("2026-03-{:02}T09:00:00Z", (n % 28) + 1),
        "brief": format!("<p>Campaign {n}</p>"),
        "isSent": n % 2 == 0,
        "sentAt": null,
        "color": "#3b82f6",
        "client": { "id": format!("cl-{n}"), "fullName": "Rina Kartika", "company": "Kopi Nusantara" }
    })
}

async fn list_activities(
    State(backend): State<Backend>,
    Query(params): Query<ListParams>,
) -> Json<Value> {
    backend
        .list_queries
        .lock()
        .expect("queries")
        .push(params.clone());
    let start = u64::from(params.page.saturating_sub(1)) * u64::from(params.limit);
    let end = (start + u64::from(params.limit)).min(TOTAL_ACTIVITIES);
    let data: Vec<Value> = (start..end.max(start)).map(|n| activity_json(n + 1)).collect();
    Json(json!({ "data": data, "meta": { "total": TOTAL_ACTIVITIES } }))
}

async fn create_activity(
    State(backend): State<Backend>,
    Json(form): Json<ActivityForm>,
) -> StatusCode {
    backend.created.lock().expect("created").push(form);
    StatusCode::CREATED
}

async fn update_member(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    backend.updated.lock().expect("updated").push((id, body));
    StatusCode::OK
}

async fn delete_member(
    State(backend): State<Backend>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "statusCode": 404, "code": 4041, "message": "Activity not found" })),
        );
    }
    backend.deleted.lock().expect("deleted").push(id);
    (StatusCode::OK, Json(json!({})))
}

async fn clients_unavailable() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "code": "db_offline", "message": "database offline" })),
    )
}

async fn spawn_backend() -> anyhow::Result<(String, Backend)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let backend = Backend::default();
    let app = Router::new()
        .route(
            "/api/marketing/activities",
            get(list_activities).post(create_activity),
        )
        .route(
            "/api/marketing/activities/:id",
            put(update_member).delete(delete_member),
        )
        .route("/api/marketing/clients", get(clients_unavailable))
        .route(
            "/api/marketing/clients/:id",
            put(update_member).delete(delete_member),
        )
        .with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), backend))
}

fn client_for(server_url: &str) -> DashboardClient {
    let settings = DashboardSettings {
        api_base_url: server_url.to_string(),
        ..DashboardSettings::default()
    };
    DashboardClient::new(&settings).expect("client")
}

fn valid_form() -> ActivityForm {
    ActivityForm {
        date: "2026-04-02".into(),
        time: "10:15".into(),
        receiver: "User".into(),
        brief: "<p>Ramadan promo</p>".into(),
        status: None,
    }
}

#[tokio::test]
async fn list_sends_wire_params_and_decodes_rows() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);

    let query = QueryState::default()
        .reduce(QueryAction::ToggleSort("scheduledAt".into()))
        .reduce(QueryAction::ToggleSort("scheduledAt".into()))
        .reduce(QueryAction::SetSearchText("promo".into()))
        .reduce(QueryAction::SetPageIndex(3));
    let page = client
        .activities()
        .fetch_page(&query)
        .await
        .expect("fetch page");

    assert_eq!(page.total_count, TOTAL_ACTIVITIES);
    assert_eq!(page.rows.len(), 5);
    let first = &page.rows[0];
    assert_eq!(first.id.0, "act-31");
    assert_eq!(first.status_label(), "Not Sent");
    assert_eq!(
        first.client.as_ref().map(|c| c.full_name.as_str()),
        Some("Rina Kartika")
    );
    assert_eq!(first.scheduled_at.to_rfc3339(), "2026-03-04T09:00:00+00:00");

    let sent = backend.list_queries();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].page, 4);
    assert_eq!(sent[0].limit, 10);
    assert_eq!(sent[0].search.as_deref(), Some("promo"));
    assert_eq!(sent[0].sort_by.as_deref(), Some("scheduledAt"));
    assert_eq!(sent[0].order, Some(SortDirection::Desc));
}

#[tokio::test]
async fn controller_over_http_reports_range() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);
    let list = client.activity_list();

    assert_eq!(list.refresh().await, FetchOutcome::Applied);
    assert_eq!(list.snapshot().await.range_label(), "1-10 of 35");

    assert_eq!(list.set_page_index(3).await, FetchOutcome::Applied);
    assert_eq!(list.snapshot().await.range_label(), "31-35 of 35");
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);
    let list = client.client_list();

    let err = match list.refresh().await {
        FetchOutcome::Failed(err) => err,
        other => panic!("expected failure, got {other:?}"),
    };
    assert_eq!(
        err,
        FetchError::Server {
            status: 500,
            message: Some("database offline".into())
        }
    );
    let view = list.snapshot().await;
    assert!(view.rows.is_empty());
    assert_eq!(view.error.map(|e| e.user_message()).as_deref(), Some("database offline"));
}

#[tokio::test]
async fn unreachable_server_is_classified() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client_for(&format!("http://{addr}"));
    let err = client
        .activities()
        .fetch_page(&QueryState::default())
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::Unreachable(_)), "got {err:?}");
    assert_eq!(err.user_message(), "Can't connect to server.");
}

#[tokio::test]
async fn create_posts_form_and_refreshes_list() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);
    let list = client.activity_list();
    list.refresh().await;

    client
        .create_activity(&list, &valid_form())
        .await
        .expect("create");

    assert_eq!(
        backend.created.lock().expect("created").as_slice(),
        &[valid_form()]
    );
    assert_eq!(backend.list_queries().len(), 2);
}

#[tokio::test]
async fn invalid_form_never_reaches_backend() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);
    let list = client.activity_list();

    let form = ActivityForm {
        receiver: String::new(),
        ..valid_form()
    };
    let err = client
        .create_activity(&list, &form)
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::Validation(_)));
    assert!(backend.created.lock().expect("created").is_empty());
    assert!(backend.list_queries().is_empty());
}

#[tokio::test]
async fn delete_of_missing_row_keeps_list() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);
    let list = client.activity_list();
    list.refresh().await;

    let err = client
        .delete_activity(&list, &ActivityId::from("missing"))
        .await
        .expect_err("must fail");
    assert_eq!(err.user_message(), "Activity not found");
    assert_eq!(backend.list_queries().len(), 1);

    client
        .delete_activity(&list, &ActivityId::from("act-3"))
        .await
        .expect("delete");
    assert_eq!(
        backend.deleted.lock().expect("deleted").as_slice(),
        &["act-3".to_string()]
    );
    assert_eq!(backend.list_queries().len(), 2);
}

#[tokio::test]
async fn update_encodes_member_id_in_path() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let client = client_for(&server_url);
    let list = client.client_list();

    let form = UserForm {
        name: "Dewi Lestari".into(),
        kind: "Manager".into(),
    };
    // The clients list endpoint is down in this backend, so the follow-up
    // refresh fails while the update itself succeeds.
    client
        .update_client(&list, &ClientId::from("client 7"), &form)
        .await
        .expect("update");

    let updated = backend.updated.lock().expect("updated").clone();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].0, "client 7");
    assert_eq!(updated[0].1, json!({ "name": "Dewi Lestari", "type": "Manager" }));
    assert!(list.snapshot().await.error.is_some());
}
