use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::get,
};
use serde_json::{Value, json};

use datatable::{
    Backend, ColumnDescriptor, CrudOrchestrator, DataSource, DataTable, Dialog, FieldKind,
    FilterField, FilterForm, FilterPipeline, FilterValue, FilterValues, FormField, HttpBackend,
    NoticeLevel, TableController, TableHandle, TableStatus,
};

#[derive(Clone, Default)]
struct Fixture {
    rows: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<String>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    locked: Arc<Vec<String>>,
}

impl Fixture {
    fn with_rows(count: usize) -> Self {
        let rows = (1..=count)
            .map(|n| {
                json!({
                    "id": format!("c{n}"),
                    "name": format!("category {n}"),
                    "kind": if n % 2 == 0 { "income" } else { "expense" },
                    "archived": false,
                })
            })
            .collect();
        Self {
            rows: Arc::new(Mutex::new(rows)),
            ..Self::default()
        }
    }

    fn last_query(&self) -> String {
        self.queries.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

async fn list(
    State(fx): State<Fixture>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    fx.queries.lock().unwrap().push(raw.unwrap_or_default());
    fx.auth.lock().unwrap().push(
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    );

    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: usize = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(20);

    let mut rows: Vec<Value> = fx
        .rows
        .lock()
        .unwrap()
        .iter()
        .filter(|row| match params.get("kind") {
            Some(kind) => row["kind"] == json!(kind),
            None => true,
        })
        .filter(|row| match params.get("q") {
            Some(q) => row["name"].as_str().is_some_and(|name| name.contains(q.as_str())),
            None => true,
        })
        .cloned()
        .collect();
    if let Some((key, direction)) = params.get("sort").and_then(|s| s.split_once(',')) {
        rows.sort_by(|a, b| a[key].as_str().cmp(&b[key].as_str()));
        if direction == "desc" {
            rows.reverse();
        }
    }

    let total = rows.len();
    let content: Vec<Value> = rows.into_iter().skip(page * size).take(size).collect();
    Json(json!({
        "content": content,
        "number": page,
        "size": size,
        "totalElements": total,
    }))
}

async fn create(
    State(fx): State<Fixture>,
    Json(body): Json<Value>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut rows = fx.rows.lock().unwrap();
    if rows.iter().any(|row| row["name"] == json!(name)) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"errors": {"name": ["already exists"]}})),
        ));
    }
    let id = format!("c{}", rows.len() + 100);
    let mut row = body;
    row["id"] = json!(id);
    rows.push(row);
    Ok(StatusCode::CREATED)
}

async fn remove(
    State(fx): State<Fixture>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    if fx.locked.contains(&id) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "record is locked"})),
        ));
    }
    fx.rows.lock().unwrap().retain(|row| row["id"] != json!(id));
    Ok(StatusCode::NO_CONTENT)
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn bare() -> Json<Value> {
    Json(json!({"content": [{"id": 1}, {"id": 2}]}))
}

async fn spawn(fx: Fixture) -> String {
    let app = Router::new()
        .route("/api/categories", get(list).post(create))
        .route("/api/categories/{id}", axum::routing::delete(remove))
        .route("/api/broken", get(broken))
        .route("/api/bare", get(bare))
        .with_state(fx);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::field("Name", "name")
            .sortable()
            .build()
            .unwrap(),
        ColumnDescriptor::field("Kind", "kind").build().unwrap(),
    ]
}

fn table(base: &str, resource: &str, page_size: u64) -> DataTable<HttpBackend> {
    let backend = HttpBackend::new(base).unwrap();
    let target = backend.endpoint(resource).unwrap();
    let controller = TableController::new(target, page_size, columns()).unwrap();
    DataTable::new(controller, DataSource::new(backend))
}

fn form_fields() -> Vec<FormField> {
    vec![
        FormField::new("name", "Name", FieldKind::Text).required(),
        FormField::new("kind", "Kind", FieldKind::Text),
    ]
}

#[tokio::test]
async fn last_partial_page_holds_the_remainder() {
    let fx = Fixture::with_rows(5);
    let base = spawn(fx.clone()).await;
    let mut table = table(&base, "categories", 2);

    table.mount().await;
    assert_eq!(table.controller().page().total_count, 5);
    assert_eq!(table.controller().page_count(), 3);

    table.go_to_page(2).await;
    let page = table.controller().page();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.page_index, 2);
    assert_eq!(fx.last_query(), "page=2&size=2");
}

#[tokio::test]
async fn absent_page_fields_fall_back_to_the_request() {
    let fx = Fixture::default();
    let base = spawn(fx).await;
    let mut table = table(&base, "bare", 10);

    table.mount().await;
    let page = table.controller().page();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page_index, 0);
    assert_eq!(page.page_size, 10);
    assert_eq!(page.total_count, 0);
    assert_eq!(table.controller().status(), TableStatus::Loaded);
}

#[tokio::test]
async fn failed_fetch_degrades_to_an_empty_page() {
    let fx = Fixture::default();
    let base = spawn(fx).await;
    let mut table = table(&base, "broken", 10);
    let mut failures = table.source_mut().subscribe_failures();

    table.mount().await;
    assert_eq!(table.controller().status(), TableStatus::Empty);
    assert!(table.controller().rows().is_empty());

    let failure = failures.try_recv().unwrap();
    assert_eq!(failure.url.path(), "/api/broken");
    assert_eq!(failure.message, "The server could not complete the request.");

    let backend = HttpBackend::new(&base).unwrap();
    let source = DataSource::new(backend.clone());
    let target = backend.endpoint("broken").unwrap();
    let query = table.controller().query().clone();
    assert!(source.try_fetch_page(&target, &query).await.is_err());
}

#[tokio::test]
async fn header_click_sends_the_sort_parameter() {
    let fx = Fixture::with_rows(3);
    let base = spawn(fx.clone()).await;
    let mut table = table(&base, "categories", 10);

    table.mount().await;
    table.header_click(0).await;
    assert_eq!(fx.last_query(), "page=0&size=10&sort=name%2Casc");
    table.header_click(0).await;
    assert_eq!(fx.last_query(), "page=0&size=10&sort=name%2Cdesc");
    assert_eq!(table.controller().rows()[0]["name"], json!("category 3"));

    let requests = fx.queries.lock().unwrap().len();
    table.header_click(1).await;
    assert_eq!(fx.queries.lock().unwrap().len(), requests);
}

#[tokio::test]
async fn filter_reload_keeps_page_and_clears_selection() {
    let fx = Fixture::with_rows(6);
    let base = spawn(fx.clone()).await;
    let mut table = table(&base, "categories", 2);

    table.mount().await;
    table.go_to_page(1).await;
    table.controller_mut().select_all();
    assert_eq!(table.selection().len(), 2);

    let mut form = FilterForm::new(
        vec![
            FilterField::text("q", "Search"),
            FilterField::text("kind", "Kind"),
        ],
        FilterValues::new(),
    );
    form.set("kind", FilterValue::Text("income".to_string()));
    let pipeline = FilterPipeline::new("categories", form.defaults().clone());
    let applied = pipeline.apply(&mut table, &form.submit()).await;

    assert!(applied.has_active_filters);
    assert!(table.selection().is_empty());
    assert_eq!(table.controller().query().page_index, 1);
    assert_eq!(fx.last_query(), "page=1&size=2&kind=income");
    assert_eq!(table.controller().page().total_count, 3);
    assert_eq!(table.controller().rows().len(), 1);

    let cleared = form.clear();
    let applied = pipeline.apply(&mut table, &cleared).await;
    assert!(!applied.has_active_filters);
    assert_eq!(fx.last_query(), "page=1&size=2");
}

#[tokio::test]
async fn create_reload_preserves_the_active_query() {
    let fx = Fixture::with_rows(2);
    let base = spawn(fx.clone()).await;
    let mut table = table(&base, "categories", 10);
    table.mount().await;
    table.reload(Some("categories?kind=expense")).await;
    table.header_click(0).await;
    let before = fx.last_query();

    let backend = HttpBackend::new(&base).unwrap();
    let mut crud = CrudOrchestrator::new("categories", form_fields());
    crud.open_create();
    if let Dialog::Form(form) = crud.dialog_mut() {
        form.set_input("name", "travel");
        form.set_input("kind", "expense");
    }
    assert!(crud.submit_form(&backend, &mut table).await);

    assert_eq!(fx.last_query(), before);
    assert_eq!(table.controller().page().total_count, 2);
    assert_eq!(crud.notices().latest().map(|n| n.level), Some(NoticeLevel::Success));
}

#[tokio::test]
async fn duplicate_create_maps_field_errors() {
    let fx = Fixture::with_rows(1);
    let base = spawn(fx).await;
    let mut table = table(&base, "categories", 10);
    table.mount().await;

    let backend = HttpBackend::new(&base).unwrap();
    let mut crud = CrudOrchestrator::new("categories", form_fields());
    crud.open_create();
    if let Dialog::Form(form) = crud.dialog_mut() {
        form.set_input("name", "category 1");
    }
    assert!(!crud.submit_form(&backend, &mut table).await);
    let Dialog::Form(form) = crud.dialog() else {
        panic!("form should stay open");
    };
    assert_eq!(form.field_errors("name"), ["already exists".to_string()]);
}

#[tokio::test]
async fn bulk_delete_is_fail_soft() {
    let fx = Fixture {
        locked: Arc::new(vec!["c2".to_string()]),
        ..Fixture::with_rows(3)
    };
    let base = spawn(fx.clone()).await;
    let mut table = table(&base, "categories", 10);
    table.mount().await;
    table.controller_mut().select_all();

    let backend = HttpBackend::new(&base).unwrap();
    let mut crud = CrudOrchestrator::new("categories", form_fields());
    assert!(crud.open_delete(&table));
    let requests = fx.queries.lock().unwrap().len();
    let outcome = crud.confirm_delete(&backend, &mut table).await;

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.succeeded, 2);
    let notice = crud.notices().latest().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains('1'));
    assert_eq!(fx.queries.lock().unwrap().len(), requests + 1);
    let survivors: Vec<&Value> = table.controller().rows().iter().map(|row| &row["id"]).collect();
    assert_eq!(survivors, vec![&json!("c2")]);
    assert_eq!(table.selection().len(), 1);
    assert_eq!(table.controller().selected_rows()[0]["id"], json!("c2"));
}

#[tokio::test]
async fn bearer_token_is_sent_when_present() {
    let fx = Fixture::with_rows(1);
    let base = spawn(fx.clone()).await;
    let backend = HttpBackend::new(&base)
        .unwrap()
        .with_token(Some("secret".to_string()));
    let target = backend.endpoint("categories").unwrap();
    let controller = TableController::new(target, 5, columns()).unwrap();
    let mut table = DataTable::new(controller, DataSource::new(backend));

    table.mount().await;
    assert_eq!(
        fx.auth.lock().unwrap().last().cloned().flatten().as_deref(),
        Some("Bearer secret")
    );
}
