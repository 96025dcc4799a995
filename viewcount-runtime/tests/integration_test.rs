use {
    std::{fs, net::SocketAddr, sync::Arc, thread, time::Duration},
    tokio::sync::{Notify, oneshot},
    serde_json::json,
    viewcount_core::{FunctionUrlEvent, FunctionUrlResponse, StatusCode},
    viewcount_runtime::{
        CounterFunction,
        Function,
        Table,
        config::{LoggerConfig, ServerConfig, StorageConfig, TableConfig, function_from_config, storage_from_config},
        error::ConfigError,
        http::{event_from_request, into_http_response},
        kv::{BoxedStorage, SqliteStorage},
        server::CounterServer,
    },
    crate::storage::DataCleanupGuard,
};

mod storage;

#[tokio::test]
async fn serves_counter_over_http() {
    let function = Arc::new(CounterFunction::new(
        Table::new("cloudportfolio-test", BoxedStorage::new(SqliteStorage::in_memory().unwrap())),
        "0",
    ));
    let server = CounterServer::bind(([127, 0, 0, 1], 0).into(), function).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.serve(async move {
        let _ = shutdown_rx.await;
    }));

    let client = reqwest::Client::new();

    for expected in 1..=3u64 {
        let response = client.get(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(200, response.status().as_u16());
        assert_eq!("application/json", response.headers()["content-type"]);
        assert_eq!("*", response.headers()["access-control-allow-origin"]);
        let body: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(json!({ "view_count": expected }), body);
    }

    let response = client.get(format!("http://{addr}/favicon.ico")).send().await.unwrap();
    assert_eq!(204, response.status().as_u16());
    assert!(response.text().await.unwrap().is_empty());

    let response = client.get(format!("http://{addr}/?utm_source=test")).send().await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(json!({ "view_count": 4 }), body);

    shutdown_tx.send(()).unwrap();
    server_task.await.unwrap();
}

struct SlowFunction {
    started: Arc<Notify>,
}

impl Function for SlowFunction {
    fn handle(&self, _event: &FunctionUrlEvent) -> FunctionUrlResponse {
        self.started.notify_one();
        thread::sleep(Duration::from_millis(500));
        FunctionUrlResponse::json(StatusCode::OK, r#"{"view_count":1}"#)
    }
}

#[tokio::test]
async fn shutdown_waits_for_requests_in_flight() {
    let started = Arc::new(Notify::new());
    let server = CounterServer::bind(([127, 0, 0, 1], 0).into(), Arc::new(SlowFunction { started: started.clone() })).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.serve(async move {
        let _ = shutdown_rx.await;
    }));

    let request = tokio::spawn(async move {
        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        (response.status().as_u16(), response.text().await.unwrap())
    });

    started.notified().await;
    shutdown_tx.send(()).unwrap();
    server_task.await.unwrap();

    let (status, body) = request.await.unwrap();
    assert_eq!(200, status);
    assert_eq!(r#"{"view_count":1}"#, body);
}

#[test]
fn request_is_converted_into_event() {
    let request = hyper::Request::builder()
        .method("POST")
        .uri("http://localhost:8080/favicon.ico?size=32")
        .header("Accept", "image/*")
        .header("X-Forwarded-For", "10.0.0.1")
        .header("X-Forwarded-For", "10.0.0.2")
        .body(())
        .unwrap();

    let event = event_from_request(&request);

    assert_eq!("/favicon.ico", event.path());
    assert_eq!(Some("size=32"), event.raw_query_string.as_deref());
    assert_eq!(Some("POST"), event.method());
    assert_eq!(Some("image/*"), event.headers.get("accept").map(String::as_str));
    assert_eq!(Some("10.0.0.1,10.0.0.2"), event.headers.get("x-forwarded-for").map(String::as_str));
}

#[test]
fn function_response_is_converted_into_http_response() {
    let response = into_http_response(FunctionUrlResponse::json(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#));

    assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());
    assert_eq!("application/json", response.headers()["content-type"]);
    assert_eq!("*", response.headers()["access-control-allow-origin"]);

    let response = into_http_response(FunctionUrlResponse::no_content().with_header("bad header", "x"));
    assert_eq!(StatusCode::NO_CONTENT, response.status());
    assert!(response.headers().is_empty());
}

#[test]
fn config_defaults() {
    let config = ServerConfig::from_yaml("storage:\n  type: memory\n").unwrap();

    assert_eq!("0.0.0.0:8080", config.listen);
    assert_eq!(TableConfig { name: "cloudportfolio-test".to_owned(), counter_id: "0".to_owned() }, config.table);
    assert_eq!(StorageConfig::Memory, config.storage);
    assert_eq!(LoggerConfig::Stdout { level: None }, config.logger);
    assert_eq!(SocketAddr::from(([0, 0, 0, 0], 8080)), config.listen_addr().unwrap());
}

#[test]
fn config_full() {
    let config = ServerConfig::from_yaml(r#"
listen: 127.0.0.1:9000
table:
  name: portfolio
  counter_id: "home"
storage:
  type: sqlite
  path: data/views.sqlite
logger:
  type: noop
"#).unwrap();

    assert_eq!(SocketAddr::from(([127, 0, 0, 1], 9000)), config.listen_addr().unwrap());
    assert_eq!(TableConfig { name: "portfolio".to_owned(), counter_id: "home".to_owned() }, config.table);
    assert_eq!(StorageConfig::Sqlite { path: "data/views.sqlite".to_owned() }, config.storage);
    assert_eq!(LoggerConfig::Noop, config.logger);
}

#[test]
fn config_errors() {
    match ServerConfig::from_yaml("storage:\n  type: dynamo\n") {
        Err(ConfigError::Parse { .. }) => {},
        other => panic!("unexpected result: {other:?}"),
    }

    match ServerConfig::from_yaml("listen: localhost\nstorage:\n  type: memory\n").unwrap().listen_addr() {
        Err(ConfigError::InvalidListenAddress { .. }) => {},
        other => panic!("unexpected result: {other:?}"),
    }

    match ServerConfig::load(std::env::temp_dir().join("viewcount-missing-config.yaml")) {
        Err(ConfigError::Read { .. }) => {},
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn config_file_with_fs_storage() {
    let data = DataCleanupGuard::new("config");
    fs::create_dir_all(data.path()).unwrap();
    let storage_path = data.path().join("store");
    let config_path = data.path().join("viewcount.yaml");
    fs::write(&config_path, format!("storage:\n  type: fs\n  path: {:?}\nlogger:\n  type: noop\n", storage_path)).unwrap();

    let config = ServerConfig::load(config_path.clone()).unwrap();
    assert_eq!(Some(config_path), config.config_path);

    let function = function_from_config(&config).unwrap();
    assert_eq!(Ok(1), function.increment());
    assert_eq!(Ok(2), function.increment());

    let stored: serde_json::Value = serde_json::from_slice(
        &fs::read(storage_path.join("cloudportfolio-test").join("0")).unwrap()
    ).unwrap();
    assert_eq!(json!({ "id": { "S": "0" }, "view_count": { "N": "2" } }), stored);
}

#[test]
fn storage_from_config_memory_is_isolated() {
    let first = storage_from_config(&StorageConfig::Memory).unwrap();
    let second = storage_from_config(&StorageConfig::Memory).unwrap();

    let first = CounterFunction::new(Table::new("views", first), "0");
    let second = CounterFunction::new(Table::new("views", second), "0");

    assert_eq!(Ok(1), first.increment());
    assert_eq!(Ok(2), first.increment());
    assert_eq!(Ok(1), second.increment());
}
