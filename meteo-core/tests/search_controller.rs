//! End-to-end search scenarios against a mock Open-Meteo server.

use std::{sync::Arc, time::Duration};

use meteo_core::{
    Config, FileStore, KeyValueStore, LAST_QUERY_KEY, LOCATION_NOT_FOUND, MemoryStore,
    SearchController, day_cards, display::TODAY_LABEL, source_from_config,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        geocoding_url: format!("{}/v1/search", server.uri()),
        forecast_url: format!("{}/v1/forecast", server.uri()),
        ..Config::default()
    }
}

fn controller_for(server: &MockServer, store: Arc<dyn KeyValueStore>) -> SearchController {
    let source = source_from_config(&config_for(server)).unwrap();
    SearchController::new(source, store)
}

fn place(name: &str, latitude: f64, longitude: f64, timezone: &str, country: &str) -> serde_json::Value {
    serde_json::json!({
        "results": [{
            "name": name,
            "latitude": latitude,
            "longitude": longitude,
            "timezone": timezone,
            "country_code": country,
        }]
    })
}

fn daily_body(first_day: u32, days: u32, code: i32) -> serde_json::Value {
    let time: Vec<String> = (first_day..first_day + days)
        .map(|d| format!("2024-06-{d:02}"))
        .collect();
    serde_json::json!({
        "daily": {
            "time": time,
            "weathercode": vec![code; days as usize],
            "temperature_2m_max": vec![24.2; days as usize],
            "temperature_2m_min": vec![13.7; days as usize],
        }
    })
}

async fn mount_place(server: &MockServer, query: &str, body: serde_json::Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("name", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
}

async fn mount_forecast(server: &MockServer, latitude: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", latitude))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn paris_resolves_to_seven_day_forecast() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "Paris",
        place("Paris", 48.85, 2.35, "Europe/Paris", "FR"),
        Duration::ZERO,
    )
    .await;
    mount_forecast(&server, "48.85", daily_body(10, 7, 0)).await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));
    controller.on_query_change("Paris").await;

    let state = controller.state();
    assert_eq!(state.resolved_place_name, "Paris");
    assert!(state.error_text.is_none());
    assert!(!state.is_loading);

    let forecast = state.forecast.expect("forecast loaded");
    assert_eq!(forecast.len(), 7);

    // 2024-06-10 is a Monday, but the first card is always "Today".
    let cards = day_cards(&forecast);
    assert_eq!(cards[0].label, TODAY_LABEL);
    assert_eq!(cards[1].label, "Tue");
    assert_eq!(cards[0].range, "13° — 25°");
}

#[tokio::test]
async fn unknown_place_shows_location_not_found() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "zzzzz",
        serde_json::json!({ "generationtime_ms": 0.3 }),
        Duration::ZERO,
    )
    .await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));
    controller.resolve_and_fetch("zzzzz").await;

    let state = controller.state();
    assert_eq!(state.error_text.as_deref(), Some(LOCATION_NOT_FOUND));
    assert!(state.forecast.is_none());
    assert!(state.resolved_place_name.is_empty());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn empty_results_array_shows_location_not_found() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "zzzzz",
        serde_json::json!({ "results": [] }),
        Duration::ZERO,
    )
    .await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));
    controller.resolve_and_fetch("zzzzz").await;

    assert_eq!(
        controller.state().error_text.as_deref(),
        Some(LOCATION_NOT_FOUND)
    );
}

#[tokio::test]
async fn forecast_failure_clears_resolved_place() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "Paris",
        place("Paris", 48.85, 2.35, "Europe/Paris", "FR"),
        Duration::ZERO,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));
    controller.resolve_and_fetch("Paris").await;

    let state = controller.state();
    assert_eq!(state.error_text.as_deref(), Some(LOCATION_NOT_FOUND));
    assert!(state.resolved_place_name.is_empty());
    assert!(state.forecast.is_none());
}

#[tokio::test]
async fn short_query_never_hits_the_network() {
    let server = MockServer::start().await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));
    controller.on_query_change("P").await;

    assert!(controller.state().forecast.is_none());
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn newer_query_wins_over_slow_older_one() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "Athens",
        place("Athens", 37.98, 23.73, "Europe/Athens", "GR"),
        Duration::from_millis(500),
    )
    .await;
    mount_place(
        &server,
        "Berlin",
        place("Berlin", 52.52, 13.41, "Europe/Berlin", "DE"),
        Duration::ZERO,
    )
    .await;
    mount_forecast(&server, "37.98", daily_body(1, 7, 0)).await;
    mount_forecast(&server, "52.52", daily_body(1, 5, 61)).await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));

    let athens = controller.commit_query("Athens").expect("query changed");
    let athens = tokio::spawn(athens.run());
    tokio::time::sleep(Duration::from_millis(50)).await;

    controller.on_query_change("Berlin").await;
    athens.await.expect("athens task");

    let state = controller.state();
    assert_eq!(state.query_text, "Berlin");
    assert_eq!(state.resolved_place_name, "Berlin");
    assert_eq!(state.forecast.as_ref().map(Vec::len), Some(5));
    assert!(state.error_text.is_none());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn cancelled_lookup_never_sets_error() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "Paris",
        place("Paris", 48.85, 2.35, "Europe/Paris", "FR"),
        Duration::from_secs(5),
    )
    .await;

    let controller = controller_for(&server, Arc::new(MemoryStore::new()));
    let task = tokio::spawn(controller.begin("Paris").run());

    let mut rx = controller.subscribe();
    rx.wait_for(|state| state.is_loading).await.expect("controller alive");
    drop(rx);

    controller.cancel_pending();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("cancellation is prompt")
        .expect("lookup task");

    let state = controller.state();
    assert!(state.error_text.is_none());
    assert!(state.forecast.is_none());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn saved_query_seeds_next_session() {
    let server = MockServer::start().await;
    mount_place(
        &server,
        "Paris",
        place("Paris", 48.85, 2.35, "Europe/Paris", "FR"),
        Duration::ZERO,
    )
    .await;
    mount_forecast(&server, "48.85", daily_body(1, 7, 3)).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let state_path = dir.path().join("state.toml");

    let first = controller_for(&server, Arc::new(FileStore::new(&state_path)));
    first.on_query_change("Paris").await;
    drop(first);

    let store = FileStore::new(&state_path);
    assert_eq!(
        store.get(LAST_QUERY_KEY).expect("read state").as_deref(),
        Some("Paris")
    );

    let second = controller_for(&server, Arc::new(store));
    assert_eq!(second.state().query_text, "Paris");

    second.start().run().await;
    assert_eq!(second.state().forecast.as_ref().map(Vec::len), Some(7));
}
