use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use availability_cell::router::availability_routes;
use availability_cell::SchedulingContext;
use shared_config::AppConfig;
use shared_database::{InMemoryStore, SchedulingStore};
use shared_models::scheduling::{ProviderProfile, ServiceTemplate};
use shared_utils::test_utils::{JwtTestUtils, SchedulingFixtures, TestConfig, TestUser};

struct TestApp {
    router: Router,
    config: Arc<AppConfig>,
    store: Arc<InMemoryStore>,
    provider: ProviderProfile,
    haircut: ServiceTemplate,
}

async fn test_app(smart_slots_enabled: bool) -> TestApp {
    let mut config = TestConfig::default().to_app_config();
    config.smart_slots_enabled = smart_slots_enabled;
    let config = Arc::new(config);
    let store = Arc::new(InMemoryStore::new());

    let haircut = SchedulingFixtures::service("Haircut", 30);
    let mut provider = SchedulingFixtures::provider("Barbearia Central", "America/Sao_Paulo");
    SchedulingFixtures::offering(&mut provider, &haircut, None);
    store.insert_service(haircut.clone()).await;
    store.insert_provider(provider.clone()).await;
    store
        .insert_rule(SchedulingFixtures::weekly_rule(provider.id, 1, "08:00", "12:00", 30))
        .await;

    let state = Arc::new(SchedulingContext::new(config.clone(), store.clone()));
    TestApp {
        router: availability_routes(state),
        config,
        store,
        provider,
        haircut,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, bearer: Option<String>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_time_slots_endpoint() {
    let app = test_app(true).await;
    let uri = format!(
        "/providers/{}/time-slots?date=2025-03-10&serviceId={}",
        app.provider.id, app.haircut.id
    );

    let (status, body) = send(&app.router, get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 8);
    assert_eq!(body["available"], 8);
    assert_eq!(body["day_of_week"], 1);
    assert_eq!(body["slots"][0]["start_time"], "08:00");
    assert_eq!(body["slots"][0]["service_duration"], 30);
}

#[tokio::test]
async fn test_malformed_date_is_rejected_with_field() {
    let app = test_app(true).await;
    let uri = format!("/providers/{}/time-slots?date=10-03-2025", app.provider.id);

    let (status, body) = send(&app.router, get(&uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "date");
    assert_eq!(body["details"]["value"], "10-03-2025");
}

#[tokio::test]
async fn test_unknown_provider_is_not_found() {
    let app = test_app(true).await;
    let uri = format!("/providers/{}/time-slots?date=2025-03-10", Uuid::new_v4());

    let (status, _) = send(&app.router, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_slots_check_filters_held_list() {
    let app = test_app(true).await;
    let owner = TestUser::provider_for(app.provider.id);
    let bearer = JwtTestUtils::bearer(&owner, &app.config.supabase_jwt_secret);

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/blocked-slots",
            Some(bearer),
            json!({ "date": "2025-03-10", "startTime": "09:00", "endTime": "10:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            &format!("/providers/{}/available-slots-check", app.provider.id),
            None,
            json!({
                "date": "2025-03-10",
                "serviceId": app.haircut.id,
                "slots": [
                    { "startTime": "08:30", "endTime": "09:00" },
                    { "startTime": "09:30", "endTime": "10:00" },
                    { "startTime": "13:00", "endTime": "13:30" }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requested_count"], 3);
    assert_eq!(body["available_count"], 1);
    assert_eq!(body["unavailable_count"], 2);
    assert_eq!(body["available_slots"][0]["start_time"], "08:30");
}

#[tokio::test]
async fn test_smart_slots_source_flag() {
    let scored = test_app(true).await;
    let uri = format!("/providers/{}/smart-time-slots?date=2025-03-10", scored.provider.id);
    let (status, body) = send(&scored.router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "scored");

    let plain = test_app(false).await;
    let uri = format!("/providers/{}/smart-time-slots?date=2025-03-10", plain.provider.id);
    let (_, body) = send(&plain.router, get(&uri)).await;
    assert_eq!(body["source"], "computed");
    assert_eq!(body["slots"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_batch_replace_requires_owner() {
    let app = test_app(true).await;
    let payload = json!({
        "provider_id": app.provider.id,
        "rules": [
            { "dayOfWeek": 2, "startTime": "09:00", "endTime": "17:00", "intervalMinutes": 60 },
            { "specificDate": "2025-12-24", "startTime": "09:00", "endTime": "12:00" }
        ]
    });

    let (status, _) = send(
        &app.router,
        json_request(Method::POST, "/availability/batch", None, payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stranger = TestUser::provider("other@example.com");
    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/availability/batch",
            Some(JwtTestUtils::bearer(&stranger, &app.config.supabase_jwt_secret)),
            payload.clone(),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let owner = TestUser::provider_for(app.provider.id);
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/availability/batch",
            Some(JwtTestUtils::bearer(&owner, &app.config.supabase_jwt_secret)),
            payload,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total"], 2);

    let rules = app.store.list_availability_rules(app.provider.id).await.unwrap();
    assert_eq!(rules.len(), 2);
    assert!(rules.iter().all(|r| r.day_of_week != Some(1)));
}

#[tokio::test]
async fn test_batch_rejects_inverted_window() {
    let app = test_app(true).await;
    let admin = TestUser::admin("admin@example.com");

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/availability/batch",
            Some(JwtTestUtils::bearer(&admin, &app.config.supabase_jwt_secret)),
            json!({
                "provider_id": app.provider.id,
                "rules": [{ "day_of_week": 1, "start_time": "12:00", "end_time": "08:00" }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("before end time"));
    // The previous rule set is untouched.
    assert_eq!(app.store.list_availability_rules(app.provider.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_blocked_slot_series() {
    let app = test_app(true).await;
    let owner = TestUser::provider_for(app.provider.id);
    let bearer = JwtTestUtils::bearer(&owner, &app.config.supabase_jwt_secret);

    let (_, created) = send(
        &app.router,
        json_request(
            Method::POST,
            "/blocked-slots",
            Some(bearer.clone()),
            json!({ "date": "2025-03-10", "start_time": "11:00", "end_time": "12:00", "repeat_weeks": 2 }),
        ),
    )
    .await;
    assert_eq!(created["total"], 3);
    let block_id = created["blocked_slots"][0]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/blocked-slots/{}?series=true", block_id))
        .header(header::AUTHORIZATION, bearer)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 3);
}

#[tokio::test]
async fn test_provider_availability_listing() {
    let app = test_app(true).await;
    let (status, body) = send(&app.router, get(&format!("/providers/{}/availability", app.provider.id))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["rules"][0]["start_time"], "08:00");
}
