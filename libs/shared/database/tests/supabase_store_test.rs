use std::time::Duration;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{SchedulingStore, StoreError, SupabaseStore, TimedStore};
use shared_models::scheduling::{AppointmentStatus, NewAppointment, PaymentStatus};

fn test_config(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        store_max_retries: 2,
        ..AppConfig::default()
    }
}

fn new_appointment(provider_id: Uuid) -> NewAppointment {
    NewAppointment {
        provider_id,
        client_id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        additional_service_ids: vec![],
        date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        start_time: "09:00".to_string(),
        end_time: "09:30".to_string(),
        status: AppointmentStatus::Pending,
        payment_status: PaymentStatus::Pending,
    }
}

#[tokio::test]
async fn test_get_provider_with_embedded_services() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .and(query_param("id", format!("eq.{}", provider_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": provider_id,
            "name": "Barbearia Central",
            "timezone": "America/Sao_Paulo",
            "rating": 47,
            "latitude": -23.55,
            "longitude": -46.63,
            "services": [{ "service_id": service_id, "custom_duration_minutes": 45 }]
        }])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(&mock_server));
    let provider = store.get_provider(provider_id).await.unwrap().unwrap();

    assert_eq!(provider.name, "Barbearia Central");
    assert_eq!(provider.offers(service_id).unwrap().custom_duration_minutes, Some(45));
}

#[tokio::test]
async fn test_missing_provider_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(&mock_server));
    assert!(store.get_provider(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_booking_maps_to_unique_violation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_active_start\""
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(&mock_server));
    let result = store.insert_appointment(new_appointment(Uuid::new_v4())).await;

    assert_matches!(result, Err(StoreError::UniqueViolation(_)));
}

#[tokio::test]
async fn test_reads_are_retried_on_server_errors() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(&mock_server));
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let appointments = store.appointments(provider_id, date).await.unwrap();
    assert!(appointments.is_empty());
}

#[tokio::test]
async fn test_writes_are_never_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(&mock_server));
    let result = store.insert_appointment(new_appointment(Uuid::new_v4())).await;

    assert_matches!(result, Err(StoreError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_timed_store_reports_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let store = TimedStore::new(
        SupabaseStore::new(&test_config(&mock_server)),
        Duration::from_millis(50),
    );

    let result = store.list_providers().await;
    assert_matches!(result, Err(StoreError::Timeout(_)));
}

#[tokio::test]
async fn test_rule_replacement_goes_through_single_rpc() {
    let mock_server = MockServer::start().await;
    let provider_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/replace_availability_rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "provider_id": provider_id,
            "day_of_week": 1,
            "specific_date": null,
            "start_time": "08:00",
            "end_time": "12:00",
            "is_available": true,
            "interval_minutes": 30
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    // No DELETE mock is mounted: a delete-then-insert sequence would 404 here.
    let store = SupabaseStore::new(&test_config(&mock_server));
    let created = store.replace_availability_rules(provider_id, vec![]).await.unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].start_time, "08:00");
}
