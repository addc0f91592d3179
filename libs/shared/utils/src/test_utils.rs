use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::scheduling::{AvailabilityRule, ProviderProfile, ProviderService, ServiceTemplate};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            default_timezone: "UTC".to_string(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn client(email: &str) -> Self {
        Self::new(email, "client")
    }

    pub fn provider(email: &str) -> Self {
        Self::new(email, "provider")
    }

    /// Provider account whose user id is the provider profile id.
    pub fn provider_for(provider_id: Uuid) -> Self {
        Self {
            id: provider_id.to_string(),
            ..Self::provider("provider@example.com")
        }
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).unwrap_or_default()
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({ "alg": "HS256", "typ": "JWT" });
        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "app_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, secret: &str) -> String {
        format!("Bearer {}", Self::create_test_token(user, secret, None))
    }
}

/// Builders for scheduling records used across cell tests.
pub struct SchedulingFixtures;

impl SchedulingFixtures {
    pub fn service(name: &str, default_duration_minutes: i32) -> ServiceTemplate {
        ServiceTemplate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category_id: None,
            default_duration_minutes,
        }
    }

    pub fn provider(name: &str, timezone: &str) -> ProviderProfile {
        ProviderProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            timezone: Some(timezone.to_string()),
            rating: 4.5,
            latitude: None,
            longitude: None,
            category_ids: vec![],
            niche_ids: vec![],
            services: vec![],
            is_active: true,
        }
    }

    pub fn offering(provider: &mut ProviderProfile, service: &ServiceTemplate, custom_duration_minutes: Option<i32>) {
        provider.services.push(ProviderService {
            service_id: service.id,
            custom_duration_minutes,
        });
    }

    pub fn weekly_rule(provider_id: Uuid, day_of_week: i16, start: &str, end: &str, interval: i32) -> AvailabilityRule {
        AvailabilityRule {
            id: Uuid::new_v4(),
            provider_id,
            day_of_week: Some(day_of_week),
            specific_date: None,
            start_time: start.to_string(),
            end_time: end.to_string(),
            is_available: true,
            interval_minutes: Some(interval),
        }
    }
}
