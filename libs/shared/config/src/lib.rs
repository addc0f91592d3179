use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub server_port: u16,
    pub default_timezone: String,
    pub default_slot_interval_minutes: i32,
    pub max_daily_minutes: i32,
    pub max_distance_km: f64,
    pub recommendation_limit: usize,
    pub ranking_concurrency: usize,
    pub store_timeout_ms: u64,
    pub store_max_retries: u32,
    pub smart_slots_enabled: bool,
    pub fixture_mode: bool,
    pub fixture_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            server_port: 3000,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            default_slot_interval_minutes: 30,
            max_daily_minutes: 600,
            max_distance_km: 50.0,
            recommendation_limit: 5,
            ranking_concurrency: 8,
            store_timeout_ms: 5000,
            store_max_retries: 2,
            smart_slots_enabled: true,
            fixture_mode: false,
            fixture_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            default_timezone: env::var("DEFAULT_PROVIDER_TIMEZONE")
                .unwrap_or_else(|_| defaults.default_timezone.clone()),
            default_slot_interval_minutes: parse_or(
                "DEFAULT_SLOT_INTERVAL_MINUTES",
                defaults.default_slot_interval_minutes,
            )
            .max(1),
            max_daily_minutes: parse_or("MAX_DAILY_MINUTES", defaults.max_daily_minutes),
            max_distance_km: parse_or("MAX_DISTANCE_KM", defaults.max_distance_km),
            recommendation_limit: parse_or("RECOMMENDATION_LIMIT", defaults.recommendation_limit),
            ranking_concurrency: parse_or("RANKING_CONCURRENCY", defaults.ranking_concurrency).max(1),
            store_timeout_ms: parse_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            store_max_retries: parse_or("STORE_MAX_RETRIES", defaults.store_max_retries),
            smart_slots_enabled: parse_or("SMART_SLOTS_ENABLED", defaults.smart_slots_enabled),
            fixture_mode: parse_or("FIXTURE_MODE", defaults.fixture_mode),
            fixture_path: env::var("FIXTURE_PATH").ok(),
        };

        if !config.is_configured() && !config.fixture_mode {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scheduling_rules() {
        let config = AppConfig::default();
        assert_eq!(config.default_timezone, "America/Sao_Paulo");
        assert_eq!(config.default_slot_interval_minutes, 30);
        assert_eq!(config.max_daily_minutes, 600);
        assert_eq!(config.recommendation_limit, 5);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        std::env::set_var("SLOTWISE_TEST_PARSE_GARBAGE", "not-a-number");
        assert_eq!(parse_or("SLOTWISE_TEST_PARSE_GARBAGE", 42u32), 42);
        std::env::set_var("SLOTWISE_TEST_PARSE_GARBAGE", " 7 ");
        assert_eq!(parse_or("SLOTWISE_TEST_PARSE_GARBAGE", 42u32), 7);
    }
}
