use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Marketplace actor type, derived from the token's role claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Provider,
    Admin,
}

impl User {
    pub fn user_role(&self) -> UserRole {
        match self.role.as_deref() {
            Some("admin") => UserRole::Admin,
            Some("provider") => UserRole::Provider,
            _ => UserRole::Client,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_role() == UserRole::Admin
    }

    /// True when the caller is `id` itself or an admin.
    pub fn acts_for(&self, id: &str) -> bool {
        self.is_admin() || self.id == id
    }
}
