/// An opaque secret issued to a tenant, stored only as a SHA-256 hex digest.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: i64,
    pub tenant_id: i64,
    pub plan_id: i64,
    pub hashed_key: String,
    pub is_active: bool,
}
