/// A per-tenant registration binding a slug to an upstream base URL.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Api {
    pub id: i64,
    pub tenant_id: i64,
    pub slug: String,
    pub upstream_base_url: String,
    pub is_active: bool,
}
