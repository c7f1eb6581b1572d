/// An optional sub-identity within a tenant with its own plan, asserted via
/// the `X-Client-ID` header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Client {
    pub id: i64,
    pub tenant_id: i64,
    pub plan_id: i64,
    pub client_id: String,
}
