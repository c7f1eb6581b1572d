/// A registered customer namespace. The first path segment of the gateway URL.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Tenant {
    pub id: i64,
    pub slug: String,
    pub is_active: bool,
}
