/// A request-rate quota set: per-minute, and an optional per-month cap.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Plan {
    pub id: i64,
    pub requests_per_minute: i64,
    pub requests_per_month: Option<i64>,
    pub is_active: bool,
}
