use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo: Option<String>,
}
