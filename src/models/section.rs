use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Section {
    pub id: i64,
    pub course_id: i64,
    pub course_name: String,
    pub name: String,
    pub description: Option<String>,
}
