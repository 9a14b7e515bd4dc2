use chrono::NaiveDateTime;
use serde::Serialize;

use crate::auth::Role;

/// Teacher profile joined with the account it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Teacher {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub secondary_email: Option<String>,
    pub photo_profile: Option<String>,
    pub description: Option<String>,
    pub registration_number: String,
    pub registered_at: NaiveDateTime,
    pub role: Role,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbTeacher {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub secondary_email: Option<String>,
    pub photo_profile: Option<String>,
    pub description: Option<String>,
    pub registration_number: String,
    pub registered_at: NaiveDateTime,
    pub group_name: Option<String>,
}

impl From<DbTeacher> for Teacher {
    fn from(teacher: DbTeacher) -> Self {
        Self {
            id: teacher.id,
            user_id: teacher.user_id,
            full_name: teacher.full_name,
            email: teacher.email,
            secondary_email: teacher.secondary_email,
            photo_profile: teacher.photo_profile,
            description: teacher.description,
            registration_number: teacher.registration_number,
            registered_at: teacher.registered_at,
            role: teacher
                .group_name
                .and_then(|name| Role::from_str(&name).ok())
                .unwrap_or(Role::Teacher),
        }
    }
}

/// Public card shown next to a teacher's course list.
#[derive(Debug, Clone, Serialize)]
pub struct TeacherPublic {
    pub full_name: String,
    pub description: Option<String>,
    pub registration_number: String,
    pub photo_profile: Option<String>,
    pub email: String,
}

impl From<Teacher> for TeacherPublic {
    fn from(teacher: Teacher) -> Self {
        Self {
            full_name: teacher.full_name,
            description: teacher.description,
            registration_number: teacher.registration_number,
            photo_profile: teacher.photo_profile,
            email: teacher.email,
        }
    }
}
