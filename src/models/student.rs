use chrono::NaiveDateTime;
use serde::Serialize;

use crate::auth::{Role, User};

/// A user as shown by the student endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub secondary_email: Option<String>,
    pub photo_profile: String,
    pub registration_number: String,
    pub created_at: NaiveDateTime,
    pub role: Role,
}

impl From<User> for Student {
    fn from(user: User) -> Self {
        let role = user.role().unwrap_or(Role::Student);

        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            secondary_email: user.secondary_email,
            photo_profile: user.photo_profile,
            registration_number: user.registration_number,
            created_at: user.created_at,
            role,
        }
    }
}

/// Compact account view used by the `/users` endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub secondary_email: Option<String>,
    pub registration_number: String,
    pub photo_profile: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub role: Option<Role>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        let role = user.role();

        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            secondary_email: user.secondary_email,
            registration_number: user.registration_number,
            photo_profile: user.photo_profile,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            role,
        }
    }
}
