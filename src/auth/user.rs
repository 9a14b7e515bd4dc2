use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::AppError;

use super::{Permission, Role};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub secondary_email: Option<String>,
    pub registration_number: String,
    pub photo_profile: String,
    pub created_at: NaiveDateTime,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Sorted by group id, so the first entry is the reported role.
    pub groups: Vec<Role>,
}

#[derive(sqlx::FromRow, Clone, Debug)]
pub struct DbUser {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub secondary_email: Option<String>,
    pub registration_number: String,
    pub photo_profile: String,
    pub created_at: NaiveDateTime,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl DbUser {
    pub fn into_user(self, mut groups: Vec<Role>) -> User {
        groups.sort();
        groups.dedup();

        User {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            secondary_email: self.secondary_email,
            registration_number: self.registration_number,
            photo_profile: self.photo_profile,
            created_at: self.created_at,
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
            groups,
        }
    }
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.groups.first().copied()
    }

    pub fn in_group(&self, role: Role) -> bool {
        self.groups.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.in_group(Role::Admin)
    }

    pub fn permissions(&self) -> HashSet<Permission> {
        self.groups
            .iter()
            .flat_map(|role| role.permissions().iter().copied())
            .collect()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_superuser || self.groups.iter().any(|role| role.has_permission(permission))
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = ?self.role(),
                permission = ?permission,
                "Permission denied"
            );
            Err(AppError::Authorization(
                "No tienes permiso para realizar esta acción.".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(
                email = %self.email,
                role = ?self.role(),
                "Administrator required"
            );
            Err(AppError::Authorization(
                "Solo los administradores pueden realizar esta acción.".to_string(),
            ))
        }
    }
}
