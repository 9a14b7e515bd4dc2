use anyhow::Error;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Student,
    Teacher,
    Area,
    Course,
    Section,
    Lesson,
    Purchase,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Student,
        Resource::Teacher,
        Resource::Area,
        Resource::Course,
        Resource::Section,
        Resource::Lesson,
        Resource::Purchase,
    ];
}

/// Model-level permission, one of view/add/change/delete per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    View(Resource),
    Add(Resource),
    Change(Resource),
    Delete(Resource),
}

impl Permission {
    fn all_on(resource: Resource) -> [Permission; 4] {
        [
            Permission::View(resource),
            Permission::Add(resource),
            Permission::Change(resource),
            Permission::Delete(resource),
        ]
    }
}

/// A group a user can belong to. Declaration order is precedence order:
/// the first group a user holds is the role reported for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Administrador")]
    Admin,
    #[serde(rename = "Docente")]
    Teacher,
    #[serde(rename = "Alumno")]
    Student,
}

static STUDENT_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::View(Resource::Student));
    permissions.insert(Permission::View(Resource::Course));
    permissions.insert(Permission::View(Resource::Area));

    permissions
});

static TEACHER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(Permission::all_on(Resource::Course));
    permissions.extend(Permission::all_on(Resource::Section));
    permissions.extend(Permission::all_on(Resource::Lesson));
    permissions.insert(Permission::View(Resource::Student));

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    Resource::ALL
        .into_iter()
        .flat_map(Permission::all_on)
        .collect()
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Student => &STUDENT_PERMISSIONS,
            Role::Teacher => &TEACHER_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Name of the backing group row.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Teacher => "Docente",
            Role::Student => "Alumno",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "Administrador" => Ok(Role::Admin),
            "Docente" => Ok(Role::Teacher),
            "Alumno" => Ok(Role::Student),
            _ => Err(Error::msg(format!("Unknown group: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
