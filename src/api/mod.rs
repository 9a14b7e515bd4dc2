use std::collections::HashMap;

use rocket::http::Status;
use rocket::request::FromParam;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Request, Route};
use sqlx::{Pool, Sqlite};

use crate::auth::User;
use crate::db::{find_teacher_by_user, get_course};
use crate::error::AppError;
use crate::models::{Course, Teacher};
use crate::validation::{ApiError, ToValidationResponse, ValidationResponse};

pub mod alumnos;
pub mod areas;
pub mod auth;
pub mod compras;
pub mod cursos;
pub mod docentes;
pub mod lecciones;
pub mod secciones;
pub mod users;

pub const NOT_A_TEACHER: &str = "El usuario autenticado no es un docente.";

/// Path segment holding a registration number; only digits match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationNumber(pub String);

impl<'a> FromParam<'a> for RegistrationNumber {
    type Error = &'a str;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        if !param.is_empty() && param.chars().all(|c| c.is_ascii_digit()) {
            Ok(RegistrationNumber(param.to_string()))
        } else {
            Err(param)
        }
    }
}

/// The caller's teacher profile, or 403 when the account has none.
pub async fn require_teacher(db: &Pool<Sqlite>, user: &User) -> Result<Teacher, AppError> {
    find_teacher_by_user(db, user.id).await?.ok_or_else(|| {
        tracing::warn!(email = %user.email, "Caller has no teacher profile");
        AppError::Authorization(NOT_A_TEACHER.to_string())
    })
}

/// Administrators pass; anyone else must be the course's teacher.
pub async fn require_course_owner(
    db: &Pool<Sqlite>,
    user: &User,
    course: &Course,
    denied: &str,
) -> Result<(), AppError> {
    if user.is_admin() {
        return Ok(());
    }

    let teacher = require_teacher(db, user).await?;
    if course.teacher_id == Some(teacher.id) {
        Ok(())
    } else {
        tracing::warn!(
            email = %user.email,
            course_id = course.id,
            "Ownership check failed"
        );
        Err(AppError::Authorization(denied.to_string()))
    }
}

/// Loads a course named in a request body; an unknown id is a bad request
/// rather than a missing resource.
pub async fn referenced_course(db: &Pool<Sqlite>, course_id: i64) -> Result<Course, AppError> {
    match get_course(db, course_id).await {
        Err(AppError::NotFound(_)) => Err(AppError::Validation(format!(
            "Curso {} no existe",
            course_id
        ))),
        other => other,
    }
}

/// Trims an optional text field, treating blank input as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub const BLANK: &str = "Este campo no puede estar en blanco.";

/// 400 for text fields that were sent but hold only whitespace.
pub fn reject_blank(fields: &[(&str, &Option<String>)]) -> Result<(), ApiError> {
    let errors: HashMap<String, Vec<String>> = fields
        .iter()
        .filter(|(_, value)| value.is_some() && present(value).is_none())
        .map(|(field, _)| (field.to_string(), vec![BLANK.to_string()]))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Custom(Status::BadRequest, Json(ValidationResponse::new(errors))))
    }
}

/// 400 naming every required field absent from a full update.
pub fn missing_fields_error(fields: &[&str]) -> ApiError {
    let errors = fields
        .iter()
        .map(|field| (field.to_string(), vec![REQUIRED.to_string()]))
        .collect();

    Custom(Status::BadRequest, Json(ValidationResponse::new(errors)))
}

pub const REQUIRED: &str = "Este campo es requerido.";

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> ApiError {
    Status::BadRequest.to_validation_response()
}

#[catch(404)]
pub fn not_found(_req: &Request) -> ApiError {
    Status::NotFound.to_validation_response()
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> ApiError {
    Status::UnprocessableEntity.to_validation_response()
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> ApiError {
    Status::InternalServerError.to_validation_response()
}

pub fn routes() -> Vec<Route> {
    let mut all = routes![health];
    all.extend(auth::routes());
    all.extend(users::routes());
    all.extend(alumnos::routes());
    all.extend(docentes::routes());
    all.extend(areas::routes());
    all.extend(cursos::routes());
    all.extend(secciones::routes());
    all.extend(lecciones::routes());
    all.extend(compras::routes());
    all
}
