use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::User;
use crate::db::{
    delete_teacher, get_all_teachers, get_teacher_by_registration_number, update_teacher,
    TeacherChanges,
};
use crate::error::AppError;
use crate::models::Teacher;
use crate::validation::{ApiError, JsonValidateExt};

use super::alumnos::{ProfileUpdated, PROFILE_UPDATED};
use super::{require_teacher, RegistrationNumber};

/// Only the profile's own fields are editable; account data stays put.
#[derive(Debug, Deserialize, Validate, Default)]
pub struct TeacherUpdate {
    #[validate(length(max = 2000, message = "La descripción es demasiado larga."))]
    pub description: Option<String>,
    pub photo_profile: Option<String>,
}

impl From<TeacherUpdate> for TeacherChanges {
    fn from(update: TeacherUpdate) -> Self {
        TeacherChanges {
            description: update.description,
            photo_profile: update.photo_profile,
        }
    }
}

/// Teachers are only ever created through `/auth/create-docente`.
#[post("/docentes")]
pub async fn create_teacher_forbidden() -> Result<Status, ApiError> {
    tracing::warn!("Teacher creation attempted outside of auth endpoint");
    Err(AppError::Authorization(
        "El registro de docentes solo puede hacerse desde /auth/create-docente.".to_string(),
    )
    .into())
}

#[get("/docentes/mi_perfil")]
pub async fn my_profile(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Teacher>, ApiError> {
    Ok(Json(require_teacher(db, &user).await?))
}

async fn update_own_profile(
    user: User,
    update: TeacherUpdate,
    db: &Pool<Sqlite>,
) -> Result<Json<ProfileUpdated<Teacher>>, ApiError> {
    let teacher = require_teacher(db, &user).await?;
    let updated = update_teacher(db, teacher.id, &TeacherChanges::from(update)).await?;

    Ok(Json(ProfileUpdated {
        message: PROFILE_UPDATED.to_string(),
        data: updated,
    }))
}

#[put("/docentes/actualizar_mi_perfil", data = "<update>")]
pub async fn replace_my_profile(
    update: Json<TeacherUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ProfileUpdated<Teacher>>, ApiError> {
    let update = update.validate_custom()?;
    update_own_profile(user, update, db).await
}

#[patch("/docentes/actualizar_mi_perfil", data = "<update>")]
pub async fn patch_my_profile(
    update: Json<TeacherUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ProfileUpdated<Teacher>>, ApiError> {
    let update = update.validate_custom()?;
    update_own_profile(user, update, db).await
}

#[get("/docentes")]
pub async fn list_teachers(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Teacher>>, ApiError> {
    user.require_admin()?;

    Ok(Json(get_all_teachers(db).await?))
}

#[get("/docentes/<registration_number>")]
pub async fn get_teacher(
    registration_number: RegistrationNumber,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Teacher>, ApiError> {
    user.require_admin()?;

    Ok(Json(
        get_teacher_by_registration_number(db, &registration_number.0).await?,
    ))
}

async fn update_by_registration_number(
    registration_number: &str,
    update: TeacherUpdate,
    db: &Pool<Sqlite>,
) -> Result<Json<Teacher>, ApiError> {
    let teacher = get_teacher_by_registration_number(db, registration_number).await?;

    Ok(Json(
        update_teacher(db, teacher.id, &TeacherChanges::from(update)).await?,
    ))
}

#[put("/docentes/<registration_number>", data = "<update>")]
pub async fn replace_teacher(
    registration_number: RegistrationNumber,
    update: Json<TeacherUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Teacher>, ApiError> {
    user.require_admin()?;
    let update = update.validate_custom()?;

    update_by_registration_number(&registration_number.0, update, db).await
}

#[patch("/docentes/<registration_number>", data = "<update>")]
pub async fn patch_teacher(
    registration_number: RegistrationNumber,
    update: Json<TeacherUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Teacher>, ApiError> {
    user.require_admin()?;
    let update = update.validate_custom()?;

    update_by_registration_number(&registration_number.0, update, db).await
}

#[delete("/docentes/<registration_number>")]
pub async fn remove_teacher(
    registration_number: RegistrationNumber,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_admin()?;

    let teacher = get_teacher_by_registration_number(db, &registration_number.0).await?;
    delete_teacher(db, teacher.id).await?;
    tracing::info!(deleted_by = %user.email, email = %teacher.email, "Teacher and account deleted");

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        create_teacher_forbidden,
        my_profile,
        replace_my_profile,
        patch_my_profile,
        list_teachers,
        get_teacher,
        replace_teacher,
        patch_teacher,
        remove_teacher
    ]
}
