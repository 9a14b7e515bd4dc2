use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Role, User};
use crate::db::{
    create_user, delete_user, email_taken, get_user_by_registration_number, get_users_in_group,
    update_user, UserChanges, EMAIL_TAKEN,
};
use crate::error::AppError;
use crate::models::Student;
use crate::validation::{ApiError, JsonValidateExt};

use super::auth::SignUpRequest;
use super::{missing_fields_error, present, reject_blank, RegistrationNumber};

pub const PROFILE_UPDATED: &str = "Perfil actualizado correctamente";

#[derive(Debug, Deserialize, Validate, Default)]
pub struct StudentUpdate {
    #[validate(length(min = 1, max = 150, message = "El nombre no puede estar vacío."))]
    pub full_name: Option<String>,
    #[validate(email(message = "Introduzca una dirección de correo electrónico válida."))]
    pub email: Option<String>,
    #[validate(email(message = "Introduzca una dirección de correo electrónico válida."))]
    pub secondary_email: Option<String>,
    #[validate(length(min = 1, message = "La contraseña no puede estar vacía."))]
    pub password: Option<String>,
    pub photo_profile: Option<String>,
}

impl StudentUpdate {
    fn missing_for_replace(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("secondary_email", &self.secondary_email),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

impl From<StudentUpdate> for UserChanges {
    fn from(update: StudentUpdate) -> Self {
        UserChanges {
            full_name: update.full_name,
            email: update.email,
            secondary_email: update.secondary_email,
            password: update.password,
            photo_profile: update.photo_profile,
            is_active: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileUpdated<T> {
    pub message: String,
    pub data: T,
}

#[post("/alumnos", data = "<request>")]
pub async fn create_student(
    request: Json<SignUpRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Student>>, ApiError> {
    let request = request.into_inner();

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }
    request.check_emails()?;
    if email_taken(db, request.email.as_deref().unwrap_or_default()).await? {
        return Err(AppError::Validation(EMAIL_TAKEN.to_string()).into());
    }

    let user = create_user(db, &request.into_new_user(false), Role::Student).await?;

    Ok(Custom(Status::Created, Json(Student::from(user))))
}

#[get("/alumnos/mi_perfil")]
pub async fn my_profile(user: User) -> Json<Student> {
    Json(Student::from(user))
}

async fn update_own_profile(
    user: User,
    update: StudentUpdate,
    db: &Pool<Sqlite>,
) -> Result<Json<ProfileUpdated<Student>>, ApiError> {
    reject_blank(&[("full_name", &update.full_name)])?;
    let updated = update_user(db, user.id, &UserChanges::from(update)).await?;
    tracing::info!(email = %updated.email, "Student updated own profile");

    Ok(Json(ProfileUpdated {
        message: PROFILE_UPDATED.to_string(),
        data: Student::from(updated),
    }))
}

#[put("/alumnos/actualizar_mi_perfil", data = "<update>")]
pub async fn replace_my_profile(
    update: Json<StudentUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ProfileUpdated<Student>>, ApiError> {
    let update = update.validate_custom()?;
    update_own_profile(user, update, db).await
}

#[patch("/alumnos/actualizar_mi_perfil", data = "<update>")]
pub async fn patch_my_profile(
    update: Json<StudentUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<ProfileUpdated<Student>>, ApiError> {
    let update = update.validate_custom()?;
    update_own_profile(user, update, db).await
}

#[get("/alumnos")]
pub async fn list_students(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Student>>, ApiError> {
    user.require_admin()?;

    let students = get_users_in_group(db, Role::Student).await?;

    Ok(Json(students.into_iter().map(Student::from).collect()))
}

#[get("/alumnos/<registration_number>")]
pub async fn get_student(
    registration_number: RegistrationNumber,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Student>, ApiError> {
    user.require_admin()?;

    let student = get_user_by_registration_number(db, &registration_number.0).await?;

    Ok(Json(Student::from(student)))
}

async fn update_student(
    registration_number: &str,
    update: StudentUpdate,
    db: &Pool<Sqlite>,
) -> Result<Json<Student>, ApiError> {
    reject_blank(&[("full_name", &update.full_name)])?;
    let student = get_user_by_registration_number(db, registration_number).await?;
    let updated = update_user(db, student.id, &UserChanges::from(update)).await?;

    Ok(Json(Student::from(updated)))
}

#[put("/alumnos/<registration_number>", data = "<update>")]
pub async fn replace_student(
    registration_number: RegistrationNumber,
    update: Json<StudentUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Student>, ApiError> {
    user.require_admin()?;
    let update = update.validate_custom()?;

    let missing = update.missing_for_replace();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    update_student(&registration_number.0, update, db).await
}

#[patch("/alumnos/<registration_number>", data = "<update>")]
pub async fn patch_student(
    registration_number: RegistrationNumber,
    update: Json<StudentUpdate>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Student>, ApiError> {
    user.require_admin()?;
    let update = update.validate_custom()?;

    update_student(&registration_number.0, update, db).await
}

#[delete("/alumnos/<registration_number>")]
pub async fn delete_student(
    registration_number: RegistrationNumber,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_admin()?;

    let student = get_user_by_registration_number(db, &registration_number.0).await?;
    delete_user(db, student.id).await?;
    tracing::info!(deleted_by = %user.email, registration_number = %registration_number.0, "Student deleted");

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        create_student,
        my_profile,
        replace_my_profile,
        patch_my_profile,
        list_students,
        get_student,
        replace_student,
        patch_student,
        delete_student
    ]
}
