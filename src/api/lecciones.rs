use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Resource, User};
use crate::db::{
    create_lesson, delete_lesson, get_all_lessons, get_course, get_lesson, get_section,
    update_lesson, LessonChanges,
};
use crate::error::AppError;
use crate::models::{Lesson, Section};
use crate::validation::{ApiError, JsonValidateExt};

use super::{missing_fields_error, present, reject_blank, require_course_owner};

const CANNOT_CREATE: &str = "No puedes crear lecciones en cursos que no te pertenecen.";
const CANNOT_EDIT: &str = "No puedes editar lecciones de cursos que no te pertenecen.";
const CANNOT_DELETE: &str = "No puedes eliminar lecciones de cursos que no te pertenecen.";

#[derive(Debug, Deserialize, Validate, Default)]
pub struct LessonInput {
    #[serde(alias = "section")]
    pub section_id: Option<i64>,
    #[validate(length(min = 1, max = 150, message = "El nombre debe tener entre 1 y 150 caracteres."))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "El enlace del material es demasiado largo."))]
    pub material: Option<String>,
}

impl LessonInput {
    fn missing_for_create(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.section_id.is_none() {
            missing.push("section_id");
        }
        if present(&self.name).is_none() {
            missing.push("name");
        }
        missing
    }
}

impl From<LessonInput> for LessonChanges {
    fn from(input: LessonInput) -> Self {
        LessonChanges {
            section_id: input.section_id,
            name: input.name,
            material: input.material,
        }
    }
}

/// Section named in a request body; unknown ids are a bad request.
async fn referenced_section(db: &Pool<Sqlite>, section_id: i64) -> Result<Section, AppError> {
    match get_section(db, section_id).await {
        Err(AppError::NotFound(_)) => Err(AppError::Validation(format!(
            "Sección {} no existe",
            section_id
        ))),
        other => other,
    }
}

async fn require_section_owner(
    db: &Pool<Sqlite>,
    user: &User,
    section: &Section,
    denied: &str,
) -> Result<(), AppError> {
    let course = get_course(db, section.course_id).await?;
    require_course_owner(db, user, &course, denied).await
}

#[get("/lecciones")]
pub async fn list_lessons(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    user.require_permission(Permission::View(Resource::Lesson))?;

    Ok(Json(get_all_lessons(db).await?))
}

#[get("/lecciones/<id>")]
pub async fn get_lesson_by_id(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Lesson>, ApiError> {
    user.require_permission(Permission::View(Resource::Lesson))?;

    Ok(Json(get_lesson(db, id).await?))
}

#[post("/lecciones", data = "<input>")]
pub async fn create_lesson_route(
    input: Json<LessonInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Lesson>>, ApiError> {
    user.require_permission(Permission::Add(Resource::Lesson))?;
    let input = input.validate_custom()?;

    let missing = input.missing_for_create();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    let section = referenced_section(db, input.section_id.unwrap_or_default()).await?;
    require_section_owner(db, &user, &section, CANNOT_CREATE).await?;

    let lesson = create_lesson(
        db,
        section.id,
        present(&input.name).unwrap_or_default(),
        present(&input.material),
    )
    .await?;
    tracing::info!(email = %user.email, lesson_id = lesson.id, "Lesson created");

    Ok(Custom(Status::Created, Json(lesson)))
}

async fn apply_lesson_update(
    id: i64,
    input: LessonInput,
    user: &User,
    db: &Pool<Sqlite>,
    require_all: bool,
) -> Result<Json<Lesson>, ApiError> {
    user.require_permission(Permission::Change(Resource::Lesson))?;

    reject_blank(&[("name", &input.name)])?;
    if require_all {
        let missing = input.missing_for_create();
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }
    }

    let lesson = get_lesson(db, id).await?;
    let section = get_section(db, lesson.section_id).await?;
    require_section_owner(db, user, &section, CANNOT_EDIT).await?;

    if let Some(section_id) = input.section_id.filter(|&s| s != lesson.section_id) {
        let target = referenced_section(db, section_id).await?;
        require_section_owner(db, user, &target, CANNOT_EDIT).await?;
    }

    Ok(Json(update_lesson(db, id, &LessonChanges::from(input)).await?))
}

#[put("/lecciones/<id>", data = "<input>")]
pub async fn replace_lesson(
    id: i64,
    input: Json<LessonInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Lesson>, ApiError> {
    let input = input.validate_custom()?;
    apply_lesson_update(id, input, &user, db, true).await
}

#[patch("/lecciones/<id>", data = "<input>")]
pub async fn patch_lesson(
    id: i64,
    input: Json<LessonInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Lesson>, ApiError> {
    let input = input.validate_custom()?;
    apply_lesson_update(id, input, &user, db, false).await
}

#[delete("/lecciones/<id>")]
pub async fn delete_lesson_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_permission(Permission::Delete(Resource::Lesson))?;

    let lesson = get_lesson(db, id).await?;
    let section = get_section(db, lesson.section_id).await?;
    require_section_owner(db, &user, &section, CANNOT_DELETE).await?;

    delete_lesson(db, id).await?;

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_lessons,
        get_lesson_by_id,
        create_lesson_route,
        replace_lesson,
        patch_lesson,
        delete_lesson_route
    ]
}
