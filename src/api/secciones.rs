use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Resource, User};
use crate::db::{
    create_section, delete_section, get_all_sections, get_course, get_section,
    get_sections_by_course, update_section, SectionChanges,
};
use crate::models::Section;
use crate::validation::{ApiError, JsonValidateExt};

use super::{
    missing_fields_error, present, referenced_course, reject_blank, require_course_owner,
};

const CANNOT_CREATE: &str = "No puedes crear secciones en cursos que no te pertenecen.";
const CANNOT_EDIT: &str = "No puedes editar secciones de cursos que no te pertenecen.";
const CANNOT_DELETE: &str = "No puedes eliminar secciones de cursos que no te pertenecen.";

#[derive(Debug, Deserialize, Validate, Default)]
pub struct SectionInput {
    #[serde(alias = "course")]
    pub course_id: Option<i64>,
    #[validate(length(min = 1, max = 150, message = "El nombre debe tener entre 1 y 150 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SectionInput {
    fn missing_for_create(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.course_id.is_none() {
            missing.push("course_id");
        }
        if present(&self.name).is_none() {
            missing.push("name");
        }
        missing
    }
}

impl From<SectionInput> for SectionChanges {
    fn from(input: SectionInput) -> Self {
        SectionChanges {
            course_id: input.course_id,
            name: input.name,
            description: input.description,
        }
    }
}

#[get("/secciones")]
pub async fn list_sections(
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Section>>, ApiError> {
    Ok(Json(get_all_sections(db).await?))
}

#[get("/secciones/<id>")]
pub async fn get_section_by_id(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Section>, ApiError> {
    Ok(Json(get_section(db, id).await?))
}

#[get("/secciones/por_curso/<course_id>")]
pub async fn sections_by_course(
    course_id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Section>>, ApiError> {
    get_course(db, course_id).await?;

    Ok(Json(get_sections_by_course(db, course_id).await?))
}

#[post("/secciones", data = "<input>")]
pub async fn create_section_route(
    input: Json<SectionInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Section>>, ApiError> {
    user.require_permission(Permission::Add(Resource::Section))?;
    let input = input.validate_custom()?;

    let missing = input.missing_for_create();
    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    let course = referenced_course(db, input.course_id.unwrap_or_default()).await?;
    require_course_owner(db, &user, &course, CANNOT_CREATE).await?;

    let section = create_section(
        db,
        course.id,
        present(&input.name).unwrap_or_default(),
        input.description.as_deref(),
    )
    .await?;

    Ok(Custom(Status::Created, Json(section)))
}

async fn apply_section_update(
    id: i64,
    input: SectionInput,
    user: &User,
    db: &Pool<Sqlite>,
    require_all: bool,
) -> Result<Json<Section>, ApiError> {
    user.require_permission(Permission::Change(Resource::Section))?;

    reject_blank(&[("name", &input.name)])?;
    if require_all {
        let missing = input.missing_for_create();
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }
    }

    let section = get_section(db, id).await?;
    let current_course = get_course(db, section.course_id).await?;
    require_course_owner(db, user, &current_course, CANNOT_EDIT).await?;

    // moving a section needs ownership of the destination too
    if let Some(course_id) = input.course_id.filter(|&c| c != section.course_id) {
        let target = referenced_course(db, course_id).await?;
        require_course_owner(db, user, &target, CANNOT_EDIT).await?;
    }

    Ok(Json(update_section(db, id, &SectionChanges::from(input)).await?))
}

#[put("/secciones/<id>", data = "<input>")]
pub async fn replace_section(
    id: i64,
    input: Json<SectionInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Section>, ApiError> {
    let input = input.validate_custom()?;
    apply_section_update(id, input, &user, db, true).await
}

#[patch("/secciones/<id>", data = "<input>")]
pub async fn patch_section(
    id: i64,
    input: Json<SectionInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Section>, ApiError> {
    let input = input.validate_custom()?;
    apply_section_update(id, input, &user, db, false).await
}

#[delete("/secciones/<id>")]
pub async fn delete_section_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_permission(Permission::Delete(Resource::Section))?;

    let section = get_section(db, id).await?;
    let course = get_course(db, section.course_id).await?;
    require_course_owner(db, &user, &course, CANNOT_DELETE).await?;

    delete_section(db, id).await?;

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_sections,
        get_section_by_id,
        sections_by_course,
        create_section_route,
        replace_section,
        patch_section,
        delete_section_route
    ]
}
