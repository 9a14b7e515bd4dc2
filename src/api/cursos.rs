use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::Validate;

use crate::auth::{Permission, Resource, User};
use crate::db::{
    create_course, delete_course, find_teacher_by_user, get_all_courses, get_course,
    get_course_detail, get_courses_by_area, get_courses_by_teacher,
    get_teacher_by_registration_number, update_course, CourseChanges, NewCourse,
};
use crate::error::AppError;
use crate::models::{Course, CourseDetail, MaterialAccess, Price, PriceInput, TeacherPublic};
use crate::validation::{ApiError, JsonValidateExt};

use super::{
    missing_fields_error, present, reject_blank, require_course_owner, require_teacher,
    RegistrationNumber, NOT_A_TEACHER,
};

const CANNOT_EDIT: &str = "No puedes editar cursos de otros docentes.";
const CANNOT_DELETE: &str = "No puedes eliminar cursos de otros docentes.";
const CANNOT_ACCESS: &str = "No puedes acceder a cursos de otros docentes.";

#[derive(Debug, Deserialize, Validate, Default)]
pub struct CourseInput {
    #[validate(length(min = 1, max = 150, message = "El nombre debe tener entre 1 y 150 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub certifiable: Option<bool>,
    pub price: Option<PriceInput>,
    pub trial_mode: Option<bool>,
    #[serde(alias = "area")]
    pub area_id: Option<i64>,
    /// Honoured for administrators only; teachers always own what they create.
    #[serde(alias = "teacher")]
    pub teacher_id: Option<i64>,
    pub photo: Option<String>,
}

impl CourseInput {
    fn price(&mut self) -> Result<Option<Price>, AppError> {
        self.price.take().map(Price::try_from).transpose()
    }

    fn into_changes(mut self, is_admin: bool) -> Result<CourseChanges, AppError> {
        let price = self.price()?;

        Ok(CourseChanges {
            name: self.name,
            description: self.description,
            certifiable: self.certifiable,
            price,
            trial_mode: self.trial_mode,
            area_id: self.area_id,
            teacher_id: if is_admin { self.teacher_id } else { None },
            photo: self.photo,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TeacherCourses {
    pub teacher: TeacherPublic,
    pub courses: Vec<Course>,
}

#[get("/cursos")]
pub async fn list_courses(db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(get_all_courses(db).await?))
}

/// Public detail; only the first section shows its lesson materials.
#[get("/cursos/<id>/detalle", rank = 2)]
pub async fn course_detail(
    id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<CourseDetail>, ApiError> {
    Ok(Json(get_course_detail(db, id, MaterialAccess::Preview).await?))
}

#[get("/cursos/por_area/<area_id>", rank = 1)]
pub async fn courses_by_area(
    area_id: i64,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(get_courses_by_area(db, area_id).await?))
}

#[get("/cursos/docente/<registration_number>", rank = 1)]
pub async fn courses_by_teacher(
    registration_number: RegistrationNumber,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<TeacherCourses>, ApiError> {
    let teacher = get_teacher_by_registration_number(db, &registration_number.0).await?;
    let courses = get_courses_by_teacher(db, teacher.id).await?;

    Ok(Json(TeacherCourses {
        teacher: TeacherPublic::from(teacher),
        courses,
    }))
}

#[get("/cursos/mis_cursos")]
pub async fn my_courses(user: User, db: &State<Pool<Sqlite>>) -> Result<Json<Vec<Course>>, ApiError> {
    let teacher = require_teacher(db, &user).await?;

    Ok(Json(get_courses_by_teacher(db, teacher.id).await?))
}

#[get("/cursos/<id>/detalle_docente", rank = 2)]
pub async fn course_detail_for_teacher(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = get_course(db, id).await?;

    if !user.is_admin() {
        let teacher = require_teacher(db, &user).await?;
        if course.teacher_id != Some(teacher.id) {
            return Err(AppError::Authorization(CANNOT_ACCESS.to_string()).into());
        }
    }

    Ok(Json(get_course_detail(db, id, MaterialAccess::Full).await?))
}

#[get("/cursos/<id>")]
pub async fn get_course_by_id(
    id: i64,
    _user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(get_course(db, id).await?))
}

#[post("/cursos", data = "<input>")]
pub async fn create_course_route(
    input: Json<CourseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<Course>>, ApiError> {
    user.require_permission(Permission::Add(Resource::Course))?;
    let mut input = input.validate_custom()?;

    let mut missing = Vec::new();
    if present(&input.name).is_none() {
        missing.push("name");
    }
    if input.area_id.is_none() {
        missing.push("area_id");
    }

    let profile = find_teacher_by_user(db, user.id).await?;
    let teacher_id = match (user.is_admin(), input.teacher_id, profile) {
        (true, Some(teacher_id), _) => Some(teacher_id),
        (_, _, Some(teacher)) => Some(teacher.id),
        (true, None, None) => {
            missing.push("teacher_id");
            None
        }
        (false, _, None) => {
            tracing::warn!(email = %user.email, "Course creation by a non-teacher");
            return Err(AppError::Authorization(NOT_A_TEACHER.to_string()).into());
        }
    };

    if !missing.is_empty() {
        return Err(missing_fields_error(&missing));
    }

    let new_course = NewCourse {
        name: input.name.clone().unwrap_or_default(),
        description: input.description.clone(),
        certifiable: input.certifiable.unwrap_or(false),
        price: input.price()?.unwrap_or_default(),
        trial_mode: input.trial_mode.unwrap_or(true),
        area_id: input.area_id.unwrap_or_default(),
        teacher_id,
        photo: input.photo.clone(),
    };

    let course = create_course(db, &new_course).await?;
    tracing::info!(email = %user.email, course_id = course.id, "Course created");

    Ok(Custom(Status::Created, Json(course)))
}

async fn apply_course_update(
    id: i64,
    input: CourseInput,
    user: &User,
    db: &Pool<Sqlite>,
    require_all: bool,
) -> Result<Json<Course>, ApiError> {
    user.require_permission(Permission::Change(Resource::Course))?;

    let course = get_course(db, id).await?;
    require_course_owner(db, user, &course, CANNOT_EDIT).await?;

    reject_blank(&[("name", &input.name)])?;
    if require_all {
        let mut missing = Vec::new();
        if present(&input.name).is_none() {
            missing.push("name");
        }
        if input.area_id.is_none() {
            missing.push("area_id");
        }
        if !missing.is_empty() {
            return Err(missing_fields_error(&missing));
        }
    }

    let changes = input.into_changes(user.is_admin())?;

    Ok(Json(update_course(db, id, &changes).await?))
}

#[put("/cursos/<id>", data = "<input>")]
pub async fn replace_course(
    id: i64,
    input: Json<CourseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Course>, ApiError> {
    let input = input.validate_custom()?;
    apply_course_update(id, input, &user, db, true).await
}

#[patch("/cursos/<id>", data = "<input>")]
pub async fn patch_course(
    id: i64,
    input: Json<CourseInput>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Json<Course>, ApiError> {
    let input = input.validate_custom()?;
    apply_course_update(id, input, &user, db, false).await
}

#[delete("/cursos/<id>")]
pub async fn delete_course_route(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Status, ApiError> {
    user.require_permission(Permission::Delete(Resource::Course))?;

    let course = get_course(db, id).await?;
    require_course_owner(db, &user, &course, CANNOT_DELETE).await?;

    delete_course(db, id).await?;
    tracing::info!(email = %user.email, course_id = id, "Course deleted");

    Ok(Status::NoContent)
}

pub fn routes() -> Vec<Route> {
    routes![
        list_courses,
        course_detail,
        courses_by_area,
        courses_by_teacher,
        my_courses,
        course_detail_for_teacher,
        get_course_by_id,
        create_course_route,
        replace_course,
        patch_course,
        delete_course_route
    ]
}
