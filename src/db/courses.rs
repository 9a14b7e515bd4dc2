use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{Course, CourseDetail, DbCourse, MaterialAccess, Price};

use super::{get_area, get_lessons_by_course, get_sections_by_course};

const COURSE_SELECT: &str = "SELECT c.id, c.name, c.description, c.certifiable, c.price_cents,
            c.trial_mode, c.area_id, a.name AS area_name, c.teacher_id,
            u.full_name AS teacher_name, t.registration_number AS teacher_registration_number,
            c.photo, c.created_at
     FROM courses c
     JOIN areas a ON a.id = c.area_id
     LEFT JOIN teachers t ON t.id = c.teacher_id
     LEFT JOIN users u ON u.id = t.user_id";

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub certifiable: bool,
    pub price: Price,
    pub trial_mode: bool,
    pub area_id: i64,
    pub teacher_id: Option<i64>,
    pub photo: Option<String>,
}

/// Field-wise course update. `teacher_id` is only ever set by administrators.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub certifiable: Option<bool>,
    pub price: Option<Price>,
    pub trial_mode: Option<bool>,
    pub area_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub photo: Option<String>,
}

async fn fetch_courses(
    pool: &Pool<Sqlite>,
    filter: &str,
    value: Option<i64>,
) -> Result<Vec<Course>, AppError> {
    let sql = format!("{} {} ORDER BY c.id", COURSE_SELECT, filter);
    let mut query = sqlx::query_as::<_, DbCourse>(&sql);
    if let Some(value) = value {
        query = query.bind(value);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.into_iter().map(Course::from).collect())
}

#[instrument]
pub async fn get_all_courses(pool: &Pool<Sqlite>) -> Result<Vec<Course>, AppError> {
    info!("Getting all courses");
    fetch_courses(pool, "", None).await
}

#[instrument]
pub async fn get_courses_by_area(pool: &Pool<Sqlite>, area_id: i64) -> Result<Vec<Course>, AppError> {
    info!("Getting courses by area");
    fetch_courses(pool, "WHERE c.area_id = ?", Some(area_id)).await
}

#[instrument]
pub async fn get_courses_by_teacher(
    pool: &Pool<Sqlite>,
    teacher_id: i64,
) -> Result<Vec<Course>, AppError> {
    info!("Getting courses by teacher");
    fetch_courses(pool, "WHERE c.teacher_id = ?", Some(teacher_id)).await
}

#[instrument]
pub async fn get_course(pool: &Pool<Sqlite>, id: i64) -> Result<Course, AppError> {
    info!("Fetching course by ID");
    let row = sqlx::query_as::<_, DbCourse>(&format!("{} WHERE c.id = ?", COURSE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Course::from)
        .ok_or_else(|| AppError::NotFound("Curso no existe.".to_string()))
}

#[instrument]
pub async fn get_course_detail(
    pool: &Pool<Sqlite>,
    id: i64,
    access: MaterialAccess,
) -> Result<CourseDetail, AppError> {
    info!("Assembling course detail");
    let course = get_course(pool, id).await?;
    let sections = get_sections_by_course(pool, id).await?;
    let lessons = get_lessons_by_course(pool, id).await?;

    Ok(CourseDetail::assemble(course, sections, lessons, access))
}

async fn ensure_references(
    pool: &Pool<Sqlite>,
    area_id: i64,
    teacher_id: Option<i64>,
) -> Result<(), AppError> {
    match get_area(pool, area_id).await {
        Ok(_) => {}
        Err(AppError::NotFound(_)) => {
            return Err(AppError::Validation(format!(
                "El área {} no existe.",
                area_id
            )));
        }
        Err(err) => return Err(err),
    }

    if let Some(teacher_id) = teacher_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM teachers WHERE id = ?")
            .bind(teacher_id)
            .fetch_optional(pool)
            .await?;
        if exists.is_none() {
            return Err(AppError::Validation(format!(
                "El docente {} no existe.",
                teacher_id
            )));
        }
    }

    Ok(())
}

#[instrument(skip(pool, course), fields(name = %course.name))]
pub async fn create_course(pool: &Pool<Sqlite>, course: &NewCourse) -> Result<Course, AppError> {
    info!("Creating course");
    ensure_references(pool, course.area_id, course.teacher_id).await?;

    let res = sqlx::query(
        "INSERT INTO courses (name, description, certifiable, price_cents, trial_mode,
                              area_id, teacher_id, photo)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(course.name.trim())
    .bind(&course.description)
    .bind(course.certifiable)
    .bind(course.price.cents())
    .bind(course.trial_mode)
    .bind(course.area_id)
    .bind(course.teacher_id)
    .bind(&course.photo)
    .execute(pool)
    .await?;

    get_course(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool, changes))]
pub async fn update_course(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: &CourseChanges,
) -> Result<Course, AppError> {
    info!("Updating course");
    let current = get_course(pool, id).await?;

    let area_id = changes.area_id.unwrap_or(current.area_id);
    let teacher_id = changes.teacher_id.or(current.teacher_id);
    ensure_references(pool, area_id, changes.teacher_id).await?;

    sqlx::query(
        "UPDATE courses
         SET name = ?, description = ?, certifiable = ?, price_cents = ?, trial_mode = ?,
             area_id = ?, teacher_id = ?, photo = ?
         WHERE id = ?",
    )
    .bind(changes.name.as_deref().map(str::trim).unwrap_or(&current.name))
    .bind(changes.description.as_ref().or(current.description.as_ref()))
    .bind(changes.certifiable.unwrap_or(current.certifiable))
    .bind(changes.price.unwrap_or(current.price).cents())
    .bind(changes.trial_mode.unwrap_or(current.trial_mode))
    .bind(area_id)
    .bind(teacher_id)
    .bind(changes.photo.as_ref().or(current.photo.as_ref()))
    .bind(id)
    .execute(pool)
    .await?;

    get_course(pool, id).await
}

#[instrument]
pub async fn delete_course(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting course");
    let res = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound("Curso no existe.".to_string()));
    }

    Ok(())
}
