use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::{DbLesson, Lesson};

use super::get_section;

#[derive(Debug, Clone, Default)]
pub struct LessonChanges {
    pub section_id: Option<i64>,
    pub name: Option<String>,
    pub material: Option<String>,
}

#[instrument]
pub async fn get_all_lessons(pool: &Pool<Sqlite>) -> Result<Vec<Lesson>, AppError> {
    info!("Getting all lessons");
    let rows = sqlx::query_as::<_, DbLesson>(
        "SELECT id, section_id, name, material FROM lessons ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Lesson::from).collect())
}

#[instrument]
pub async fn get_lesson(pool: &Pool<Sqlite>, id: i64) -> Result<Lesson, AppError> {
    info!("Fetching lesson by ID");
    let row = sqlx::query_as::<_, DbLesson>(
        "SELECT id, section_id, name, material FROM lessons WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Lesson::from)
        .ok_or_else(|| AppError::NotFound(format!("No existe una lección con id {}.", id)))
}

/// Every lesson of a course across its sections.
#[instrument]
pub async fn get_lessons_by_course(
    pool: &Pool<Sqlite>,
    course_id: i64,
) -> Result<Vec<Lesson>, AppError> {
    info!("Getting lessons by course");
    let rows = sqlx::query_as::<_, DbLesson>(
        "SELECT l.id, l.section_id, l.name, l.material
         FROM lessons l
         JOIN sections s ON s.id = l.section_id
         WHERE s.course_id = ?
         ORDER BY l.id",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Lesson::from).collect())
}

#[instrument(skip(pool, material))]
pub async fn create_lesson(
    pool: &Pool<Sqlite>,
    section_id: i64,
    name: &str,
    material: Option<&str>,
) -> Result<Lesson, AppError> {
    info!("Creating lesson");
    get_section(pool, section_id).await?;

    let res = sqlx::query("INSERT INTO lessons (section_id, name, material) VALUES (?, ?, ?)")
        .bind(section_id)
        .bind(name.trim())
        .bind(material)
        .execute(pool)
        .await?;

    get_lesson(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool, changes))]
pub async fn update_lesson(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: &LessonChanges,
) -> Result<Lesson, AppError> {
    info!("Updating lesson");
    let current = get_lesson(pool, id).await?;

    if let Some(section_id) = changes.section_id {
        get_section(pool, section_id).await?;
    }

    sqlx::query("UPDATE lessons SET section_id = ?, name = ?, material = ? WHERE id = ?")
        .bind(changes.section_id.unwrap_or(current.section_id))
        .bind(changes.name.as_deref().map(str::trim).unwrap_or(&current.name))
        .bind(changes.material.as_ref().or(current.material.as_ref()))
        .bind(id)
        .execute(pool)
        .await?;

    get_lesson(pool, id).await
}

#[instrument]
pub async fn delete_lesson(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting lesson");
    let res = sqlx::query("DELETE FROM lessons WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("No existe una lección con id {}.", id)));
    }

    Ok(())
}
