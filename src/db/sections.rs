use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::Section;

use super::get_course;

const SECTION_SELECT: &str = "SELECT s.id, s.course_id, c.name AS course_name, s.name, s.description
     FROM sections s
     JOIN courses c ON c.id = s.course_id";

#[derive(Debug, Clone, Default)]
pub struct SectionChanges {
    pub course_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[instrument]
pub async fn get_all_sections(pool: &Pool<Sqlite>) -> Result<Vec<Section>, AppError> {
    info!("Getting all sections");
    let sections = sqlx::query_as::<_, Section>(&format!("{} ORDER BY s.id", SECTION_SELECT))
        .fetch_all(pool)
        .await?;

    Ok(sections)
}

#[instrument]
pub async fn get_section(pool: &Pool<Sqlite>, id: i64) -> Result<Section, AppError> {
    info!("Fetching section by ID");
    sqlx::query_as::<_, Section>(&format!("{} WHERE s.id = ?", SECTION_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No existe una sección con id {}.", id)))
}

/// Sections of a course, first section first.
#[instrument]
pub async fn get_sections_by_course(
    pool: &Pool<Sqlite>,
    course_id: i64,
) -> Result<Vec<Section>, AppError> {
    info!("Getting sections by course");
    let sections = sqlx::query_as::<_, Section>(&format!(
        "{} WHERE s.course_id = ? ORDER BY s.id",
        SECTION_SELECT
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await?;

    Ok(sections)
}

#[instrument(skip(pool, description))]
pub async fn create_section(
    pool: &Pool<Sqlite>,
    course_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<Section, AppError> {
    info!("Creating section");
    get_course(pool, course_id).await?;

    let res = sqlx::query("INSERT INTO sections (course_id, name, description) VALUES (?, ?, ?)")
        .bind(course_id)
        .bind(name.trim())
        .bind(description)
        .execute(pool)
        .await?;

    get_section(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool, changes))]
pub async fn update_section(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: &SectionChanges,
) -> Result<Section, AppError> {
    info!("Updating section");
    let current = get_section(pool, id).await?;

    if let Some(course_id) = changes.course_id {
        get_course(pool, course_id).await?;
    }

    sqlx::query("UPDATE sections SET course_id = ?, name = ?, description = ? WHERE id = ?")
        .bind(changes.course_id.unwrap_or(current.course_id))
        .bind(changes.name.as_deref().map(str::trim).unwrap_or(&current.name))
        .bind(changes.description.as_ref().or(current.description.as_ref()))
        .bind(id)
        .execute(pool)
        .await?;

    get_section(pool, id).await
}

#[instrument]
pub async fn delete_section(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting section");
    let res = sqlx::query("DELETE FROM sections WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("No existe una sección con id {}.", id)));
    }

    Ok(())
}
