use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::models::Area;

const AREA_NAME_TAKEN: &str = "Ya existe un área con ese nombre.";

#[derive(Debug, Clone, Default)]
pub struct AreaChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
}

#[instrument]
pub async fn get_all_areas(pool: &Pool<Sqlite>) -> Result<Vec<Area>, AppError> {
    info!("Getting all areas");
    let areas = sqlx::query_as::<_, Area>("SELECT id, name, description, photo FROM areas ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(areas)
}

#[instrument]
pub async fn get_area(pool: &Pool<Sqlite>, id: i64) -> Result<Area, AppError> {
    info!("Fetching area by ID");
    sqlx::query_as::<_, Area>("SELECT id, name, description, photo FROM areas WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No existe un área con id {}.", id)))
}

#[instrument]
pub async fn create_area(
    pool: &Pool<Sqlite>,
    name: &str,
    description: Option<&str>,
    photo: Option<&str>,
) -> Result<Area, AppError> {
    info!("Creating area");
    let res = sqlx::query("INSERT INTO areas (name, description, photo) VALUES (?, ?, ?)")
        .bind(name.trim())
        .bind(description)
        .bind(photo)
        .execute(pool)
        .await
        .map_err(|e| AppError::unique_violation_as(e, AREA_NAME_TAKEN))?;

    get_area(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool, changes))]
pub async fn update_area(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: &AreaChanges,
) -> Result<Area, AppError> {
    info!("Updating area");
    let current = get_area(pool, id).await?;

    sqlx::query("UPDATE areas SET name = ?, description = ?, photo = ? WHERE id = ?")
        .bind(changes.name.as_deref().map(str::trim).unwrap_or(&current.name))
        .bind(changes.description.as_ref().or(current.description.as_ref()))
        .bind(changes.photo.as_ref().or(current.photo.as_ref()))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::unique_violation_as(e, AREA_NAME_TAKEN))?;

    get_area(pool, id).await
}

/// Removing an area removes every course filed under it.
#[instrument]
pub async fn delete_area(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting area");
    let res = sqlx::query("DELETE FROM areas WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("No existe un área con id {}.", id)));
    }

    Ok(())
}
