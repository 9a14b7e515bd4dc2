use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::Role;
use crate::error::AppError;
use crate::models::{DbTeacher, Teacher};

use super::users::{insert_user, NewUser};

const TEACHER_SELECT: &str = "SELECT t.id, t.user_id, u.full_name, u.email, u.secondary_email,
            t.photo_profile, t.description, t.registration_number, t.registered_at,
            (SELECT g.name FROM user_groups ug JOIN auth_groups g ON g.id = ug.group_id
             WHERE ug.user_id = t.user_id ORDER BY g.id LIMIT 1) AS group_name
     FROM teachers t
     JOIN users u ON u.id = t.user_id";

#[derive(Debug, Clone, Default)]
pub struct TeacherChanges {
    pub description: Option<String>,
    pub photo_profile: Option<String>,
}

#[instrument]
pub async fn get_teacher(pool: &Pool<Sqlite>, id: i64) -> Result<Teacher, AppError> {
    info!("Fetching teacher by ID");
    let row = sqlx::query_as::<_, DbTeacher>(&format!("{} WHERE t.id = ?", TEACHER_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Teacher::from)
        .ok_or_else(|| AppError::NotFound(format!("No existe un docente con id {}.", id)))
}

/// The teacher profile attached to an account, if it has one.
#[instrument]
pub async fn find_teacher_by_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Option<Teacher>, AppError> {
    info!("Looking up teacher profile for user");
    let row = sqlx::query_as::<_, DbTeacher>(&format!("{} WHERE t.user_id = ?", TEACHER_SELECT))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Teacher::from))
}

#[instrument]
pub async fn get_teacher_by_registration_number(
    pool: &Pool<Sqlite>,
    registration_number: &str,
) -> Result<Teacher, AppError> {
    info!("Fetching teacher by registration number");
    let row = sqlx::query_as::<_, DbTeacher>(&format!(
        "{} WHERE t.registration_number = ?",
        TEACHER_SELECT
    ))
    .bind(registration_number)
    .fetch_optional(pool)
    .await?;

    row.map(Teacher::from).ok_or_else(|| {
        AppError::NotFound("No existe un docente con ese número de registro.".to_string())
    })
}

#[instrument]
pub async fn get_all_teachers(pool: &Pool<Sqlite>) -> Result<Vec<Teacher>, AppError> {
    info!("Getting all teachers");
    let rows = sqlx::query_as::<_, DbTeacher>(&format!("{} ORDER BY t.id", TEACHER_SELECT))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Teacher::from).collect())
}

/// Creates the account, puts it in the teacher group and attaches a teacher
/// profile sharing its registration number, all or nothing.
#[instrument(skip_all, fields(email = %new_user.email))]
pub async fn create_teacher(
    pool: &Pool<Sqlite>,
    new_user: &NewUser,
    description: Option<&str>,
) -> Result<Teacher, AppError> {
    info!("Creating teacher");
    let mut tx = pool.begin().await?;

    let (user_id, registration_number) = insert_user(&mut *tx, new_user, Role::Teacher).await?;

    let res = sqlx::query(
        "INSERT INTO teachers (user_id, description, registration_number, photo_profile)
         VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(description)
    .bind(&registration_number)
    .bind(&new_user.photo_profile)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_teacher(pool, res.last_insert_rowid()).await
}

#[instrument(skip(pool, changes))]
pub async fn update_teacher(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: &TeacherChanges,
) -> Result<Teacher, AppError> {
    info!("Updating teacher profile");
    let current = get_teacher(pool, id).await?;

    sqlx::query("UPDATE teachers SET description = ?, photo_profile = ? WHERE id = ?")
        .bind(changes.description.as_ref().or(current.description.as_ref()))
        .bind(changes.photo_profile.as_ref().or(current.photo_profile.as_ref()))
        .bind(id)
        .execute(pool)
        .await?;

    get_teacher(pool, id).await
}

/// Deletes the teacher's account; the profile goes with it and their
/// courses are left without a teacher.
#[instrument]
pub async fn delete_teacher(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting teacher and account");
    let teacher = get_teacher(pool, id).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(teacher.user_id)
        .execute(pool)
        .await?;

    Ok(())
}
