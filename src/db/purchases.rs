use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::models::{BulkPurchaseResult, DbPurchase, MaterialAccess, Purchase, PurchaseDetail};

use super::{get_course, get_course_detail};

const PURCHASE_SELECT: &str = "SELECT p.id, p.student_id, u.full_name AS student_name,
            p.course_id, c.name AS course_name, p.is_trial, p.purchased_at
     FROM purchases p
     JOIN users u ON u.id = p.student_id
     JOIN courses c ON c.id = p.course_id";

const ALREADY_PURCHASED: &str = "Este alumno ya compró este curso.";

#[derive(Debug, Clone, Default)]
pub struct PurchaseChanges {
    pub student_id: Option<i64>,
    pub course_id: Option<i64>,
    pub is_trial: Option<bool>,
}

async fn attach_courses(
    pool: &Pool<Sqlite>,
    rows: Vec<DbPurchase>,
) -> Result<Vec<Purchase>, AppError> {
    let mut purchases = Vec::with_capacity(rows.len());
    for row in rows {
        let course = get_course(pool, row.course_id).await?;
        purchases.push(row.with_course(course));
    }
    Ok(purchases)
}

#[instrument]
pub async fn get_all_purchases(pool: &Pool<Sqlite>) -> Result<Vec<Purchase>, AppError> {
    info!("Getting all purchases");
    let rows = sqlx::query_as::<_, DbPurchase>(&format!("{} ORDER BY p.id", PURCHASE_SELECT))
        .fetch_all(pool)
        .await?;

    attach_courses(pool, rows).await
}

#[instrument]
pub async fn get_purchases_for_student(
    pool: &Pool<Sqlite>,
    student_id: i64,
) -> Result<Vec<Purchase>, AppError> {
    info!("Getting purchases for student");
    let rows = sqlx::query_as::<_, DbPurchase>(&format!(
        "{} WHERE p.student_id = ? ORDER BY p.id",
        PURCHASE_SELECT
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    attach_courses(pool, rows).await
}

#[instrument]
pub async fn get_purchase(pool: &Pool<Sqlite>, id: i64) -> Result<Purchase, AppError> {
    info!("Fetching purchase by ID");
    let row = sqlx::query_as::<_, DbPurchase>(&format!("{} WHERE p.id = ?", PURCHASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No existe una compra con id {}.", id)))?;

    let course = get_course(pool, row.course_id).await?;
    Ok(row.with_course(course))
}

/// A purchase as its owner sees it: trial purchases stay a plain record,
/// full purchases unlock every lesson material of the course.
#[instrument]
pub async fn get_purchase_detail(pool: &Pool<Sqlite>, id: i64) -> Result<PurchaseDetail, AppError> {
    let purchase = get_purchase(pool, id).await?;

    let course_full_detail = if purchase.is_trial {
        None
    } else {
        Some(get_course_detail(pool, purchase.course_id, MaterialAccess::Full).await?)
    };

    Ok(PurchaseDetail {
        purchase,
        course_full_detail,
    })
}

async fn ensure_student_and_course(
    pool: &Pool<Sqlite>,
    student_id: i64,
    course_id: i64,
) -> Result<(), AppError> {
    let student: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
    if student.is_none() {
        return Err(AppError::Validation(format!(
            "El alumno {} no existe.",
            student_id
        )));
    }

    match get_course(pool, course_id).await {
        Ok(_) => Ok(()),
        Err(AppError::NotFound(_)) => Err(AppError::Validation(format!(
            "Curso {} no existe",
            course_id
        ))),
        Err(err) => Err(err),
    }
}

#[instrument]
pub async fn create_purchase(
    pool: &Pool<Sqlite>,
    student_id: i64,
    course_id: i64,
    is_trial: bool,
) -> Result<Purchase, AppError> {
    info!("Creating purchase");
    ensure_student_and_course(pool, student_id, course_id).await?;

    let res = sqlx::query("INSERT INTO purchases (student_id, course_id, is_trial) VALUES (?, ?, ?)")
        .bind(student_id)
        .bind(course_id)
        .bind(is_trial)
        .execute(pool)
        .await
        .map_err(|e| AppError::unique_violation_as(e, ALREADY_PURCHASED))?;

    get_purchase(pool, res.last_insert_rowid()).await
}

/// Inserts one purchase row, or `None` when the pair already exists because
/// another purchase committed it first.
pub async fn insert_purchase_entry(
    conn: &mut SqliteConnection,
    student_id: i64,
    course_id: i64,
    is_trial: bool,
) -> Result<Option<i64>, AppError> {
    let res = sqlx::query(
        "INSERT INTO purchases (student_id, course_id, is_trial) VALUES (?, ?, ?)",
    )
    .bind(student_id)
    .bind(course_id)
    .bind(is_trial)
    .execute(&mut *conn)
    .await;

    match res {
        Ok(res) => Ok(Some(res.last_insert_rowid())),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Buys each course independently for the student. Unknown and already
/// owned courses are reported in `errors`; the rest are created together.
#[instrument(skip(pool, course_ids), fields(count = course_ids.len()))]
pub async fn purchase_courses(
    pool: &Pool<Sqlite>,
    student_id: i64,
    course_ids: &[i64],
    is_trial: bool,
) -> Result<BulkPurchaseResult, AppError> {
    info!("Purchasing several courses");
    let mut created_ids = Vec::new();
    let mut errors = Vec::new();

    let mut tx = pool.begin().await?;

    for &course_id in course_ids {
        let course_name: Option<String> = sqlx::query_scalar("SELECT name FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(course_name) = course_name else {
            warn!(course_id, "Course to purchase does not exist");
            errors.push(format!("Curso {} no existe", course_id));
            continue;
        };

        let owned: Option<i64> =
            sqlx::query_scalar("SELECT id FROM purchases WHERE student_id = ? AND course_id = ?")
                .bind(student_id)
                .bind(course_id)
                .fetch_optional(&mut *tx)
                .await?;

        if owned.is_some() {
            errors.push(format!("Curso {} ya comprado", course_name));
            continue;
        }

        match insert_purchase_entry(&mut *tx, student_id, course_id, is_trial).await? {
            Some(id) => created_ids.push(id),
            None => {
                warn!(course_id, "Course purchased concurrently");
                errors.push(format!("Curso {} ya comprado", course_name));
            }
        }
    }

    tx.commit().await?;

    let mut created = Vec::with_capacity(created_ids.len());
    for id in created_ids {
        created.push(get_purchase(pool, id).await?);
    }

    Ok(BulkPurchaseResult { created, errors })
}

#[instrument(skip(pool, changes))]
pub async fn update_purchase(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: &PurchaseChanges,
) -> Result<Purchase, AppError> {
    info!("Updating purchase");
    let current = get_purchase(pool, id).await?;

    let student_id = changes.student_id.unwrap_or(current.student_id);
    let course_id = changes.course_id.unwrap_or(current.course_id);
    ensure_student_and_course(pool, student_id, course_id).await?;

    sqlx::query("UPDATE purchases SET student_id = ?, course_id = ?, is_trial = ? WHERE id = ?")
        .bind(student_id)
        .bind(course_id)
        .bind(changes.is_trial.unwrap_or(current.is_trial))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| AppError::unique_violation_as(e, ALREADY_PURCHASED))?;

    get_purchase(pool, id).await
}

#[instrument]
pub async fn delete_purchase(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting purchase");
    let res = sqlx::query("DELETE FROM purchases WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("No existe una compra con id {}.", id)));
    }

    Ok(())
}
