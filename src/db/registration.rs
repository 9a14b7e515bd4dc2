use rand::Rng;
use sqlx::SqliteConnection;
use tracing::{instrument, warn};

use crate::error::AppError;

const MAX_ATTEMPTS: usize = 20;

/// Draws random six-digit registration numbers until one is unused.
#[instrument(skip(conn))]
pub async fn generate_registration_number(conn: &mut SqliteConnection) -> Result<String, AppError> {
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = rand::rng().random_range(100_000..=999_999).to_string();

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE registration_number = ?")
                .bind(&candidate)
                .fetch_optional(&mut *conn)
                .await?;

        if existing.is_none() {
            return Ok(candidate);
        }

        warn!(attempt, "Registration number collision");
    }

    Err(AppError::Internal(
        "Could not allocate a unique registration number".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[rocket::async_test]
    async fn generates_six_digit_numbers() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        for _ in 0..50 {
            let number = generate_registration_number(&mut conn).await.unwrap();
            assert_eq!(number.len(), 6);
            assert!(number.chars().all(|c| c.is_ascii_digit()));
            assert!(!number.starts_with('0'));
        }
    }
}
