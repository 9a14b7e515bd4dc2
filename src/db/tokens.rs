use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::auth::Claims;
use crate::error::AppError;

#[instrument(skip(pool, claims), fields(user_id = %claims.sub))]
pub async fn store_refresh_token(pool: &Pool<Sqlite>, claims: &Claims) -> Result<(), AppError> {
    info!("Storing refresh token");
    let user_id = claims.user_id()?;

    sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(&claims.jti)
        .bind(claims.expires_at())
        .execute(pool)
        .await?;

    Ok(())
}

/// Whether a refresh token id is still on record and not past its expiry.
#[instrument(skip(pool, jti))]
pub async fn refresh_token_active(pool: &Pool<Sqlite>, jti: &str) -> Result<bool, AppError> {
    let now = Utc::now().naive_utc();

    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM refresh_tokens WHERE jti = ? AND expires_at > ?")
            .bind(jti)
            .bind(now)
            .fetch_optional(pool)
            .await?;

    Ok(found.is_some())
}

#[instrument(skip(pool, jti))]
pub async fn revoke_refresh_token(pool: &Pool<Sqlite>, jti: &str) -> Result<bool, AppError> {
    info!("Revoking refresh token");

    let result = sqlx::query("DELETE FROM refresh_tokens WHERE jti = ?")
        .bind(jti)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[instrument(skip(pool))]
pub async fn clean_expired_tokens(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
    info!("Cleaning expired refresh tokens");

    let now = Utc::now().naive_utc();

    let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
