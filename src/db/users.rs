use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

use crate::auth::{DbUser, Role, User};
use crate::error::AppError;

use super::generate_registration_number;

const USER_COLUMNS: &str = "id, full_name, email, secondary_email, registration_number, \
     photo_profile, created_at, is_active, is_staff, is_superuser";

pub const EMAIL_TAKEN: &str = "El email ya está registrado";

const BCRYPT_COST: u32 = if cfg!(test) { 4 } else { bcrypt::DEFAULT_COST };

/// Lowercases the domain part of an address, leaving the local part as typed.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub secondary_email: Option<String>,
    pub password: String,
    pub photo_profile: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Field-wise update of an account; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub secondary_email: Option<String>,
    pub password: Option<String>,
    pub photo_profile: Option<String>,
    pub is_active: Option<bool>,
}

async fn load_groups(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<Role>, AppError> {
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT g.name FROM auth_groups g
         JOIN user_groups ug ON ug.group_id = g.id
         WHERE ug.user_id = ?
         ORDER BY g.id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    names
        .iter()
        .map(|name| Role::from_str(name).map_err(|e| AppError::Internal(e.to_string())))
        .collect()
}

async fn hydrate(conn: &mut SqliteConnection, row: DbUser) -> Result<User, AppError> {
    let groups = load_groups(conn, row.id).await?;
    Ok(row.into_user(groups))
}

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let mut conn = pool.acquire().await?;

    let row = sqlx::query_as::<_, DbUser>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => hydrate(&mut conn, row).await,
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn get_user_by_registration_number(
    pool: &Pool<Sqlite>,
    registration_number: &str,
) -> Result<User, AppError> {
    info!("Fetching user by registration number");
    let mut conn = pool.acquire().await?;

    let row = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users WHERE registration_number = ?",
        USER_COLUMNS
    ))
    .bind(registration_number)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => hydrate(&mut conn, row).await,
        _ => Err(AppError::NotFound(format!(
            "No existe un alumno con el número de registro {}.",
            registration_number
        ))),
    }
}

#[instrument]
pub async fn email_taken(pool: &Pool<Sqlite>, email: &str) -> Result<bool, AppError> {
    let email = normalize_email(email);
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM users WHERE email = ? OR secondary_email = ?")
            .bind(&email)
            .bind(&email)
            .fetch_optional(pool)
            .await?;

    Ok(existing.is_some())
}

/// Whether any account other than `except_user` holds the address as its
/// primary or secondary email.
async fn address_in_use(
    conn: &mut SqliteConnection,
    email: &str,
    except_user: Option<i64>,
) -> Result<bool, AppError> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM users
         WHERE (email = ? OR secondary_email = ?) AND (? IS NULL OR id != ?)",
    )
    .bind(email)
    .bind(email)
    .bind(except_user)
    .bind(except_user)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(existing.is_some())
}

async fn ensure_addresses_free(
    conn: &mut SqliteConnection,
    addresses: &[Option<&str>],
    except_user: Option<i64>,
) -> Result<(), AppError> {
    for email in addresses.iter().flatten() {
        if address_in_use(conn, email, except_user).await? {
            warn!(%email, "Email already in use");
            return Err(AppError::Validation(EMAIL_TAKEN.to_string()));
        }
    }
    Ok(())
}

/// Inserts the account and its group membership on an open connection, so
/// callers can add more rows in the same transaction.
pub(super) async fn insert_user(
    conn: &mut SqliteConnection,
    new_user: &NewUser,
    role: Role,
) -> Result<(i64, String), AppError> {
    let registration_number = generate_registration_number(conn).await?;
    let hashed_password = bcrypt::hash(&new_user.password, BCRYPT_COST)?;
    let secondary_email = new_user
        .secondary_email
        .as_deref()
        .filter(|email| !email.trim().is_empty())
        .map(normalize_email);
    let email = normalize_email(&new_user.email);

    ensure_addresses_free(conn, &[Some(email.as_str()), secondary_email.as_deref()], None).await?;

    let res = sqlx::query(
        "INSERT INTO users (full_name, email, secondary_email, password, registration_number,
                            photo_profile, is_staff, is_superuser)
         VALUES (?, ?, ?, ?, ?, COALESCE(?, 'alumnos_fotos/profile_icon.png'), ?, ?)",
    )
    .bind(new_user.full_name.trim())
    .bind(&email)
    .bind(secondary_email)
    .bind(hashed_password)
    .bind(&registration_number)
    .bind(&new_user.photo_profile)
    .bind(new_user.is_staff)
    .bind(new_user.is_superuser)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::unique_violation_as(e, EMAIL_TAKEN))?;

    let user_id = res.last_insert_rowid();

    let assigned = sqlx::query(
        "INSERT INTO user_groups (user_id, group_id) SELECT ?, id FROM auth_groups WHERE name = ?",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(&mut *conn)
    .await?;

    if assigned.rows_affected() == 0 {
        return Err(AppError::Internal(format!("Group '{}' is missing", role)));
    }

    Ok((user_id, registration_number))
}

#[instrument(skip_all, fields(email = %new_user.email, role = %role))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    new_user: &NewUser,
    role: Role,
) -> Result<User, AppError> {
    info!("Creating new user");
    let mut tx = pool.begin().await?;

    let (user_id, _) = insert_user(&mut *tx, new_user, role).await?;

    tx.commit().await?;

    get_user(pool, user_id).await
}

#[instrument(skip_all, fields(email))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    info!("Authenticating user");
    let user = sqlx::query_as::<_, (i64, String, bool)>(
        "SELECT id, password, is_active FROM users WHERE email = ?",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    let Some((id, hashed_password, is_active)) = user else {
        return Err(AppError::Validation(
            "No existe un usuario con ese email.".to_string(),
        ));
    };

    if !bcrypt::verify(password, &hashed_password).unwrap_or(false) {
        return Err(AppError::Validation("Contraseña incorrecta.".to_string()));
    }

    if !is_active {
        return Err(AppError::Validation(
            "La cuenta de usuario está desactivada.".to_string(),
        ));
    }

    get_user(pool, id).await
}

#[instrument]
pub async fn get_users_in_group(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<User>, AppError> {
    info!("Getting users by group");
    let mut conn = pool.acquire().await?;

    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {} FROM users
         WHERE id IN (SELECT ug.user_id FROM user_groups ug
                      JOIN auth_groups g ON g.id = ug.group_id
                      WHERE g.name = ?)
         ORDER BY id",
        USER_COLUMNS
    ))
    .bind(role.as_str())
    .fetch_all(&mut *conn)
    .await?;

    let mut users = Vec::with_capacity(rows.len());
    for row in rows {
        users.push(hydrate(&mut conn, row).await?);
    }

    Ok(users)
}

#[instrument(skip(pool, changes))]
pub async fn update_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
    changes: &UserChanges,
) -> Result<User, AppError> {
    info!("Updating user");
    let current = get_user(pool, user_id).await?;

    let full_name = changes
        .full_name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.full_name)
        .to_string();
    let email = changes
        .email
        .as_deref()
        .map(normalize_email)
        .unwrap_or(current.email);
    let secondary_email = match changes.secondary_email.as_deref() {
        Some(email) if email.trim().is_empty() => None,
        Some(email) => Some(normalize_email(email)),
        None => current.secondary_email,
    };
    let photo_profile = changes
        .photo_profile
        .clone()
        .unwrap_or(current.photo_profile);
    let is_active = changes.is_active.unwrap_or(current.is_active);

    let mut tx = pool.begin().await?;

    ensure_addresses_free(
        &mut *tx,
        &[
            changes.email.as_ref().map(|_| email.as_str()),
            changes.secondary_email.as_ref().and(secondary_email.as_deref()),
        ],
        Some(user_id),
    )
    .await?;

    sqlx::query(
        "UPDATE users
         SET full_name = ?, email = ?, secondary_email = ?, photo_profile = ?, is_active = ?
         WHERE id = ?",
    )
    .bind(full_name)
    .bind(email)
    .bind(secondary_email)
    .bind(photo_profile)
    .bind(is_active)
    .bind(user_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::unique_violation_as(e, EMAIL_TAKEN))?;

    if let Some(password) = &changes.password {
        let hashed_password = bcrypt::hash(password, BCRYPT_COST)?;
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    get_user(pool, user_id).await
}

#[instrument]
pub async fn delete_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), AppError> {
    info!("Deleting user");
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            user_id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn normalizes_only_the_domain() {
        assert_eq!(normalize_email("Ana.Perez@Example.COM"), "Ana.Perez@example.com");
        assert_eq!(normalize_email("  bob@MAIL.org "), "bob@mail.org");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }
}
