use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use validator::{Validate, ValidateEmail};

use crate::auth::{Role, TokenKeys, TokenType, User};
use crate::db::{
    authenticate_user, create_teacher, create_user, email_taken, refresh_token_active,
    revoke_refresh_token, store_refresh_token, NewUser, EMAIL_TAKEN,
};
use crate::error::AppError;
use crate::validation::{ApiError, JsonValidateExt};

use super::present;

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default)]
    #[validate(email(message = "Introduzca una dirección de correo electrónico válida."))]
    email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Este campo es requerido."))]
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Este campo es requerido."))]
    refresh: String,
}

/// Account fields shared by every sign-up flow. All are optional on the wire
/// so that missing fields can be reported together.
#[derive(Debug, Deserialize, Default)]
pub struct SignUpRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub secondary_email: Option<String>,
    pub password: Option<String>,
    pub photo_profile: Option<String>,
}

impl SignUpRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("secondary_email", &self.secondary_email),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn into_new_user(self, is_staff: bool) -> NewUser {
        NewUser {
            full_name: self.full_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            secondary_email: self.secondary_email,
            password: self.password.unwrap_or_default(),
            photo_profile: self.photo_profile,
            is_staff,
            is_superuser: false,
        }
    }

    /// Rejects malformed addresses once presence has been checked.
    pub fn check_emails(&self) -> Result<(), AppError> {
        for email in [&self.email, &self.secondary_email] {
            if let Some(email) = present(email) {
                if !email.validate_email() {
                    return Err(AppError::Validation(format!(
                        "'{}' no es un email válido.",
                        email
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedMessage {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedTeacher {
    pub message: String,
    pub teacher_id: i64,
    pub registration_number: String,
}

pub async fn issue_token_pair(
    db: &Pool<Sqlite>,
    keys: &TokenKeys,
    user_id: i64,
) -> Result<TokenPair, AppError> {
    let access = keys.issue(user_id, TokenType::Access)?;
    let refresh = keys.issue(user_id, TokenType::Refresh)?;

    store_refresh_token(db, &refresh.claims).await?;

    Ok(TokenPair {
        access: access.token,
        refresh: refresh.token,
    })
}

#[post("/token", data = "<login>")]
pub async fn obtain_token(
    login: Json<TokenRequest>,
    db: &State<Pool<Sqlite>>,
    keys: &State<TokenKeys>,
) -> Result<Json<TokenPair>, ApiError> {
    let login = login.validate_custom()?;

    let user = authenticate_user(db, &login.email, &login.password).await?;
    tracing::info!(email = %user.email, "Issuing token pair");

    Ok(Json(issue_token_pair(db, keys, user.id).await?))
}

#[post("/token/refresh", data = "<request>")]
pub async fn refresh_token(
    request: Json<RefreshRequest>,
    db: &State<Pool<Sqlite>>,
    keys: &State<TokenKeys>,
) -> Result<Json<AccessToken>, ApiError> {
    let request = request.validate_custom()?;

    let claims = keys.decode(&request.refresh, TokenType::Refresh)?;
    if !refresh_token_active(db, &claims.jti).await? {
        return Err(AppError::Authentication("Token has been revoked".to_string()).into());
    }

    let access = keys.issue(claims.user_id()?, TokenType::Access)?;

    Ok(Json(AccessToken {
        access: access.token,
    }))
}

#[post("/auth/logout", data = "<request>")]
pub async fn logout(
    request: Json<RefreshRequest>,
    db: &State<Pool<Sqlite>>,
    keys: &State<TokenKeys>,
) -> Result<Status, ApiError> {
    let request = request.validate_custom()?;

    let claims = keys.decode(&request.refresh, TokenType::Refresh)?;
    if !revoke_refresh_token(db, &claims.jti).await? {
        tracing::info!(jti = %claims.jti, "Refresh token was already revoked");
    }

    Ok(Status::NoContent)
}

#[post("/auth/register", data = "<request>")]
pub async fn register(
    request: Json<SignUpRequest>,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<RegisteredUser>>, ApiError> {
    let request = request.into_inner();

    if !request.missing_fields().is_empty() {
        return Err(AppError::Validation("Todos los campos son obligatorios".to_string()).into());
    }
    request.check_emails()?;
    if email_taken(db, request.email.as_deref().unwrap_or_default()).await? {
        return Err(AppError::Validation(EMAIL_TAKEN.to_string()).into());
    }

    let user = create_user(db, &request.into_new_user(false), Role::Student).await?;

    Ok(Custom(
        Status::Created,
        Json(RegisteredUser {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: Role::Student,
        }),
    ))
}

#[post("/auth/create-admin", data = "<request>")]
pub async fn create_admin(
    request: Json<SignUpRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<CreatedMessage>>, ApiError> {
    user.require_admin()?;
    let request = request.into_inner();

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Faltan los siguientes campos obligatorios: {}",
            missing.join(", ")
        ))
        .into());
    }
    request.check_emails()?;
    if email_taken(db, request.email.as_deref().unwrap_or_default()).await? {
        return Err(AppError::Validation(EMAIL_TAKEN.to_string()).into());
    }

    let admin = create_user(db, &request.into_new_user(true), Role::Admin).await?;
    tracing::info!(created_by = %user.email, email = %admin.email, "Administrator created");

    Ok(Custom(
        Status::Created,
        Json(CreatedMessage {
            message: format!("Administrador {} creado correctamente.", admin.email),
        }),
    ))
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateTeacherRequest {
    #[serde(flatten)]
    pub account: SignUpRequest,
    pub description: Option<String>,
}

#[post("/auth/create-docente", data = "<request>")]
pub async fn create_docente(
    request: Json<CreateTeacherRequest>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> Result<Custom<Json<CreatedTeacher>>, ApiError> {
    user.require_admin()?;
    let CreateTeacherRequest {
        account,
        description,
    } = request.into_inner();

    if !account.missing_fields().is_empty() {
        return Err(AppError::Validation("Todos los campos son obligatorios.".to_string()).into());
    }
    account.check_emails()?;
    if email_taken(db, account.email.as_deref().unwrap_or_default()).await? {
        return Err(AppError::Validation(EMAIL_TAKEN.to_string()).into());
    }

    let teacher = create_teacher(db, &account.into_new_user(true), present(&description)).await?;
    tracing::info!(created_by = %user.email, email = %teacher.email, "Teacher created");

    Ok(Custom(
        Status::Created,
        Json(CreatedTeacher {
            message: format!("Docente {} creado correctamente.", teacher.email),
            teacher_id: teacher.id,
            registration_number: teacher.registration_number,
        }),
    ))
}

pub fn routes() -> Vec<Route> {
    routes![
        obtain_token,
        refresh_token,
        logout,
        register,
        create_admin,
        create_docente
    ]
}
